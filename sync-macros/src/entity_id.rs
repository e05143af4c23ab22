use crate::derive_utils::DeriveSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Fields, ItemStruct, Result, Type};

/// #[entity_id] 宏实现
///
/// 只接受包裹 `String` 的单字段 tuple struct。标识是生产者分配的不透明字符串，
/// 生成：全序与哈希派生（可作 BTreeMap/DashMap 键）、`new`/`as_str`/`is_blank`、
/// Display、FromStr、`AsRef<str>`，以及与 `String`/`&str` 之间的转换。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new(attr.span(), "#[entity_id] takes no arguments"));
    }

    let mut st: ItemStruct = syn::parse2(item)
        .map_err(|e| syn::Error::new(e.span(), "#[entity_id] only on struct"))?;

    match &st.fields {
        Fields::Unnamed(f) if f.unnamed.len() == 1 && is_string(&f.unnamed[0].ty) => {}
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[entity_id] expects a String newtype, e.g. struct EntityId(String);",
            ));
        }
    }

    DeriveSet::new(vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(Default),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
        syn::parse_quote!(Hash),
        syn::parse_quote!(PartialOrd),
        syn::parse_quote!(Ord),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ])
    .apply_to(&mut st.attrs)?;

    let ident = &st.ident;

    Ok(quote! {
        #st

        impl #ident {
            pub fn new(value: impl ::core::convert::Into<::std::string::String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// 空串或只含空白
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::std::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::str::FromStr for #ident {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                ::std::result::Result::Ok(Self(s.to_owned()))
            }
        }

        impl ::core::convert::AsRef<str> for #ident {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::convert::From<::std::string::String> for #ident {
            fn from(value: ::std::string::String) -> Self {
                Self(value)
            }
        }

        impl ::core::convert::From<&str> for #ident {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl ::core::convert::From<#ident> for ::std::string::String {
            fn from(value: #ident) -> Self {
                value.0
            }
        }
    })
}

fn is_string(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p.qself.is_none() && p.path.segments.last().is_some_and(|s| s.ident == "String"),
        _ => false,
    }
}
