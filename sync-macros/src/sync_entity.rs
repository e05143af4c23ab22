use crate::derive_utils::DeriveSet;
use crate::field_utils::{ensure_leading_fields, has_field};
use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Ident, ItemStruct, Result, Token, Type, parse::Parse, parse::ParseStream};

/// #[sync_entity] 宏实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let cfg: SyncEntityAttrConfig = syn::parse2(attr)?;
    let mut st: ItemStruct = syn::parse2(item)
        .map_err(|e| syn::Error::new(e.span(), "#[sync_entity] only on struct"))?;

    let Some(kind) = cfg.kind else {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[sync_entity] requires `kind = <EntityType variant>`",
        ));
    };

    let struct_span = st.span();
    let syn::Fields::Named(fields_named) = &mut st.fields else {
        return Err(syn::Error::new(struct_span, "only supports named-field struct"));
    };

    if let Some(visible) = &cfg.visible
        && !has_field(fields_named, visible)
    {
        return Err(syn::Error::new(
            visible.span(),
            format!("visibility field `{visible}` not found on struct"),
        ));
    }

    let id_ty: Type = syn::parse_quote! { ::sync_domain::model::EntityId };
    ensure_leading_fields(fields_named, &[("id", &id_ty)]);

    DeriveSet::new(vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(Default),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ])
    .apply_to(&mut st.attrs)?;

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let (is_visible_body, set_visible_body) = match &cfg.visible {
        Some(field) => (quote! { self.#field }, quote! { self.#field = visible; }),
        // 恒可见实体（如站点设置）忽略可见性切换
        None => (quote! { true }, quote! { let _ = visible; }),
    };

    Ok(quote! {
        #st

        impl #impl_generics ::sync_domain::model::SyncEntity for #ident #ty_generics #where_clause {
            const ENTITY_TYPE: ::sync_domain::model::EntityType =
                ::sync_domain::model::EntityType::#kind;

            fn id(&self) -> &::sync_domain::model::EntityId {
                &self.id
            }

            fn is_visible(&self) -> bool {
                #is_visible_body
            }

            fn set_visible(&mut self, visible: bool) {
                #set_visible_body
            }

            fn from_snapshot(
                snapshot: ::sync_domain::model::EntitySnapshot,
            ) -> ::core::option::Option<Self> {
                match snapshot {
                    ::sync_domain::model::EntitySnapshot::#kind(entity) => {
                        ::core::option::Option::Some(entity)
                    }
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::core::convert::From<#ident #ty_generics>
            for ::sync_domain::model::EntitySnapshot #where_clause
        {
            fn from(entity: #ident #ty_generics) -> Self {
                ::sync_domain::model::EntitySnapshot::#kind(entity)
            }
        }
    })
}

// -------- parsing --------

struct SyncEntityAttrConfig {
    kind: Option<Ident>,
    visible: Option<Ident>,
}

impl Parse for SyncEntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut kind: Option<Ident> = None;
        let mut visible: Option<Ident> = None;

        let elems: Punctuated<SyncEntityAttrElem, Token![,]> =
            Punctuated::<SyncEntityAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            match elem {
                SyncEntityAttrElem::Kind(ident) => {
                    if kind.is_some() {
                        return Err(syn::Error::new(
                            ident.span(),
                            "duplicate key 'kind' in attribute",
                        ));
                    }
                    kind = Some(ident);
                }
                SyncEntityAttrElem::Visible(ident) => {
                    if visible.is_some() {
                        return Err(syn::Error::new(
                            ident.span(),
                            "duplicate key 'visible' in attribute",
                        ));
                    }
                    visible = Some(ident);
                }
            }
        }

        Ok(Self { kind, visible })
    }
}

enum SyncEntityAttrElem {
    Kind(Ident),
    Visible(Ident),
}

impl Parse for SyncEntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Ident = input.parse()?;
        if key == "kind" {
            Ok(SyncEntityAttrElem::Kind(value))
        } else if key == "visible" {
            Ok(SyncEntityAttrElem::Visible(value))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'kind' or 'visible'",
            ))
        }
    }
}
