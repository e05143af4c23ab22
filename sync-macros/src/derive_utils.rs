use syn::punctuated::Punctuated;
use syn::{Attribute, Path, Result, Token};

/// 宏生成类型所需的派生集合
///
/// 按 trait 名（路径最后一段）去重：`Serialize` 与 `serde::Serialize` 视为同一项。
/// 宏要求的派生排在前面，用户手写的其他派生随后。
pub(crate) struct DeriveSet {
    paths: Vec<Path>,
}

impl DeriveSet {
    pub(crate) fn new(required: Vec<Path>) -> Self {
        let mut set = Self { paths: Vec::new() };
        for path in required {
            set.insert(path);
        }
        set
    }

    fn insert(&mut self, path: Path) {
        if !self.paths.iter().any(|p| trait_name(p) == trait_name(&path)) {
            self.paths.push(path);
        }
    }

    /// 吸收 `attrs` 中已有的 `#[derive(..)]`，替换为一条合并后的派生；
    /// 非 derive 属性（如 `#[serde(..)]`）保持原顺序。无法解析的 derive 直接报错。
    pub(crate) fn apply_to(mut self, attrs: &mut Vec<Attribute>) -> Result<()> {
        let mut others = Vec::with_capacity(attrs.len());
        for attr in attrs.drain(..) {
            if !attr.path().is_ident("derive") {
                others.push(attr);
                continue;
            }
            let written = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
            for path in written {
                self.insert(path);
            }
        }

        let paths = &self.paths;
        attrs.push(syn::parse_quote!(#[derive(#(#paths),*)]));
        attrs.extend(others);
        Ok(())
    }
}

fn trait_name(path: &Path) -> Option<String> {
    path.segments.last().map(|s| s.ident.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::ItemStruct;

    fn derived_traits(st: &ItemStruct) -> Vec<Vec<String>> {
        st.attrs
            .iter()
            .filter(|a| a.path().is_ident("derive"))
            .map(|a| {
                a.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
                    .unwrap()
                    .iter()
                    .filter_map(trait_name)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn merges_written_derives_after_required_ones() {
        let mut st: ItemStruct = syn::parse_quote! {
            #[serde(rename_all = "camelCase")]
            #[derive(Serialize, Copy)]
            struct Flags { on: bool }
        };
        DeriveSet::new(vec![syn::parse_quote!(Clone), syn::parse_quote!(serde::Serialize)])
            .apply_to(&mut st.attrs)
            .unwrap();

        assert_eq!(derived_traits(&st), vec![vec!["Clone", "Serialize", "Copy"]]);
        assert!(st.attrs[1].path().is_ident("serde"));
    }

    #[test]
    fn malformed_derive_is_an_error() {
        let mut st: ItemStruct = syn::parse_quote! {
            #[derive(Clone = 1)]
            struct Broken;
        };
        assert!(DeriveSet::new(Vec::new()).apply_to(&mut st.attrs).is_err());
    }
}
