use syn::{Field, FieldsNamed, Ident, Token, Type, punctuated::Punctuated};

pub(crate) fn has_field(fields_named: &FieldsNamed, name: &Ident) -> bool {
    fields_named
        .named
        .iter()
        .any(|f| f.ident.as_ref() == Some(name))
}

/// 确保具名字段结构体包含所需字段，并将其移至最前
/// - 已存在的字段复用原定义（保留属性与可见性）
/// - 缺失的字段按给定类型新增
/// - 其余字段保持原始相对顺序
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required.iter() {
        match old_named
            .iter()
            .find(|f| f.ident.as_ref().map(|i| i == *name).unwrap_or(false))
        {
            Some(existing) => new_named.push(existing.clone()),
            None => {
                let ident = Ident::new(name, proc_macro2::Span::call_site());
                let field: Field = syn::parse_quote! { pub #ident: #ty };
                new_named.push(field);
            }
        }
    }

    for f in old_named.into_iter() {
        let is_required = f
            .ident
            .as_ref()
            .map(|i| required.iter().any(|(n, _)| i == n))
            .unwrap_or(false);
        if !is_required {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}
