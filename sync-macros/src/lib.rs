//! 同步层过程宏（sync-macros）
//!
//! - `#[sync_entity]`：为门户内容实体生成 `SyncEntity` 实现与快照转换；
//! - `#[entity_id]`：为单字段 tuple struct 形式的标识类型生成常用 trait。
//!
use proc_macro::TokenStream;

mod derive_utils;
mod entity_id;
mod field_utils;
mod sync_entity;

/// 同步实体宏
/// - 若缺失则追加字段 `id: EntityId`，并置于字段最前
/// - 合并派生：Debug, Clone, Default, PartialEq, Serialize, Deserialize
/// - 实现 `::sync_domain::model::SyncEntity` 与 `From<T> for EntitySnapshot`
/// - 参数：`#[sync_entity(kind = Resource, visible = is_published)]`；
///   `kind` 必填，对应 `EntityType` 的变体；`visible` 可省略（视为恒可见）
#[proc_macro_attribute]
pub fn sync_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    sync_entity::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 实体 ID 宏
/// 用于 `struct EntityId(String);` 这类字符串包装类型，生成访问器、
/// Display、FromStr、`AsRef<str>` 与字符串转换，并合并比较与哈希相关派生。
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
