// パス: src/resolver/mod.rs
// 役割: 型名解決の窓口となるトレイトと実装モジュールをまとめる
// 意図: 評価器は `NameResolver` だけを知り、検索パスの有無や規則の違いを意識しない
// 関連ファイル: src/resolver/base.rs, src/resolver/layered.rs, src/context.rs
//! 名前解決。
//!
//! - `BaseResolver`: プリミティブ・配列・既定パッケージの固定規則。
//! - `LayeredResolver`: classpath で拡張したローダを先に試し、失敗したら `BaseResolver` に委ねる。
//! - 両者は継承ではなく委譲で組み合わせる。

pub mod base;
pub mod layered;
pub mod loader;
pub mod search_path;
pub mod types;

pub use base::BaseResolver;
pub use layered::LayeredResolver;
pub use search_path::SearchPath;
pub use types::{TypeDef, TypeRef};

use crate::errors::NameNotFound;

pub trait NameResolver {
    /// 型名を型へ解決する。見つからなければ `NameNotFound`。
    fn resolve_name(&self, name: &str) -> Result<TypeRef, NameNotFound>;
}
