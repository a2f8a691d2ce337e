// パス: src/resolver/layered.rs
// 役割: 検索パスで拡張したローダを基本リゾルバの前段に重ねる
// 意図: 拡張は置き換えではなく追加であり、失敗時は基本リゾルバの規則をそのまま適用する
// 関連ファイル: src/resolver/base.rs, src/resolver/loader.rs, src/resolver/search_path.rs

use std::rc::Rc;

use crate::errors::{NameNotFound, StartupError};
use crate::resolver::base::BaseResolver;
use crate::resolver::loader::{PathLoader, SystemLoader, TypeLoader};
use crate::resolver::search_path::SearchPath;
use crate::resolver::types::TypeRef;
use crate::resolver::NameResolver;

pub struct LayeredResolver {
    extended: Rc<dyn TypeLoader>,
    base: BaseResolver,
}

impl LayeredResolver {
    /// 検索パスのローダを既定ローダの前に置いて構築する。
    ///
    /// 基本リゾルバも拡張ローダを使うため、`Point[]` のように検索パス上の型を要素とする配列も
    /// 基本規則で解決できる。
    pub fn new(search_path: SearchPath) -> Self {
        let system: Rc<dyn TypeLoader> = Rc::new(SystemLoader);
        let extended: Rc<dyn TypeLoader> = Rc::new(PathLoader::new(search_path, system));
        Self {
            base: BaseResolver::with_loader(extended.clone()),
            extended,
        }
    }

    /// `classpath` 設定値から構築する。不正な要素は起動時エラー。
    pub fn from_classpath(classpath: &str) -> Result<Self, StartupError> {
        Ok(Self::new(SearchPath::parse(classpath)?))
    }
}

impl NameResolver for LayeredResolver {
    fn resolve_name(&self, name: &str) -> Result<TypeRef, NameNotFound> {
        match self.extended.load(name.trim()) {
            Ok(ty) => Ok(ty),
            Err(_) => {
                tracing::debug!(name, "not found on search path, applying base rules");
                self.base.resolve_name(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    /// 検索パス上の型と基本規則の両方で解決できる。
    fn extension_is_additive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Point.type"), "x=0\n").unwrap();
        let sp = SearchPath::parse_in(&dir.path().display().to_string(), dir.path()).unwrap();
        let r = LayeredResolver::new(sp);
        assert_eq!(r.resolve_name("Point").unwrap().name(), "Point");
        assert_eq!(r.resolve_name("Point[]").unwrap().name(), "Point[]");
        assert_eq!(r.resolve_name("int[]").unwrap().name(), "int[]");
        assert_eq!(r.resolve_name("Math").unwrap().name(), "lang.Math");
        assert_eq!(r.resolve_name("NoSuchType").unwrap_err().name, "NoSuchType");
    }
}
