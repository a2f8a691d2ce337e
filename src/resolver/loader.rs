// パス: src/resolver/loader.rs
// 役割: 型名から型を読み込むローダ（既定ローダと検索パスローダ）を提供する
// 意図: 検索パスローダを既定ローダの前段に重ね、拡張の場所を先に調べる
// 関連ファイル: src/resolver/search_path.rs, src/resolver/types.rs, src/resolver/layered.rs
//! 型ローダ。
//!
//! - `SystemLoader` は組み込みライブラリ型だけを完全修飾名で返す。
//! - `PathLoader` は検索パス上の `a/b/C.type` を読み、見つからなければ親ローダへ委譲する。
//!   読み込んだ型は内部のキャッシュに保持し、同じ名前には同じ `TypeRef` を返す。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::properties::Properties;
use crate::errors::NameNotFound;
use crate::resolver::search_path::SearchPath;
use crate::resolver::types::{Builtin, DefinedType, TypeDef, TypeRef};

pub trait TypeLoader {
    /// 完全修飾名で型を読み込む。名前の加工（配列・既定パッケージ）は行わない。
    fn load(&self, name: &str) -> Result<TypeRef, NameNotFound>;
}

/// プロセス既定のローダ。組み込みライブラリ型を提供する。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl TypeLoader for SystemLoader {
    fn load(&self, name: &str) -> Result<TypeRef, NameNotFound> {
        Builtin::lookup(name)
            .map(TypeDef::builtin)
            .ok_or_else(|| NameNotFound::new(name))
    }
}

pub struct PathLoader {
    search_path: SearchPath,
    parent: Rc<dyn TypeLoader>,
    cache: RefCell<HashMap<String, TypeRef>>,
}

impl PathLoader {
    pub fn new(search_path: SearchPath, parent: Rc<dyn TypeLoader>) -> Self {
        Self {
            search_path,
            parent,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    // `a.b.C` → `a/b/C.type`。識別子として不正な区切りを含む名前は対象外。
    fn relative_file(name: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = name.split('.').collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        });
        if !valid {
            return None;
        }
        let mut path: PathBuf = segments.iter().collect();
        path.set_extension("type");
        Some(path)
    }

    fn find_in_search_path(&self, name: &str) -> Option<TypeRef> {
        let relative = Self::relative_file(name)?;
        for location in self.search_path.locations() {
            let candidate = location.dir().join(&relative);
            if !candidate.is_file() {
                continue;
            }
            match fs::read_to_string(&candidate) {
                Ok(text) => {
                    let def = DefinedType::from_properties(&candidate, &Properties::parse(&text));
                    tracing::debug!(name, path = %candidate.display(), "loaded type definition");
                    return Some(TypeDef::defined(name, def));
                }
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "type definition unreadable, skipped");
                }
            }
        }
        None
    }
}

impl TypeLoader for PathLoader {
    fn load(&self, name: &str) -> Result<TypeRef, NameNotFound> {
        if let Some(ty) = self.cache.borrow().get(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.find_in_search_path(name) {
            self.cache
                .borrow_mut()
                .insert(name.to_string(), ty.clone());
            return Ok(ty);
        }
        self.parent.load(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::types::TypeKind;

    fn loader_for(dir: &std::path::Path) -> PathLoader {
        let sp = SearchPath::parse_in(&dir.display().to_string(), dir).unwrap();
        PathLoader::new(sp, Rc::new(SystemLoader))
    }

    #[test]
    /// パッケージ名はディレクトリ階層に対応する。
    fn loads_packaged_type_from_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("geo")).unwrap();
        fs::write(dir.path().join("geo/Point.type"), "x=0\ny=0\n").unwrap();
        let loader = loader_for(dir.path());
        let ty = loader.load("geo.Point").unwrap();
        assert_eq!(ty.name(), "geo.Point");
        assert!(matches!(ty.kind(), TypeKind::Defined(_)));
    }

    #[test]
    /// 同じ名前は同じ型オブジェクトを返す。
    fn repeated_loads_hit_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Foo.type"), "a=1\n").unwrap();
        let loader = loader_for(dir.path());
        let a = loader.load("Foo").unwrap();
        let b = loader.load("Foo").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    /// 検索パスに無い名前は親ローダへ委譲される。
    fn unknown_names_fall_through_to_parent() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());
        assert_eq!(loader.load("lang.String").unwrap().name(), "lang.String");
        assert_eq!(loader.load("Nope").unwrap_err().name, "Nope");
    }

    #[test]
    /// 親ディレクトリへ抜ける名前はファイルとして探さない。
    fn invalid_segments_are_not_files() {
        assert!(PathLoader::relative_file("..Foo").is_none());
        assert!(PathLoader::relative_file("a/b").is_none());
        assert_eq!(
            PathLoader::relative_file("a.B"),
            Some(PathBuf::from("a/B.type"))
        );
    }
}
