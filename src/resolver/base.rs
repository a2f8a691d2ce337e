// パス: src/resolver/base.rs
// 役割: 固定規則（プリミティブ・配列・既定パッケージ）による名前解決を提供する
// 意図: 検索パスで見つからなかった名前にも、名前の書式に基づく解決の機会を残す
// 関連ファイル: src/resolver/layered.rs, src/resolver/loader.rs, src/resolver/types.rs

use std::rc::Rc;

use crate::errors::NameNotFound;
use crate::resolver::loader::{SystemLoader, TypeLoader};
use crate::resolver::types::{Primitive, TypeDef, TypeRef};
use crate::resolver::NameResolver;

/// パッケージを省略した名前に補う既定パッケージ（先頭から順に試す）。
pub const DEFAULT_PACKAGES: &[&str] = &["lang", "util"];

pub struct BaseResolver {
    loader: Rc<dyn TypeLoader>,
}

impl BaseResolver {
    pub fn new() -> Self {
        Self::with_loader(Rc::new(SystemLoader))
    }

    pub fn with_loader(loader: Rc<dyn TypeLoader>) -> Self {
        Self { loader }
    }
}

impl Default for BaseResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver for BaseResolver {
    fn resolve_name(&self, name: &str) -> Result<TypeRef, NameNotFound> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self
                .resolve_name(element)
                .map(TypeDef::array)
                .map_err(|_| NameNotFound::new(name));
        }
        if let Some(p) = Primitive::from_keyword(name) {
            return Ok(TypeDef::primitive(p));
        }
        if let Ok(ty) = self.loader.load(name) {
            return Ok(ty);
        }
        if !name.contains('.') {
            for package in DEFAULT_PACKAGES {
                if let Ok(ty) = self.loader.load(&format!("{package}.{name}")) {
                    return Ok(ty);
                }
            }
        }
        Err(NameNotFound::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::types::{Builtin, TypeKind};

    #[test]
    /// プリミティブ名はローダを介さずに解決される。
    fn primitives_resolve_by_keyword() {
        let r = BaseResolver::new();
        assert_eq!(r.resolve_name("int").unwrap().name(), "int");
        assert_eq!(r.resolve_name(" boolean ").unwrap().name(), "boolean");
    }

    #[test]
    /// 配列は要素型を再帰的に解決する。
    fn arrays_wrap_element_type() {
        let r = BaseResolver::new();
        let ty = r.resolve_name("String[][]").unwrap();
        assert_eq!(ty.name(), "lang.String[][]");
        match ty.kind() {
            TypeKind::Array(inner) => assert_eq!(inner.name(), "lang.String[]"),
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(r.resolve_name("Nope[]").unwrap_err().name, "Nope[]");
    }

    #[test]
    /// パッケージ省略名は lang → util の順に補われる。
    fn simple_names_use_default_packages() {
        let r = BaseResolver::new();
        assert!(matches!(
            r.resolve_name("Math").unwrap().kind(),
            TypeKind::Builtin(Builtin::Math)
        ));
        assert_eq!(r.resolve_name("HashMap").unwrap().name(), "util.HashMap");
        assert!(r.resolve_name("x.Math").is_err());
    }
}
