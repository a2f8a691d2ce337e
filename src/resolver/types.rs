// パス: src/resolver/types.rs
// 役割: 名前解決の結果として得られる型の表現を定義する
// 意図: プリミティブ・配列・組み込み型・検索パス上の定義型を一つの列挙で扱う
// 関連ファイル: src/resolver/loader.rs, src/resolver/base.rs, src/builtins.rs, src/value.rs
//! 解決済みの型。
//!
//! - `TypeRef` は `Rc` で共有され、同じ型を同一性で比較できる。
//! - 定義型（`.type` ファイル）はフィールドと static メンバを式の文字列として保持し、
//!   評価はインスタンス化・参照の時点まで遅らせる。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::config::properties::Properties;

pub type TypeRef = Rc<TypeDef>;

#[derive(Debug)]
pub struct TypeDef {
    name: String,
    kind: TypeKind,
}

#[derive(Debug)]
pub enum TypeKind {
    Primitive(Primitive),
    Array(TypeRef),
    Builtin(Builtin),
    Defined(DefinedType),
}

impl TypeDef {
    pub fn primitive(p: Primitive) -> TypeRef {
        Rc::new(Self {
            name: p.keyword().to_string(),
            kind: TypeKind::Primitive(p),
        })
    }

    pub fn array(element: TypeRef) -> TypeRef {
        Rc::new(Self {
            name: format!("{}[]", element.name()),
            kind: TypeKind::Array(element),
        })
    }

    pub fn builtin(b: Builtin) -> TypeRef {
        Rc::new(Self {
            name: b.qualified_name().to_string(),
            kind: TypeKind::Builtin(b),
        })
    }

    pub fn defined(name: impl Into<String>, def: DefinedType) -> TypeRef {
        Rc::new(Self {
            name: name.into(),
            kind: TypeKind::Defined(def),
        })
    }

    /// 完全修飾名（配列は `要素名[]`）。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// パッケージを除いた名前。
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn same_type(&self, other: &TypeDef) -> bool {
        self.name == other.name
    }
}

// Java の Class#toString に合わせ、プリミティブ以外は `class` を前置する。
impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Primitive(_) => write!(f, "{}", self.name),
            _ => write!(f, "class {}", self.name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Long,
    Short,
    Byte,
    Double,
    Float,
    Boolean,
    Char,
    Void,
}

const PRIMITIVES: &[Primitive] = &[
    Primitive::Int,
    Primitive::Long,
    Primitive::Short,
    Primitive::Byte,
    Primitive::Double,
    Primitive::Float,
    Primitive::Boolean,
    Primitive::Char,
    Primitive::Void,
];

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Byte => "byte",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Boolean => "boolean",
            Primitive::Char => "char",
            Primitive::Void => "void",
        }
    }

    pub fn from_keyword(name: &str) -> Option<Self> {
        PRIMITIVES.iter().copied().find(|p| p.keyword() == name)
    }
}

/// 既定ローダが提供する組み込みライブラリ型。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Object,
    String,
    Integer,
    Double,
    Boolean,
    Math,
    HashMap,
    ArrayList,
}

impl Builtin {
    pub fn qualified_name(self) -> &'static str {
        match self {
            Builtin::Object => "lang.Object",
            Builtin::String => "lang.String",
            Builtin::Integer => "lang.Integer",
            Builtin::Double => "lang.Double",
            Builtin::Boolean => "lang.Boolean",
            Builtin::Math => "lang.Math",
            Builtin::HashMap => "util.HashMap",
            Builtin::ArrayList => "util.ArrayList",
        }
    }

    /// 完全修飾名から組み込み型を引く。
    pub fn lookup(name: &str) -> Option<Self> {
        BUILTINS.get(name).copied()
    }
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    [
        Builtin::Object,
        Builtin::String,
        Builtin::Integer,
        Builtin::Double,
        Builtin::Boolean,
        Builtin::Math,
        Builtin::HashMap,
        Builtin::ArrayList,
    ]
    .into_iter()
    .map(|b| (b.qualified_name(), b))
    .collect()
});

/// `.type` ファイルから読み込んだ型の定義。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedType {
    origin: PathBuf,
    fields: Vec<(String, String)>,
    statics: Vec<(String, String)>,
}

const STATIC_PREFIX: &str = "static.";

impl DefinedType {
    /// properties 形式の内容を `field=式` と `static.NAME=式` に振り分ける。
    pub fn from_properties(origin: impl Into<PathBuf>, props: &Properties) -> Self {
        let mut fields = Vec::new();
        let mut statics = Vec::new();
        for (key, value) in props.iter() {
            match key.strip_prefix(STATIC_PREFIX) {
                Some(name) => statics.push((name.to_string(), value.to_string())),
                None => fields.push((key.to_string(), value.to_string())),
            }
        }
        Self {
            origin: origin.into(),
            fields,
            statics,
        }
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// 宣言順のフィールド名と既定値の式。
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn static_member(&self, name: &str) -> Option<&str> {
        self.statics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, src)| src.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// static. 接頭辞の有無でフィールドと static メンバに分かれる。
    fn defined_type_splits_fields_and_statics() {
        let props = Properties::parse("x=1\nstatic.ORIGIN=0\ny='a'\n");
        let def = DefinedType::from_properties("/tmp/Point.type", &props);
        assert_eq!(
            def.fields(),
            &[
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "'a'".to_string())
            ]
        );
        assert_eq!(def.static_member("ORIGIN"), Some("0"));
        assert_eq!(def.static_member("x"), None);
    }

    #[test]
    /// 表示はプリミティブとそれ以外で形が異なる。
    fn display_prefixes_class_except_primitives() {
        assert_eq!(TypeDef::primitive(Primitive::Int).to_string(), "int");
        assert_eq!(
            TypeDef::builtin(Builtin::String).to_string(),
            "class lang.String"
        );
        let arr = TypeDef::array(TypeDef::primitive(Primitive::Int));
        assert_eq!(arr.name(), "int[]");
    }
}
