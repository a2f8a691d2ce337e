// パス: src/value.rs
// 役割: 評価結果として扱う値と、その表示・等価性・真偽判定を定義する
// 意図: ルートやコンテキスト変数の中身を共有参照で保持し、式からの更新を反映させる
// 関連ファイル: src/evaluator.rs, src/builtins.rs, src/resolver/types.rs
//! 値の表現。
//!
//! - リスト・マップ・オブジェクトは `Rc<RefCell<..>>` で共有され、代入やメソッド呼び出しで
//!   中身が書き換わる。ルートを評価器が変更できるのはこのため。
//! - マップのキーは文字列で、キー順に並ぶ。
//! - 表示形式は `toString` の結果でもあり、出力テンプレートの `%s` に渡される。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::resolver::types::{Builtin, Primitive, TypeKind, TypeRef};

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type MapRef = Rc<RefCell<BTreeMap<String, Value>>>;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(ListRef),
    Map(MapRef),
    Object(Rc<Object>),
    Type(TypeRef),
}

/// 定義型のインスタンス。フィールドは宣言順に並ぶ。
#[derive(Debug)]
pub struct Object {
    ty: TypeRef,
    fields: RefCell<Vec<(String, Value)>>,
}

impl Object {
    pub fn new(ty: TypeRef, fields: Vec<(String, Value)>) -> Self {
        Self {
            ty,
            fields: RefCell::new(fields),
        }
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// 既存フィールドを書き換える。存在しなければ false。
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }
}

// 入れ子のコレクションの表示・比較を打ち切る深さ。
const MAX_DEPTH: usize = 32;

// 表示・比較の途中にある共有コンテナの識別子。
type ContainerId = *const ();

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `null` と `false` と数値の 0 が偽、それ以外は真。
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Double(d) => *d != 0.0,
            _ => true,
        }
    }

    /// エラーメッセージ用の型名。
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "boolean".into(),
            Value::Int(_) => "int".into(),
            Value::Double(_) => "double".into(),
            Value::String(_) => "String".into(),
            Value::List(_) => "List".into(),
            Value::Map(_) => "Map".into(),
            Value::Object(o) => o.ty.name().to_string(),
            Value::Type(_) => "Class".into(),
        }
    }

    /// マップのキーとして使う文字列。文字列はそのまま、それ以外は表示形式。
    pub fn to_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// `==` の意味での等価性。数値は int と double をまたいで比べ、オブジェクトは同一性で比べる。
    pub fn loosely_equals(&self, other: &Value) -> bool {
        loosely_equals_at(self, other, &mut Vec::new())
    }

    /// 型 `ty` のインスタンスかどうか。
    pub fn is_instance_of(&self, ty: &TypeRef) -> bool {
        match ty.kind() {
            TypeKind::Primitive(p) => match self {
                Value::Int(_) => matches!(
                    p,
                    Primitive::Int | Primitive::Long | Primitive::Short | Primitive::Byte
                ),
                Value::Double(_) => matches!(p, Primitive::Double | Primitive::Float),
                Value::Bool(_) => *p == Primitive::Boolean,
                Value::String(s) => *p == Primitive::Char && s.chars().count() == 1,
                _ => false,
            },
            TypeKind::Array(elem) => match self {
                Value::List(items) => items.borrow().iter().all(|v| v.is_instance_of(elem)),
                _ => false,
            },
            TypeKind::Builtin(b) => match (b, self) {
                (_, Value::Null) => false,
                (Builtin::Object, _) => true,
                (Builtin::String, Value::String(_))
                | (Builtin::Integer, Value::Int(_))
                | (Builtin::Double, Value::Double(_))
                | (Builtin::Boolean, Value::Bool(_))
                | (Builtin::HashMap, Value::Map(_))
                | (Builtin::ArrayList, Value::List(_)) => true,
                _ => false,
            },
            TypeKind::Defined(_) => match self {
                Value::Object(o) => o.ty.same_type(ty),
                _ => false,
            },
        }
    }

    fn container_id(&self) -> Option<ContainerId> {
        match self {
            Value::List(items) => Some(Rc::as_ptr(items) as ContainerId),
            Value::Map(entries) => Some(Rc::as_ptr(entries) as ContainerId),
            Value::Object(o) => Some(Rc::as_ptr(o) as ContainerId),
            _ => None,
        }
    }

    // 表示中の経路に同じコンテナが再び現れたら `...` で打ち切る。
    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, path: &mut Vec<ContainerId>) -> fmt::Result {
        let Some(id) = self.container_id() else {
            return self.fmt_contents(f, path);
        };
        if path.len() >= MAX_DEPTH || path.contains(&id) {
            return write!(f, "...");
        }
        path.push(id);
        let result = self.fmt_contents(f, path);
        path.pop();
        result
    }

    fn fmt_contents(&self, f: &mut fmt::Formatter<'_>, path: &mut Vec<ContainerId>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", format_double(*d)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    v.fmt_at(f, path)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=", k)?;
                    v.fmt_at(f, path)?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => {
                write!(f, "{}{{", o.ty.simple_name())?;
                for (i, (k, v)) in o.fields.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=", k)?;
                    v.fmt_at(f, path)?;
                }
                write!(f, "}}")
            }
            Value::Type(t) => write!(f, "{}", t),
        }
    }
}

/// 倍精度は常に小数部か指数部を伴って表示する（`2.0`, `1e20`）。
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".into()
    } else if d.is_infinite() {
        let s = if d > 0.0 { "Infinity" } else { "-Infinity" };
        s.into()
    } else {
        format!("{:?}", d)
    }
}

// 比較中の経路に同じ組が再び現れたら、その組は等しいとみなして打ち切る。
fn loosely_equals_at(a: &Value, b: &Value, path: &mut Vec<(ContainerId, ContainerId)>) -> bool {
    let pair = match (a.container_id(), b.container_id()) {
        (Some(x), Some(y)) => (x, y),
        _ => return loosely_equals_contents(a, b, path),
    };
    if pair.0 == pair.1 || path.contains(&pair) {
        return true;
    }
    if path.len() >= MAX_DEPTH {
        return false;
    }
    path.push(pair);
    let equal = loosely_equals_contents(a, b, path);
    path.pop();
    equal
}

fn loosely_equals_contents(
    a: &Value,
    b: &Value,
    path: &mut Vec<(ContainerId, ContainerId)>,
) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y.iter())
                    .all(|(vx, vy)| loosely_equals_at(vx, vy, path))
        }
        (Value::Map(x), Value::Map(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|((kx, vx), (ky, vy))| {
                    kx == ky && loosely_equals_at(vx, vy, path)
                })
        }
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Type(x), Value::Type(y)) => x.same_type(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, &mut Vec::new())
    }
}

// テストで値を直接比べるための厳密な等価性。int と double は区別する。
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(_), Value::Double(_)) | (Value::Double(_), Value::Int(_)) => false,
            _ => self.loosely_equals(other),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
