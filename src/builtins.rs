// パス: src/builtins.rs
// 役割: 組み込みライブラリ型の static メンバ・インスタンス生成と、値に対するメソッドを実装する
// 意図: 評価器本体から型ごとのメソッド表を切り離し、評価器は AST の走査に専念させる
// 関連ファイル: src/evaluator.rs, src/value.rs, src/resolver/types.rs
//! 組み込みの振る舞い。
//!
//! - メソッド名と引数の数で分岐し、未知の名前は EVAL030、引数の数や型の誤りは EVAL031。
//! - 添字の範囲外は EVAL050、数値への変換失敗は EVAL032。
//! - `getClass` は名前解決が必要なため評価器側で扱う。

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::errors::EvalError;
use crate::resolver::types::{Builtin, TypeRef};
use crate::value::{ListRef, MapRef, Object, Value};

fn no_such_method(this: &Value, name: &str) -> EvalError {
    EvalError::new(
        "EVAL030",
        format!("{} にメソッド {} はありません", this.type_name(), name),
    )
}

fn arity_error(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::new(
        "EVAL031",
        format!(
            "{} は {} 個の引数を取りますが {} 個が渡されました",
            name, expected, got
        ),
    )
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(name, expected, args.len()))
    }
}

fn take2(name: &str, args: Vec<Value>) -> Result<(Value, Value), EvalError> {
    let [a, b]: [Value; 2] = args
        .try_into()
        .map_err(|rest: Vec<Value>| arity_error(name, 2, rest.len()))?;
    Ok((a, b))
}

fn bad_argument(name: &str, expected: &str, got: &Value) -> EvalError {
    EvalError::new(
        "EVAL031",
        format!(
            "{} の引数には {} が必要ですが {} が渡されました",
            name,
            expected,
            got.type_name()
        ),
    )
}

fn int_arg(name: &str, v: &Value) -> Result<i64, EvalError> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(bad_argument(name, "int", other)),
    }
}

fn num_arg(name: &str, v: &Value) -> Result<f64, EvalError> {
    v.as_f64().ok_or_else(|| bad_argument(name, "数値", v))
}

fn str_arg<'a>(name: &str, v: &'a Value) -> Result<&'a str, EvalError> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(bad_argument(name, "String", other)),
    }
}

fn out_of_range(index: i64, len: usize) -> EvalError {
    EvalError::new(
        "EVAL050",
        format!("添字 {} は範囲外です（長さ {}）", index, len),
    )
}

// 0 <= index < len（`inclusive` なら index == len も許す）
fn checked_index(index: i64, len: usize, inclusive: bool) -> Result<usize, EvalError> {
    let limit = if inclusive { len + 1 } else { len };
    usize::try_from(index)
        .ok()
        .filter(|&i| i < limit)
        .ok_or_else(|| out_of_range(index, len))
}

fn overflow(op: &str) -> EvalError {
    EvalError::new("EVAL060", format!("{} で整数がオーバーフローしました", op))
}

fn parse_int(s: &str) -> Result<i64, EvalError> {
    s.parse::<i64>().map_err(|_| {
        EvalError::new("EVAL032", format!("{:?} は整数として解釈できません", s))
    })
}

fn parse_double(s: &str) -> Result<f64, EvalError> {
    s.trim().parse::<f64>().map_err(|_| {
        EvalError::new("EVAL032", format!("{:?} は数値として解釈できません", s))
    })
}

/// `@T@NAME` の組み込み定数。
pub fn static_field(b: Builtin, member: &str) -> Result<Value, EvalError> {
    let v = match (b, member) {
        (Builtin::Math, "PI") => Value::Double(std::f64::consts::PI),
        (Builtin::Math, "E") => Value::Double(std::f64::consts::E),
        (Builtin::Integer, "MAX_VALUE") => Value::Int(i64::MAX),
        (Builtin::Integer, "MIN_VALUE") => Value::Int(i64::MIN),
        (Builtin::Double, "MAX_VALUE") => Value::Double(f64::MAX),
        (Builtin::Double, "POSITIVE_INFINITY") => Value::Double(f64::INFINITY),
        (Builtin::Double, "NEGATIVE_INFINITY") => Value::Double(f64::NEG_INFINITY),
        (Builtin::Double, "NaN") => Value::Double(f64::NAN),
        (Builtin::Boolean, "TRUE") => Value::Bool(true),
        (Builtin::Boolean, "FALSE") => Value::Bool(false),
        _ => {
            return Err(EvalError::new(
                "EVAL070",
                format!(
                    "型 {} に static メンバ {} はありません",
                    b.qualified_name(),
                    member
                ),
            ))
        }
    };
    Ok(v)
}

/// `@T@m(args)` の組み込み static メソッド。
pub fn call_static(b: Builtin, method: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    match (b, method) {
        (Builtin::Math, "abs") => {
            arity(method, &args, 1)?;
            match &args[0] {
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs")),
                other => Ok(Value::Double(num_arg(method, other)?.abs())),
            }
        }
        (Builtin::Math, "max" | "min") => {
            arity(method, &args, 2)?;
            let pick_max = method == "max";
            match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => {
                    Ok(Value::Int(if pick_max { *a.max(b) } else { *a.min(b) }))
                }
                (a, b) => {
                    let (a, b) = (num_arg(method, a)?, num_arg(method, b)?);
                    Ok(Value::Double(if pick_max { a.max(b) } else { a.min(b) }))
                }
            }
        }
        (Builtin::Math, "pow") => {
            arity(method, &args, 2)?;
            Ok(Value::Double(
                num_arg(method, &args[0])?.powf(num_arg(method, &args[1])?),
            ))
        }
        (Builtin::Math, "sqrt" | "floor" | "ceil") => {
            arity(method, &args, 1)?;
            let x = num_arg(method, &args[0])?;
            Ok(Value::Double(match method {
                "sqrt" => x.sqrt(),
                "floor" => x.floor(),
                _ => x.ceil(),
            }))
        }
        (Builtin::Math, "round") => {
            arity(method, &args, 1)?;
            let r = num_arg(method, &args[0])?.round();
            if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
                Ok(Value::Int(r as i64))
            } else {
                Err(overflow("round"))
            }
        }
        (Builtin::Integer, "parseInt") => {
            arity(method, &args, 1)?;
            Ok(Value::Int(parse_int(str_arg(method, &args[0])?)?))
        }
        (Builtin::Integer, "valueOf") => {
            arity(method, &args, 1)?;
            to_int(method, &args[0]).map(Value::Int)
        }
        (Builtin::Double, "parseDouble") => {
            arity(method, &args, 1)?;
            Ok(Value::Double(parse_double(str_arg(method, &args[0])?)?))
        }
        (Builtin::Double, "valueOf") => {
            arity(method, &args, 1)?;
            to_double(method, &args[0]).map(Value::Double)
        }
        (Builtin::Boolean, "parseBoolean" | "valueOf") => {
            arity(method, &args, 1)?;
            Ok(Value::Bool(to_bool(&args[0])))
        }
        (Builtin::Integer | Builtin::String, "toString" | "valueOf") => {
            arity(method, &args, 1)?;
            Ok(Value::String(args[0].to_string()))
        }
        _ => Err(EvalError::new(
            "EVAL030",
            format!(
                "型 {} に static メソッド {} はありません",
                b.qualified_name(),
                method
            ),
        )),
    }
}

fn to_int(name: &str, v: &Value) -> Result<i64, EvalError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::String(s) => parse_int(s),
        other => Err(bad_argument(name, "int または String", other)),
    }
}

fn to_double(name: &str, v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::String(s) => parse_double(s),
        other => num_arg(name, other),
    }
}

fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// `new T(args)` の組み込み型。`ty` は生成するオブジェクトの型として使う。
pub fn instantiate(ty: &TypeRef, b: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let name = b.qualified_name();
    match b {
        Builtin::HashMap => match args.as_slice() {
            [] => Ok(Value::map(BTreeMap::new())),
            [Value::Map(m)] => Ok(Value::map(m.borrow().clone())),
            [other] => Err(bad_argument(name, "Map", other)),
            _ => arity(name, &args, 1).map(|_| Value::Null),
        },
        Builtin::ArrayList => match args.as_slice() {
            [] | [Value::Int(_)] => Ok(Value::list(Vec::new())),
            [Value::List(items)] => Ok(Value::list(items.borrow().clone())),
            [other] => Err(bad_argument(name, "List または int", other)),
            _ => arity(name, &args, 1).map(|_| Value::Null),
        },
        Builtin::String => match args.as_slice() {
            [] => Ok(Value::string("")),
            [Value::String(s)] => Ok(Value::string(s.clone())),
            [other] => Err(bad_argument(name, "String", other)),
            _ => arity(name, &args, 1).map(|_| Value::Null),
        },
        Builtin::Integer => {
            arity(name, &args, 1)?;
            to_int(name, &args[0]).map(Value::Int)
        }
        Builtin::Double => {
            arity(name, &args, 1)?;
            to_double(name, &args[0]).map(Value::Double)
        }
        Builtin::Boolean => {
            arity(name, &args, 1)?;
            Ok(Value::Bool(to_bool(&args[0])))
        }
        Builtin::Object => {
            arity(name, &args, 0)?;
            Ok(Value::Object(Rc::new(Object::new(ty.clone(), Vec::new()))))
        }
        Builtin::Math => Err(EvalError::new(
            "EVAL071",
            format!("型 {} はインスタンス化できません", name),
        )),
    }
}

/// `getClass` が返す組み込み型の名前。オブジェクトと型そのものは対象外。
pub fn builtin_class_of(v: &Value) -> Option<Builtin> {
    Some(match v {
        Value::Bool(_) => Builtin::Boolean,
        Value::Int(_) => Builtin::Integer,
        Value::Double(_) => Builtin::Double,
        Value::String(_) => Builtin::String,
        Value::List(_) => Builtin::ArrayList,
        Value::Map(_) => Builtin::HashMap,
        Value::Null | Value::Object(_) | Value::Type(_) => return None,
    })
}

/// null 以外の値に対するメソッド呼び出し。
pub fn call_method(this: &Value, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    match name {
        "toString" => {
            arity(name, &args, 0)?;
            return Ok(Value::String(this.to_string()));
        }
        "equals" => {
            arity(name, &args, 1)?;
            return Ok(Value::Bool(*this == args[0]));
        }
        _ => {}
    }
    match this {
        Value::String(s) => string_method(this, s, name, args),
        Value::List(items) => list_method(this, items, name, args),
        Value::Map(entries) => map_method(this, entries, name, args),
        Value::Int(_) | Value::Double(_) => number_method(this, name, args),
        Value::Type(t) => match name {
            "getName" => {
                arity(name, &args, 0)?;
                Ok(Value::string(t.name()))
            }
            "getSimpleName" => {
                arity(name, &args, 0)?;
                Ok(Value::string(t.simple_name()))
            }
            _ => Err(no_such_method(this, name)),
        },
        _ => Err(no_such_method(this, name)),
    }
}

fn number_method(this: &Value, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    arity(name, &args, 0)?;
    match (name, this) {
        ("intValue", Value::Int(i)) => Ok(Value::Int(*i)),
        ("intValue", Value::Double(d)) => Ok(Value::Int(*d as i64)),
        ("doubleValue", v) => Ok(Value::Double(v.as_f64().unwrap_or_default())),
        _ => Err(no_such_method(this, name)),
    }
}

fn string_method(this: &Value, s: &str, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    let chars: Vec<char> = s.chars().collect();
    let v = match name {
        "length" => {
            arity(name, &args, 0)?;
            Value::Int(chars.len() as i64)
        }
        "isEmpty" => {
            arity(name, &args, 0)?;
            Value::Bool(s.is_empty())
        }
        "toUpperCase" => {
            arity(name, &args, 0)?;
            Value::string(s.to_uppercase())
        }
        "toLowerCase" => {
            arity(name, &args, 0)?;
            Value::string(s.to_lowercase())
        }
        "trim" => {
            arity(name, &args, 0)?;
            Value::string(s.trim())
        }
        "substring" => {
            let (begin, end) = match args.as_slice() {
                [b] => (int_arg(name, b)?, chars.len() as i64),
                [b, e] => (int_arg(name, b)?, int_arg(name, e)?),
                _ => return arity(name, &args, 1).map(|_| Value::Null),
            };
            let begin_idx = checked_index(begin, chars.len(), true)?;
            let end_idx = checked_index(end, chars.len(), true)?;
            if begin_idx > end_idx {
                return Err(EvalError::new(
                    "EVAL050",
                    format!("開始位置 {} が終了位置 {} より後ろです", begin, end),
                ));
            }
            Value::string(chars[begin_idx..end_idx].iter().collect::<String>())
        }
        "startsWith" | "endsWith" | "contains" => {
            arity(name, &args, 1)?;
            let needle = str_arg(name, &args[0])?;
            Value::Bool(match name {
                "startsWith" => s.starts_with(needle),
                "endsWith" => s.ends_with(needle),
                _ => s.contains(needle),
            })
        }
        "indexOf" => {
            arity(name, &args, 1)?;
            let needle = str_arg(name, &args[0])?;
            Value::Int(
                s.find(needle)
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1),
            )
        }
        "charAt" => {
            arity(name, &args, 1)?;
            let i = checked_index(int_arg(name, &args[0])?, chars.len(), false)?;
            Value::string(chars[i].to_string())
        }
        "concat" => {
            arity(name, &args, 1)?;
            Value::string(format!("{}{}", s, str_arg(name, &args[0])?))
        }
        "replace" => {
            arity(name, &args, 2)?;
            let from = str_arg(name, &args[0])?;
            let to = str_arg(name, &args[1])?;
            Value::string(s.replace(from, to))
        }
        "split" => {
            arity(name, &args, 1)?;
            let sep = str_arg(name, &args[0])?;
            let mut parts: Vec<Value> = if sep.is_empty() {
                chars.iter().map(|c| Value::string(c.to_string())).collect()
            } else {
                s.split(sep).map(Value::string).collect()
            };
            // 末尾の空要素は落とす
            while matches!(parts.last(), Some(Value::String(p)) if p.is_empty()) {
                parts.pop();
            }
            Value::list(parts)
        }
        _ => return Err(no_such_method(this, name)),
    };
    Ok(v)
}

fn list_method(
    this: &Value,
    items: &ListRef,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    let v = match name {
        "size" => {
            arity(name, &args, 0)?;
            Value::Int(items.borrow().len() as i64)
        }
        "isEmpty" => {
            arity(name, &args, 0)?;
            Value::Bool(items.borrow().is_empty())
        }
        "get" => {
            arity(name, &args, 1)?;
            let list = items.borrow();
            let i = checked_index(int_arg(name, &args[0])?, list.len(), false)?;
            list[i].clone()
        }
        "set" => {
            let (index, value) = take2(name, args)?;
            let mut list = items.borrow_mut();
            let i = checked_index(int_arg(name, &index)?, list.len(), false)?;
            std::mem::replace(&mut list[i], value)
        }
        "add" => match args.len() {
            1 => {
                items.borrow_mut().extend(args);
                Value::Bool(true)
            }
            2 => {
                let (index, value) = take2(name, args)?;
                let mut list = items.borrow_mut();
                let i = checked_index(int_arg(name, &index)?, list.len(), true)?;
                list.insert(i, value);
                Value::Null
            }
            _ => return arity(name, &args, 1).map(|_| Value::Null),
        },
        "contains" => {
            arity(name, &args, 1)?;
            Value::Bool(items.borrow().iter().any(|v| v.loosely_equals(&args[0])))
        }
        "indexOf" => {
            arity(name, &args, 1)?;
            Value::Int(
                items
                    .borrow()
                    .iter()
                    .position(|v| v.loosely_equals(&args[0]))
                    .map(|i| i as i64)
                    .unwrap_or(-1),
            )
        }
        "remove" => {
            arity(name, &args, 1)?;
            match &args[0] {
                // 整数は位置として扱う
                Value::Int(index) => {
                    let mut list = items.borrow_mut();
                    let i = checked_index(*index, list.len(), false)?;
                    list.remove(i)
                }
                other => {
                    let found = items.borrow().iter().position(|v| v.loosely_equals(other));
                    match found {
                        Some(i) => {
                            items.borrow_mut().remove(i);
                            Value::Bool(true)
                        }
                        None => Value::Bool(false),
                    }
                }
            }
        }
        "clear" => {
            arity(name, &args, 0)?;
            items.borrow_mut().clear();
            Value::Null
        }
        _ => return Err(no_such_method(this, name)),
    };
    Ok(v)
}

fn map_method(
    this: &Value,
    entries: &MapRef,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    let v = match name {
        "size" => {
            arity(name, &args, 0)?;
            Value::Int(entries.borrow().len() as i64)
        }
        "isEmpty" => {
            arity(name, &args, 0)?;
            Value::Bool(entries.borrow().is_empty())
        }
        "get" => {
            arity(name, &args, 1)?;
            let key = args[0].to_key();
            entries.borrow().get(&key).cloned().unwrap_or(Value::Null)
        }
        "put" => {
            let (key, value) = take2(name, args)?;
            // キーの表示がこのマップ自身を借用する場合があるので先に文字列化する
            let key = key.to_key();
            entries.borrow_mut().insert(key, value).unwrap_or(Value::Null)
        }
        "containsKey" => {
            arity(name, &args, 1)?;
            let key = args[0].to_key();
            Value::Bool(entries.borrow().contains_key(&key))
        }
        "remove" => {
            arity(name, &args, 1)?;
            let key = args[0].to_key();
            entries.borrow_mut().remove(&key).unwrap_or(Value::Null)
        }
        "keySet" => {
            arity(name, &args, 0)?;
            Value::list(entries.borrow().keys().map(Value::string).collect())
        }
        "values" => {
            arity(name, &args, 0)?;
            Value::list(entries.borrow().values().cloned().collect())
        }
        "clear" => {
            arity(name, &args, 0)?;
            entries.borrow_mut().clear();
            Value::Null
        }
        _ => return Err(no_such_method(this, name)),
    };
    Ok(v)
}
