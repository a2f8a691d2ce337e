// パス: src/evaluator.rs
// 役割: 式を解析し、コンテキストとルートに対して評価する
// 意図: 評価ループからは `evaluate` だけが見え、解析・名前解決・実行時エラーを一つの型で受け取れるようにする
// 関連ファイル: src/parser/mod.rs, src/builtins.rs, src/context.rs, src/value.rs
//! 評価器（evaluator）
//!
//! 目的:
//! - 1 行の式を解析・評価し、値か `EvaluationError` を返す。
//!
//! 仕様要点:
//! - 裸の識別子は現在の対象（`#this`）のプロパティ。トップレベルの対象はルート。
//! - `a.b` は `a` の値を対象に `b` を評価する。呼び出しの引数はルートを対象に評価する。
//! - 整数演算は検査付きで、オーバーフローは EVAL060、ゼロ除算は EVAL061。
//! - `&&` / `||` は短絡評価し、最後に評価したオペランドの値を返す。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::{self as A, BinOp, UnaryOp};
use crate::builtins;
use crate::context::{EvaluationContext, RESERVED_NAMES};
use crate::errors::{EvalError, EvaluationError};
use crate::parser::parse_expr;
use crate::resolver::types::{DefinedType, TypeKind, TypeRef};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Object, Value};

// 定義型の既定値・static 式が互いを参照し続ける場合の打ち切り深さ。
const MAX_DEFINITION_DEPTH: usize = 64;

/// 式を解析して評価する。
pub fn evaluate(
    src: &str,
    ctx: &mut EvaluationContext,
    root: &Value,
) -> Result<Value, EvaluationError> {
    let expr = parse_expr(src)?;
    Ok(eval_expr(&expr, ctx, root)?)
}

/// 解析済みの式を評価する。対象（`#this`）はルートから始まる。
pub fn eval_expr(
    e: &A::Expr,
    ctx: &mut EvaluationContext,
    root: &Value,
) -> Result<Value, EvalError> {
    let mut ev = Evaluator {
        ctx,
        root,
        depth: 0,
    };
    ev.eval(e, root)
}

struct Evaluator<'a> {
    ctx: &'a mut EvaluationContext,
    root: &'a Value,
    depth: usize,
}

impl Evaluator<'_> {
    fn eval(&mut self, e: &A::Expr, this: &Value) -> Result<Value, EvalError> {
        ensure_sufficient_stack(|| self.eval_node(e, this))
    }

    fn eval_node(&mut self, e: &A::Expr, this: &Value) -> Result<Value, EvalError> {
        use A::Expr::*;
        match e {
            Null => Ok(Value::Null),
            BoolLit { value } => Ok(Value::Bool(*value)),
            IntLit { value } => Ok(Value::Int(*value)),
            FloatLit { value } => Ok(Value::Double(*value)),
            StringLit { value } => Ok(Value::String(value.clone())),
            ListLit { items } => {
                let mut vs = Vec::with_capacity(items.len());
                for it in items {
                    vs.push(self.eval(it, this)?);
                }
                Ok(Value::list(vs))
            }
            MapLit { entries } => {
                let mut m = BTreeMap::new();
                for (k, v) in entries {
                    let key = self.eval(k, this)?.to_key();
                    let value = self.eval(v, this)?;
                    m.insert(key, value);
                }
                Ok(Value::map(m))
            }
            Property { name } => get_property(this, name),
            Variable { name } => Ok(match name.as_str() {
                "this" => this.clone(),
                "root" => self.root.clone(),
                _ => self.ctx.get(name).cloned().unwrap_or(Value::Null),
            }),
            Call { name, args } => {
                let args = self.eval_args(args)?;
                self.call_method(this, name, args)
            }
            Chain { target, step } => {
                let subject = self.eval(target, this)?;
                self.eval(step, &subject)
            }
            Index { target, index } => {
                let subject = self.eval(target, this)?;
                let key = self.eval(index, this)?;
                get_index(&subject, &key)
            }
            StaticField { type_name, member } => self.static_field(type_name, member),
            StaticCall {
                type_name,
                method,
                args,
            } => {
                let ty = self.resolve(type_name)?;
                let args = self.eval_args(args)?;
                match ty.kind() {
                    TypeKind::Builtin(b) => builtins::call_static(*b, method, args),
                    _ => Err(EvalError::new(
                        "EVAL030",
                        format!("型 {} に static メソッド {} はありません", ty.name(), method),
                    )),
                }
            }
            New { type_name, args } => {
                let ty = self.resolve(type_name)?;
                let args = self.eval_args(args)?;
                self.instantiate(&ty, args)
            }
            Unary { op, operand } => {
                let v = self.eval(operand, this)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
                    UnaryOp::Neg => match v {
                        Value::Int(i) => i
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or_else(|| overflow("-")),
                        Value::Double(d) => Ok(Value::Double(-d)),
                        other => Err(EvalError::new(
                            "EVAL041",
                            format!("単項 - は {} に適用できません", other.type_name()),
                        )),
                    },
                }
            }
            BinOp { op, left, right } => {
                let l = self.eval(left, this)?;
                match op {
                    A::BinOp::And => {
                        if l.truthy() {
                            self.eval(right, this)
                        } else {
                            Ok(l)
                        }
                    }
                    A::BinOp::Or => {
                        if l.truthy() {
                            Ok(l)
                        } else {
                            self.eval(right, this)
                        }
                    }
                    _ => {
                        let r = self.eval(right, this)?;
                        binary(*op, &l, &r)
                    }
                }
            }
            Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, this)?.truthy() {
                    self.eval(then_branch, this)
                } else {
                    self.eval(else_branch, this)
                }
            }
            InstanceOf { expr, type_name } => {
                let v = self.eval(expr, this)?;
                let ty = self.resolve(type_name)?;
                Ok(Value::Bool(v.is_instance_of(&ty)))
            }
            Assign { target, value } => {
                let v = self.eval(value, this)?;
                self.assign(target, this, v.clone())?;
                Ok(v)
            }
        }
    }

    fn eval_args(&mut self, args: &[A::Expr]) -> Result<Vec<Value>, EvalError> {
        let root = self.root;
        args.iter().map(|a| self.eval(a, root)).collect()
    }

    fn resolve(&self, type_name: &str) -> Result<TypeRef, EvalError> {
        Ok(self.ctx.resolver().resolve_name(type_name)?)
    }

    fn call_method(
        &mut self,
        this: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        if this.is_null() {
            return Err(EvalError::new(
                "EVAL010",
                format!("null に対してメソッド {} を呼び出しました", name),
            ));
        }
        if name == "getClass" {
            if !args.is_empty() {
                return Err(EvalError::new(
                    "EVAL031",
                    format!("getClass は引数を取りませんが {} 個が渡されました", args.len()),
                ));
            }
            return self.class_of(this);
        }
        builtins::call_method(this, name, args)
    }

    fn class_of(&self, v: &Value) -> Result<Value, EvalError> {
        let ty = match v {
            Value::Object(o) => o.type_ref().clone(),
            other => match builtins::builtin_class_of(other) {
                Some(b) => self.resolve(b.qualified_name())?,
                None => return Err(no_such_method(other, "getClass")),
            },
        };
        Ok(Value::Type(ty))
    }

    fn static_field(&mut self, type_name: &str, member: &str) -> Result<Value, EvalError> {
        let ty = self.resolve(type_name)?;
        match ty.kind() {
            TypeKind::Builtin(b) => builtins::static_field(*b, member),
            TypeKind::Defined(def) => match def.static_member(member) {
                Some(src) => self.eval_definition(&ty, def, &format!("static.{member}"), src),
                None => Err(no_such_static(&ty, member)),
            },
            _ => Err(no_such_static(&ty, member)),
        }
    }

    fn instantiate(&mut self, ty: &TypeRef, args: Vec<Value>) -> Result<Value, EvalError> {
        match ty.kind() {
            TypeKind::Builtin(b) => builtins::instantiate(ty, *b, args),
            TypeKind::Defined(def) => {
                let declared = def.fields();
                if args.len() > declared.len() {
                    return Err(EvalError::new(
                        "EVAL031",
                        format!(
                            "型 {} のフィールドは {} 個ですが {} 個の引数が渡されました",
                            ty.name(),
                            declared.len(),
                            args.len()
                        ),
                    ));
                }
                let mut args = args.into_iter();
                let mut fields = Vec::with_capacity(declared.len());
                for (name, default_src) in declared {
                    let value = match args.next() {
                        Some(v) => v,
                        None => self.eval_definition(ty, def, name, default_src)?,
                    };
                    fields.push((name.clone(), value));
                }
                Ok(Value::Object(Rc::new(Object::new(ty.clone(), fields))))
            }
            TypeKind::Primitive(_) | TypeKind::Array(_) => Err(EvalError::new(
                "EVAL071",
                format!("型 {} はインスタンス化できません", ty.name()),
            )),
        }
    }

    // 型定義ファイルに書かれた式を、対象なし（null）で評価する。
    fn eval_definition(
        &mut self,
        ty: &TypeRef,
        def: &DefinedType,
        entry: &str,
        src: &str,
    ) -> Result<Value, EvalError> {
        if self.depth >= MAX_DEFINITION_DEPTH {
            return Err(EvalError::new(
                "EVAL073",
                format!("型 {} の定義の評価が深すぎます", ty.name()),
            ));
        }
        let expr = parse_expr(src).map_err(|e| {
            EvalError::new(
                "EVAL072",
                format!(
                    "型 {} の {} の式を解析できません（{}）: {}",
                    ty.name(),
                    entry,
                    def.origin().display(),
                    e.0.msg
                ),
            )
        })?;
        self.depth += 1;
        let result = self.eval(&expr, &Value::Null);
        self.depth -= 1;
        result
    }

    fn assign(&mut self, target: &A::Expr, this: &Value, v: Value) -> Result<(), EvalError> {
        use A::Expr::*;
        match target {
            Variable { name } => {
                if RESERVED_NAMES.contains(&name.as_str()) {
                    return Err(EvalError::new(
                        "EVAL022",
                        format!("#{} へは代入できません", name),
                    ));
                }
                self.ctx.set(name.clone(), v);
                Ok(())
            }
            Property { name } => set_property(this, name, v),
            Chain { target, step } => {
                let subject = self.eval(target, this)?;
                match step.as_ref() {
                    Property { name } => set_property(&subject, name, v),
                    other => Err(not_assignable(other)),
                }
            }
            Index { target, index } => {
                let subject = self.eval(target, this)?;
                let key = self.eval(index, this)?;
                set_index(&subject, &key, v)
            }
            other => Err(not_assignable(other)),
        }
    }
}

fn not_assignable(e: &A::Expr) -> EvalError {
    EvalError::new("EVAL023", format!("{} へは代入できません", e))
}

fn no_such_method(v: &Value, name: &str) -> EvalError {
    EvalError::new(
        "EVAL030",
        format!("{} にメソッド {} はありません", v.type_name(), name),
    )
}

fn no_such_static(ty: &TypeRef, member: &str) -> EvalError {
    EvalError::new(
        "EVAL070",
        format!("型 {} に static メンバ {} はありません", ty.name(), member),
    )
}

fn overflow(op: &str) -> EvalError {
    EvalError::new("EVAL060", format!("{} で整数がオーバーフローしました", op))
}

fn null_subject(name: &str) -> EvalError {
    EvalError::new(
        "EVAL010",
        format!("null に対してプロパティ {} を参照しました", name),
    )
}

fn no_such_property(v: &Value, name: &str) -> EvalError {
    EvalError::new(
        "EVAL020",
        format!("{} にプロパティ {} はありません", v.type_name(), name),
    )
}

fn get_property(this: &Value, name: &str) -> Result<Value, EvalError> {
    match this {
        Value::Null => Err(null_subject(name)),
        Value::Map(m) => {
            let m = m.borrow();
            if let Some(v) = m.get(name) {
                return Ok(v.clone());
            }
            Ok(match name {
                "size" => Value::Int(m.len() as i64),
                "isEmpty" => Value::Bool(m.is_empty()),
                _ => Value::Null,
            })
        }
        Value::Object(o) => o.get(name).ok_or_else(|| no_such_property(this, name)),
        Value::List(items) => match name {
            "size" => Ok(Value::Int(items.borrow().len() as i64)),
            "isEmpty" => Ok(Value::Bool(items.borrow().is_empty())),
            _ => Err(no_such_property(this, name)),
        },
        Value::String(s) => match name {
            "length" => Ok(Value::Int(s.chars().count() as i64)),
            "isEmpty" => Ok(Value::Bool(s.is_empty())),
            _ => Err(no_such_property(this, name)),
        },
        _ => Err(no_such_property(this, name)),
    }
}

fn set_property(this: &Value, name: &str, v: Value) -> Result<(), EvalError> {
    match this {
        Value::Null => Err(EvalError::new(
            "EVAL011",
            format!("null のプロパティ {} へは代入できません", name),
        )),
        Value::Map(m) => {
            m.borrow_mut().insert(name.to_string(), v);
            Ok(())
        }
        Value::Object(o) => {
            if o.set(name, v) {
                Ok(())
            } else {
                Err(no_such_property(this, name))
            }
        }
        other => Err(EvalError::new(
            "EVAL021",
            format!("{} のプロパティ {} へは代入できません", other.type_name(), name),
        )),
    }
}

fn index_out_of_range(i: i64, len: usize) -> EvalError {
    EvalError::new(
        "EVAL050",
        format!("添字 {} は範囲外です（長さ {}）", i, len),
    )
}

fn not_indexable(subject: &Value, key: &Value) -> EvalError {
    EvalError::new(
        "EVAL051",
        format!(
            "{} を {} で添字付けできません",
            subject.type_name(),
            key.type_name()
        ),
    )
}

fn get_index(subject: &Value, key: &Value) -> Result<Value, EvalError> {
    match (subject, key) {
        (Value::Null, _) => Err(null_subject(&format!("[{}]", key))),
        (Value::List(items), Value::Int(i)) => {
            let items = items.borrow();
            usize::try_from(*i)
                .ok()
                .and_then(|idx| items.get(idx).cloned())
                .ok_or_else(|| index_out_of_range(*i, items.len()))
        }
        (Value::String(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|idx| s.chars().nth(idx))
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| index_out_of_range(*i, s.chars().count())),
        (Value::Map(m), k) => {
            let key = k.to_key();
            Ok(m.borrow().get(&key).cloned().unwrap_or(Value::Null))
        }
        (Value::Object(_), Value::String(name)) => get_property(subject, name),
        _ => Err(not_indexable(subject, key)),
    }
}

fn set_index(subject: &Value, key: &Value, v: Value) -> Result<(), EvalError> {
    match (subject, key) {
        (Value::Null, _) => Err(EvalError::new(
            "EVAL011",
            format!("null の要素 [{}] へは代入できません", key),
        )),
        (Value::List(items), Value::Int(i)) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let slot = usize::try_from(*i)
                .ok()
                .and_then(|idx| items.get_mut(idx))
                .ok_or_else(|| index_out_of_range(*i, len))?;
            *slot = v;
            Ok(())
        }
        (Value::Map(m), k) => {
            let key = k.to_key();
            m.borrow_mut().insert(key, v);
            Ok(())
        }
        (Value::Object(_), Value::String(name)) => set_property(subject, name, v),
        _ => Err(not_indexable(subject, key)),
    }
}

fn binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(l.loosely_equals(r))),
        BinOp::Ne => Ok(Value::Bool(!l.loosely_equals(r))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = compare(op, l, r)?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ord == Ordering::Less,
                BinOp::Le => ord != Ordering::Greater,
                BinOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => arith(op, l, r),
        // 短絡演算は評価器側で処理済み
        BinOp::And | BinOp::Or => Ok(r.clone()),
    }
}

fn compare(op: BinOp, l: &Value, r: &Value) -> Result<Ordering, EvalError> {
    match (l, r) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| {
                EvalError::new("EVAL042", format!("NaN は {} で比較できません", op.symbol()))
            }),
            _ => Err(EvalError::new(
                "EVAL040",
                format!(
                    "{} と {} は {} で比較できません",
                    l.type_name(),
                    r.type_name(),
                    op.symbol()
                ),
            )),
        },
    }
}

fn arith(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    if op == BinOp::Add && (matches!(l, Value::String(_)) || matches!(r, Value::String(_))) {
        return Ok(Value::String(format!("{}{}", l, r)));
    }
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            if matches!(op, BinOp::Div | BinOp::Rem) && b == 0 {
                return Err(EvalError::new("EVAL061", "0 で除算しました"));
            }
            let result = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                BinOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(|| overflow(op.symbol()))
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                _ => a % b,
            })),
            _ => Err(EvalError::new(
                "EVAL041",
                format!(
                    "演算子 {} は {} と {} に適用できません",
                    op.symbol(),
                    l.type_name(),
                    r.type_name()
                ),
            )),
        },
    }
}
