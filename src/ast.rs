//! 抽象構文木（AST）
//!
//! 目的:
//! - 構文解析結果を評価器へ渡す中立的な表現に落とし込む。
//!
//! 設計ノート:
//! - 裸の識別子は「現在の対象（`#this`）のプロパティ」であり、変数ではない。
//! - `a.b` は `Chain` として表し、右側を左側の値を対象に評価する。
//! - 型名は解決前の文字列のまま保持し、評価時に `NameResolver` へ渡す。

use std::fmt;

// 式ノード
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Null,
    BoolLit {
        value: bool,
    },
    IntLit {
        value: i64,
    },
    FloatLit {
        value: f64,
    },
    StringLit {
        value: String,
    },
    ListLit {
        items: Vec<Expr>,
    },
    MapLit {
        entries: Vec<(Expr, Expr)>,
    },
    Property {
        name: String,
    },
    Variable {
        name: String,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Chain {
        target: Box<Expr>,
        step: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    StaticField {
        type_name: String,
        member: String,
    },
    StaticCall {
        type_name: String,
        method: String,
        args: Vec<Expr>,
    },
    New {
        type_name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        type_name: String,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }
}

impl Expr {
    /// 代入の左辺として使える形かどうか。
    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Property { .. } | Expr::Variable { .. } | Expr::Index { .. } => true,
            Expr::Chain { step, .. } => matches!(**step, Expr::Property { .. }),
            _ => false,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    write!(f, "(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    write!(f, ")")
}

// 表示は常に完全に括弧付けした形で、構文木の形をそのまま確認できるようにする。
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => write!(f, "null"),
            Expr::BoolLit { value } => write!(f, "{}", value),
            Expr::IntLit { value } => write!(f, "{}", value),
            Expr::FloatLit { value } => write!(f, "{:?}", value),
            Expr::StringLit { value } => write!(f, "{:?}", value),
            Expr::ListLit { items } => {
                write!(f, "{{")?;
                for (i, it) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", it)?;
                }
                write!(f, "}}")
            }
            Expr::MapLit { entries } => {
                write!(f, "#{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expr::Property { name } => write!(f, "{}", name),
            Expr::Variable { name } => write!(f, "#{}", name),
            Expr::Call { name, args } => {
                write!(f, "{}", name)?;
                write_args(f, args)
            }
            Expr::Chain { target, step } => write!(f, "{}.{}", target, step),
            Expr::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expr::StaticField { type_name, member } => write!(f, "@{}@{}", type_name, member),
            Expr::StaticCall {
                type_name,
                method,
                args,
            } => {
                write!(f, "@{}@{}", type_name, method)?;
                write_args(f, args)
            }
            Expr::New { type_name, args } => {
                write!(f, "new {}", type_name)?;
                write_args(f, args)
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{})", operand),
                UnaryOp::Not => write!(f, "(!{})", operand),
            },
            Expr::BinOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", cond, then_branch, else_branch),
            Expr::InstanceOf { expr, type_name } => {
                write!(f, "({} instanceof {})", expr, type_name)
            }
            Expr::Assign { target, value } => write!(f, "({} = {})", target, value),
        }
    }
}
