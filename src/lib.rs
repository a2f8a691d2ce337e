// パス: src/lib.rs
// 役割: クレートのルート。各モジュールを結線し、利用側向けの型を再公開する
// 意図: 実行ファイルと統合テストが同じ公開 API を通して評価ループを組み立てられるようにする
// 関連ファイル: src/repl/mod.rs, src/evaluator.rs, src/config/mod.rs, src/resolver/mod.rs
//! OGNL 風の式言語を 1 行ずつ評価する REPL のコア。
//!
//! 構成:
//! - `lexer` / `parser` / `ast`: 式の字句解析と構文解析
//! - `evaluator` / `builtins` / `value`: 評価器と組み込みの型・メソッド
//! - `context` / `root`: 変数を保持する評価コンテキストと起動時のルート
//! - `resolver`: 型名の解決（既定の解決器と classpath による拡張）
//! - `config`: 上書き・設定ファイル・同梱既定値の層構造
//! - `repl` / `cli`: 評価ループと実行ファイルの入口
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - 行単位の失敗は `EvaluationError`、起動を止める失敗は `StartupError` で表す。
#![allow(unexpected_cfgs)]
#![cfg_attr(coverage, feature(coverage_attribute))]

pub mod ast;
pub mod builtins;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod resolver;
pub mod root;
mod stack;
pub mod value;

pub use crate::config::{ConfigResolver, Overrides, Settings, Templates};
pub use crate::context::EvaluationContext;
pub use crate::errors::*;
pub use crate::evaluator::evaluate;
pub use crate::resolver::{BaseResolver, LayeredResolver, NameResolver};
pub use crate::root::RootInitializer;
pub use crate::value::Value;
