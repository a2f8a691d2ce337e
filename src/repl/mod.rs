// パス: src/repl/mod.rs
// 役割: REPL モジュールのファサードと再公開
// 意図: 起動と評価ループの入口だけを公開し、端末処理の詳細は内部に閉じ込める
// 関連ファイル: src/repl/bootstrap.rs, src/repl/session.rs, src/cli.rs
//! 行単位の対話環境を構成するモジュール群をまとめたファサード。
//!
//! - `bootstrap`: 設定から評価ループを組み立てて起動する
//! - `session`: 評価ループ本体（対話入力とパイプ入力）
//! - `source`: 行入力の抽象とストリーム実装
//! - `line_editor`: 端末向けの行エディタ
//! - `printer`: テンプレートの展開

pub mod bootstrap;
mod line_editor;
pub mod printer;
pub mod session;
pub mod source;

pub use bootstrap::{run, run_with, start_session};
pub use line_editor::LineEditor;
pub use printer::format_template;
pub use session::EvaluationLoop;
pub use source::{LineSource, ReadResult, StreamSource};
