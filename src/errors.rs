// パス: src/errors.rs
// 役割: 字句解析・構文解析・評価・起動処理で共有するエラー型を定義する
// 意図: 行単位で回復できる失敗と、起動を中断する致命的な失敗を型で区別する
// 関連ファイル: src/evaluator.rs, src/config/mod.rs, src/resolver/mod.rs, src/repl/bootstrap.rs
//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ @col / @pos）。
//!
//! - 式の処理で起きる失敗は `ErrorInfo` を包んだ newtype で表し、`EvaluationError` にまとめる。
//! - 設定・型解決・起動処理の失敗は `thiserror` で列挙体として定義する。

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
    pub pos: Option<usize>,      // バイトオフセット（任意）
    pub col: Option<usize>,      // 1-origin（任意）
    pub snippet: Option<String>, // 入力行のスニペット（任意）
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            col: None,
            snippet: None,
        }
    }
    pub fn at(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        col: Option<usize>,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            col,
            snippet: None,
        }
    }
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // 1行目: ヘッダ
        match (self.col, self.pos) {
            (Some(c), Some(p)) => write!(f, "[{}] {} @col={} @pos={}", self.code, self.msg, c, p)?,
            (Some(c), None) => write!(f, "[{}] {} @col={}", self.code, self.msg, c)?,
            (None, Some(p)) => write!(f, "[{}] {} @pos={}", self.code, self.msg, p)?,
            (None, None) => write!(f, "[{}] {}", self.code, self.msg)?,
        }
        // 2行目以降: スニペット
        if let (Some(s), Some(c)) = (&self.snippet, self.col) {
            let caret = if c > 1 {
                " ".repeat(c - 1) + "^"
            } else {
                "^".to_string()
            };
            write!(f, "\n{}\n{}", s, caret)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError(pub ErrorInfo);
impl LexerError {
    pub fn at_with_snippet(
        code: &'static str,
        msg: impl Into<String>,
        pos: usize,
        col: usize,
        snippet: impl Into<String>,
    ) -> Self {
        Self(ErrorInfo::at(code, msg, Some(pos), Some(col)).with_snippet(snippet))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub ErrorInfo);
impl ParseError {
    pub fn at(code: &'static str, msg: impl Into<String>, pos: usize, col: usize) -> Self {
        Self(ErrorInfo::at(code, msg, Some(pos), Some(col)))
    }
    pub fn with_snippet(self, snippet: impl Into<String>) -> Self {
        Self(self.0.with_snippet(snippet))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError(pub ErrorInfo);
impl EvalError {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg, None))
    }
    pub fn code(&self) -> &'static str {
        self.0.code
    }
}

impl Display for LexerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for LexerError {}

// 字句エラーは構文エラーとして利用者へ届ける（コードは LEX のまま残す）。
impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError(e.0)
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for ParseError {}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for EvalError {}

/// 1 行の式を処理する間に起きた失敗。セッションは継続する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl EvaluationError {
    /// どの段階の失敗でも共通の `ErrorInfo` を参照できるようにする。
    pub fn info(&self) -> &ErrorInfo {
        match self {
            EvaluationError::Parse(e) => &e.0,
            EvaluationError::Eval(e) => &e.0,
        }
    }
}

/// 型名を解決できなかったことを表す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("型 {name} を解決できません")]
pub struct NameNotFound {
    pub name: String,
}

impl NameNotFound {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<NameNotFound> for EvalError {
    fn from(e: NameNotFound) -> Self {
        EvalError::new("NAME001", e.to_string())
    }
}

/// 設定リソースの読み込み失敗。ログへ記録し、その層は存在しないものとして扱う。
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("設定リソース {} を読み込めません: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 評価ループ開始前に起きる致命的な失敗。
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("classpath の要素 {entry:?} は不正です: {reason}")]
    MalformedSearchPath { entry: String, reason: String },
    #[error("ルート式 {expression:?} の評価に失敗しました: {source}")]
    RootExpression {
        expression: String,
        #[source]
        source: EvaluationError,
    },
}

/// 実行ファイルが終了コード 1 で報告するエラー。
#[derive(Debug, Error)]
pub enum ReplError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("入出力エラー: {0}")]
    Io(#[from] io::Error),
}
