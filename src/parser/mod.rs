// パス: src/parser/mod.rs
// 役割: トークン列から AST を生成する再帰下降パーサのエントリポイント
// 意図: 字句解析結果を評価器に渡すためのモジュール構成を整理する
// 関連ファイル: src/parser/expr.rs, src/lexer.rs, src/ast.rs
//! 構文解析モジュール
//!
//! - 1 行の式を解析する。複数の式や文は扱わない。
//! - 二項演算子の優先順位は `INFIX_LEVELS` の表で管理し、低い順に並べる。
//! - 代入・三項演算子・単項演算子・後置のナビゲーションは表の外でハンドコードする。
//! - 入れ子の深さは `MAX_NESTING` までに制限し、超えた行は PAR040 で拒否する。

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::errors::ParseError;
use crate::lexer::{lex, Token, TokenKind};

mod expr;

pub struct Parser {
    ts: Vec<Token>,
    i: usize,
    depth: usize,
}

/// 括弧・単項演算子・演算子の連鎖を合わせた入れ子の上限。超えると PAR040。
pub const MAX_NESTING: usize = 256;

#[derive(Clone, Copy)]
pub(super) enum Assoc {
    Left,
    Non,
}

pub(super) struct InfixSpec {
    pub tokens: &'static [TokenKind],
    pub assoc: Assoc,
}

impl InfixSpec {
    pub(super) fn contains(&self, kind: &TokenKind) -> bool {
        self.tokens.iter().any(|tk| tk == kind)
    }
}

pub(super) const INFIX_LEVELS: &[InfixSpec] = &[
    InfixSpec {
        tokens: &[TokenKind::OR, TokenKind::KW_OR],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::AND, TokenKind::KW_AND],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::EQ, TokenKind::NE],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[
            TokenKind::LT,
            TokenKind::LE,
            TokenKind::GT,
            TokenKind::GE,
            TokenKind::INSTANCEOF,
        ],
        assoc: Assoc::Non,
    },
    InfixSpec {
        tokens: &[TokenKind::PLUS, TokenKind::MINUS],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::STAR, TokenKind::SLASH, TokenKind::PERCENT],
        assoc: Assoc::Left,
    },
];

/// 演算子トークンを AST の二項演算子へ写像する。
pub(super) fn binop_for(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::OR | TokenKind::KW_OR => BinOp::Or,
        TokenKind::AND | TokenKind::KW_AND => BinOp::And,
        TokenKind::EQ => BinOp::Eq,
        TokenKind::NE => BinOp::Ne,
        TokenKind::LT => BinOp::Lt,
        TokenKind::LE => BinOp::Le,
        TokenKind::GT => BinOp::Gt,
        TokenKind::GE => BinOp::Ge,
        TokenKind::PLUS => BinOp::Add,
        TokenKind::MINUS => BinOp::Sub,
        TokenKind::STAR => BinOp::Mul,
        TokenKind::SLASH => BinOp::Div,
        TokenKind::PERCENT => BinOp::Rem,
        _ => return None,
    })
}

impl Parser {
    /// トークン列から新しいパーサインスタンスを構築する。
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            ts: tokens,
            i: 0,
            depth: 0,
        }
    }

    pub(super) fn peek(&self) -> &Token {
        &self.ts[self.i]
    }

    pub(super) fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.ts.get(self.i + offset).map(|t| t.kind)
    }

    // EOF の先へは進まない。
    pub(super) fn pop_any(&mut self) -> Token {
        let t = self.ts[self.i].clone();
        if self.i + 1 < self.ts.len() {
            self.i += 1;
        }
        t
    }

    pub(super) fn pop(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let t = self.peek();
        if t.kind != kind {
            return Err(self.unexpected(format!("{:?} を期待しました", kind)));
        }
        Ok(self.pop_any())
    }

    pub(super) fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.pop_any())
        } else {
            None
        }
    }

    // 入れ子を 1 段深くする。エラー時は解析全体を打ち切るので戻さない。
    pub(super) fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let t = self.peek();
            return Err(ParseError::at(
                "PAR040",
                format!("式の入れ子が深すぎます（上限 {}）", MAX_NESTING),
                t.pos,
                t.col,
            ));
        }
        Ok(())
    }

    pub(super) fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    /// 現在位置のトークンを指す PAR001 エラーを作る。
    pub(super) fn unexpected(&self, expectation: impl Into<String>) -> ParseError {
        let t = self.peek();
        let found = if t.kind == TokenKind::EOF {
            "入力の終わり".to_string()
        } else {
            format!("{:?} ({})", t.kind, t.value)
        };
        ParseError::at(
            "PAR001",
            format!("{}が、{} がありました", expectation.into(), found),
            t.pos,
            t.col,
        )
    }
}

/// 1 行分の式を解析する。空（空白のみを含む）入力は PAR010 になる。
pub fn parse_expr(src: &str) -> Result<Expr, ParseError> {
    let ts = lex(src)?;
    let mut p = Parser::new(ts);
    let result = p.parse_expr().and_then(|e| {
        if p.peek().kind != TokenKind::EOF {
            let t = p.peek();
            return Err(ParseError::at(
                "PAR090",
                "余分なトークンが残っています",
                t.pos,
                t.col,
            ));
        }
        Ok(e)
    });
    result.map_err(|e| e.with_snippet(src))
}

#[cfg(test)]
mod tests {
    use super::parse_expr;

    fn shape(src: &str) -> String {
        parse_expr(src).unwrap().to_string()
    }

    #[test]
    /// 乗除が加減より強く結合し、加減は左結合になる。
    fn arithmetic_precedence_and_left_assoc() {
        assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape("1 - 2 - 3"), "((1 - 2) - 3)");
    }

    #[test]
    /// 比較演算子は連鎖できない。
    fn relational_is_non_associative() {
        let err = parse_expr("1 < 2 < 3").unwrap_err();
        assert_eq!(err.0.code, "PAR090");
    }

    #[test]
    /// 空入力は専用のコードで報告される。
    fn empty_input_is_par010() {
        assert_eq!(parse_expr("").unwrap_err().0.code, "PAR010");
        assert_eq!(parse_expr("  \t").unwrap_err().0.code, "PAR010");
    }

    #[test]
    /// 入れ子の上限を超える括弧・単項演算子・連鎖は PAR040 で止まる。
    fn nesting_beyond_limit_is_par040() {
        let n = super::MAX_NESTING;
        let parens = format!("{}1{}", "(".repeat(n + 1), ")".repeat(n + 1));
        assert_eq!(parse_expr(&parens).unwrap_err().0.code, "PAR040");
        let negs = format!("{}1", "-".repeat(n + 1));
        assert_eq!(parse_expr(&negs).unwrap_err().0.code, "PAR040");
        let sum = vec!["1"; n + 2].join(" + ");
        assert_eq!(parse_expr(&sum).unwrap_err().0.code, "PAR040");
        let chain = format!("a{}", ".b".repeat(n + 1));
        assert_eq!(parse_expr(&chain).unwrap_err().0.code, "PAR040");
        let dims = format!("x instanceof int{}", "[]".repeat(n + 1));
        assert_eq!(parse_expr(&dims).unwrap_err().0.code, "PAR040");
    }

    #[test]
    /// 上限より浅い入れ子はそのまま解析できる。
    fn nesting_within_limit_parses() {
        let depth = super::MAX_NESTING / 2;
        let parens = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(shape(&parens), "1");
    }
}
