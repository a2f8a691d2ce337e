// パス: src/lexer.rs
// 役割: 式 1 行分の字句解析器とトークン定義を提供する
// 意図: 構文解析に必要な位置付きトークンを生成する
// 関連ファイル: src/parser/mod.rs, src/errors.rs, tests/lexer_parser.rs
//! 字句解析モジュール
//!
//! - OGNL 風の式をトークン列へ変換する。
//! - 正規表現ライブラリを使わず、標準ライブラリのみで実装する。
//! - すべてのトークンに桁・バイト位置を記録し、診断情報と連携させる。
//! - 文字列リテラルはここでエスケープを解決し、`value` には中身だけを入れる。

use crate::errors::LexerError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// 生成されたトークンとその位置情報を保持するレコード。
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// 字句解析で識別されるトークンの分類。
pub enum TokenKind {
    EOF,
    // 演算子・記号トークン
    EQ,
    NE,
    LE,
    GE,
    LT,
    GT,
    AND,
    OR,
    BANG,
    ASSIGN,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    LPAREN,
    RPAREN,
    LBRACK,
    RBRACK,
    LBRACE,
    RBRACE,
    COMMA,
    COLON,
    QMARK,
    DOT,
    HASH, // コンテキスト変数・マップリテラルの `#`
    AT,   // 静的メンバ参照の `@`
    // リテラル分類
    STRING,
    HEX,
    FLOAT,
    INT,
    IDENT,
    // キーワード分類
    TRUE,
    FALSE,
    NULL,
    NEW,
    INSTANCEOF,
    KW_AND,
    KW_OR,
    KW_NOT,
}

/// 空白文字かどうかを判定するユーティリティ。
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
/// 10 進数字かどうかを判定するユーティリティ。
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
/// 識別子の先頭に使用可能な文字かどうかを判定する。
fn is_letter(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}
/// 識別子の後続として許容される文字か判定する。
fn is_ident_rest(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    src: &'a str,
    cursor: usize,
    len: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            cursor: 0,
            len: src.len(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexerError> {
        while self.cursor < self.len {
            if self.consume_whitespace() {
                continue;
            }
            self.lex_token()?;
        }
        self.push_simple(TokenKind::EOF, "", self.len);
        Ok(self.tokens)
    }

    fn consume_whitespace(&mut self) -> bool {
        let mut advanced = false;
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.advance_char();
                advanced = true;
            } else {
                break;
            }
        }
        advanced
    }

    fn lex_token(&mut self) -> Result<(), LexerError> {
        let start = self.cursor;
        let Some(ch) = self.peek_char() else {
            return Ok(());
        };
        if self.try_multi_char_symbol(ch) {
            return Ok(());
        }
        if self.try_single_char_symbol(ch) {
            return Ok(());
        }
        if ch == '\'' || ch == '"' {
            return self.lex_string_literal(ch);
        }
        if is_digit(ch) {
            return self.lex_number();
        }
        if is_letter(ch) {
            self.lex_identifier_or_keyword();
            return Ok(());
        }
        Err(self.err("LEX090", format!("字句解析に失敗: {:?}", ch), start))
    }

    fn try_multi_char_symbol(&mut self, first: char) -> bool {
        let Some(second) = self.peek_second_char() else {
            return false;
        };
        let token = match (first, second) {
            ('=', '=') => Some((TokenKind::EQ, "==")),
            ('!', '=') => Some((TokenKind::NE, "!=")),
            ('<', '=') => Some((TokenKind::LE, "<=")),
            ('>', '=') => Some((TokenKind::GE, ">=")),
            ('&', '&') => Some((TokenKind::AND, "&&")),
            ('|', '|') => Some((TokenKind::OR, "||")),
            _ => None,
        };
        if let Some((kind, value)) = token {
            let start = self.cursor;
            self.advance_bytes(first.len_utf8() + second.len_utf8());
            self.push_simple(kind, value, start);
            return true;
        }
        false
    }

    fn try_single_char_symbol(&mut self, ch: char) -> bool {
        let token = match ch {
            '<' => Some((TokenKind::LT, "<")),
            '>' => Some((TokenKind::GT, ">")),
            '!' => Some((TokenKind::BANG, "!")),
            '=' => Some((TokenKind::ASSIGN, "=")),
            '+' => Some((TokenKind::PLUS, "+")),
            '-' => Some((TokenKind::MINUS, "-")),
            '*' => Some((TokenKind::STAR, "*")),
            '/' => Some((TokenKind::SLASH, "/")),
            '%' => Some((TokenKind::PERCENT, "%")),
            '(' => Some((TokenKind::LPAREN, "(")),
            ')' => Some((TokenKind::RPAREN, ")")),
            '[' => Some((TokenKind::LBRACK, "[")),
            ']' => Some((TokenKind::RBRACK, "]")),
            '{' => Some((TokenKind::LBRACE, "{")),
            '}' => Some((TokenKind::RBRACE, "}")),
            ',' => Some((TokenKind::COMMA, ",")),
            ':' => Some((TokenKind::COLON, ":")),
            '?' => Some((TokenKind::QMARK, "?")),
            '.' => Some((TokenKind::DOT, ".")),
            '#' => Some((TokenKind::HASH, "#")),
            '@' => Some((TokenKind::AT, "@")),
            _ => None,
        };
        if let Some((kind, value)) = token {
            let start = self.cursor;
            self.advance_bytes(ch.len_utf8());
            self.push_simple(kind, value, start);
            return true;
        }
        false
    }

    // シングル・ダブルどちらのクォートも文字列として扱う。
    fn lex_string_literal(&mut self, quote: char) -> Result<(), LexerError> {
        let start = self.cursor;
        self.advance_bytes(1); // 開始クォート
        let mut value = String::new();
        loop {
            let Some(ch) = self.advance_char() else {
                return Err(self.err("LEX003", "文字列リテラルが閉じていません", start));
            };
            if ch == quote {
                break;
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let esc_pos = self.cursor - 1;
            let decoded = match self.advance_char() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some('"') => '"',
                Some(other) => {
                    return Err(self.err(
                        "LEX004",
                        format!("未知のエスケープシーケンス \\{}", other),
                        esc_pos,
                    ))
                }
                None => return Err(self.err("LEX003", "文字列リテラルが閉じていません", start)),
            };
            value.push(decoded);
        }
        self.push_simple(TokenKind::STRING, &value, start);
        Ok(())
    }

    fn lex_number(&mut self) -> Result<(), LexerError> {
        let start = self.cursor;
        if self.starts_with("0x") || self.starts_with("0X") {
            self.advance_bytes(2);
            let mut count = 0;
            while let Some(ch) = self.peek_char() {
                if ch.is_ascii_hexdigit() {
                    self.advance_char();
                    count += 1;
                } else {
                    break;
                }
            }
            if count == 0 {
                return Err(self.err("LEX010", "16進数の桁がありません", start));
            }
            let end = self.cursor;
            self.push_slice(TokenKind::HEX, start, end);
            return Ok(());
        }

        self.consume_digits();

        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_second_char().is_some_and(is_digit) {
            is_float = true;
            self.advance_char(); // '.'
            self.consume_digits();
        }

        if let Some('e') | Some('E') = self.peek_char() {
            let mut idx = self.cursor + 1;
            if let Some('+') | Some('-') = self.char_at(idx) {
                idx += 1;
            }
            let mut count = 0;
            let mut scan = idx;
            while let Some(ch) = self.char_at(scan) {
                if is_digit(ch) {
                    scan += ch.len_utf8();
                    count += 1;
                } else {
                    break;
                }
            }
            if count > 0 {
                is_float = true;
                self.cursor = scan;
            }
        }

        let end = self.cursor;
        let kind = if is_float {
            TokenKind::FLOAT
        } else {
            TokenKind::INT
        };
        self.push_slice(kind, start, end);
        Ok(())
    }

    fn consume_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if is_digit(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn lex_identifier_or_keyword(&mut self) {
        let start = self.cursor;
        self.advance_char();
        while let Some(ch) = self.peek_char() {
            if is_ident_rest(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
        let slice = &self.src[start..self.cursor];
        let kind = match slice {
            "true" => TokenKind::TRUE,
            "false" => TokenKind::FALSE,
            "null" => TokenKind::NULL,
            "new" => TokenKind::NEW,
            "instanceof" => TokenKind::INSTANCEOF,
            "and" => TokenKind::KW_AND,
            "or" => TokenKind::KW_OR,
            "not" => TokenKind::KW_NOT,
            _ => TokenKind::IDENT,
        };
        self.push_slice(kind, start, self.cursor);
    }

    fn column(&self, pos: usize) -> usize {
        self.src[..pos].chars().count() + 1
    }

    fn push_simple(&mut self, kind: TokenKind, value: &str, start: usize) {
        let col = self.column(start);
        self.tokens.push(Token {
            kind,
            value: value.into(),
            pos: start,
            col,
        });
    }

    fn push_slice(&mut self, kind: TokenKind, start: usize, end: usize) {
        let col = self.column(start);
        self.tokens.push(Token {
            kind,
            value: self.src[start..end].into(),
            pos: start,
            col,
        });
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.cursor)
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut iter = self.src[self.cursor..].chars();
        iter.next()?;
        iter.next()
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        if idx >= self.len {
            None
        } else {
            self.src[idx..].chars().next()
        }
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.advance_bytes(ch.len_utf8());
        Some(ch)
    }

    fn advance_bytes(&mut self, count: usize) {
        self.cursor = (self.cursor + count).min(self.len);
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.src[self.cursor..].starts_with(pattern)
    }

    fn err(&self, code: &'static str, message: impl Into<String>, pos: usize) -> LexerError {
        LexerError::at_with_snippet(code, message, pos, self.column(pos), self.src)
    }
}

/// 式のソースをトークン列へ変換する。末尾には必ず `EOF` が入る。
pub fn lex(src: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(src).run()
}
