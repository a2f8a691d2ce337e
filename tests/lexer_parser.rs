// パス: tests/lexer_parser.rs
// 役割: Lexer と parser の基本〜境界テストを一本化
// 意図: 字句解析と構文解析の重要ケースをシンプルに網羅する
// 関連ファイル: src/lexer.rs, src/parser/mod.rs, src/parser/expr.rs, src/ast.rs
#[path = "test_support.rs"]
mod support;

use ognl_repl::lexer::{self, TokenKind};
use ognl_repl::parser;
use support::{lex_ok, parse_expr};

fn assert_token_presence(tokens: &[lexer::Token], kinds: &[TokenKind], note: &str) {
    for kind in kinds {
        assert!(
            tokens.iter().any(|t| &t.kind == kind),
            "{note}: expected token {:?}",
            kind
        );
    }
}

#[test]
/// 代表的な字句パターンをテーブル駆動で検証する。
fn lexer_happy_paths() {
    struct Case<'a> {
        src: &'a str,
        kinds: &'a [TokenKind],
        note: &'a str,
    }

    let cases = [
        Case {
            src: "#x = 0xFF + 1.5e2",
            kinds: &[
                TokenKind::HASH,
                TokenKind::IDENT,
                TokenKind::ASSIGN,
                TokenKind::HEX,
                TokenKind::FLOAT,
            ],
            note: "変数代入と数値リテラル",
        },
        Case {
            src: "a and b or not c",
            kinds: &[TokenKind::KW_AND, TokenKind::KW_OR, TokenKind::KW_NOT],
            note: "語の論理演算子",
        },
        Case {
            src: "@lang.Math@max(1, 2)",
            kinds: &[TokenKind::AT, TokenKind::DOT, TokenKind::COMMA],
            note: "static 参照",
        },
        Case {
            src: "new util.ArrayList() instanceof ArrayList",
            kinds: &[TokenKind::NEW, TokenKind::INSTANCEOF],
            note: "new と instanceof",
        },
        Case {
            src: "#{'k': null, \"v\": true}",
            kinds: &[
                TokenKind::LBRACE,
                TokenKind::STRING,
                TokenKind::COLON,
                TokenKind::NULL,
                TokenKind::TRUE,
            ],
            note: "マップリテラル",
        },
        Case {
            src: "x >= 1 ? y[0] : $z_1",
            kinds: &[
                TokenKind::GE,
                TokenKind::QMARK,
                TokenKind::LBRACK,
                TokenKind::COLON,
            ],
            note: "条件式と添字",
        },
    ];

    for case in cases {
        let tokens = lex_ok(case.src);
        assert_token_presence(&tokens, case.kinds, case.note);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EOF));
    }
}

#[test]
/// 誤った入力が字句エラーになり、コードと桁が報告されることを検証する。
fn lexer_error_paths() {
    for (src, code) in [
        ("'abc", "LEX003"),
        ("\"a\\q\"", "LEX004"),
        ("0x", "LEX010"),
        ("1 ; 2", "LEX090"),
    ] {
        let err = lexer::lex(src).unwrap_err();
        assert_eq!(err.0.code, code, "{src}");
        assert!(err.0.col.is_some(), "{src}: column should be reported");
    }
}

#[test]
/// 非 ASCII の識別子と文字列を扱える。
fn lexer_unicode_handling() {
    let tokens = lex_ok("名前 + 'あいう'");
    assert_eq!(tokens[0].kind, TokenKind::IDENT);
    assert_eq!(tokens[0].value, "名前");
    assert_eq!(tokens[2].value, "あいう");
}

#[test]
/// 各種式が期待通りの木になることを括弧付き表示で検証する。
fn parser_expr_shapes() {
    let cases = [
        ("1 + 2 * 3", "(1 + (2 * 3))", "乗除が加減より強い"),
        ("a || b && c", "(a || (b && c))", "and が or より強い"),
        ("a == b < c", "(a == (b < c))", "比較が等価より強い"),
        ("-x.y", "(-x.y)", "後置が単項より強い"),
        ("!a.b()", "(!a.b())", "否定と呼び出し"),
        ("a ? b : c ? d : e", "(a ? b : (c ? d : e))", "条件式は右結合"),
        ("#a = #b = 1", "(#a = (#b = 1))", "代入は右結合"),
        ("name.first[0]", "name.first[0]", "プロパティと添字"),
        ("@Math@PI", "@Math@PI", "static フィールド"),
        (
            "@lang.Integer@parseInt('7')",
            "@lang.Integer@parseInt(\"7\")",
            "修飾名の static 呼び出し",
        ),
        ("new util.HashMap()", "new util.HashMap()", "new"),
        ("x instanceof int[]", "(x instanceof int[])", "配列型の instanceof"),
        ("{1, {2}}", "{1, {2}}", "入れ子のリスト"),
        ("#{'a': 1}", "#{\"a\": 1}", "マップ"),
        ("#this.size()", "#this.size()", "#this"),
    ];
    for (src, expected, note) in cases {
        assert_eq!(parse_expr(src).to_string(), expected, "{note}");
    }
}

#[test]
/// 構文エラーのコードを検証する。
fn parser_error_codes() {
    for (src, code) in [
        ("", "PAR010"),
        ("1 +", "PAR010"),
        ("1 + )", "PAR001"),
        ("1 2", "PAR090"),
        ("1 < 2 < 3", "PAR090"),
        ("1 = 2", "PAR020"),
        ("f() = 2", "PAR020"),
        ("(1", "PAR001"),
    ] {
        let err = parser::parse_expr(src).unwrap_err();
        assert_eq!(err.0.code, code, "{src:?}");
    }
}
