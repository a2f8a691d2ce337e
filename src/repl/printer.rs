// パス: src/repl/printer.rs
// 役割: 出力・エラー・プロンプトのテンプレートを展開して書き出す
// 意図: printf 風の書式を設定値として差し替えられるようにし、表示形式を一箇所にまとめる
// 関連ファイル: src/repl/session.rs, src/config/settings.rs
//! テンプレートの書式は次の 4 つだけを解釈する。
//!
//! - `%s` / `%d`: 次の引数を `Display` で埋め込む
//! - `%n`: 改行
//! - `%%`: `%` そのもの
//!
//! それ以外の `%` の並びや、引数が尽きた後の `%s` / `%d` はそのまま残す。

use std::fmt::Display;
use std::io::{self, Write};

/// テンプレートを展開した文字列を返す。
pub fn format_template(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(conv @ ('s' | 'd')) => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(&arg.to_string()),
                    None => {
                        out.push('%');
                        out.push(conv);
                    }
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

/// テンプレートを展開して書き出し、すぐに flush する。
pub(crate) fn write_template<W: Write + ?Sized>(
    out: &mut W,
    template: &str,
    args: &[&dyn Display],
) -> io::Result<()> {
    out.write_all(format_template(template, args).as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 既定の出力テンプレートは値の後に改行を付ける。
    fn default_output_template() {
        assert_eq!(format_template("%s%n", &[&2]), "2\n");
    }

    #[test]
    /// プロンプトの %d にカウンタが入る。
    fn prompt_counter() {
        assert_eq!(format_template("ognl:%d> ", &[&3]), "ognl:3> ");
    }

    #[test]
    /// %% は % に、未知の書式はそのまま残る。
    fn percent_escape_and_unknown_sequences() {
        assert_eq!(format_template("100%% %x %", &[]), "100% %x %");
    }

    #[test]
    /// 引数が足りない書式は展開しない。
    fn missing_arguments_are_kept() {
        assert_eq!(format_template("%s and %s", &[&"a"]), "a and %s");
    }

    #[test]
    /// 書き出し先へテンプレートの展開結果が届く。
    fn write_template_writes_expansion() {
        let mut buf = Vec::new();
        write_template(&mut buf, "=> %s%n", &[&"x"]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "=> x\n");
    }
}
