// パス: src/repl/source.rs
// 役割: 評価ループへ 1 行ずつ入力を渡す抽象と、パイプ入力向けの実装
// 意図: 端末とストリームの違いをループから隠し、テストでは台本入力へ差し替えられるようにする
// 関連ファイル: src/repl/session.rs, src/repl/line_editor.rs, src/repl/bootstrap.rs
use std::io::{self, BufRead};

/// 行入力が返す 3 種類の結果を表す列挙体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Eof,
    Interrupted,
}

/// 評価ループが入力を取得するためのインターフェース。
pub trait LineSource {
    /// プロンプトを（必要なら）表示し、1 行を読む。改行文字は含めない。
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult>;

    /// 人が操作している端末かどうか。プロンプトと出力テンプレートの選択に使う。
    fn is_interactive(&self) -> bool;
}

/// パイプやファイルから読む非対話の入力。プロンプトは表示しない。
pub struct StreamSource<R> {
    reader: R,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for StreamSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<ReadResult> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(ReadResult::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(ReadResult::Line(line))
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    /// 改行コードを取り除き、最後の行は改行なしでも読める。
    fn strips_line_endings() {
        let mut src = StreamSource::new(Cursor::new("1 + 1\r\n'a'\nlast"));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Line("1 + 1".into()));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Line("'a'".into()));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Line("last".into()));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Eof);
        assert!(!src.is_interactive());
    }

    #[test]
    /// 空行も 1 行として返す。
    fn empty_lines_are_returned() {
        let mut src = StreamSource::new(Cursor::new("\n\n"));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Line(String::new()));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Line(String::new()));
        assert_eq!(src.read_line("").unwrap(), ReadResult::Eof);
    }
}
