// パス: src/repl/line_editor.rs
// 役割: 対話端末向けの行エディタ（カーソル移動・行頭行末・削除）
// 意図: 外部クレートに頼らず Raw モードで 1 行を編集し、評価ループへ LineSource として渡す
// 関連ファイル: src/repl/source.rs, src/repl/session.rs, src/repl/bootstrap.rs
use std::io::{self, Read, Write};

use super::source::{LineSource, ReadResult};

/// 端末から 1 行ずつ読む簡易ラインエディタ。
#[derive(Debug, Default)]
pub struct LineEditor {
    _private: (),
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineSource for LineEditor {
    /// プロンプトを出力し、1 行分の入力または制御シグナルを取得する。
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        #[cfg(unix)]
        {
            self.read_line_unix(prompt)
        }
        #[cfg(not(unix))]
        {
            self.read_line_fallback(prompt)
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

#[cfg(not(unix))]
impl LineEditor {
    /// Raw モードが利用できない環境向けのフォールバック読み取り。
    fn read_line_fallback(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
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
}

#[cfg(unix)]
impl LineEditor {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn read_line_unix(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let _raw = RawMode::new()?;
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let stdin = io::stdin();
        let mut stdin = stdin.lock();
        let mut session = EditorSession::new();
        loop {
            let mut byte = [0u8; 1];
            if stdin.read(&mut byte)? == 0 {
                return Ok(ReadResult::Eof);
            }
            let changed = match interpret_action(byte[0], &mut stdin)? {
                EditAction::Submit => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Line(session.into_string()));
                }
                EditAction::Interrupt => {
                    write!(stdout, "^C\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Interrupted);
                }
                // Ctrl-D は空行なら終端、入力中ならカーソル位置の 1 文字削除。
                EditAction::Eof if session.is_empty() => return Ok(ReadResult::Eof),
                EditAction::Eof | EditAction::DeleteRight => session.delete_right(),
                EditAction::DeleteLeft => session.delete_left(),
                EditAction::MoveLeft => session.move_left(),
                EditAction::MoveRight => session.move_right(),
                EditAction::MoveHome => session.move_home(),
                EditAction::MoveEnd => session.move_end(),
                EditAction::KillLine => session.kill_line(),
                EditAction::InsertChar(ch) => {
                    session.insert_char(ch);
                    true
                }
                EditAction::Ignore => false,
            };
            if changed {
                refresh_line(&mut stdout, prompt, session.buffer(), session.cursor())?;
            }
        }
    }
}

/// 先頭バイトと後続バイトから UTF-8 の 1 文字を復元する。
fn read_utf8_char<R: Read>(first: u8, reader: &mut R) -> io::Result<Option<char>> {
    let width = match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Ok(None),
    };
    let mut buf = [0u8; 4];
    buf[0] = first;
    for idx in 1..width {
        reader.read_exact(&mut buf[idx..idx + 1])?;
    }
    match std::str::from_utf8(&buf[..width]) {
        Ok(s) => Ok(s.chars().next()),
        Err(_) => Ok(None),
    }
}

/// 1 バイト読めなければ `None`。
fn next_byte<R: Read>(reader: &mut R) -> Option<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b).ok().map(|_| b[0])
}

/// 読み取った制御シーケンスを内部の編集操作へ写像する。
fn interpret_action<R: Read>(first: u8, reader: &mut R) -> io::Result<EditAction> {
    match first {
        b'\n' | b'\r' => Ok(EditAction::Submit),
        0x01 => Ok(EditAction::MoveHome),
        0x02 => Ok(EditAction::MoveLeft),
        0x03 => Ok(EditAction::Interrupt),
        0x04 => Ok(EditAction::Eof),
        0x05 => Ok(EditAction::MoveEnd),
        0x06 => Ok(EditAction::MoveRight),
        0x15 => Ok(EditAction::KillLine),
        0x7f | 0x08 => Ok(EditAction::DeleteLeft),
        0x1b => Ok(interpret_escape(reader)),
        _ => match read_utf8_char(first, reader)? {
            Some(ch) if !ch.is_control() => Ok(EditAction::InsertChar(ch)),
            _ => Ok(EditAction::Ignore),
        },
    }
}

/// `ESC [ x`、`ESC O x`、`ESC [ n ~` の形のシーケンスを解釈する。
/// 上下矢印は履歴を持たないので無視する。
fn interpret_escape<R: Read>(reader: &mut R) -> EditAction {
    let Some(intro) = next_byte(reader) else {
        return EditAction::Ignore;
    };
    if intro != b'[' && intro != b'O' {
        return EditAction::Ignore;
    }
    let Some(code) = next_byte(reader) else {
        return EditAction::Ignore;
    };
    match code {
        b'C' => EditAction::MoveRight,
        b'D' => EditAction::MoveLeft,
        b'H' => EditAction::MoveHome,
        b'F' => EditAction::MoveEnd,
        b'1' | b'3' | b'4' | b'7' | b'8' if intro == b'[' => {
            if next_byte(reader) != Some(b'~') {
                return EditAction::Ignore;
            }
            match code {
                b'1' | b'7' => EditAction::MoveHome,
                b'3' => EditAction::DeleteRight,
                _ => EditAction::MoveEnd,
            }
        }
        _ => EditAction::Ignore,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditAction {
    Submit,
    Interrupt,
    Eof,
    DeleteLeft,
    DeleteRight,
    MoveLeft,
    MoveRight,
    MoveHome,
    MoveEnd,
    KillLine,
    InsertChar(char),
    Ignore,
}

/// 編集中の 1 行。各操作は再描画が必要なとき true を返す。
struct EditorSession {
    buffer: Vec<char>,
    cursor: usize,
}

impl EditorSession {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    fn buffer(&self) -> &[char] {
        &self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn delete_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        true
    }

    fn delete_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.cursor);
        true
    }

    fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.buffer.len();
        self.cursor = self.buffer.len();
        moved
    }

    /// カーソルより前を削除する（Ctrl-U）。
    fn kill_line(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        true
    }

    fn into_string(self) -> String {
        self.buffer.into_iter().collect()
    }
}

/// バッファとカーソル位置に合わせて行全体を再描画する。
fn refresh_line<W: Write>(
    writer: &mut W,
    prompt: &str,
    buffer: &[char],
    cursor: usize,
) -> io::Result<()> {
    let rendered: String = buffer.iter().collect();
    write!(writer, "\r{}{}", prompt, rendered)?;
    write!(writer, "\x1b[K")?;
    let total = prompt.chars().count() + buffer.len();
    let target = prompt.chars().count() + cursor;
    if total > target {
        write!(writer, "\x1b[{}D", total - target)?;
    }
    writer.flush()
}

#[cfg(unix)]
/// Raw モードへの切り替えと復帰を担う RAII ガード。
struct RawMode {
    original: Termios,
}

#[cfg(unix)]
impl RawMode {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn new() -> io::Result<Self> {
        let fd = 0; // 標準入力
        let mut termios = Termios::default();
        if unsafe { tcgetattr(fd, &mut termios as *mut _) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut raw = termios;
        unsafe {
            cfmakeraw(&mut raw as *mut _);
        }
        if unsafe { tcsetattr(fd, TCSANOW, &raw as *const _) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { original: termios })
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn drop(&mut self) {
        unsafe {
            let _ = tcsetattr(0, TCSANOW, &self.original as *const _);
        }
    }
}

#[cfg(unix)]
const TCSANOW: i32 = 0;

#[cfg(unix)]
#[repr(C)]
#[derive(Clone, Copy)]
/// POSIX 端末属性 (`termios`) を Rust 表現に写した構造体。
struct Termios {
    c_iflag: u32,
    c_oflag: u32,
    c_cflag: u32,
    c_lflag: u32,
    c_line: u8,
    c_cc: [u8; NCCS],
    c_ispeed: u32,
    c_ospeed: u32,
}

#[cfg(unix)]
impl Default for Termios {
    fn default() -> Self {
        Self {
            c_iflag: 0,
            c_oflag: 0,
            c_cflag: 0,
            c_lflag: 0,
            c_line: 0,
            c_cc: [0; NCCS],
            c_ispeed: 0,
            c_ospeed: 0,
        }
    }
}

#[cfg(unix)]
#[cfg(any(target_os = "linux", target_os = "android"))]
const NCCS: usize = 32;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
))]
const NCCS: usize = 20;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
)))]
const NCCS: usize = 32;

#[cfg(unix)]
extern "C" {
    fn tcgetattr(fd: i32, termios: *mut Termios) -> i32;
    fn tcsetattr(fd: i32, optional_actions: i32, termios: *const Termios) -> i32;
    fn cfmakeraw(termios: *mut Termios);
}

#[cfg(test)]
mod tests {
    use super::{interpret_action, read_utf8_char, refresh_line, EditAction, EditorSession};
    use std::io::Cursor;

    fn action(first: u8, rest: &[u8]) -> EditAction {
        interpret_action(first, &mut Cursor::new(rest.to_vec())).unwrap()
    }

    fn typed(text: &str) -> EditorSession {
        let mut session = EditorSession::new();
        for ch in text.chars() {
            session.insert_char(ch);
        }
        session
    }

    #[test]
    /// 複数バイトの UTF-8 文字が正しく復元されるか検証する。
    fn read_utf8_char_handles_multibyte() {
        let mut cursor = Cursor::new(vec![0x81, 0x82]);
        let ch = read_utf8_char(0xe3, &mut cursor).unwrap().unwrap();
        assert_eq!(ch, 'あ');
    }

    #[test]
    /// 無効な UTF-8 先頭バイトが None を返すか確認する。
    fn read_utf8_char_rejects_invalid_lead() {
        let mut cursor = Cursor::new(vec![0xff, 0x00, 0x00]);
        assert!(read_utf8_char(0x80, &mut cursor).unwrap().is_none());
    }

    #[test]
    /// 再描画後のカーソル位置が期待通り手前へ戻るか確認する。
    fn refresh_line_repositions_cursor() {
        let mut buffer: Vec<u8> = Vec::new();
        refresh_line(&mut buffer, "ognl:1> ", &['a', 'b', 'c'], 1).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("ognl:1> abc"));
        assert!(output.contains("\x1b[K"));
        assert!(output.contains("\x1b[2D"));
    }

    #[test]
    /// 制御文字とエスケープシーケンスの対応。
    fn control_keys_map_to_actions() {
        assert_eq!(action(b'\r', &[]), EditAction::Submit);
        assert_eq!(action(0x03, &[]), EditAction::Interrupt);
        assert_eq!(action(0x04, &[]), EditAction::Eof);
        assert_eq!(action(0x01, &[]), EditAction::MoveHome);
        assert_eq!(action(0x05, &[]), EditAction::MoveEnd);
        assert_eq!(action(0x15, &[]), EditAction::KillLine);
        assert_eq!(action(0x1b, b"[D"), EditAction::MoveLeft);
        assert_eq!(action(0x1b, b"[C"), EditAction::MoveRight);
        assert_eq!(action(0x1b, b"[H"), EditAction::MoveHome);
        assert_eq!(action(0x1b, b"OF"), EditAction::MoveEnd);
        assert_eq!(action(0x1b, b"[3~"), EditAction::DeleteRight);
        assert_eq!(action(0x1b, b"[4~"), EditAction::MoveEnd);
        assert_eq!(action(b'x', &[]), EditAction::InsertChar('x'));
    }

    #[test]
    /// 上下矢印や不完全なシーケンス、非表示文字は無視する。
    fn incomplete_or_unknown_sequences_are_ignored() {
        assert_eq!(action(0x1b, b"[A"), EditAction::Ignore);
        assert_eq!(action(0x1b, b"[B"), EditAction::Ignore);
        assert_eq!(action(0x1b, &[]), EditAction::Ignore);
        assert_eq!(action(0x1b, b"X"), EditAction::Ignore);
        assert_eq!(action(0x1b, b"["), EditAction::Ignore);
        assert_eq!(action(0x1b, b"[3"), EditAction::Ignore);
        assert_eq!(action(0x1b, b"O3~"), EditAction::Ignore);
        assert_eq!(action(0x07, &[]), EditAction::Ignore);
    }

    #[test]
    /// カーソル位置への挿入と左右の削除。
    fn insert_and_delete_around_cursor() {
        let mut session = typed("ac");
        assert!(session.move_left());
        session.insert_char('b');
        assert_eq!(session.buffer().iter().collect::<String>(), "abc");
        assert!(session.delete_right());
        assert!(!session.delete_right());
        assert!(session.delete_left());
        assert_eq!(session.into_string(), "a");
    }

    #[test]
    /// 行頭・行末への移動と Ctrl-U の境界。
    fn home_end_and_kill_line() {
        let mut session = typed("1 + 2");
        assert!(!session.move_end());
        assert!(session.move_home());
        assert!(!session.move_home());
        assert!(!session.kill_line());
        assert!(!session.move_left());
        assert!(session.move_right());
        assert!(session.move_right());
        assert!(session.kill_line());
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.into_string(), "+ 2");
    }

    #[test]
    /// 空のセッションではどの移動も削除も起きない。
    fn empty_session_boundaries() {
        let mut session = EditorSession::new();
        assert!(session.is_empty());
        assert!(!session.delete_left());
        assert!(!session.delete_right());
        assert!(!session.move_left());
        assert!(!session.move_right());
        assert!(!session.move_home());
        assert!(!session.move_end());
    }
}
