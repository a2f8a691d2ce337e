// パス: src/repl/bootstrap.rs
// 役割: 設定から名前解決・ルート・コンテキストを組み立て、入出力を選んで評価ループを起動する
// 意図: 起動時の失敗（classpath・ルート式）を評価ループに入る前にまとめて検出する
// 関連ファイル: src/repl/session.rs, src/config/mod.rs, src/resolver/layered.rs, src/root.rs, src/cli.rs
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

use super::line_editor::LineEditor;
use super::session::EvaluationLoop;
use super::source::{LineSource, StreamSource};
use crate::config::{ConfigResolver, Settings};
use crate::context::EvaluationContext;
use crate::errors::{ReplError, StartupError};
use crate::resolver::{LayeredResolver, NameResolver};
use crate::root::RootInitializer;

/// 標準入出力で評価ループを動かす。端末なら行エディタ、それ以外はストリーム読み取り。
pub fn run(config: &ConfigResolver) -> Result<(), ReplError> {
    let settings = config.settings();
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    if stdin.is_terminal() {
        tracing::debug!("interactive session");
        let mut editor = LineEditor::new();
        run_with(&settings, &mut editor, &mut io::stdout(), &mut stderr)
    } else {
        tracing::debug!("piped session");
        let mut source = StreamSource::new(stdin.lock());
        run_with(&settings, &mut source, &mut io::stdout().lock(), &mut stderr)
    }
}

/// 入出力を差し替えて評価ループを動かす。
///
/// 非対話入力で `stream-output-enabled` が偽なら、成功結果は捨ててエラーだけを書く。
pub fn run_with<S, W, E>(
    settings: &Settings,
    source: &mut S,
    out: &mut W,
    err: &mut E,
) -> Result<(), ReplError>
where
    S: LineSource + ?Sized,
    W: Write,
    E: Write,
{
    let mut session = start_session(settings)?;
    if !source.is_interactive() && !settings.stream_output_enabled {
        session.run(source, &mut io::sink(), err)?;
    } else {
        session.run(source, out, err)?;
    }
    Ok(())
}

/// 名前解決器・ルート・コンテキストを用意した評価ループを返す。
pub fn start_session(settings: &Settings) -> Result<EvaluationLoop, StartupError> {
    let resolver: Rc<dyn NameResolver> =
        Rc::new(LayeredResolver::from_classpath(&settings.classpath)?);
    let root = RootInitializer::new(resolver.clone())
        .init_root(settings.root_expression.as_deref())?;
    let context = EvaluationContext::new(resolver);
    Ok(EvaluationLoop::new(context, root, settings.templates.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Overrides, KEY_ROOT_EXPRESSION, KEY_STREAM_OUTPUT_ENABLED};
    use std::io::Cursor;

    fn settings(overrides: Overrides) -> Settings {
        ConfigResolver::from_layers(overrides, vec![]).settings()
    }

    fn piped(settings: &Settings, input: &str) -> (String, String) {
        let mut source = StreamSource::new(Cursor::new(input.to_string()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_with(settings, &mut source, &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    /// 出力が無効なら結果は捨てられ、エラーだけが書かれる。
    fn quiet_mode_discards_results() {
        let (out, err) = piped(&settings(Overrides::new()), "1 + 1\n1 / 0\n");
        assert_eq!(out, "");
        assert!(err.contains("[EVAL061]"), "{err}");
    }

    #[test]
    /// 出力を有効にすると結果が書かれる。
    fn enabled_stream_output_writes_results() {
        let s = settings(Overrides::new().define(KEY_STREAM_OUTPUT_ENABLED, "true"));
        let (out, err) = piped(&s, "1 + 1\n");
        assert_eq!(out, "2\n");
        assert_eq!(err, "");
    }

    #[test]
    /// ルート式の値が各行の評価対象になる。
    fn root_expression_feeds_session() {
        let s = settings(
            Overrides::new()
                .define(KEY_STREAM_OUTPUT_ENABLED, "true")
                .define(KEY_ROOT_EXPRESSION, "#{'n': 41}"),
        );
        let (out, _) = piped(&s, "n + 1\n#root\n");
        assert_eq!(out, "42\n{n=41}\n");
    }

    #[test]
    /// ルート式の失敗は起動エラーになり、ループは始まらない。
    fn failing_root_expression_aborts_startup() {
        let s = settings(Overrides::new().define(KEY_ROOT_EXPRESSION, "1 +"));
        let mut source = StreamSource::new(Cursor::new("1\n".to_string()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run_with(&s, &mut source, &mut out, &mut err);
        assert!(matches!(
            result,
            Err(ReplError::Startup(StartupError::RootExpression { .. }))
        ));
        assert!(out.is_empty() && err.is_empty());
    }
}
