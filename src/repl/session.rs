// パス: src/repl/session.rs
// 役割: 1 行読んで評価し、結果かエラーを書き出す評価ループ
// 意図: 対話入力とパイプ入力の違い（プロンプト・空行の扱い・テンプレート）を一つのループで切り替える
// 関連ファイル: src/repl/source.rs, src/repl/printer.rs, src/repl/bootstrap.rs, src/evaluator.rs
//! 評価ループ。
//!
//! - パイプ入力: 空行も含めて全行を評価し、出力テンプレートで書き出す。
//! - 対話入力: 行番号付きプロンプトを出し、空白だけの行は読み飛ばす（カウンタも進めない）。
//!   終端では改行を 1 つ書いて終わる。
//!
//! 行単位の失敗はエラーテンプレートでエラー側へ書き、ループは続ける。

use std::io::{self, Write};

use super::printer::{format_template, write_template};
use super::source::{LineSource, ReadResult};
use crate::config::Templates;
use crate::context::EvaluationContext;
use crate::evaluator::evaluate;
use crate::value::Value;

pub struct EvaluationLoop {
    context: EvaluationContext,
    root: Value,
    templates: Templates,
}

impl EvaluationLoop {
    pub fn new(context: EvaluationContext, root: Value, templates: Templates) -> Self {
        Self {
            context,
            root,
            templates,
        }
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 入力が尽きるまで評価を繰り返す。`Err` は書き出し先の I/O 失敗のみ。
    pub fn run<S, W, E>(&mut self, source: &mut S, out: &mut W, err: &mut E) -> io::Result<()>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        if source.is_interactive() {
            self.run_interactive(source, out, err)
        } else {
            self.run_piped(source, out, err)
        }
    }

    fn run_piped<S, W, E>(&mut self, source: &mut S, out: &mut W, err: &mut E) -> io::Result<()>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        loop {
            match source.read_line("")? {
                ReadResult::Line(line) => self.evaluate_line(&line, false, out, err)?,
                ReadResult::Interrupted => continue,
                ReadResult::Eof => return Ok(()),
            }
        }
    }

    fn run_interactive<S, W, E>(
        &mut self,
        source: &mut S,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<()>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let mut counter: u64 = 1;
        loop {
            let prompt = format_template(&self.templates.prompt, &[&counter]);
            match source.read_line(&prompt)? {
                ReadResult::Eof => {
                    out.write_all(b"\n")?;
                    return out.flush();
                }
                ReadResult::Interrupted => continue,
                ReadResult::Line(line) if line.trim().is_empty() => continue,
                ReadResult::Line(line) => {
                    self.evaluate_line(&line, true, out, err)?;
                    counter += 1;
                }
            }
        }
    }

    fn evaluate_line<W, E>(
        &mut self,
        line: &str,
        interactive: bool,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<()>
    where
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        match evaluate(line, &mut self.context, &self.root) {
            Ok(value) => {
                let template = if interactive {
                    &self.templates.console_output
                } else {
                    &self.templates.output
                };
                write_template(out, template, &[&value])
            }
            Err(e) => {
                tracing::debug!(expression = line, code = e.info().code, "evaluation failed");
                write_template(err, &self.templates.error, &[&e])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::BaseResolver;
    use std::collections::{BTreeMap, VecDeque};
    use std::rc::Rc;

    enum ScriptEvent {
        Line(&'static str),
        Interrupt,
    }

    /// 台本どおりに行を返し、表示されたプロンプトを記録する入力。
    struct ScriptedLineSource {
        events: VecDeque<ScriptEvent>,
        interactive: bool,
        prompts: Vec<String>,
    }

    impl ScriptedLineSource {
        fn new(interactive: bool, events: impl IntoIterator<Item = ScriptEvent>) -> Self {
            Self {
                events: events.into_iter().collect(),
                interactive,
                prompts: Vec::new(),
            }
        }
    }

    impl LineSource for ScriptedLineSource {
        fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
            self.prompts.push(prompt.to_string());
            Ok(match self.events.pop_front() {
                Some(ScriptEvent::Line(s)) => ReadResult::Line(s.to_string()),
                Some(ScriptEvent::Interrupt) => ReadResult::Interrupted,
                None => ReadResult::Eof,
            })
        }

        fn is_interactive(&self) -> bool {
            self.interactive
        }
    }

    fn session(root: Value) -> EvaluationLoop {
        let ctx = EvaluationContext::new(Rc::new(BaseResolver::new()));
        EvaluationLoop::new(ctx, root, Templates::default())
    }

    fn run(session: &mut EvaluationLoop, source: &mut ScriptedLineSource) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        session.run(source, &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    /// パイプ入力では空行も評価され、空の式エラーになる。
    fn piped_mode_evaluates_blank_lines() {
        use ScriptEvent::*;
        let mut src = ScriptedLineSource::new(false, [Line("1 + 1"), Line(""), Line("'a'")]);
        let (out, err) = run(&mut session(Value::Null), &mut src);
        assert_eq!(out, "2\na\n");
        assert!(err.contains("[PAR010]"), "{err}");
        assert!(src.prompts.iter().all(|p| p.is_empty()));
    }

    #[test]
    /// 対話入力では空行を読み飛ばし、評価した行だけカウンタが進む。
    fn interactive_mode_skips_blank_lines() {
        use ScriptEvent::*;
        let mut src = ScriptedLineSource::new(
            true,
            [Line("1"), Line("   "), Interrupt, Line("2"), Line("nope(")],
        );
        let (out, err) = run(&mut session(Value::Null), &mut src);
        assert_eq!(out, "1\n2\n\n");
        assert!(!err.is_empty());
        assert_eq!(
            src.prompts,
            vec![
                "ognl:1> ", "ognl:2> ", "ognl:2> ", "ognl:2> ", "ognl:3> ", "ognl:4> ",
            ]
        );
    }

    #[test]
    /// 変数への代入は次の行から参照できる。
    fn context_persists_between_lines() {
        use ScriptEvent::*;
        let mut src = ScriptedLineSource::new(false, [Line("#x = 20"), Line("#x + 1")]);
        let mut s = session(Value::Null);
        let (out, _) = run(&mut s, &mut src);
        assert_eq!(out, "20\n21\n");
        assert_eq!(s.context().get("x"), Some(&Value::Int(20)));
    }

    #[test]
    /// ルートのプロパティを式から読める。
    fn root_properties_are_visible() {
        use ScriptEvent::*;
        let root = Value::map(BTreeMap::new());
        let mut src =
            ScriptedLineSource::new(false, [Line("name = 'ognl'"), Line("name.length()")]);
        let mut s = session(root);
        let (out, err) = run(&mut s, &mut src);
        assert_eq!(err, "");
        assert_eq!(out, "ognl\n4\n");
        assert_eq!(s.root().to_string(), "{name=ognl}");
    }

    #[test]
    /// 設定したテンプレートで結果とエラーが整形される。
    fn templates_shape_output() {
        use ScriptEvent::*;
        let ctx = EvaluationContext::new(Rc::new(BaseResolver::new()));
        let templates = Templates {
            output: "=> %s%n".into(),
            console_output: "%s%n".into(),
            error: "!! %s%n".into(),
            prompt: "> ".into(),
        };
        let mut s = EvaluationLoop::new(ctx, Value::Null, templates);
        let mut src = ScriptedLineSource::new(false, [Line("3 * 3"), Line("1 / 0")]);
        let (out, err) = run(&mut s, &mut src);
        assert_eq!(out, "=> 9\n");
        assert!(err.starts_with("!! [EVAL061]"), "{err}");
    }
}
