// パス: src/config/settings.rs
// 役割: 起動時に参照する設定値を型付きの構造体へ取り出す
// 意図: キー文字列と既定値の対応をここに集め、`--print-config` でもそのまま出力できるようにする
// 関連ファイル: src/config/mod.rs, src/repl/bootstrap.rs, src/cli.rs

use serde::Serialize;

use super::{
    ConfigResolver, KEY_CLASSPATH, KEY_FORMAT_CONSOLE_OUTPUT, KEY_FORMAT_ERROR, KEY_FORMAT_OUTPUT,
    KEY_FORMAT_PROMPT, KEY_ROOT_EXPRESSION, KEY_STREAM_OUTPUT_ENABLED,
};

pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%s%n";
pub const DEFAULT_ERROR_TEMPLATE: &str = "%s%n";
pub const DEFAULT_PROMPT_TEMPLATE: &str = "ognl:%d> ";

/// 出力・エラー・プロンプトのテンプレート。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Templates {
    pub output: String,
    pub console_output: String,
    pub error: String,
    pub prompt: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            output: DEFAULT_OUTPUT_TEMPLATE.into(),
            console_output: DEFAULT_OUTPUT_TEMPLATE.into(),
            error: DEFAULT_ERROR_TEMPLATE.into(),
            prompt: DEFAULT_PROMPT_TEMPLATE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    pub classpath: String,
    /// 空文字列は未設定として `None` にする。
    pub root_expression: Option<String>,
    pub stream_output_enabled: bool,
    pub templates: Templates,
    /// 有効な設定層の読み込み元（強い順）。
    pub layers: Vec<String>,
}

impl Settings {
    pub(super) fn resolve(cfg: &ConfigResolver) -> Self {
        let defaults = Templates::default();
        let text = |key: &str, fallback: &str| {
            cfg.get(key, Some(fallback))
                .unwrap_or_else(|| fallback.to_string())
        };
        Self {
            classpath: text(KEY_CLASSPATH, ""),
            root_expression: cfg
                .get(KEY_ROOT_EXPRESSION, None)
                .filter(|expr| !expr.is_empty()),
            stream_output_enabled: cfg.get_bool(KEY_STREAM_OUTPUT_ENABLED),
            templates: Templates {
                output: text(KEY_FORMAT_OUTPUT, &defaults.output),
                console_output: text(KEY_FORMAT_CONSOLE_OUTPUT, &defaults.console_output),
                error: text(KEY_FORMAT_ERROR, &defaults.error),
                prompt: text(KEY_FORMAT_PROMPT, &defaults.prompt),
            },
            layers: cfg.layer_origins().into_iter().map(String::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ConfigResolver, Overrides};
    use super::*;

    #[test]
    /// 層が一つも無いときはコード上の既定値になる。
    fn code_defaults_apply_without_layers() {
        let s = ConfigResolver::from_layers(Overrides::new(), vec![]).settings();
        assert_eq!(s.classpath, "");
        assert_eq!(s.root_expression, None);
        assert!(!s.stream_output_enabled);
        assert_eq!(s.templates, Templates::default());
    }

    #[test]
    /// 空のルート式は未設定として扱う。
    fn empty_root_expression_is_none() {
        let overrides = Overrides::new().define(KEY_ROOT_EXPRESSION, "");
        let s = ConfigResolver::from_layers(overrides, vec![]).settings();
        assert_eq!(s.root_expression, None);
    }

    #[test]
    /// JSON ではキーがケバブケースになる。
    fn serializes_with_kebab_case_keys() {
        let s = ConfigResolver::from_layers(Overrides::new(), vec![]).settings();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["stream-output-enabled"], serde_json::json!(false));
        assert_eq!(json["templates"]["console-output"], serde_json::json!("%s%n"));
    }
}
