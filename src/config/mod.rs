// パス: src/config/mod.rs
// 役割: プロセス上書き・設定リソースの層・呼び出し側の既定値を一つの参照にまとめる
// 意図: 起動時に一度だけ層を組み立て、以後は不変の値として各コンポーネントへ明示的に渡す
// 関連ファイル: src/config/properties.rs, src/config/settings.rs, src/repl/bootstrap.rs
//! 設定の解決。
//!
//! 参照順:
//! 1. プロセス上書き（`-D key=value`、次に環境変数 `OGNL_REPL_<KEY>`）
//! 2. 設定リソースの層（最初に見つかったものが最も強い）
//! 3. 呼び出し側の既定値
//!
//! 層はアリーナ（`Vec`）に親から順に積み、各層は親の添字を持つ。組み立ては末尾の
//! リソースから再帰的に行い、後に見つかったリソースほど基底側の既定値になる。

pub mod properties;
mod settings;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::errors::ConfigLoadError;
use self::properties::Properties;

pub use settings::{Settings, Templates};

/// 探索する設定リソースのファイル名。
pub const RESOURCE_NAME: &str = "ognl-repl.properties";
/// 追加の設定ディレクトリを列挙する環境変数。
pub const CONFIG_PATH_ENV: &str = "OGNL_REPL_CONFIG_PATH";
/// 設定キーを上書きする環境変数の接頭辞。
pub const ENV_PREFIX: &str = "OGNL_REPL_";

pub const KEY_CLASSPATH: &str = "classpath";
pub const KEY_ROOT_EXPRESSION: &str = "root-expression";
pub const KEY_STREAM_OUTPUT_ENABLED: &str = "stream-output-enabled";
pub const KEY_FORMAT_OUTPUT: &str = "format.output";
pub const KEY_FORMAT_CONSOLE_OUTPUT: &str = "format.console-output";
pub const KEY_FORMAT_ERROR: &str = "format.error";
pub const KEY_FORMAT_PROMPT: &str = "format.prompt";

const BUNDLED_ORIGIN: &str = "<bundled>";
const BUNDLED: &str = include_str!("../../resources/ognl-repl.properties");

/// 設定キーに対応する環境変数名（`root-expression` → `OGNL_REPL_ROOT_EXPRESSION`）。
pub fn env_var_name(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{ENV_PREFIX}{suffix}")
}

/// システムプロパティ相当の上書き。環境変数は構築時に写し取る。
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    defines: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl Overrides {
    /// 上書きなし。
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のプロセス環境から `OGNL_REPL_` で始まる変数を写し取る。
    pub fn from_env() -> Self {
        Self::from_vars(
            env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self {
            defines: HashMap::new(),
            env,
        }
    }

    /// `-D key=value` 相当の定義を加える。同じキーは後の定義が勝つ。
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.defines
            .get(key)
            .or_else(|| self.env.get(&env_var_name(key)))
            .map(String::as_str)
    }
}

/// 層の読み込み元。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    File(PathBuf),
    Bundled,
}

impl ResourceSource {
    fn origin(&self) -> String {
        match self {
            ResourceSource::File(path) => path.display().to_string(),
            ResourceSource::Bundled => BUNDLED_ORIGIN.to_string(),
        }
    }

    fn load(&self) -> Result<Properties, ConfigLoadError> {
        match self {
            ResourceSource::File(path) => fs::read_to_string(path)
                .map(|text| Properties::parse(&text))
                .map_err(|source| ConfigLoadError::Read {
                    path: path.clone(),
                    source,
                }),
            ResourceSource::Bundled => Ok(Properties::parse(BUNDLED)),
        }
    }
}

/// 設定リソースを探すディレクトリの並び（先頭ほど強い）。
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    dirs: Vec<PathBuf>,
    bundled: bool,
}

impl ResourceLocator {
    /// `OGNL_REPL_CONFIG_PATH` の各ディレクトリ、カレントディレクトリ、ユーザー設定ディレクトリ、
    /// 同梱の既定値の順。
    pub fn standard() -> Self {
        let mut search: Vec<PathBuf> = env::var_os(CONFIG_PATH_ENV)
            .map(|v| env::split_paths(&v).collect())
            .unwrap_or_default();
        if let Ok(cwd) = env::current_dir() {
            search.push(cwd);
        }
        if let Some(config) = dirs::config_dir() {
            search.push(config.join("ognl-repl"));
        }
        Self {
            dirs: search,
            bundled: true,
        }
    }

    /// 指定したディレクトリだけを探す。同梱の既定値は含めない。
    pub fn dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            bundled: false,
        }
    }

    pub fn with_bundled(mut self) -> Self {
        self.bundled = true;
        self
    }

    /// 存在するリソースを探索順に列挙する。
    pub fn discover(&self) -> Vec<ResourceSource> {
        let mut found: Vec<ResourceSource> = Vec::new();
        for dir in &self.dirs {
            let candidate = dir.join(RESOURCE_NAME);
            if candidate.is_file() {
                let source = ResourceSource::File(candidate);
                // 同じディレクトリが複数回現れても層は一つ
                if !found.contains(&source) {
                    found.push(source);
                }
            }
        }
        if self.bundled {
            found.push(ResourceSource::Bundled);
        }
        found
    }
}

/// 名前付きのキー・値の集合と親の添字。
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    origin: String,
    props: Properties,
    parent: Option<usize>,
}

impl ConfigLayer {
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    overrides: Overrides,
    layers: Vec<ConfigLayer>,
    top: Option<usize>,
}

impl ConfigResolver {
    /// 標準の探索順でリソースを集めて構築する。
    pub fn discover(overrides: Overrides) -> Self {
        Self::load(overrides, &ResourceLocator::standard())
    }

    pub fn load(overrides: Overrides, locator: &ResourceLocator) -> Self {
        Self::from_sources(overrides, &locator.discover())
    }

    /// 読み込み元の列（先頭ほど強い）から層を組み立てる。
    pub fn from_sources(overrides: Overrides, sources: &[ResourceSource]) -> Self {
        let mut layers = Vec::new();
        let top = Self::chain(&mut layers, sources, |s| (s.origin(), s.load()));
        Self {
            overrides,
            layers,
            top,
        }
    }

    /// 読み込み済みの内容（先頭ほど強い）から層を組み立てる。
    pub fn from_layers(overrides: Overrides, layers: Vec<(String, Properties)>) -> Self {
        let mut arena = Vec::new();
        let top = Self::chain(&mut arena, &layers, |(origin, props)| {
            (origin.clone(), Ok(props.clone()))
        });
        Self {
            overrides,
            layers: arena,
            top,
        }
    }

    // 親（残りのリソース）を先に作ってから自分を読み込む。読めない層は飛ばして親をそのまま返す。
    fn chain<T, F>(arena: &mut Vec<ConfigLayer>, sources: &[T], load: F) -> Option<usize>
    where
        F: Fn(&T) -> (String, Result<Properties, ConfigLoadError>) + Copy,
    {
        let (first, rest) = sources.split_first()?;
        let parent = Self::chain(arena, rest, load);
        let (origin, loaded) = load(first);
        match loaded {
            Ok(props) => {
                tracing::debug!(origin = %origin, entries = props.len(), "configuration layer loaded");
                arena.push(ConfigLayer {
                    origin,
                    props,
                    parent,
                });
                Some(arena.len() - 1)
            }
            Err(e) => {
                tracing::warn!(error = %e, "configuration layer skipped");
                parent
            }
        }
    }

    fn layered(&self, key: &str) -> Option<&str> {
        let mut cursor = self.top;
        while let Some(i) = cursor {
            let layer = &self.layers[i];
            if let Some(v) = layer.props.get(key) {
                return Some(v);
            }
            cursor = layer.parent;
        }
        None
    }

    /// 上書き → 層 → `fallback` の順に値を探す。
    pub fn get(&self, key: &str, fallback: Option<&str>) -> Option<String> {
        let value = self
            .overrides
            .get(key)
            .or_else(|| self.layered(key))
            .or(fallback)
            .map(str::to_string);
        tracing::debug!(key, value = ?value, "configuration lookup");
        value
    }

    /// 値が `true`（大文字小文字を区別しない）のときだけ真。
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key, None)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// 層の読み込み元を強い順に返す。
    pub fn layer_origins(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut cursor = self.top;
        while let Some(i) = cursor {
            out.push(self.layers[i].origin());
            cursor = self.layers[i].parent;
        }
        out
    }

    /// 起動に必要な設定値をまとめて取り出す。
    pub fn settings(&self) -> Settings {
        Settings::resolve(self)
    }
}
