// パス: src/cli.rs
// 役割: コマンドライン引数の定義と、実行ファイルから呼ばれる入口
// 意図: `-D key=value` を環境変数より強い上書きとして設定解決へ渡す
// 関連ファイル: src/bin/ognl-repl.rs, src/config/mod.rs, src/repl/bootstrap.rs
use std::io::{self, Write};

use clap::Parser;

use crate::config::{ConfigResolver, Overrides};
use crate::errors::ReplError;
use crate::repl;

/// OGNL 風の式を 1 行ずつ評価する REPL
#[derive(Parser, Debug)]
#[command(name = "ognl-repl", version, about, long_about = None)]
pub struct Cli {
    /// 設定値を上書きする（繰り返し指定可）
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// 解決済みの設定を JSON で表示して終了する
    #[arg(long)]
    pub print_config: bool,
}

/// `KEY=VALUE` を分割する。`=` が無ければ値は空文字列。
fn parse_define(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg.split_once('=').unwrap_or((arg, ""));
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("キーが空です: {arg:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// 環境変数の上に `-D` の指定を重ねた上書き集合。
    pub fn overrides(&self) -> Overrides {
        self.defines
            .iter()
            .fold(Overrides::from_env(), |acc, (k, v)| acc.define(k.as_str(), v.as_str()))
    }
}

pub fn run(cli: Cli) -> Result<(), ReplError> {
    let config = ConfigResolver::discover(cli.overrides());
    if cli.print_config {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &config.settings()).map_err(io::Error::from)?;
        writeln!(stdout)?;
        return Ok(());
    }
    repl::run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// `-D` は繰り返し指定でき、値に `=` を含めてもよい。
    fn parses_repeated_defines() {
        let cli = Cli::try_parse_from([
            "ognl-repl",
            "-D",
            "classpath=lib",
            "--define",
            "format.output=%s = %s%n",
        ])
        .unwrap();
        assert_eq!(
            cli.defines,
            vec![
                ("classpath".to_string(), "lib".to_string()),
                ("format.output".to_string(), "%s = %s%n".to_string()),
            ]
        );
        assert!(!cli.print_config);
    }

    #[test]
    /// 値の無い指定は空文字列、キーの無い指定は拒否する。
    fn define_edge_cases() {
        assert_eq!(
            parse_define("root-expression").unwrap(),
            ("root-expression".to_string(), String::new())
        );
        assert!(parse_define("=x").is_err());
    }

    #[test]
    /// `-D` の指定は上書き集合から引ける。
    fn defines_become_overrides() {
        let cli = Cli::try_parse_from(["ognl-repl", "-Dstream-output-enabled=true"]).unwrap();
        assert_eq!(cli.overrides().get("stream-output-enabled"), Some("true"));
    }
}
