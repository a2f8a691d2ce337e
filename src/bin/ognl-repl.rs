// パス: src/bin/ognl-repl.rs
// 役割: 引数を解釈し、ログを初期化して REPL を起動する実行ファイル
// 意図: 起動時の致命的な失敗は標準エラーへ 1 行で報告し、終了コード 1 で終える
// 関連ファイル: src/cli.rs, src/repl/bootstrap.rs
use clap::Parser;
use ognl_repl::cli::{self, Cli};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    // RUST_LOG が無ければ warn 以上のみ
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        eprintln!("ognl-repl: {e}");
        std::process::exit(1);
    }
}
