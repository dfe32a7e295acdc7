use std::io::Write as _;

use clap::Parser;
use colored::Colorize as _;
use sjudge_cli::{cmd::GlobalArgs, style::ColorTheme as _};

#[tokio::main]
async fn main() {
    let app = GlobalArgs::parse();
    init_logger(app.verbose);

    app.exec_subcmd().await.unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    });
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let level = record.level();
            writeln!(
                buf,
                "{} {}",
                format!("[{}]", level).color(level.color()).bold(),
                record.args()
            )
        })
        .init();
}
