//! redfox - concurrent credential-auditing engine
//!
//! For use only against systems you are authorized to test.

mod cli;
mod commands;
mod config;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

const BANNER: &str = r#"
               _  __
  _ _ ___  __| |/ _|_____ __
 | '_/ -_)/ _` |  _/ _ \ \ /
 |_| \___|\__,_|_| \___/_\_\
"#;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let level = logging::level_for(cli.verbose, &config.general.log_level);
    let _guard = logging::init(&level, config.general.log_file.as_deref())?;

    if !cli.quiet {
        eprintln!("{BANNER}");
        eprintln!("  redfox v{} - authorized testing only\n", env!("CARGO_PKG_VERSION"));
    }

    match cli.command {
        Command::Scan(args) => commands::scan(args, &config).await,
        Command::Benchmark(args) => commands::benchmark(args, &config).await,
        Command::Validate(args) => commands::validate(args, &config).await,
        Command::ListWordlists => commands::list_wordlists(&config),
    }
}
