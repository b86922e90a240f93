use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use trawl_common::observability::{LogConfig, LogFormat, default_filter_for, init_logging};
use trawl_config::{TrawlConfig, TrawlConfigLoader};

mod cli;
mod plan;
mod run;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            // Logging may not be up yet when config or argument checks fail.
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let common = cli.command.common();

    // 1) Config first so logging can honour the file's settings.
    let loader = match &common.config {
        Some(path) => TrawlConfigLoader::new().with_file(path),
        None => TrawlConfigLoader::new().with_discovered_file(),
    };
    let cfg = loader.load()?;

    // 2) Logging: -q/-v beat --log-level, which beats the config file.
    init_logging(log_config(&cfg, common))?;

    // 3) Ctrl-C cancels the pager; whatever was accepted still gets written.
    let cancel = CancellationToken::new();
    let interrupted = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; wrapping up after the current batch");
            interrupted.cancel();
        }
    });

    match &cli.command {
        Command::Twitter(args) => {
            let plan = plan::TwitterPlan::resolve(args, &cfg)?;
            if args.common.dry_run {
                println!("{plan}");
                return Ok(ExitCode::SUCCESS);
            }
            run::run_twitter(plan, &cfg, cancel).await
        }
        Command::Tiktok(args) => {
            let plan = plan::TikTokPlan::resolve(args, &cfg)?;
            if args.common.dry_run {
                println!("{plan}");
                return Ok(ExitCode::SUCCESS);
            }
            run::run_tiktok(plan, &cfg, cancel).await
        }
    }
}

fn log_config(cfg: &TrawlConfig, common: &cli::CommonArgs) -> LogConfig {
    let default_filter = if common.quiet || common.verbose {
        default_filter_for(common.quiet, common.verbose)
    } else {
        let level = common
            .log_level
            .as_deref()
            .or(cfg.logging.level.as_deref())
            .unwrap_or("info");
        match level {
            "debug" => "debug",
            "warning" | "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    };
    LogConfig {
        app_name: "trawl",
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: true,
        format: match cfg.logging.format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        },
        default_filter,
    }
}
