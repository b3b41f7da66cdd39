#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Test-stand monitor binary: config loading, logging setup, dispatch.

mod cli;
mod error_fmt;
mod monitor;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::{Result, WrapErr};
use std::path::Path;

fn main() {
    let code = match real_main() {
        Ok(()) => 0,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn real_main() -> Result<()> {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    color_eyre::install()?;

    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("read config {}", args.config.display()))?;
    let cfg = teststand_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", args.config.display()))?;
    cfg.validate()?;

    let level = cfg.logging.level.as_deref().unwrap_or(&args.log_level);
    init_logging(args.json, level, cfg.logging.file.as_deref());

    match args.cmd {
        Commands::Monitor { ticks, tick_ms, out } => {
            monitor::run_monitor(&cfg, ticks, tick_ms, out.as_deref(), args.json)
        }
        Commands::SelfCheck => monitor::run_self_check(&cfg),
    }
}

/// Console logs go to stderr so stdout stays clean for readings; an
/// optional JSONL log file comes from `[logging] file` in the config.
fn init_logging(json: bool, level: &str, file: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if let Some(path) = file {
        let path = Path::new(path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let name = path.file_name().unwrap_or(path.as_os_str());
        let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        if json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(writer))
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
    } else if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
