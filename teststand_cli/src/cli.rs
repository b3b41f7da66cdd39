//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "teststand", version, about = "Test-stand sensor monitor CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/teststand.toml")]
    pub config: PathBuf,

    /// Emit readings and errors as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll all configured channels and print conditioned readings
    Monitor {
        /// Stop after this many poll cycles (runs until Ctrl-C if omitted)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override the poll period from the config (takes precedence)
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Write every reading as a JSON line to this file on exit
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
