use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "migrate")]
#[command(about = "Run a staged raw -> staging -> output migration described by a TOML config")]
pub struct CliArgs {
    /// Path to the migration config (TOML)
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit diagnostics as JSON lines on stderr")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage after each stage")]
    pub monitor: bool,
}
