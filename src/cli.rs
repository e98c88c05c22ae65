use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the Debian package in the workspace with pbuilder
    Build(BuildArgs),

    /// Validate the given YAML profile
    Validate(ValidateArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Path to a YAML profile with the build settings
    #[arg(short, long)]
    pub file: Option<Utf8PathBuf>,

    /// Source tree to build (overrides the profile, defaults to the current directory)
    #[arg(short, long)]
    pub workspace: Option<Utf8PathBuf>,

    /// Package mirror for the build root
    #[arg(long)]
    pub mirror: Option<String>,

    /// Target distribution codename
    #[arg(long)]
    pub distribution: Option<String>,

    /// Output directory name, relative to the workspace
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Do not run, just show what would be done
    #[arg(long)]
    pub dry_run: bool,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the YAML profile to validate
    #[arg(short, long, default_value = "pbuilder.yaml")]
    pub file: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Log verbosity, mapped onto the `tracing` levels of the same name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
