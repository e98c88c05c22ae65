pub mod args;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod listener;
pub mod pipeline;
pub mod privilege;
pub mod reporter;
pub mod step;
pub mod workspace;

pub use error::RspbuilderError;

use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::CommandFactory;
use clap_complete::Shell;
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::config::Profile;
use crate::env::ProcessEnv;
use crate::executor::CommandExecutor;
use crate::listener::{BuildListener, BuildResult};
use crate::step::{BuildStep, PbuilderStep};
use crate::workspace::LocalWorkspace;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Builds the profile for a `build` invocation: the profile file (if any)
/// with command-line flags layered on top.
pub fn profile_from_args(opts: &cli::BuildArgs) -> Result<Profile> {
    let mut profile = match &opts.file {
        Some(path) => config::load_profile(path)
            .with_context(|| format!("failed to load profile from {}", path))?,
        None => Profile::default(),
    };

    if let Some(workspace) = &opts.workspace {
        profile.workspace = Some(workspace.clone());
    }
    if let Some(mirror) = &opts.mirror {
        profile.mirror = mirror.clone();
    }
    if let Some(distribution) = &opts.distribution {
        profile.distribution = distribution.clone();
    }
    if let Some(output_dir) = &opts.output_dir {
        profile.output_dir = output_dir.clone();
    }

    Ok(profile)
}

/// Resolves the workspace root to an absolute path.
fn workspace_root(profile: &Profile) -> Result<Utf8PathBuf> {
    let root = profile
        .workspace
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from("."));
    let canonical = root
        .canonicalize_utf8()
        .with_context(|| format!("failed to resolve workspace {}", root))?;
    if !canonical.is_dir() {
        anyhow::bail!("workspace {} is not a directory", canonical);
    }
    Ok(canonical)
}

/// Runs the pbuilder step for a `build` invocation and returns the recorded outcome.
///
/// Profile and workspace problems are returned as errors before the step
/// starts; everything after that ends up in `listener`.
pub fn run_build(
    opts: &cli::BuildArgs,
    executor: &dyn CommandExecutor,
    listener: &dyn BuildListener,
) -> Result<BuildResult> {
    let profile = profile_from_args(opts)?;
    profile.validate().context("profile validation failed")?;

    let root = workspace_root(&profile)?;
    info!("building {} for {}", root, profile.distribution());

    let workspace = LocalWorkspace::new(root).with_dry_run(opts.dry_run);
    let step = PbuilderStep::new(profile.resolve());
    step.perform(&ProcessEnv, &workspace, executor, listener);

    listener
        .result()
        .context("build step finished without recording a result")
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let profile = config::load_profile(&opts.file)
        .with_context(|| format!("failed to load profile from {}", opts.file))?;
    profile.validate().context("profile validation failed")?;
    info!("validation successful:\n{:#?}", profile.resolve());
    Ok(())
}

pub fn generate_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}
