use std::process;

use anyhow::Result;
use tracing::error;

use rspbuilder::cli;
use rspbuilder::executor::RealCommandExecutor;
use rspbuilder::listener::{BuildResult, TracingListener};

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    match &args.command {
        cli::Commands::Build(opts) => {
            rspbuilder::init_logging(opts.log_level)?;
            let executor = RealCommandExecutor {
                dry_run: opts.dry_run,
            };
            let listener = TracingListener::new();
            match rspbuilder::run_build(opts, &executor, &listener) {
                Ok(BuildResult::Success) => {}
                Ok(BuildResult::Failure) => process::exit(1),
                Err(e) => {
                    error!("{:#}", e);
                    process::exit(1);
                }
            }
        }
        cli::Commands::Validate(opts) => {
            rspbuilder::init_logging(opts.log_level)?;
            if let Err(e) = rspbuilder::run_validate(opts) {
                error!("{:#}", e);
                process::exit(1);
            }
        }
        cli::Commands::Completions(opts) => {
            rspbuilder::generate_completions(opts.shell, &mut std::io::stdout());
        }
    }

    Ok(())
}
