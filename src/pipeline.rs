//! Pipeline orchestrator for one pbuilder build.
//!
//! A build runs five stages strictly in order:
//!
//! 1. **install-tools**: make sure `build-essential`, `devscripts` and `pbuilder` are installed
//! 2. **stage-output-dir**: wipe and recreate the output directory
//! 3. **build-source**: `dpkg-source -b` the workspace into the output directory
//! 4. **create-base**: `pbuilder --create` a fresh build-root image
//! 5. **build-packages**: `pbuilder --build` every `.dsc` produced by stage 3
//!
//! The first non-zero exit code or I/O fault ends the run; nothing is retried.
//! The build-root image is recreated on every run.

use camino::{Utf8Path, Utf8PathBuf};
use strum::Display;
use tracing::{debug, info, warn};

use crate::args::{CommandArgsBuilder, FlagValueStyle};
use crate::config::BuildConfig;
use crate::env::Environment;
use crate::error::RspbuilderError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::listener::{BuildListener, BuildResult};
use crate::reporter;
use crate::workspace::{self, GlobPattern, Workspace};

/// Prefix of every line the orchestrator writes to the build log.
pub const LOG_PREFIX: &str = "[pbuilder]";
/// File name prefix of the build-root image.
pub const BASE_TGZ_PREFIX: &str = "pbuilder-base";
/// Packages that make up the build toolchain.
pub const TOOLCHAIN_PACKAGES: &[&str] = &["build-essential", "devscripts", "pbuilder"];
/// Package-description files picked up by the build stage.
pub const DSC_PATTERN: &str = "*.dsc";

/// Stage of a build run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    InstallTools,
    StageOutputDir,
    BuildSource,
    CreateBase,
    BuildPackages,
}

/// Returns the build-root image path for `distribution` inside `output_dir`.
pub fn base_tgz_path(output_dir: &Utf8Path, distribution: &str) -> Utf8PathBuf {
    output_dir.join(format!("{}-{}.tgz", BASE_TGZ_PREFIX, distribution))
}

/// Command installing the build toolchain.
pub fn install_tools_command(config: &BuildConfig) -> CommandSpec {
    let mut args = CommandArgsBuilder::new();
    args.push_arg("install").push_arg("-y");
    for package in TOOLCHAIN_PACKAGES {
        args.push_arg(package);
    }
    CommandSpec::new("apt-get", args.into_args()).with_privilege(config.privilege.method())
}

/// Command building the source package of `workspace_root`.
///
/// The output directory itself and the configured ignore list are excluded
/// from the generated source archive.
pub fn build_source_command(
    config: &BuildConfig,
    workspace_root: &Utf8Path,
    output_dir: &Utf8Path,
) -> CommandSpec {
    let output_name = output_dir.file_name().unwrap_or(config.output_dir_name.as_str());
    let mut args = CommandArgsBuilder::new();
    args.push_arg("-b")
        .push_flag_value("-I", output_name, FlagValueStyle::Joined)
        .push_flag_values("-I", &config.ignore, FlagValueStyle::Joined)
        .push_arg(workspace_root);
    CommandSpec::new("dpkg-source", args.into_args())
}

/// Command creating the build-root image at `base_tgz`.
pub fn create_base_command(config: &BuildConfig, base_tgz: &Utf8Path) -> CommandSpec {
    let mut args = CommandArgsBuilder::new();
    args.push_arg("--create")
        .push_flag_value("--basetgz", base_tgz, FlagValueStyle::Separate)
        .push_flag_value("--mirror", &config.mirror, FlagValueStyle::Separate)
        .push_flag_value("--distribution", &config.distribution, FlagValueStyle::Separate);
    CommandSpec::new("pbuilder", args.into_args()).with_privilege(config.privilege.method())
}

/// Command building the binary packages described by `dsc`.
pub fn build_package_command(
    config: &BuildConfig,
    base_tgz: &Utf8Path,
    output_dir: &Utf8Path,
    dsc: &Utf8Path,
) -> CommandSpec {
    let mut args = CommandArgsBuilder::new();
    args.push_arg("--build")
        .push_flag_value("--basetgz", base_tgz, FlagValueStyle::Separate)
        .push_flag_value("--buildresult", output_dir, FlagValueStyle::Separate)
        .push_arg(dsc);
    CommandSpec::new("pbuilder", args.into_args()).with_privilege(config.privilege.method())
}

/// Pipeline orchestrator for one build run.
///
/// Borrows everything it needs from the caller; one pipeline owns the
/// output directory exclusively for the duration of [`Pipeline::run`].
pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    env: &'a Environment,
    workspace: &'a dyn Workspace,
    executor: &'a dyn CommandExecutor,
    listener: &'a dyn BuildListener,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a BuildConfig,
        env: &'a Environment,
        workspace: &'a dyn Workspace,
        executor: &'a dyn CommandExecutor,
        listener: &'a dyn BuildListener,
    ) -> Self {
        Self {
            config,
            env,
            workspace,
            executor,
            listener,
        }
    }

    /// Runs every stage in order and returns the files found in the output
    /// directory afterwards.
    pub fn run(&self) -> Result<Vec<Utf8PathBuf>, RspbuilderError> {
        let root = self.workspace.root().to_owned();

        self.enter(Stage::InstallTools);
        self.run_command(install_tools_command(self.config).with_cwd(&root))?;

        self.enter(Stage::StageOutputDir);
        let output_dir = self.stage_output_dir()?;

        self.enter(Stage::BuildSource);
        let source = build_source_command(self.config, &root, &output_dir).with_cwd(&output_dir);
        self.run_command(source)?;

        self.enter(Stage::CreateBase);
        let base_tgz = base_tgz_path(&output_dir, &self.config.distribution);
        self.run_command(create_base_command(self.config, &base_tgz).with_cwd(&root))?;

        self.enter(Stage::BuildPackages);
        let dscs = self.workspace.list(&output_dir, &GlobPattern::new(DSC_PATTERN)?)?;
        if dscs.is_empty() {
            warn!("no {} files found in {}", DSC_PATTERN, output_dir);
        }
        for (index, dsc) in dscs.iter().enumerate() {
            info!("building package {}/{}: {}", index + 1, dscs.len(), dsc);
            let spec =
                build_package_command(self.config, &base_tgz, &output_dir, dsc).with_cwd(&root);
            self.run_command(spec)?;
        }

        self.list_outputs(&output_dir)
    }

    fn enter(&self, stage: Stage) {
        info!(stage = %stage, "entering stage");
    }

    fn stage_output_dir(&self) -> Result<Utf8PathBuf, RspbuilderError> {
        let path = self.workspace.child(&self.config.output_dir_name);
        self.listener
            .log(&format!("{} Cleaning outputDir \"{}\"", LOG_PREFIX, path));
        workspace::stage_output_dir(self.workspace, &self.config.output_dir_name)
    }

    fn list_outputs(&self, output_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RspbuilderError> {
        let files = self.workspace.list(output_dir, &GlobPattern::new("*")?)?;
        for file in &files {
            let name = file.file_name().unwrap_or(file.as_str());
            self.listener.log(&format!("{} output: {}", LOG_PREFIX, name));
        }
        Ok(files)
    }

    /// Echoes and runs one command, failing on a launch fault or non-zero exit.
    fn run_command(&self, spec: CommandSpec) -> Result<(), RspbuilderError> {
        let spec = spec.with_env(self.env.clone());
        let command_line = spec.command_line();
        self.listener.log(&format!("{} $ {}", LOG_PREFIX, command_line));
        debug!(cwd = ?spec.cwd, "executing: {}", command_line);

        let result = self
            .executor
            .execute(&spec, self.listener)
            .map_err(|e| match e.downcast::<RspbuilderError>() {
                Ok(err) => err,
                Err(e) => RspbuilderError::Execution {
                    command: command_line.clone(),
                    status: format!("{:#}", e),
                },
            })?;

        if !result.success() {
            return Err(RspbuilderError::CommandFailed {
                command: command_line,
                code: result.code(),
            });
        }
        Ok(())
    }
}

/// Runs a complete build and records its outcome on `listener`.
///
/// Never fails: every fault is turned into a logged diagnostic and
/// [`BuildResult::Failure`].
pub fn run(
    config: &BuildConfig,
    env: &Environment,
    workspace: &dyn Workspace,
    executor: &dyn CommandExecutor,
    listener: &dyn BuildListener,
) -> BuildResult {
    let outcome = Pipeline::new(config, env, workspace, executor, listener).run();
    reporter::report(outcome.map(|_| ()), listener)
}
