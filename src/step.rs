//! The pbuilder build step as seen by a CI host.
//!
//! A host discovers build steps through their [`BuildStepDescriptor`] and
//! runs them through [`BuildStep::perform`].

use strum::{Display, EnumString};

use crate::config::BuildConfig;
use crate::env::{EnvSource, prepare_env};
use crate::executor::CommandExecutor;
use crate::listener::BuildListener;
use crate::pipeline;
use crate::reporter;
use crate::workspace::Workspace;

/// Kind of project a build step may be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ProjectKind {
    FreeStyle,
    MultiConfiguration,
    Pipeline,
}

/// Registration data a host needs to offer a build step.
pub trait BuildStepDescriptor: Send + Sync {
    /// Human-readable name shown when configuring a project.
    fn display_name(&self) -> &str;

    /// Returns true if the step can be used with projects of `kind`.
    fn is_applicable(&self, kind: ProjectKind) -> bool;
}

/// A build action the host runs as part of a build.
pub trait BuildStep {
    fn descriptor(&self) -> &dyn BuildStepDescriptor;

    /// Runs the step.
    ///
    /// Returns true when the step ran to completion. Whether the build passed
    /// is recorded separately on `listener`; hosts must read
    /// [`BuildListener::result`] rather than the return value.
    fn perform(
        &self,
        env_source: &dyn EnvSource,
        workspace: &dyn Workspace,
        executor: &dyn CommandExecutor,
        listener: &dyn BuildListener,
    ) -> bool;
}

/// Descriptor of [`PbuilderStep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PbuilderDescriptor;

impl BuildStepDescriptor for PbuilderDescriptor {
    fn display_name(&self) -> &str {
        "pbuilder (Debian package builder)"
    }

    fn is_applicable(&self, _kind: ProjectKind) -> bool {
        true
    }
}

/// Builds the Debian package in the workspace inside a fresh pbuilder chroot.
#[derive(Debug, Clone)]
pub struct PbuilderStep {
    config: BuildConfig,
}

impl PbuilderStep {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

impl BuildStep for PbuilderStep {
    fn descriptor(&self) -> &dyn BuildStepDescriptor {
        &PbuilderDescriptor
    }

    fn perform(
        &self,
        env_source: &dyn EnvSource,
        workspace: &dyn Workspace,
        executor: &dyn CommandExecutor,
        listener: &dyn BuildListener,
    ) -> bool {
        match env_source.environment() {
            Ok(host_env) => {
                let env = prepare_env(&host_env);
                pipeline::run(&self.config, &env, workspace, executor, listener);
            }
            Err(err) => {
                reporter::report(Err(err), listener);
            }
        }
        true
    }
}
