//! Process environment for child commands.
//!
//! Every command of a build run receives the same environment: a copy of the
//! host's ambient environment with `DEBIAN_FRONTEND` forced to
//! `noninteractive`, so apt and debconf never stop to ask a question.

use std::collections::BTreeMap;
use std::ffi::OsString;

use tracing::warn;

use crate::error::RspbuilderError;

/// Variable forcing debconf-aware tools to run without prompting.
pub const NONINTERACTIVE_KEY: &str = "DEBIAN_FRONTEND";
/// Value of [`NONINTERACTIVE_KEY`] applied to every child command.
pub const NONINTERACTIVE_VALUE: &str = "noninteractive";

/// An environment mapping handed to child processes.
pub type Environment = BTreeMap<String, String>;

/// Source of the host's ambient environment.
pub trait EnvSource {
    /// Returns the ambient environment of the host build.
    fn environment(&self) -> Result<Environment, RspbuilderError>;
}

/// Reads the environment of the current process.
///
/// Variables whose name or value is not valid UTF-8 cannot be handed to a
/// child through [`Environment`]; they are skipped with a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn environment(&self) -> Result<Environment, RspbuilderError> {
        Ok(utf8_entries(std::env::vars_os()))
    }
}

/// Collects the UTF-8 entries of `vars`, dropping the rest.
fn utf8_entries(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Environment {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                warn!("skipping environment variable {}: value is not valid UTF-8", key);
                None
            }
            (Err(key), _) => {
                warn!("skipping environment variable {:?}: name is not valid UTF-8", key);
                None
            }
        })
        .collect()
}

/// A fixed environment, for hosts that supply their own mapping.
impl EnvSource for Environment {
    fn environment(&self) -> Result<Environment, RspbuilderError> {
        Ok(self.clone())
    }
}

/// Derives the child-process environment from the host environment.
///
/// The input is left untouched; the returned mapping is an independent copy
/// with the non-interactive override applied.
pub fn prepare_env(host_env: &Environment) -> Environment {
    let mut env = host_env.clone();
    env.insert(NONINTERACTIVE_KEY.to_string(), NONINTERACTIVE_VALUE.to_string());
    env
}
