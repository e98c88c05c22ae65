//! Build configuration.
//!
//! Users supply three strings (mirror, distribution, output directory name);
//! any of them left empty falls back to a fixed default. [`resolve`] applies
//! those defaults, and [`Profile`] carries the raw values loaded from YAML.

use std::fs::File;
use std::io::BufReader;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RspbuilderError;
use crate::privilege::Privilege;

/// Mirror used when none is configured.
pub const DEFAULT_MIRROR: &str = "http://http.us.debian.org/debian";
/// Distribution used when none is configured.
pub const DEFAULT_DISTRIBUTION: &str = "unstable";
/// Output directory name used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "hudson-output";
/// Version-control directories excluded from the source package by default.
pub const DEFAULT_IGNORE: &[&str] = &["CVS", ".svn", ".git"];

/// URL schemes apt can fetch from and pbuilder accepts as a mirror.
const MIRROR_SCHEMES: &[&str] = &["http", "https", "ftp", "file"];

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Effective configuration of one build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Package mirror handed to `pbuilder --create`.
    pub mirror: String,
    /// Target distribution codename.
    pub distribution: String,
    /// Output directory name, relative to the workspace root.
    pub output_dir_name: String,
    /// Directory names excluded from the source package, after the output directory.
    pub ignore: Vec<String>,
    /// Privilege escalation for the root-only steps.
    pub privilege: Privilege,
}

impl BuildConfig {
    /// Replaces the ignore list.
    #[must_use]
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Sets the privilege escalation for the root-only steps.
    #[must_use]
    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }
}

/// Resolves the three user-supplied strings into a [`BuildConfig`].
///
/// Each empty input is replaced by its default; non-empty inputs pass
/// through unchanged.
pub fn resolve(mirror: &str, distribution: &str, output_dir_name: &str) -> BuildConfig {
    BuildConfig {
        mirror: or_default(mirror, DEFAULT_MIRROR),
        distribution: or_default(distribution, DEFAULT_DISTRIBUTION),
        output_dir_name: or_default(output_dir_name, DEFAULT_OUTPUT_DIR),
        ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        privilege: Privilege::default(),
    }
}

/// Build settings as entered by the user.
///
/// Values are kept raw; the accessors resolve defaults on every call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Source tree to build (defaults to the current directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Utf8PathBuf>,
    #[serde(default)]
    pub mirror: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub output_dir: String,
    /// Directory names excluded from the source package (defaults to VCS directories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,
    #[serde(default)]
    pub privilege: Privilege,
}

impl Profile {
    pub fn mirror(&self) -> String {
        or_default(&self.mirror, DEFAULT_MIRROR)
    }

    pub fn distribution(&self) -> String {
        or_default(&self.distribution, DEFAULT_DISTRIBUTION)
    }

    pub fn output_dir(&self) -> String {
        or_default(&self.output_dir, DEFAULT_OUTPUT_DIR)
    }

    /// Returns the effective build configuration.
    pub fn resolve(&self) -> BuildConfig {
        let config = resolve(&self.mirror, &self.distribution, &self.output_dir)
            .with_privilege(self.privilege);
        match &self.ignore {
            Some(ignore) => config.with_ignore(ignore.clone()),
            None => config,
        }
    }

    /// Validates the profile.
    ///
    /// The output directory is deleted recursively at the start of every
    /// build, so it must stay strictly inside the workspace.
    pub fn validate(&self) -> Result<(), RspbuilderError> {
        let mirror = self.mirror();
        let url = Url::parse(&mirror).map_err(|e| {
            RspbuilderError::Validation(format!("mirror '{}' is not a valid URL: {}", mirror, e))
        })?;
        if !MIRROR_SCHEMES.contains(&url.scheme()) {
            return Err(RspbuilderError::Validation(format!(
                "mirror '{}' uses unsupported scheme '{}' (expected one of: {})",
                mirror,
                url.scheme(),
                MIRROR_SCHEMES.join(", ")
            )));
        }

        let distribution = self.distribution();
        if distribution.contains('/') || distribution.chars().any(char::is_whitespace) {
            return Err(RspbuilderError::Validation(format!(
                "distribution '{}' must not contain '/' or whitespace",
                distribution
            )));
        }

        let output_dir = self.output_dir();
        validate_output_dir(Utf8Path::new(&output_dir))?;

        if let Some(ignore) = &self.ignore {
            if let Some(index) = ignore.iter().position(|entry| entry.trim().is_empty()) {
                return Err(RspbuilderError::Validation(format!(
                    "ignore entry {} must not be empty",
                    index + 1
                )));
            }
        }

        Ok(())
    }
}

fn validate_output_dir(path: &Utf8Path) -> Result<(), RspbuilderError> {
    let mut depth = 0;
    for component in path.components() {
        match component {
            Utf8Component::Normal(_) => depth += 1,
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                return Err(RspbuilderError::Validation(format!(
                    "output_dir '{}' must not contain '..'",
                    path
                )));
            }
            Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                return Err(RspbuilderError::Validation(format!(
                    "output_dir '{}' must be relative to the workspace",
                    path
                )));
            }
        }
    }
    if depth == 0 {
        return Err(RspbuilderError::Validation(format!(
            "output_dir '{}' must name a directory inside the workspace",
            path
        )));
    }
    Ok(())
}

/// Loads a profile from a YAML file.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, RspbuilderError> {
    let file = File::open(path).map_err(|e| RspbuilderError::io(path.to_string(), e))?;
    let reader = BufReader::new(file);
    let profile: Profile = serde_yaml::from_reader(reader)
        .map_err(|e| RspbuilderError::Config(format!("failed to parse yaml {}: {}", path, e)))?;
    Ok(profile)
}
