//! Workspace handle and output directory staging.
//!
//! The [`Workspace`] trait is the filesystem surface the pipeline needs from
//! the host: existence checks, recursive delete, directory creation, filtered
//! listing and child-path resolution. [`LocalWorkspace`] implements it on the
//! local filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::{debug, info};

use crate::error::RspbuilderError;

/// Glob-style file name filter supporting `*` and `?`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compiles a glob pattern such as `*.dsc`.
    pub fn new(pattern: &str) -> Result<Self, RspbuilderError> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => source.push_str("[^/]*"),
                '?' => source.push_str("[^/]"),
                _ => source.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            RspbuilderError::Validation(format!("invalid file pattern {:?}: {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if `name` matches the pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Filesystem operations the pipeline performs on the build workspace.
pub trait Workspace {
    /// The workspace root holding the project's source tree.
    fn root(&self) -> &Utf8Path;

    /// Resolves `name` beneath the workspace root.
    fn child(&self, name: &str) -> Utf8PathBuf {
        self.root().join(name)
    }

    /// Returns true if `path` exists (without following a final symlink).
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Deletes `path` and everything beneath it.
    fn remove_recursive(&self, path: &Utf8Path) -> Result<(), RspbuilderError>;

    /// Creates `path` and any missing parents.
    fn create_dir_all(&self, path: &Utf8Path) -> Result<(), RspbuilderError>;

    /// Lists the entries of `dir` whose file name matches `pattern`.
    ///
    /// Entries are returned sorted by file name.
    fn list(
        &self,
        dir: &Utf8Path,
        pattern: &GlobPattern,
    ) -> Result<Vec<Utf8PathBuf>, RspbuilderError>;
}

/// Workspace on the local filesystem.
///
/// When `dry_run` is true, deletions and directory creation are logged
/// but not performed.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: Utf8PathBuf,
    dry_run: bool,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Workspace for LocalWorkspace {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn remove_recursive(&self, path: &Utf8Path) -> Result<(), RspbuilderError> {
        if self.dry_run {
            info!("dry run: would remove {}", path);
            return Ok(());
        }

        let metadata = path
            .symlink_metadata()
            .map_err(|e| RspbuilderError::io(format!("failed to read metadata: {}", path), e))?;
        let result = if metadata.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        result.map_err(|e| RspbuilderError::io(format!("failed to remove {}", path), e))?;
        debug!("removed {}", path);
        Ok(())
    }

    fn create_dir_all(&self, path: &Utf8Path) -> Result<(), RspbuilderError> {
        if self.dry_run {
            info!("dry run: would create directory {}", path);
            return Ok(());
        }

        std::fs::create_dir_all(path)
            .map_err(|e| RspbuilderError::io(format!("failed to create directory {}", path), e))?;
        debug!("created directory {}", path);
        Ok(())
    }

    fn list(
        &self,
        dir: &Utf8Path,
        pattern: &GlobPattern,
    ) -> Result<Vec<Utf8PathBuf>, RspbuilderError> {
        if self.dry_run && !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = dir
            .read_dir_utf8()
            .map_err(|e| RspbuilderError::io(format!("failed to list {}", dir), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| RspbuilderError::io(format!("failed to list {}", dir), e))?;
            if pattern.matches(entry.file_name()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Prepares an empty output directory `name` under the workspace root.
///
/// An existing directory (or file) at that path is removed recursively first.
/// Any fault during deletion or creation is returned; a partially staged
/// directory is never reported as success.
pub fn stage_output_dir(
    workspace: &dyn Workspace,
    name: &str,
) -> Result<Utf8PathBuf, RspbuilderError> {
    let path = workspace.child(name);
    if workspace.exists(&path) {
        workspace.remove_recursive(&path)?;
    }
    workspace.create_dir_all(&path)?;
    Ok(path)
}
