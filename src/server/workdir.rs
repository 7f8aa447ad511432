// src/server/workdir.rs
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DATA_DIR: &str = "data";
const LOGS_DIR: &str = "logs";

/// Working directory backing a single server instance.
///
/// Tracks whether the directory was allocated by the controller (and must
/// be removed on cleanup) or supplied by the caller (and must never be
/// touched beyond creating the `data/` and `logs/` subdirectories).
pub(crate) enum WorkDir {
    /// Allocated by the controller at start time.
    Owned(TempDir),
    /// Supplied by the caller; survives cleanup untouched.
    External(PathBuf),
}

impl WorkDir {
    /// Allocate a fresh uniquely-named temporary directory.
    pub(crate) fn owned() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("es-runner-")
            .tempdir()
            .map_err(|e| {
                Error::WorkDir(format!("Failed to allocate temporary directory: {}", e))
            })?;

        prepare_layout(dir.path())?;
        tracing::debug!(root = %dir.path().display(), "Allocated temporary working directory");
        Ok(Self::Owned(dir))
    }

    /// Use a caller-supplied root directory, creating it and the expected
    /// subdirectories if absent.
    pub(crate) fn external(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::WorkDir(format!(
                "Failed to create root directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        prepare_layout(&root)?;
        tracing::debug!(root = %root.display(), "Using caller-supplied working directory");
        Ok(Self::External(root))
    }

    pub(crate) fn root(&self) -> &Path {
        match self {
            Self::Owned(dir) => dir.path(),
            Self::External(root) => root,
        }
    }

    pub(crate) fn data_path(&self) -> PathBuf {
        self.root().join(DATA_DIR)
    }

    pub(crate) fn logs_path(&self) -> PathBuf {
        self.root().join(LOGS_DIR)
    }

    /// Release the directory. Owned directories are removed recursively;
    /// external directories are left in place, including whatever the
    /// server wrote into them. Removal failures are logged and swallowed
    /// so that teardown always appears to succeed to the caller.
    pub(crate) fn cleanup(self) {
        match self {
            Self::Owned(dir) => {
                let root = dir.path().to_path_buf();
                if let Err(e) = dir.close() {
                    tracing::warn!(
                        root = %root.display(),
                        error = %e,
                        "Failed to remove temporary working directory"
                    );
                } else {
                    tracing::debug!(root = %root.display(), "Removed temporary working directory");
                }
            }
            Self::External(root) => {
                tracing::debug!(root = %root.display(), "Leaving caller-supplied directory in place");
            }
        }
    }
}

fn prepare_layout(root: &Path) -> Result<()> {
    for subdir in [DATA_DIR, LOGS_DIR] {
        let path = root.join(subdir);
        fs::create_dir_all(&path).map_err(|e| {
            Error::WorkDir(format!(
                "Failed to create '{}' directory under '{}': {}",
                subdir,
                root.display(),
                e
            ))
        })?;
    }
    Ok(())
}
