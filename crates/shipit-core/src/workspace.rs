//! Disposable local workspaces for cloned repositories.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name prefix of every workspace directory, locally and on the remote host.
///
/// Cleanup refuses to touch directories without it.
pub const WORKSPACE_PREFIX: &str = "shipit-repo-";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("temp dir creation failed in {}", root.display())]
    Create {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to resolve absolute path of {}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Whether a directory base name marks a shipit workspace.
pub fn is_workspace_name(name: &str) -> bool {
    name.starts_with(WORKSPACE_PREFIX)
}

/// A uniquely named directory allocated under a temp root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    temp_dir: PathBuf,
    abs_path: PathBuf,
}

impl Workspace {
    /// Allocate a new workspace under `root`.
    ///
    /// The directory is created on disk and left in place; it is not removed
    /// on drop.
    pub fn allocate_in(root: &Path) -> Result<Self, WorkspaceError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|source| WorkspaceError::Create {
                root: root.to_path_buf(),
                source,
            })?
            .keep();

        let abs_path = std::path::absolute(&temp_dir).map_err(|source| WorkspaceError::Resolve {
            path: temp_dir.clone(),
            source,
        })?;

        tracing::debug!(path = %abs_path.display(), "allocated workspace");
        Ok(Self { temp_dir, abs_path })
    }

    /// Path as returned by the allocator.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Base name of the workspace directory.
    pub fn name(&self) -> String {
        self.abs_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Remove the (still empty) directory entry so that `git clone` can
    /// create it.
    pub fn remove_placeholder(&self) -> io::Result<()> {
        std::fs::remove_dir(&self.temp_dir)
    }
}
