//! Removal of workspace directories, locally and on the remote host.
//!
//! Only directories whose base name starts with [`WORKSPACE_PREFIX`] are ever
//! deleted.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::{ProcessError, ProcessRunner, Streams};
use crate::target::SshTarget;
use crate::validate::{self, ValidationError};
use crate::workspace::{WORKSPACE_PREFIX, is_workspace_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRequest {
    /// Remove every workspace under the temp root.
    pub all: bool,
    /// Remove a single workspace.
    pub specific_dir: Option<PathBuf>,
    /// Repeat the removal in the home directory of this host.
    pub remote: Option<SshTarget>,
}

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("specify either --all or --specific-dir")]
    NothingSelected,

    #[error("refusing to delete {}: not a shipit temp directory", path.display())]
    NotAWorkspace { path: PathBuf },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid remote cleanup target")]
    Target(#[from] ValidationError),

    #[error("remote cleanup via {target} failed")]
    Remote {
        target: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to write progress output")]
    Output(#[source] io::Error),
}

/// What a cleanup run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub remote_commands: Vec<String>,
}

#[derive(Debug)]
pub struct CleanService<R> {
    runner: R,
    temp_root: PathBuf,
}

impl<R: ProcessRunner> CleanService<R> {
    /// Service scanning the OS temp directory.
    pub fn new(runner: R) -> Self {
        Self::with_temp_root(runner, std::env::temp_dir())
    }

    pub fn with_temp_root(runner: R, temp_root: PathBuf) -> Self {
        Self { runner, temp_root }
    }

    pub fn run(
        &self,
        request: &CleanRequest,
        streams: &mut Streams<'_>,
    ) -> Result<CleanReport, CleanError> {
        if !request.all && request.specific_dir.is_none() {
            return Err(CleanError::NothingSelected);
        }
        if let Some(target) = &request.remote {
            validate::validate_target(target)?;
        }

        let mut report = CleanReport::default();

        if request.all {
            self.delete_all_local(streams, &mut report)?;
        }
        if let Some(dir) = &request.specific_dir {
            delete_local_dir(dir, streams, &mut report)?;
        }
        if let Some(target) = &request.remote {
            self.delete_remote(request, target, streams, &mut report)?;
        }

        Ok(report)
    }

    fn delete_all_local(
        &self,
        streams: &mut Streams<'_>,
        report: &mut CleanReport,
    ) -> Result<(), CleanError> {
        let pattern = self.temp_root.join(format!("{WORKSPACE_PREFIX}*"));
        let entries = std::fs::read_dir(&self.temp_root).map_err(|source| CleanError::Io {
            action: "read",
            path: self.temp_root.clone(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CleanError::Io {
                action: "read",
                path: self.temp_root.clone(),
                source,
            })?;
            if is_workspace_name(&entry.file_name().to_string_lossy()) {
                matches.push(entry.path());
            }
        }
        matches.sort();

        if matches.is_empty() {
            writeln!(streams.out, "No directories matching {}", pattern.display())
                .map_err(CleanError::Output)?;
            return Ok(());
        }

        for dir in &matches {
            delete_local_dir(dir, streams, report)?;
        }
        Ok(())
    }

    fn delete_remote(
        &self,
        request: &CleanRequest,
        target: &SshTarget,
        streams: &mut Streams<'_>,
        report: &mut CleanReport,
    ) -> Result<(), CleanError> {
        let mut commands = Vec::new();
        if request.all {
            commands.push(format!("rm -rf ~/{WORKSPACE_PREFIX}*"));
        }
        if let Some(dir) = &request.specific_dir {
            let name = base_name(dir);
            if !is_workspace_name(&name) || !is_plain_name(&name) {
                return Err(CleanError::NotAWorkspace { path: dir.clone() });
            }
            commands.push(format!("rm -rf ~/{name}"));
        }

        let address = target.address();
        for command in commands {
            self.runner
                .run("ssh", &[address.clone(), command.clone()], streams)
                .map_err(|source| CleanError::Remote {
                    target: address.clone(),
                    source,
                })?;
            writeln!(streams.out, "Remote cleanup via {address}: {command}")
                .map_err(CleanError::Output)?;
            report.remote_commands.push(command);
        }
        Ok(())
    }
}

/// Delete one local workspace directory.
///
/// A missing directory is reported and skipped, not treated as an error.
pub fn delete_local_dir(
    dir: &Path,
    streams: &mut Streams<'_>,
    report: &mut CleanReport,
) -> Result<(), CleanError> {
    let abs = std::path::absolute(dir).map_err(|source| CleanError::Io {
        action: "resolve",
        path: dir.to_path_buf(),
        source,
    })?;

    if !is_workspace_name(&base_name(&abs)) {
        return Err(CleanError::NotAWorkspace { path: abs });
    }

    let metadata = match std::fs::metadata(&abs) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %abs.display(), "workspace does not exist");
            writeln!(streams.out, "Directory {} does not exist, skipping", abs.display())
                .map_err(CleanError::Output)?;
            report.skipped.push(abs);
            return Ok(());
        }
        Err(source) => {
            return Err(CleanError::Io {
                action: "stat",
                path: abs,
                source,
            });
        }
    };

    if !metadata.is_dir() {
        return Err(CleanError::NotADirectory { path: abs });
    }

    std::fs::remove_dir_all(&abs).map_err(|source| CleanError::Io {
        action: "remove",
        path: abs.clone(),
        source,
    })?;

    tracing::info!(path = %abs.display(), "removed workspace");
    writeln!(streams.out, "Removed {}", abs.display()).map_err(CleanError::Output)?;
    report.removed.push(abs);
    Ok(())
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Remote names end up in a shell command line.
fn is_plain_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
