//! Clone pipeline: validate, allocate a workspace, `git clone` into it and
//! copy the result to the remote host's home directory with `scp`.

use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::process::{ProcessError, ProcessRunner, Streams};
use crate::target::SshTarget;
use crate::validate::{self, ValidationError};
use crate::workspace::{Workspace, WorkspaceError};

/// Raw inputs for one clone invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    pub url: String,
    pub host: String,
    pub user: String,
}

impl CloneRequest {
    pub fn new(url: impl Into<String>, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
            user: user.into(),
        }
    }
}

/// Where a workspace ends up on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    /// Home-relative directory, e.g. `~/shipit-repo-abc123`.
    pub remote_dir: String,
    /// `user@host`.
    pub target_host: String,
    /// `user@host:~`.
    pub scp_destination: String,
}

impl CopyTarget {
    pub fn new(workspace: &Workspace, target: &SshTarget) -> Self {
        Self {
            remote_dir: format!("~/{}", workspace.name()),
            target_host: target.address(),
            scp_destination: target.scp_home(),
        }
    }
}

/// Pipeline progress, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Validated,
    WorkspaceReady,
    Cloned,
    Copied,
    Done,
}

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("failed to prepare {} for clone", path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repo: invalid request")]
    Validation(#[from] ValidationError),

    #[error("repo: temp dir creation failed")]
    Workspace(#[from] WorkspaceError),

    #[error("repo: clone repository failed")]
    Clone(#[source] CloneError),

    #[error("repo: copy repository to {destination} failed")]
    Copy {
        destination: String,
        #[source]
        source: ProcessError,
    },

    #[error("repo: failed to write progress output")]
    Output {
        /// Stage reached when the write failed.
        stage: Stage,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// Last stage the pipeline completed before failing.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Start,
            Self::Workspace(_) => Stage::Validated,
            Self::Clone(_) => Stage::WorkspaceReady,
            Self::Copy { .. } => Stage::Cloned,
            Self::Output { stage, .. } => *stage,
        }
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct CloneReport {
    pub workspace: Workspace,
    pub copy_target: CopyTarget,
}

/// Runs the clone pipeline against a [`ProcessRunner`].
#[derive(Debug)]
pub struct CloneService<R> {
    runner: R,
    temp_root: PathBuf,
}

impl<R: ProcessRunner> CloneService<R> {
    /// Service allocating workspaces under the OS temp directory.
    pub fn new(runner: R) -> Self {
        Self::with_temp_root(runner, std::env::temp_dir())
    }

    pub fn with_temp_root(runner: R, temp_root: PathBuf) -> Self {
        Self { runner, temp_root }
    }

    /// Run the pipeline to completion or to the first failure.
    ///
    /// Nothing is rolled back: a failed copy leaves the local clone on disk.
    pub fn run(
        &self,
        request: &CloneRequest,
        streams: &mut Streams<'_>,
    ) -> Result<CloneReport, PipelineError> {
        let mut stage = Stage::Start;
        tracing::debug!(?stage, url = %request.url, "starting clone pipeline");

        validate::validate_host(&request.host)?;
        validate::validate_user(&request.user)?;
        validate::validate_url(&request.url)?;
        stage = advance(stage, Stage::Validated);

        let workspace = Workspace::allocate_in(&self.temp_root)?;
        let target = SshTarget::new(request.host.trim()).with_user(request.user.trim());
        let copy_target = CopyTarget::new(&workspace, &target);
        stage = advance(stage, Stage::WorkspaceReady);

        // git clone expects the destination path not to exist
        workspace.remove_placeholder().map_err(|source| {
            PipelineError::Clone(CloneError::Prepare {
                path: workspace.temp_dir().to_path_buf(),
                source,
            })
        })?;
        let clone_args = vec![
            "clone".to_string(),
            "--".to_string(),
            request.url.trim().to_string(),
            workspace.temp_dir().display().to_string(),
        ];
        self.runner
            .run("git", &clone_args, streams)
            .map_err(|err| PipelineError::Clone(err.into()))?;
        stage = advance(stage, Stage::Cloned);

        writeln!(
            streams.out,
            "\nCopying repository to {}:{}",
            copy_target.target_host, copy_target.remote_dir
        )
        .map_err(|source| PipelineError::Output { stage, source })?;
        let copy_args = vec![
            "-r".to_string(),
            workspace.abs_path().display().to_string(),
            copy_target.scp_destination.clone(),
        ];
        self.runner
            .run("scp", &copy_args, streams)
            .map_err(|source| PipelineError::Copy {
                destination: copy_target.scp_destination.clone(),
                source,
            })?;
        stage = advance(stage, Stage::Copied);

        write!(
            streams.out,
            "\nRepository copied successfully\n\nRun:\n  cd {}\n",
            workspace.abs_path().display()
        )
        .map_err(|source| PipelineError::Output { stage, source })?;
        advance(stage, Stage::Done);

        Ok(CloneReport {
            workspace,
            copy_target,
        })
    }
}

fn advance(from: Stage, to: Stage) -> Stage {
    tracing::debug!(?from, ?to, "clone pipeline stage");
    to
}
