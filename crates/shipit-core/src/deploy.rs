//! Remote deployment: runs the repository's docker scripts over SSH.

use std::io::{self, Write};

use thiserror::Error;

use crate::process::{ProcessError, ProcessRunner, Streams};
use crate::target::SshTarget;
use crate::validate::{self, ValidationError};

/// Location of the deployment scripts inside a repository.
pub const SCRIPT_DIR: &str = "scripts/docker";

/// Scripts executed in order; the first failure stops the run.
pub const DEPLOY_SCRIPTS: [&str; 3] = ["prerun.sh", "run.sh", "postrun.sh"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Remote repository directory, e.g. `~/shipit-repo-abc123`.
    pub dir: String,
    pub host: String,
    pub user: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("--dir is required")]
    MissingDir,

    #[error("--host cannot be empty")]
    EmptyHost,

    #[error("invalid deploy target")]
    Target(#[from] ValidationError),

    #[error("refusing to use remote directory {0:?}: unsupported characters")]
    UnsafeDir(String),

    #[error("deploy script {script} failed on {target}")]
    Script {
        script: String,
        target: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to write progress output")]
    Output(#[source] io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    /// Remote script paths that completed successfully.
    pub completed: Vec<String>,
}

/// Executes [`DEPLOY_SCRIPTS`] on a remote host via `ssh`.
#[derive(Debug)]
pub struct DeployService<R> {
    runner: R,
}

impl<R: ProcessRunner> DeployService<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn run(
        &self,
        request: &DeployRequest,
        streams: &mut Streams<'_>,
    ) -> Result<DeployReport, DeployError> {
        let dir = request.dir.trim();
        if dir.is_empty() {
            return Err(DeployError::MissingDir);
        }
        if !is_safe_remote_dir(dir) {
            return Err(DeployError::UnsafeDir(request.dir.clone()));
        }
        let host = request.host.trim();
        if host.is_empty() {
            return Err(DeployError::EmptyHost);
        }

        let mut target = SshTarget::new(host);
        if let Some(user) = &request.user {
            target = target.with_user(user.trim());
        }
        validate::validate_target(&target)?;
        let address = target.address();

        let mut report = DeployReport::default();
        for script in script_paths(dir) {
            writeln!(streams.out, "Running {script} on {address}").map_err(DeployError::Output)?;
            self.runner
                .run("ssh", &[address.clone(), script.clone()], streams)
                .map_err(|source| DeployError::Script {
                    script: script.clone(),
                    target: address.clone(),
                    source,
                })?;
            tracing::info!(script = %script, target = %address, "deploy script finished");
            report.completed.push(script);
        }

        Ok(report)
    }
}

/// Remote paths of the deploy scripts below `dir`.
pub fn script_paths(dir: &str) -> Vec<String> {
    let dir = dir.trim_end_matches('/');
    DEPLOY_SCRIPTS
        .iter()
        .map(|script| format!("{dir}/{SCRIPT_DIR}/{script}"))
        .collect()
}

// The path is interpreted by the remote shell, so only a leading `~` and
// plain path characters are let through.
fn is_safe_remote_dir(dir: &str) -> bool {
    let rest = dir.strip_prefix('~').unwrap_or(dir);
    rest.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-'))
}
