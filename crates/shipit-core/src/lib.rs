//! Shipit Core Library
//!
//! Clones repositories into disposable temp directories, copies them to a
//! remote test host, runs deployment scripts there and cleans up afterwards.
//! All transport is delegated to the installed `git`, `scp` and `ssh`
//! binaries through the [`process::ProcessRunner`] seam.

pub mod clean;
pub mod clone;
pub mod config;
pub mod deploy;
pub mod process;
pub mod target;
pub mod validate;
pub mod workspace;

/// Re-exports of commonly used types
pub mod prelude {
    // Services
    pub use crate::clean::{CleanError, CleanReport, CleanRequest, CleanService};
    pub use crate::clone::{
        CloneError, CloneReport, CloneRequest, CloneService, CopyTarget, PipelineError, Stage,
    };
    pub use crate::deploy::{DeployError, DeployReport, DeployRequest, DeployService};

    // Configuration
    pub use crate::config::{ConfigStore, ShipitConfig};

    // Building blocks
    pub use crate::process::{ProcessError, ProcessRunner, Streams, SystemRunner};
    pub use crate::target::{DEFAULT_HOST, SshTarget};
    pub use crate::validate::{InvalidValue, RepoUrl, ValidationError};
    pub use crate::workspace::{WORKSPACE_PREFIX, Workspace, WorkspaceError};
}
