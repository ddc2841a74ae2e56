//! Shipit - clone, copy, deploy and clean up repos on remote test hosts
//!
//! Usage:
//!   shipit repo clone --url <URL> --user <USER>   # clone to a temp dir and scp it
//!   shipit repo clean --all --user <USER>         # remove temp dirs locally and remotely
//!   shipit deploy run --dir <DIR>                 # run scripts/docker/*.sh over ssh

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipit_core::clean::{CleanRequest, CleanService};
use shipit_core::clone::{CloneRequest, CloneService};
use shipit_core::config::{ConfigStore, ShipitConfig};
use shipit_core::deploy::{DeployRequest, DeployService};
use shipit_core::process::{Streams, SystemRunner};
use shipit_core::target::SshTarget;

#[derive(Parser)]
#[command(name = "shipit")]
#[command(about = "Clone, sync, clean, and deploy repos to your remote test hosts", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to <config dir>/shipit/shipit.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repository operations
    Repo(RepoArgs),

    /// Deployment operations
    Deploy(DeployArgs),
}

#[derive(Args)]
struct RepoArgs {
    #[command(subcommand)]
    command: RepoSubcommand,
}

#[derive(Subcommand)]
enum RepoSubcommand {
    /// Clone a repository into a temp directory and copy it to the test host
    ///
    /// Example: shipit repo clone --url https://github.com/foo/bar --user alice
    Clone {
        /// Repository URL to clone
        #[arg(long)]
        url: String,

        /// SSH host (from ~/.ssh/config) whose home directory receives the clone
        #[arg(long)]
        host: Option<String>,

        /// SSH username to use for the remote copy
        #[arg(long)]
        user: Option<String>,
    },

    /// Remove temporary shipit clone directories
    ///
    /// Use --all to remove every shipit-repo-* directory under the temp
    /// directory, or --specific-dir to delete a single one. Provide --user
    /// (and optionally --host) to delete the same directories on the test
    /// host via SSH.
    Clean {
        /// Delete all shipit-repo-* directories under the temp directory
        #[arg(long)]
        all: bool,

        /// Delete a specific directory created by shipit repo clone
        #[arg(long)]
        specific_dir: Option<PathBuf>,

        /// SSH host whose home directory should be cleaned up
        #[arg(long)]
        host: Option<String>,

        /// SSH username to use for remote cleanup
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Args)]
struct DeployArgs {
    #[command(subcommand)]
    command: DeploySubcommand,
}

#[derive(Subcommand)]
enum DeploySubcommand {
    /// Run the repository's docker deployment scripts on the remote host
    ///
    /// Executes scripts/docker/prerun.sh, run.sh and postrun.sh (in that
    /// order) below --dir over SSH.
    Run {
        /// Remote path to the repository containing scripts/docker
        #[arg(long)]
        dir: String,

        /// SSH host to execute the deployment scripts on
        #[arg(long)]
        host: Option<String>,

        /// SSH username to use for remote execution
        #[arg(long)]
        user: Option<String>,
    },
}

/// Used when `RUST_LOG` is unset: info for both shipit crates, warn elsewhere.
const DEFAULT_LOG_FILTER: &str = "shipit=info,warn";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;

    run_cli(cli.command, &config)
}

fn load_config(path: Option<PathBuf>) -> Result<ShipitConfig> {
    let store = match path {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_location()?,
    };
    store.load()
}

fn run_cli(command: Commands, config: &ShipitConfig) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut streams = Streams::new(&mut stdout, &mut stderr);

    match command {
        Commands::Repo(args) => match args.command {
            RepoSubcommand::Clone { url, host, user } => {
                let request = clone_request(config, url, host, user);
                let service = CloneService::with_temp_root(SystemRunner, config.temp_root());
                service.run(&request, &mut streams)?;
            }
            RepoSubcommand::Clean {
                all,
                specific_dir,
                host,
                user,
            } => {
                let request = clean_request(config, all, specific_dir, host, user)?;
                let service = CleanService::with_temp_root(SystemRunner, config.temp_root());
                let report = service.run(&request, &mut streams)?;
                tracing::debug!(
                    removed = report.removed.len(),
                    skipped = report.skipped.len(),
                    remote = report.remote_commands.len(),
                    "cleanup finished"
                );
            }
        },
        Commands::Deploy(args) => match args.command {
            DeploySubcommand::Run { dir, host, user } => {
                let request = DeployRequest {
                    dir,
                    host: config.resolve_host(host.as_deref()),
                    user: config.resolve_user(user.as_deref()),
                };
                DeployService::new(SystemRunner).run(&request, &mut streams)?;
            }
        },
    }
    Ok(())
}

fn clone_request(
    config: &ShipitConfig,
    url: String,
    host: Option<String>,
    user: Option<String>,
) -> CloneRequest {
    CloneRequest::new(
        url,
        config.resolve_host(host.as_deref()),
        config.resolve_user(user.as_deref()).unwrap_or_default(),
    )
}

fn clean_request(
    config: &ShipitConfig,
    all: bool,
    specific_dir: Option<PathBuf>,
    host: Option<String>,
    user: Option<String>,
) -> Result<CleanRequest> {
    if host.as_deref().is_some_and(|h| h.trim().is_empty()) {
        anyhow::bail!("--host cannot be empty");
    }
    if user.as_deref().is_some_and(|u| u.trim().is_empty()) {
        anyhow::bail!("--user cannot be empty");
    }

    let remote = config
        .resolve_user(user.as_deref())
        .map(|user| SshTarget::new(config.resolve_host(host.as_deref())).with_user(user));

    Ok(CleanRequest {
        all,
        specific_dir,
        remote,
    })
}
