use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogOptions;
use crate::params::ParamsBuilder;
use crate::pipeline::{Mode, Settings};
use crate::probe::StatusRange;

const EXIT_CODES: &str = "\
Exit codes:
  0    success
  10   input validation
  20   source retrieval
  30   remote connectivity
  31   file synchronization
  40   remote preparation
  50   remote build
  51   proxy configuration
  60   validation
  130  interrupted";

/// Deploy a Dockerized git repository to a single host behind nginx.
///
/// Any parameter not given as a flag or environment variable is asked
/// for interactively.
#[derive(Debug, Parser)]
#[command(name = "dropship", version, after_help = EXIT_CODES)]
pub struct Cli {
    /// Remove all containers, images, deployed files, and the nginx
    /// site from the remote host instead of deploying
    #[arg(long, conflicts_with = "dry_run")]
    pub cleanup: bool,

    /// Print the deployment plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Never prompt; missing values fail validation
    #[arg(long)]
    pub non_interactive: bool,

    /// Git repository URL
    #[arg(long, env = "DROPSHIP_REPO")]
    pub repo: Option<String>,

    /// Access token for private http(s) repositories
    #[arg(long, env = "DROPSHIP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Branch to deploy [default: main]
    #[arg(long, env = "DROPSHIP_BRANCH")]
    pub branch: Option<String>,

    /// SSH username on the remote host
    #[arg(long, env = "DROPSHIP_USER")]
    pub user: Option<String>,

    /// Remote host (IP or hostname)
    #[arg(long, env = "DROPSHIP_HOST")]
    pub host: Option<String>,

    /// SSH private key path
    #[arg(long, env = "DROPSHIP_KEY")]
    pub key: Option<String>,

    /// Port the application listens on
    #[arg(long, env = "DROPSHIP_PORT")]
    pub port: Option<String>,

    /// Reuse this local directory as the workspace
    #[arg(long, env = "DROPSHIP_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Status codes accepted by the final probe, as MIN-MAX (max
    /// exclusive)
    #[arg(long, default_value = "200-500")]
    pub accept_status: StatusRange,

    /// Directory for the run log
    #[arg(long, env = "DROPSHIP_LOG_DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Show debug output on the terminal
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.cleanup {
            Mode::Cleanup
        } else if self.dry_run {
            Mode::DryRun
        } else {
            Mode::Deploy
        }
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            mode: self.mode(),
            workspace: self.workspace.clone(),
            accept: self.accept_status,
        }
    }

    #[must_use]
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_dir: self.log_dir.clone(),
            verbose: self.verbose,
        }
    }

    /// Parameters given on the command line or in the environment.
    #[must_use]
    pub fn params(&self) -> ParamsBuilder {
        let mut builder = ParamsBuilder::new();
        if let Some(v) = &self.repo {
            builder = builder.repo_url(v);
        }
        if let Some(v) = &self.token {
            builder = builder.token(v);
        }
        if let Some(v) = &self.branch {
            builder = builder.branch(v);
        }
        if let Some(v) = &self.user {
            builder = builder.ssh_user(v);
        }
        if let Some(v) = &self.host {
            builder = builder.ssh_host(v);
        }
        if let Some(v) = &self.key {
            builder = builder.ssh_key(v);
        }
        if let Some(v) = &self.port {
            builder = builder.app_port(v);
        }
        builder
    }
}
