//! Push a Dockerized git repository to a single host and put it
//! behind nginx.
//!
//! `dropship` clones a branch into a local workspace, prepares the
//! remote host (Docker, the compose plugin, nginx), mirrors the
//! workspace over rsync, builds and runs the application, writes a
//! reverse-proxy site, and probes the public endpoint.
//!
//! # Overview
//!
//! A run is a [`Pipeline`] built from validated
//! [`DeployParams`](params::DeployParams). Each external tool sits
//! behind a narrow trait so the pipeline can run against fakes:
//!
//! - [`SourceControl`](git::SourceControl) for cloning (`git`)
//! - [`Remote`](remote::Remote) for commands, file writes, and sync
//!   (`ssh`, `rsync`)
//! - [`HttpProbe`](probe::HttpProbe) for the final check
//!
//! # Stages and exit codes
//!
//! | Stage | Exit code |
//! |---|---|
//! | Input validation | 10 |
//! | Source retrieval | 20 |
//! | Remote connectivity | 30 |
//! | Remote preparation | 40 |
//! | File synchronization | 31 |
//! | Remote build | 50 |
//! | Proxy configuration | 51 |
//! | Validation | 60 |
//!
//! The first failing stage ends the run.
//!
//! # Example
//!
//! ```rust,no_run
//! use dropship::params::ParamsBuilder;
//! use dropship::pipeline::{Pipeline, Settings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let params = ParamsBuilder::new()
//!         .repo_url("https://github.com/acme/widget.git")
//!         .ssh_user("deploy")
//!         .ssh_host("203.0.113.7")
//!         .ssh_key("~/.ssh/id_ed25519")
//!         .app_port("5000")
//!         .build()?;
//!
//!     Pipeline::new(params, Settings::default()).run()?;
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cleanup;
pub mod cli;
pub mod cmd;
pub mod compose;
pub mod detect;
pub mod docker;
pub mod error;
pub mod git;
pub mod logging;
pub mod names;
pub mod nginx;
pub mod params;
pub mod pipeline;
pub mod prepare;
pub mod probe;
pub mod prompt;
pub mod remote;
pub mod rsync;
pub mod source;
pub mod ssh;

pub use detect::DeploymentKind;
pub use error::{DeployError, DeployResult, Stage};
pub use names::ProjectNames;
pub use pipeline::Pipeline;
pub use ssh::SshSession;
