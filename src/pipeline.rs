use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cleanup::{self, StepReport};
use crate::cmd;
use crate::compose;
use crate::detect::DeploymentKind;
use crate::docker;
use crate::error::{DeployError, DeployResult, Stage, StageExt};
use crate::git::{GitCli, SourceControl};
use crate::names::ProjectNames;
use crate::nginx;
use crate::params::DeployParams;
use crate::prepare;
use crate::probe::{self, HttpProbe, ReqwestProbe, StatusRange};
use crate::remote::{self, Remote};
use crate::rsync;
use crate::source;
use crate::ssh::SshSession;

/// What a run does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Deploy,
    /// Tear down a previous deployment.
    Cleanup,
    /// Print the plan without touching anything.
    DryRun,
}

/// Run options that are not deployment parameters.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub mode: Mode,
    /// Reuse this directory instead of a fresh temporary one.
    pub workspace: Option<PathBuf>,
    pub accept: StatusRange,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed(Deployment),
    CleanedUp(Vec<StepReport>),
    Planned,
}

/// Summary of a completed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub workspace: PathBuf,
    pub kind: DeploymentKind,
    pub remote_dir: String,
    pub site: nginx::SitePaths,
    pub status: u16,
}

/// Deployment pipeline: retrieval, remote preparation, sync, build,
/// proxy configuration, and validation, in that order. The first
/// failing stage ends the run.
pub struct Pipeline {
    params: DeployParams,
    names: ProjectNames,
    settings: Settings,
    scm: Box<dyn SourceControl>,
    remote: Box<dyn Remote>,
    probe: Box<dyn HttpProbe>,
}

impl Pipeline {
    /// Pipeline over the real tools: `git`, `ssh`/`rsync`, and an
    /// HTTP client.
    #[must_use]
    pub fn new(params: DeployParams, settings: Settings) -> Self {
        let git = params
            .masked_values()
            .iter()
            .fold(GitCli::new(), |git, value| git.mask(value));
        let ssh = SshSession::new(&params.ssh_host, &params.ssh_user).with_key(&params.ssh_key);

        Self {
            names: ProjectNames::from_repo_url(&params.repo_url),
            params,
            settings,
            scm: Box::new(git),
            remote: Box::new(ssh),
            probe: Box::new(ReqwestProbe::default()),
        }
    }

    #[must_use]
    pub fn source_control(mut self, scm: impl SourceControl + 'static) -> Self {
        self.scm = Box::new(scm);
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: impl Remote + 'static) -> Self {
        self.remote = Box::new(remote);
        self
    }

    #[must_use]
    pub fn probe(mut self, probe: impl HttpProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    #[must_use]
    pub const fn names(&self) -> &ProjectNames {
        &self.names
    }

    /// Public URL probed by the validation stage.
    #[must_use]
    pub fn public_url(&self) -> String {
        let host = &self.params.ssh_host;
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{host}]/")
        } else {
            format!("http://{host}/")
        }
    }

    /// Check that the local tools the real pipeline shells out to
    /// are installed.
    pub fn check_prerequisites(&self) -> DeployResult<()> {
        let needed: &[&str] = match self.settings.mode {
            Mode::Deploy => &["git", "ssh", "rsync"],
            Mode::Cleanup => &["ssh"],
            Mode::DryRun => &[],
        };

        for tool in needed {
            let present = if *tool == "rsync" {
                rsync::check_available()
            } else {
                cmd::command_exists(tool)
            };
            if !present {
                return Err(DeployError::CommandNotFound(format!(
                    "{tool} is not installed locally"
                )))
                .stage(Stage::Input);
            }
        }
        Ok(())
    }

    /// Run the configured mode.
    pub fn run(&self) -> DeployResult<Outcome> {
        info!(
            "Project {} (identifier {}) -> {}",
            self.names.project,
            self.names.sanitized,
            self.params.destination()
        );

        match self.settings.mode {
            Mode::Deploy => self.deploy().map(Outcome::Deployed),
            Mode::Cleanup => self.cleanup().map(Outcome::CleanedUp),
            Mode::DryRun => {
                self.print_plan();
                Ok(Outcome::Planned)
            }
        }
    }

    fn deploy(&self) -> DeployResult<Deployment> {
        let remote = self.remote.as_ref();
        let remote_dir = self.names.remote_dir();

        let workspace = self.retrieve().stage(Stage::Source)?;
        let kind = DeploymentKind::detect(&workspace).stage(Stage::Source)?;
        info!("Deployment type: {kind}");
        if let DeploymentKind::Compose(file) = &kind {
            self.inspect_compose(&workspace.join(file));
        }

        info!("Testing SSH connection to {}...", self.params.destination());
        remote::check_connection(remote).stage(Stage::Connectivity)?;

        prepare::prepare_host(remote, &self.params.ssh_user).stage(Stage::Preparation)?;

        remote
            .sync_dir(&workspace, &remote_dir)
            .stage(Stage::Sync)?;

        docker::build_and_run(remote, &kind, &self.names, self.params.app_port)
            .stage(Stage::Build)?;

        let site = nginx::configure(
            remote,
            &self.names.sanitized,
            &self.params.ssh_host,
            self.params.app_port,
        )
        .stage(Stage::Proxy)?;

        self.report_containers();

        let status = probe::check(self.probe.as_ref(), &self.public_url(), self.settings.accept)
            .stage(Stage::Validation)?;

        info!("Deployment complete: {}", self.public_url());
        Ok(Deployment {
            workspace,
            kind,
            remote_dir,
            site,
            status,
        })
    }

    fn retrieve(&self) -> DeployResult<PathBuf> {
        let workspace = match &self.settings.workspace {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => source::fresh_workspace()?,
        };

        source::retrieve(
            self.scm.as_ref(),
            &self.params.clone_url(),
            &self.params.repo_url,
            &self.params.branch,
            &workspace,
        )?;
        Ok(workspace)
    }

    fn inspect_compose(&self, path: &Path) {
        match compose::inspect(path) {
            Ok(summary) => {
                info!("Compose services: {}", summary.services.join(", "));
                if !summary.publishes(self.params.app_port) {
                    warn!(
                        "No compose service publishes port {}; the proxy may have nothing to reach",
                        self.params.app_port
                    );
                }
            }
            Err(e) => warn!("Could not inspect {}: {e}", path.display()),
        }
    }

    fn report_containers(&self) {
        match docker::list_running(self.remote.as_ref(), &self.names.sanitized) {
            Ok(containers) if containers.is_empty() => {
                warn!("No running container matches {}", self.names.sanitized);
            }
            Ok(containers) => {
                for c in containers {
                    info!("Running: {} ({}) {} {}", c.names, c.image, c.status, c.ports);
                }
            }
            Err(e) => warn!("Could not list containers: {e}"),
        }
    }

    fn cleanup(&self) -> DeployResult<Vec<StepReport>> {
        let remote = self.remote.as_ref();

        info!("Testing SSH connection to {}...", self.params.destination());
        remote::check_connection(remote).stage(Stage::Connectivity)?;

        let reports = cleanup::teardown(remote, &self.names);
        let skipped = reports.iter().filter(|r| !r.ok).count();
        info!("Cleanup finished ({skipped} step(s) skipped)");
        Ok(reports)
    }

    fn print_plan(&self) {
        let site = nginx::SitePaths::for_site(&self.names.sanitized);

        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();
        eprintln!("Project:        {}", self.names.project);
        eprintln!("Identifier:     {}", self.names.sanitized);
        eprintln!("Repository:     {} ({})", self.params.repo_url, self.params.branch);
        eprintln!("Target:         {}", self.params.destination());
        eprintln!("Remote dir:     ~/{}", self.names.remote_dir());
        eprintln!("Nginx site:     {}", site.available);
        eprintln!();

        eprintln!("--- {} ---", site.available);
        println!(
            "{}",
            nginx::render(&self.params.ssh_host, self.params.app_port)
        );

        eprintln!("--- Actions that would be performed ---");
        eprintln!("1. Clone {} into a local workspace", self.params.branch);
        eprintln!("2. Detect Dockerfile or compose file");
        eprintln!("3. Test SSH connection");
        eprintln!("4. Install Docker, Compose, and nginx if missing");
        eprintln!("5. Sync workspace to ~/{}", self.names.remote_dir());
        eprintln!(
            "6. Build and run {} on port {}",
            self.names.image_tag(),
            self.params.app_port
        );
        eprintln!("7. Enable nginx site and reload");
        eprintln!(
            "8. Probe {} (accepting {})",
            self.public_url(),
            self.settings.accept
        );
    }
}
