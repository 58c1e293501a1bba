//! Idempotent installation of Docker, the compose plugin, and nginx on
//! the remote host. Every install is guarded by a presence check.

use std::fmt;

use tracing::{info, warn};

use crate::error::{DeployError, DeployResult};
use crate::nginx;
use crate::remote::{Remote, RemoteCommand, has_program};

const DOCKER_INSTALL_URL: &str = "https://get.docker.com";
const DOCKER_INSTALL_SCRIPT: &str = "/tmp/get-docker.sh";

/// Remote system package manager. `Apt` covers the Debian family;
/// `Dnf` and `Yum` cover the Red Hat family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Probe the remote host, preferring `apt-get`, then `dnf`, then
    /// `yum`.
    pub fn detect(remote: &dyn Remote) -> DeployResult<Self> {
        [Self::Apt, Self::Dnf, Self::Yum]
            .into_iter()
            .find(|pm| remote.succeeds(&has_program(pm.program())))
            .ok_or_else(|| {
                DeployError::UnsupportedHost(
                    "no supported package manager (apt-get, dnf, yum) found".into(),
                )
            })
    }

    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
        }
    }

    #[must_use]
    pub fn update_index(self) -> RemoteCommand {
        match self {
            Self::Apt => RemoteCommand::new("apt-get").args(["update", "-y"]).sudo(),
            Self::Dnf | Self::Yum => RemoteCommand::new(self.program())
                .args(["makecache", "-y"])
                .sudo(),
        }
    }

    #[must_use]
    pub fn install(self, packages: &[&str]) -> RemoteCommand {
        let base = match self {
            Self::Apt => RemoteCommand::new("env").args([
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
            ]),
            Self::Dnf | Self::Yum => RemoteCommand::new(self.program()).args(["install", "-y"]),
        };
        base.args(packages.iter().copied()).sudo()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Install and start everything the deployment needs. Safe to run
/// repeatedly.
pub fn prepare_host(remote: &dyn Remote, ssh_user: &str) -> DeployResult<PackageManager> {
    let pm = PackageManager::detect(remote)?;
    info!("Preparing remote host (package manager: {pm})");

    remote.exec(&pm.update_index())?;

    ensure_docker(remote, pm)?;
    ensure_compose(remote, pm)?;
    ensure_nginx(remote, pm)?;

    remote.exec(&RemoteCommand::new("systemctl").args(["enable", "--now", "docker"]).sudo())?;
    remote.exec(&RemoteCommand::new("systemctl").args(["enable", "--now", "nginx"]).sudo())?;

    let usermod = RemoteCommand::new("usermod")
        .args(["-aG", "docker", ssh_user])
        .sudo();
    if let Err(e) = remote.exec(&usermod) {
        warn!("Could not add {ssh_user} to the docker group: {e}");
    }

    info!("Remote host ready");
    Ok(pm)
}

fn ensure_docker(remote: &dyn Remote, pm: PackageManager) -> DeployResult<()> {
    if remote.succeeds(&has_program("docker")) {
        info!("Docker already installed");
        return Ok(());
    }

    if !remote.succeeds(&has_program("curl")) {
        remote.exec(&pm.install(&["curl"]))?;
    }

    info!("Installing Docker...");
    remote.exec(
        &RemoteCommand::new("curl").args(["-fsSL", DOCKER_INSTALL_URL, "-o", DOCKER_INSTALL_SCRIPT]),
    )?;
    remote.exec(&RemoteCommand::new("sh").arg(DOCKER_INSTALL_SCRIPT).sudo())?;
    Ok(())
}

fn ensure_compose(remote: &dyn Remote, pm: PackageManager) -> DeployResult<()> {
    if compose_available(remote) {
        info!("Docker Compose already available");
        return Ok(());
    }

    info!("Installing Docker Compose plugin...");
    remote.exec(&pm.install(&["docker-compose-plugin"]))?;
    Ok(())
}

/// Either the native `docker compose` or the legacy `docker-compose`
/// works.
#[must_use]
pub fn compose_available(remote: &dyn Remote) -> bool {
    remote.succeeds(&native_compose_version()) || remote.succeeds(&legacy_compose_version())
}

#[must_use]
pub fn native_compose_version() -> RemoteCommand {
    RemoteCommand::new("docker").args(["compose", "version"]).sudo()
}

#[must_use]
pub fn legacy_compose_version() -> RemoteCommand {
    RemoteCommand::new("docker-compose").arg("version").sudo()
}

fn ensure_nginx(remote: &dyn Remote, pm: PackageManager) -> DeployResult<()> {
    if remote.succeeds(&has_program("nginx").sudo()) {
        info!("nginx already installed");
    } else {
        info!("Installing nginx...");
        remote.exec(&pm.install(&["nginx"]))?;
    }

    remote.exec(
        &RemoteCommand::new("mkdir")
            .args(["-p", nginx::SITES_AVAILABLE, nginx::SITES_ENABLED])
            .sudo(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apt_install_is_noninteractive() {
        let cmd = PackageManager::Apt.install(&["nginx"]);
        let line = cmd.render().unwrap();
        assert!(line.starts_with("sudo env "));
        assert!(line.contains("DEBIAN_FRONTEND=noninteractive"));
        assert!(line.ends_with("apt-get install -y nginx"));
    }

    #[test]
    fn dnf_refreshes_with_makecache() {
        let cmd = PackageManager::Dnf.update_index();
        assert_eq!(cmd.render().unwrap(), "sudo dnf makecache -y");
    }
}
