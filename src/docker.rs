use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::detect::DeploymentKind;
use crate::error::{DeployError, DeployResult};
use crate::names::ProjectNames;
use crate::prepare;
use crate::remote::{Remote, RemoteCommand};

/// Which compose entry point the remote host offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCli {
    /// `docker compose`
    Native,
    /// `docker-compose`
    Legacy,
}

impl ComposeCli {
    pub fn detect(remote: &dyn Remote) -> DeployResult<Self> {
        if remote.succeeds(&prepare::native_compose_version()) {
            Ok(Self::Native)
        } else if remote.succeeds(&prepare::legacy_compose_version()) {
            Ok(Self::Legacy)
        } else {
            Err(DeployError::UnsupportedHost(
                "neither `docker compose` nor `docker-compose` is available".into(),
            ))
        }
    }

    /// `<compose> -f <file> <args...>` run with sudo in `dir`.
    #[must_use]
    pub fn command(self, dir: &str, file: &Path, args: &[&str]) -> RemoteCommand {
        let file = file.to_string_lossy().into_owned();
        let base = match self {
            Self::Native => RemoteCommand::new("docker").arg("compose"),
            Self::Legacy => RemoteCommand::new("docker-compose"),
        };
        base.args(["-f", file.as_str()])
            .args(args.iter().copied())
            .sudo()
            .current_dir(dir)
    }
}

/// Build and start the application on the remote host.
pub fn build_and_run(
    remote: &dyn Remote,
    kind: &DeploymentKind,
    names: &ProjectNames,
    port: u16,
) -> DeployResult<()> {
    let dir = names.remote_dir();
    match kind {
        DeploymentKind::Compose(file) => run_compose(remote, &dir, file),
        DeploymentKind::Dockerfile => run_container(remote, &dir, names, port),
    }
}

fn run_compose(remote: &dyn Remote, dir: &str, file: &Path) -> DeployResult<()> {
    let cli = ComposeCli::detect(remote)?;

    info!("Stopping existing compose stack (if any)...");
    if let Err(e) = remote.exec(&cli.command(dir, file, &["down"])) {
        info!("Nothing to stop: {e}");
    }

    info!("Starting compose stack...");
    remote.exec(&cli.command(dir, file, &["up", "-d", "--build"]))?;
    info!("Compose stack is up");
    Ok(())
}

fn run_container(
    remote: &dyn Remote,
    dir: &str,
    names: &ProjectNames,
    port: u16,
) -> DeployResult<()> {
    let name = names.sanitized.as_str();
    let image = names.image_tag();

    info!("Building image {image}...");
    remote.exec(
        &docker()
            .args(["build", "-t", image.as_str(), "."])
            .current_dir(dir),
    )?;

    let exact = format!("name=^{name}$");
    let existing = remote.exec(&docker().args(["ps", "-aq", "--filter", exact.as_str()]))?;
    if !existing.trim().is_empty() {
        info!("Removing existing container {name}");
        remote.exec(&docker().args(["rm", "-f", name]))?;
    }

    let publish = format!("{port}:{port}");
    info!("Starting container {name} ({publish})...");
    remote.exec(&docker().args([
        "run",
        "-d",
        "--name",
        name,
        "--restart",
        "unless-stopped",
        "-p",
        publish.as_str(),
        image.as_str(),
    ]))?;
    Ok(())
}

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInfo {
    pub names: String,
    pub image: String,
    pub status: String,
    #[serde(default)]
    pub ports: String,
}

/// Running containers whose name matches `name`. Lines that do not
/// parse are skipped.
pub fn list_running(remote: &dyn Remote, name: &str) -> DeployResult<Vec<ContainerInfo>> {
    let filter = format!("name={name}");
    let output = remote.exec(&docker().args([
        "ps",
        "--filter",
        filter.as_str(),
        "--format",
        "{{json .}}",
    ]))?;
    Ok(parse_ps(&output))
}

/// Parse `docker ps` JSON lines.
#[must_use]
pub fn parse_ps(output: &str) -> Vec<ContainerInfo> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Unparseable docker ps line: {e}");
                None
            }
        })
        .collect()
}

fn docker() -> RemoteCommand {
    RemoteCommand::new("docker").sudo()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_compose_command() {
        let cmd = ComposeCli::Native.command("deploy_app", Path::new("compose.yml"), &["down"]);
        assert_eq!(
            cmd.render().unwrap(),
            "cd deploy_app && sudo docker compose -f compose.yml down"
        );
    }

    #[test]
    fn legacy_compose_command() {
        let cmd = ComposeCli::Legacy.command(
            "deploy_app",
            Path::new("docker-compose.yml"),
            &["up", "-d", "--build"],
        );
        assert_eq!(
            cmd.render().unwrap(),
            "cd deploy_app && sudo docker-compose -f docker-compose.yml up -d --build"
        );
    }

    #[test]
    fn parse_ps_lines() {
        let output = r#"{"Names":"widget","Image":"widget:latest","Status":"Up 2 seconds","Ports":"0.0.0.0:5000->5000/tcp"}
not json
"#;
        let containers = parse_ps(output);

        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].names, "widget");
        assert_eq!(containers[0].ports, "0.0.0.0:5000->5000/tcp");
    }
}
