use std::path::Path;

use docker_compose_types::{Compose, Ports, PublishedPort};

use crate::error::{DeployError, DeployResult};

/// What the deployer needs to know about a compose file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeSummary {
    pub services: Vec<String>,
    pub published_ports: Vec<u16>,
}

impl ComposeSummary {
    #[must_use]
    pub fn publishes(&self, port: u16) -> bool {
        self.published_ports.contains(&port)
    }
}

/// Read and summarize a compose file.
pub fn inspect(path: &Path) -> DeployResult<ComposeSummary> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Summarize compose YAML: service names and published host ports.
pub fn parse(content: &str) -> DeployResult<ComposeSummary> {
    let compose: Compose = serde_yaml::from_str(content)
        .map_err(|e| DeployError::Other(format!("invalid compose file: {e}")))?;

    let mut summary = ComposeSummary::default();
    for (name, service) in &compose.services.0 {
        summary.services.push(name.clone());

        let Some(service) = service else { continue };
        if let Ports::Short(ports) = &service.ports {
            summary
                .published_ports
                .extend(ports.iter().filter_map(|p| published_from_short(p)));
        } else if let Ports::Long(ports) = &service.ports {
            summary
                .published_ports
                .extend(ports.iter().filter_map(|p| published_from_long(p.published.as_ref())));
        }
    }

    summary.published_ports.sort_unstable();
    summary.published_ports.dedup();
    Ok(summary)
}

fn published_from_long(published: Option<&PublishedPort>) -> Option<u16> {
    if let Some(PublishedPort::Single(port)) = published {
        Some(*port)
    } else if let Some(PublishedPort::Range(raw)) = published {
        raw.parse().ok()
    } else {
        None
    }
}

/// Host port of a short port mapping: `"8080:80"`,
/// `"127.0.0.1:8080:80/tcp"`. A bare container port publishes
/// nothing fixed and yields `None`.
fn published_from_short(mapping: &str) -> Option<u16> {
    let mapping = mapping.split('/').next().unwrap_or(mapping);
    let parts: Vec<&str> = mapping.rsplitn(3, ':').collect();
    match parts.as_slice() {
        [_container, host] | [_container, host, _] => host.parse().ok(),
        _ => None,
    }
}
