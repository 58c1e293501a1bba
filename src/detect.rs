use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DeployError, DeployResult};

/// Compose file names, in lookup order.
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Build/run strategy for a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentKind {
    /// Single container built from `Dockerfile`.
    Dockerfile,
    /// Multi-service stack; holds the compose file name relative to
    /// the workspace root.
    Compose(PathBuf),
}

impl DeploymentKind {
    /// Inspect `workspace`: a `Dockerfile` wins over a compose file.
    pub fn detect(workspace: &Path) -> DeployResult<Self> {
        if workspace.join("Dockerfile").is_file() {
            return Ok(Self::Dockerfile);
        }

        COMPOSE_FILES
            .iter()
            .find(|name| workspace.join(name).is_file())
            .map(|name| Self::Compose(PathBuf::from(name)))
            .ok_or_else(|| DeployError::NoBuildDefinition(workspace.display().to_string()))
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dockerfile => f.write_str("dockerfile"),
            Self::Compose(_) => f.write_str("compose"),
        }
    }
}
