use std::fmt;
use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

/// Pipeline stage a failure is attributed to. Each stage owns one
/// process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Source,
    Connectivity,
    Preparation,
    Sync,
    Build,
    Proxy,
    Validation,
}

impl Stage {
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Input => 10,
            Self::Source => 20,
            Self::Connectivity => 30,
            Self::Preparation => 40,
            Self::Sync => 31,
            Self::Build => 50,
            Self::Proxy => 51,
            Self::Validation => 60,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Input => "input validation",
            Self::Source => "source retrieval",
            Self::Connectivity => "remote connectivity",
            Self::Preparation => "remote preparation",
            Self::Sync => "file synchronization",
            Self::Build => "remote build",
            Self::Proxy => "proxy configuration",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("no buildable definition found in {0}")]
    NoBuildDefinition(String),

    #[error("unsupported remote host: {0}")]
    UnsupportedHost(String),

    #[error("endpoint {url} answered {code}")]
    UnhealthyEndpoint { url: String, code: String },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<DeployError>,
    },

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// Stage this error was attributed to, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit code for this error. Errors that never passed
    /// through a stage map to 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.stage() {
            Some(stage) => stage.exit_code(),
            None => 1,
        }
    }
}

/// Attach a [`Stage`] to the error side of a result.
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> DeployResult<T>;
}

impl<T> StageExt<T> for DeployResult<T> {
    fn stage(self, stage: Stage) -> DeployResult<T> {
        self.map_err(|e| match e {
            // The innermost stage wins.
            DeployError::Stage { .. } => e,
            other => DeployError::Stage {
                stage,
                source: Box::new(other),
            },
        })
    }
}
