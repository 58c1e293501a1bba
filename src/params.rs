use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use url::Url;

use crate::error::{DeployError, DeployResult};
use crate::prompt::Prompter;

pub const DEFAULT_BRANCH: &str = "main";

/// Validated deployment parameters. Built once, never mutated.
#[derive(Debug)]
pub struct DeployParams {
    pub repo_url: String,
    pub token: Option<SecretString>,
    pub branch: String,
    pub ssh_user: String,
    pub ssh_host: String,
    pub ssh_key: PathBuf,
    pub app_port: u16,
}

impl DeployParams {
    /// Repository URL with the access token spliced into its
    /// authority. Only http(s) URLs carry a token; anything else is
    /// returned unchanged.
    #[must_use]
    pub fn clone_url(&self) -> String {
        let Some(token) = &self.token else {
            return self.repo_url.clone();
        };

        match Url::parse(&self.repo_url) {
            Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
                if url.set_username(token.expose_secret()).is_ok() {
                    return url.to_string();
                }
                warn!("could not attach token to {}; cloning without it", self.repo_url);
                self.repo_url.clone()
            }
            _ => {
                warn!("access token ignored: only http(s) repository URLs can carry one");
                self.repo_url.clone()
            }
        }
    }

    /// Token value as entered.
    #[must_use]
    pub fn token_value(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }

    /// Every form of the token that can show up in a logged command
    /// line or in git's output: the raw value and, when it differs,
    /// the percent-encoded form spliced into the clone URL.
    #[must_use]
    pub fn masked_values(&self) -> Vec<String> {
        let Some(token) = self.token_value().filter(|t| !t.is_empty()) else {
            return Vec::new();
        };

        let mut values = vec![token.to_string()];
        let encoded = Url::parse("https://host/").ok().and_then(|mut url| {
            url.set_username(token).ok()?;
            Some(url.username().to_string())
        });
        if let Some(encoded) = encoded.filter(|e| e != token) {
            values.push(encoded);
        }
        values
    }

    /// `user@host` for SSH.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.ssh_user, self.ssh_host)
    }
}

/// Raw, possibly incomplete parameters gathered from flags,
/// environment, and prompts.
///
/// # Example
///
/// ```
/// use dropship::params::ParamsBuilder;
///
/// let params = ParamsBuilder::new()
///     .repo_url("https://github.com/acme/widget.git")
///     .ssh_user("deploy")
///     .ssh_host("203.0.113.7")
///     .ssh_key("Cargo.toml")
///     .app_port("5000")
///     .build()
///     .unwrap();
///
/// assert_eq!(params.branch, "main");
/// assert_eq!(params.app_port, 5000);
/// ```
#[derive(Debug, Default)]
pub struct ParamsBuilder {
    pub repo_url: Option<String>,
    pub token: Option<SecretString>,
    pub branch: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_key: Option<String>,
    pub app_port: Option<String>,
}

impl ParamsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn repo_url(mut self, url: &str) -> Self {
        self.repo_url = Some(url.to_string());
        self
    }

    #[must_use]
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(SecretString::from(token.to_string()));
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    #[must_use]
    pub fn ssh_user(mut self, user: &str) -> Self {
        self.ssh_user = Some(user.to_string());
        self
    }

    #[must_use]
    pub fn ssh_host(mut self, host: &str) -> Self {
        self.ssh_host = Some(host.to_string());
        self
    }

    #[must_use]
    pub fn ssh_key(mut self, path: &str) -> Self {
        self.ssh_key = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn app_port(mut self, port: &str) -> Self {
        self.app_port = Some(port.to_string());
        self
    }

    /// Ask for every value that is still missing.
    pub fn prompt_missing(mut self, prompter: &dyn Prompter) -> DeployResult<Self> {
        if self.repo_url.is_none() {
            self.repo_url = Some(prompter.input("Git repository URL", None)?);
        }
        if self.token.is_none() {
            self.token = prompter
                .secret("Access token (leave blank for public repositories)")?
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from);
        }
        if self.branch.is_none() {
            self.branch = Some(prompter.input("Branch", Some(DEFAULT_BRANCH))?);
        }
        if self.ssh_user.is_none() {
            self.ssh_user = Some(prompter.input("SSH username", None)?);
        }
        if self.ssh_host.is_none() {
            self.ssh_host = Some(prompter.input("Remote host (IP or hostname)", None)?);
        }
        if self.ssh_key.is_none() {
            self.ssh_key = Some(prompter.input("SSH private key path", Some("~/.ssh/id_rsa"))?);
        }
        if self.app_port.is_none() {
            self.app_port = Some(prompter.input("Application port", None)?);
        }
        Ok(self)
    }

    /// Validate and freeze the parameters.
    pub fn build(self) -> DeployResult<DeployParams> {
        let repo_url = required(self.repo_url, "repository URL")?;
        let ssh_user = required(self.ssh_user, "SSH username")?;
        let ssh_host = required(self.ssh_host, "remote host")?;

        let branch = self
            .branch
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let key = required(self.ssh_key, "SSH key path")?;
        let ssh_key = expand_home(&key);
        if !ssh_key.is_file() {
            return Err(DeployError::InvalidInput(format!(
                "SSH key file not found: {}",
                ssh_key.display()
            )));
        }

        let port = required(self.app_port, "application port")?;
        let app_port = parse_port(&port)?;

        Ok(DeployParams {
            repo_url,
            token: self.token,
            branch,
            ssh_user,
            ssh_host,
            ssh_key,
            app_port,
        })
    }
}

fn required(value: Option<String>, field: &str) -> DeployResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DeployError::InvalidInput(format!("{field} is required")))
}

fn parse_port(raw: &str) -> DeployResult<u16> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(DeployError::InvalidInput(format!(
            "application port must be a number between 1 and 65535, got '{raw}'"
        ))),
        Ok(port) => Ok(port),
    }
}

/// Expand a leading `~/` using `HOME`.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}
