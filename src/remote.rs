use std::fmt;
use std::path::Path;

use tracing::info;

use crate::error::{DeployError, DeployResult};

/// Echoed by the connectivity check; the round trip must return it.
pub const SENTINEL: &str = "dropship-ssh-ok";

/// A command to run on the remote host, kept as an argument list
/// until it is rendered for the remote shell.
///
/// # Example
///
/// ```
/// use dropship::remote::RemoteCommand;
///
/// let cmd = RemoteCommand::new("docker")
///     .args(["build", "-t", "my app:latest", "."])
///     .sudo()
///     .current_dir("deploy_app");
///
/// assert_eq!(
///     cmd.render().unwrap(),
///     "cd deploy_app && sudo docker build -t 'my app:latest' ."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub program: String,
    pub args: Vec<String>,
    pub sudo: bool,
    pub current_dir: Option<String>,
}

impl RemoteCommand {
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            sudo: false,
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &str) -> Self {
        self.current_dir = Some(dir.to_string());
        self
    }

    /// Render to a single shell command line, quoting every word.
    pub fn render(&self) -> DeployResult<String> {
        let mut words = Vec::with_capacity(self.args.len() + 2);
        if self.sudo {
            words.push("sudo".to_string());
        }
        words.push(quote(&self.program)?);
        for arg in &self.args {
            words.push(quote(arg)?);
        }

        let line = words.join(" ");
        match &self.current_dir {
            Some(dir) => Ok(format!("cd {} && {line}", quote(dir)?)),
            None => Ok(line),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(line) => f.write_str(&line),
            Err(_) => write!(f, "{} {}", self.program, self.args.join(" ")),
        }
    }
}

fn quote(word: &str) -> DeployResult<String> {
    shlex::try_quote(word)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| DeployError::InvalidInput(format!("cannot quote '{word}': {e}")))
}

/// Operations the pipeline needs from the remote host.
pub trait Remote {
    /// Run a command and return its trimmed stdout. Fails on a
    /// non-zero exit status.
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String>;

    /// Write `content` to `path` on the remote host.
    fn write_file(&self, content: &str, path: &str, sudo: bool) -> DeployResult<()>;

    /// Mirror `local` into `remote_dir`, deleting extraneous remote
    /// files.
    fn sync_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()>;

    /// Whether a command exits successfully.
    fn succeeds(&self, command: &RemoteCommand) -> bool {
        self.exec(command).is_ok()
    }
}

/// Verify that a round trip to the remote host echoes [`SENTINEL`].
pub fn check_connection(remote: &dyn Remote) -> DeployResult<()> {
    let echoed = remote
        .exec(&RemoteCommand::new("echo").arg(SENTINEL))
        .map_err(|e| DeployError::SshFailed(e.to_string()))?;

    if echoed.trim() == SENTINEL {
        info!("SSH connection OK");
        Ok(())
    } else {
        Err(DeployError::SshFailed(format!("unexpected reply '{echoed}'")))
    }
}

/// `command -v <program>`, for presence checks.
#[must_use]
pub fn has_program(program: &str) -> RemoteCommand {
    RemoteCommand::new("sh")
        .arg("-c")
        .arg(format!("command -v {program}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_unquoted() {
        let cmd = RemoteCommand::new("echo").arg("ready");
        assert_eq!(cmd.render().unwrap(), "echo ready");
    }

    #[test]
    fn metacharacters_are_quoted() {
        let cmd = RemoteCommand::new("rm").args(["-rf", "x; reboot"]);
        assert_eq!(cmd.render().unwrap(), "rm -rf 'x; reboot'");
    }

    #[test]
    fn sudo_prefix_is_not_quoted() {
        let cmd = RemoteCommand::new("systemctl").args(["reload", "nginx"]).sudo();
        assert_eq!(cmd.render().unwrap(), "sudo systemctl reload nginx");
    }

    #[test]
    fn nul_byte_cannot_be_quoted() {
        let cmd = RemoteCommand::new("echo").arg("a\0b");
        assert!(cmd.render().is_err());
    }
}
