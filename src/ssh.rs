use std::path::{Path, PathBuf};

use crate::cmd;
use crate::error::DeployResult;
use crate::remote::{Remote, RemoteCommand};
use crate::rsync;

/// SSH session wrapper for executing commands and transferring
/// files to a remote host. Every call spawns its own `ssh` process.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<PathBuf>,
    connect_timeout: u32,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
            connect_timeout: 10,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &Path) -> Self {
        self.key = Some(key_path.to_path_buf());
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, seconds: u32) -> Self {
        self.connect_timeout = seconds;
        self
    }

    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Options shared by `ssh` and the `rsync -e` transport.
    #[must_use]
    pub fn transport_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.transport_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }
}

impl Remote for SshSession {
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String> {
        let args = self.build_ssh_args(&command.render()?);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs)
    }

    fn write_file(&self, content: &str, path: &str, sudo: bool) -> DeployResult<()> {
        let mut tee = RemoteCommand::new("tee").arg(path);
        if sudo {
            tee = tee.sudo();
        }
        // tee echoes its input; keep it out of the captured output.
        let command = format!("{} > /dev/null", tee.render()?);
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }

    fn sync_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()> {
        self.exec(&RemoteCommand::new("mkdir").args(["-p", remote_dir]))?;
        rsync::mirror(self, local, remote_dir)
    }
}
