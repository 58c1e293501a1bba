//! Workspace mirroring with rsync over the session's SSH transport.

use std::path::Path;

use tracing::info;

use crate::cmd;
use crate::error::{DeployError, DeployResult};
use crate::ssh::SshSession;

/// Mirror the contents of `local` into `remote_dir`. Remote files
/// that no longer exist locally are deleted.
pub fn mirror(ssh: &SshSession, local: &Path, remote_dir: &str) -> DeployResult<()> {
    info!(
        "Syncing {} to {}:{remote_dir}/",
        local.display(),
        ssh.destination()
    );

    let args = build_args(ssh, local, remote_dir)?;
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    cmd::run("rsync", &refs)?;

    info!("Files synchronized");
    Ok(())
}

/// Check if rsync is installed locally.
#[must_use]
pub fn check_available() -> bool {
    cmd::command_exists("rsync")
}

fn build_args(ssh: &SshSession, local: &Path, remote_dir: &str) -> DeployResult<Vec<String>> {
    let mut transport = vec!["ssh".to_string()];
    transport.extend(ssh.transport_args());
    let shell = shlex::try_join(transport.iter().map(String::as_str))
        .map_err(|e| DeployError::InvalidInput(format!("cannot quote ssh transport: {e}")))?;

    Ok(vec![
        "-az".to_string(),
        "--delete".to_string(),
        "-e".to_string(),
        shell,
        // trailing slash = copy contents
        format!("{}/", local.display()),
        format!("{}:{remote_dir}/", ssh.destination()),
    ])
}
