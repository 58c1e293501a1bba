use std::path::Path;

use crate::cmd;
use crate::error::DeployResult;

/// Version-control operations used to populate the workspace.
pub trait SourceControl {
    /// Shallow, single-branch clone of `branch` into `dest`.
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> DeployResult<()>;

    /// Fetch, check out, and pull `branch` in an existing checkout.
    fn update_branch(&self, dest: &Path, branch: &str) -> DeployResult<()>;
}

/// [`SourceControl`] backed by the `git` command line. Values in
/// `masked` (the access token) never reach the log.
#[derive(Debug, Default)]
pub struct GitCli {
    masked: Vec<String>,
}

impl GitCli {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mask(mut self, secret: &str) -> Self {
        self.masked.push(secret.to_string());
        self
    }

    fn git(&self, args: &[&str]) -> DeployResult<String> {
        let masked: Vec<&str> = self.masked.iter().map(String::as_str).collect();
        cmd::run_masked("git", args, &masked)
    }
}

impl SourceControl for GitCli {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> DeployResult<()> {
        let dest = dest.to_string_lossy();
        self.git(&[
            "clone",
            "--depth",
            "1",
            "--single-branch",
            "--branch",
            branch,
            url,
            &dest,
        ])?;
        Ok(())
    }

    fn update_branch(&self, dest: &Path, branch: &str) -> DeployResult<()> {
        let dir = dest.to_string_lossy();
        self.git(&["-C", &dir, "fetch", "origin", branch])?;
        self.git(&["-C", &dir, "checkout", branch])?;
        self.git(&["-C", &dir, "pull", "origin", branch])?;
        Ok(())
    }
}
