use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{DeployError, DeployResult};
use crate::git::SourceControl;

/// Create a fresh, uniquely named workspace directory. It is kept on
/// disk after the run for inspection.
pub fn fresh_workspace() -> DeployResult<PathBuf> {
    let dir = tempfile::Builder::new().prefix("dropship-").tempdir()?;
    Ok(dir.keep())
}

/// Populate `dest` with `branch` of `url`.
///
/// A failed clone falls back to fetch + checkout + pull when `dest`
/// already holds a git checkout; otherwise the clone error is
/// returned.
pub fn retrieve(
    scm: &dyn SourceControl,
    url: &str,
    display_url: &str,
    branch: &str,
    dest: &Path,
) -> DeployResult<()> {
    info!("Cloning {display_url} (branch {branch}) into {}", dest.display());

    let Err(clone_err) = scm.clone_branch(url, branch, dest) else {
        info!("Clone complete");
        return Ok(());
    };

    if !dest.join(".git").exists() {
        return Err(clone_err);
    }

    warn!("Clone failed ({clone_err}); updating existing checkout instead");
    scm.update_branch(dest, branch).map_err(|e| {
        DeployError::Other(format!("updating existing checkout failed: {e}"))
    })?;

    info!("Existing checkout updated to {branch}");
    Ok(())
}
