use tracing::{info, warn};

use crate::names::ProjectNames;
use crate::nginx::{self, SitePaths};
use crate::remote::{Remote, RemoteCommand};

/// Outcome of one teardown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub ok: bool,
}

/// Tear down everything a deployment left on the remote host: all
/// containers, all images, the deployment directory, and the nginx
/// site. Every step tolerates failure; the reports say which ones
/// did not succeed.
pub fn teardown(remote: &dyn Remote, names: &ProjectNames) -> Vec<StepReport> {
    let site = SitePaths::for_site(&names.sanitized);
    let remote_dir = names.remote_dir();

    info!("Cleaning up {} on the remote host", names.project);

    vec![
        remove_all(remote, "containers", &["ps", "-aq"], &["rm", "-f"]),
        remove_all(remote, "images", &["images", "-q"], &["rmi", "-f"]),
        step(
            remote,
            "deployment directory",
            &RemoteCommand::new("rm")
                .args(["-rf", remote_dir.as_str()])
                .sudo(),
        ),
        step(
            remote,
            "nginx site",
            &RemoteCommand::new("rm")
                .args(["-f", site.enabled.as_str(), site.available.as_str()])
                .sudo(),
        ),
        step(remote, "nginx reload", &nginx::reload()),
    ]
}

fn step(remote: &dyn Remote, name: &'static str, command: &RemoteCommand) -> StepReport {
    match remote.exec(command) {
        Ok(_) => {
            info!("Removed {name}");
            StepReport { step: name, ok: true }
        }
        Err(e) => {
            warn!("Skipping {name}: {e}");
            StepReport { step: name, ok: false }
        }
    }
}

/// List ids with `docker <list...>` and force-remove them with
/// `docker <remove...> <ids>`. An empty list is a success.
fn remove_all(
    remote: &dyn Remote,
    name: &'static str,
    list: &[&str],
    remove: &[&str],
) -> StepReport {
    let listed = remote.exec(&RemoteCommand::new("docker").args(list.iter().copied()).sudo());
    let ids = match listed {
        Ok(out) => out,
        Err(e) => {
            warn!("Skipping {name}: {e}");
            return StepReport { step: name, ok: false };
        }
    };

    let mut ids: Vec<&str> = ids.split_whitespace().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        info!("No {name} to remove");
        return StepReport { step: name, ok: true };
    }

    step(
        remote,
        name,
        &RemoteCommand::new("docker")
            .args(remove.iter().copied())
            .args(ids)
            .sudo(),
    )
}
