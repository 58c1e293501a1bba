use tracing::info;

use crate::error::DeployResult;
use crate::remote::{Remote, RemoteCommand};

pub const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
pub const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";

/// Headers forwarded to the upstream, in file order.
const PROXY_HEADERS: [(&str, &str); 4] = [
    ("Host", "$host"),
    ("X-Real-IP", "$remote_addr"),
    ("X-Forwarded-For", "$proxy_add_x_forwarded_for"),
    ("X-Forwarded-Proto", "$scheme"),
];

/// Paths of one site definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub available: String,
    pub enabled: String,
}

impl SitePaths {
    #[must_use]
    pub fn for_site(name: &str) -> Self {
        Self {
            available: format!("{SITES_AVAILABLE}/{name}"),
            enabled: format!("{SITES_ENABLED}/{name}"),
        }
    }
}

/// Render a server block listening on port 80 that proxies every path
/// to `127.0.0.1:<port>`.
///
/// # Example
///
/// ```
/// let site = dropship::nginx::render("203.0.113.7", 5000);
///
/// assert!(site.contains("listen 80;"));
/// assert!(site.contains("proxy_pass http://127.0.0.1:5000;"));
/// ```
#[must_use]
pub fn render(server_name: &str, port: u16) -> String {
    let headers = PROXY_HEADERS
        .iter()
        .map(|(header, value)| format!("        proxy_set_header {header} {value};"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "server {{
    listen 80;
    server_name {server_name};

    location / {{
        proxy_pass http://127.0.0.1:{port};
{headers}
    }}
}}
"
    )
}

/// Install the site file, enable it, validate the configuration, and
/// reload nginx. Nothing is reloaded when validation fails.
pub fn configure(
    remote: &dyn Remote,
    site_name: &str,
    server_name: &str,
    port: u16,
) -> DeployResult<SitePaths> {
    let paths = SitePaths::for_site(site_name);
    info!("Writing nginx site {}", paths.available);

    remote.write_file(&render(server_name, port), &paths.available, true)?;
    remote.exec(
        &RemoteCommand::new("ln")
            .args(["-sf", paths.available.as_str(), paths.enabled.as_str()])
            .sudo(),
    )?;

    info!("Validating nginx configuration...");
    remote.exec(&RemoteCommand::new("nginx").arg("-t").sudo())?;
    remote.exec(&reload())?;

    info!("nginx reloaded: port 80 -> 127.0.0.1:{port}");
    Ok(paths)
}

#[must_use]
pub fn reload() -> RemoteCommand {
    RemoteCommand::new("systemctl").args(["reload", "nginx"]).sudo()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_site() {
        let site = render("example.org", 8080);

        assert!(site.starts_with("server {\n    listen 80;\n"));
        assert!(site.contains("server_name example.org;"));
        assert!(site.contains("location / {"));
        assert!(site.contains("proxy_pass http://127.0.0.1:8080;"));
        assert!(site.contains("proxy_set_header Host $host;"));
        assert!(site.contains("proxy_set_header X-Real-IP $remote_addr;"));
        assert!(site.contains("proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;"));
        assert!(site.contains("proxy_set_header X-Forwarded-Proto $scheme;"));
        assert!(site.ends_with("    }\n}\n"));
    }

    #[test]
    fn site_paths() {
        let paths = SitePaths::for_site("widget");

        assert_eq!(paths.available, "/etc/nginx/sites-available/widget");
        assert_eq!(paths.enabled, "/etc/nginx/sites-enabled/widget");
    }
}
