/// Names derived from the repository URL.
///
/// # Example
///
/// ```
/// use dropship::names::ProjectNames;
///
/// let names = ProjectNames::from_repo_url("https://github.com/acme/My_App.git");
///
/// assert_eq!(names.project, "My_App");
/// assert_eq!(names.sanitized, "my_app");
/// assert_eq!(names.remote_dir(), "deploy_My_App");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNames {
    /// Basename of the repository, as written in the URL.
    pub project: String,
    /// Container, image, and proxy file token.
    pub sanitized: String,
}

impl ProjectNames {
    #[must_use]
    pub fn from_repo_url(repo_url: &str) -> Self {
        let project = project_name(repo_url);
        let sanitized = sanitize(&project);
        Self { project, sanitized }
    }

    /// Deployment directory, relative to the remote user's home.
    #[must_use]
    pub fn remote_dir(&self) -> String {
        format!("deploy_{}", self.dir_component())
    }

    /// Image reference built for the Dockerfile deployment type.
    #[must_use]
    pub fn image_tag(&self) -> String {
        format!("{}:latest", self.sanitized)
    }

    // The project name is used verbatim unless it is empty or would need
    // quoting on the remote shell.
    fn dir_component(&self) -> &str {
        let safe = self
            .project
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if safe && !self.project.is_empty() {
            &self.project
        } else {
            &self.sanitized
        }
    }
}

/// Last path segment of a repository URL, without a trailing `.git`.
///
/// Handles `https://host/a/b.git`, `git@host:a/b.git`, and local paths.
#[must_use]
pub fn project_name(repo_url: &str) -> String {
    let trimmed = repo_url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Normalize a name into `[a-z0-9_.-]`. Every other character maps to
/// `-`. Idempotent; an empty name becomes `app`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let out: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if out.is_empty() { "app".to_string() } else { out }
}
