//! In-memory stand-ins for git, the remote host, and the HTTP probe.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dropship::error::{DeployError, DeployResult};
use dropship::git::SourceControl;
use dropship::params::{DeployParams, ParamsBuilder};
use dropship::probe::HttpProbe;
use dropship::remote::{Remote, RemoteCommand, SENTINEL};

#[derive(Default)]
struct RemoteState {
    commands: Vec<String>,
    rules: Vec<(String, Option<String>)>,
    files: Vec<(String, String)>,
    synced: Vec<(PathBuf, String)>,
    fail_sync: bool,
}

/// Records every command. Replies come from rules matched by
/// substring, in insertion order; unmatched commands succeed with
/// empty output, and the connectivity check echoes the sentinel.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Rc<RefCell<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` succeed with `output`.
    pub fn reply(self, pattern: &str, output: &str) -> Self {
        self.state
            .borrow_mut()
            .rules
            .push((pattern.to_string(), Some(output.to_string())));
        self
    }

    /// Commands containing `pattern` fail.
    pub fn fail(self, pattern: &str) -> Self {
        self.state
            .borrow_mut()
            .rules
            .push((pattern.to_string(), None));
        self
    }

    pub fn fail_sync(self) -> Self {
        self.state.borrow_mut().fail_sync = true;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.commands().iter().any(|c| c.contains(pattern))
    }

    pub fn files(&self) -> Vec<(String, String)> {
        self.state.borrow().files.clone()
    }

    pub fn synced(&self) -> Vec<(PathBuf, String)> {
        self.state.borrow().synced.clone()
    }
}

impl Remote for FakeRemote {
    fn exec(&self, command: &RemoteCommand) -> DeployResult<String> {
        let line = command.render()?;
        let mut state = self.state.borrow_mut();
        state.commands.push(line.clone());

        let reply = state
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Some(output)) => Ok(output),
            Some(None) => Err(DeployError::Other(format!("fake failure: {line}"))),
            None if line == format!("echo {SENTINEL}") => Ok(SENTINEL.to_string()),
            None => Ok(String::new()),
        }
    }

    fn write_file(&self, content: &str, path: &str, _sudo: bool) -> DeployResult<()> {
        self.state
            .borrow_mut()
            .files
            .push((path.to_string(), content.to_string()));
        Ok(())
    }

    fn sync_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_sync {
            return Err(DeployError::Other("fake rsync failure".into()));
        }
        state
            .synced
            .push((local.to_path_buf(), remote_dir.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct ScmState {
    clone_files: Vec<&'static str>,
    clone_fails: bool,
    update_fails: bool,
    clones: Vec<(String, String)>,
    updates: Vec<String>,
}

/// Writes a fixed set of files on clone, or fails on demand.
#[derive(Clone, Default)]
pub struct FakeSourceControl {
    state: Rc<RefCell<ScmState>>,
}

impl FakeSourceControl {
    /// A clone that produces `files` (empty contents, except compose
    /// files which get a minimal service).
    pub fn with_files(files: &[&'static str]) -> Self {
        let scm = Self::default();
        scm.state.borrow_mut().clone_files = files.to_vec();
        scm
    }

    pub fn failing_clone(self) -> Self {
        self.state.borrow_mut().clone_fails = true;
        self
    }

    pub fn failing_update(self) -> Self {
        self.state.borrow_mut().update_fails = true;
        self
    }

    pub fn clones(&self) -> Vec<(String, String)> {
        self.state.borrow().clones.clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.state.borrow().updates.clone()
    }
}

impl SourceControl for FakeSourceControl {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> DeployResult<()> {
        let mut state = self.state.borrow_mut();
        state.clones.push((url.to_string(), branch.to_string()));
        if state.clone_fails {
            return Err(DeployError::Other("fake clone failure".into()));
        }

        std::fs::create_dir_all(dest)?;
        for file in &state.clone_files {
            let content = if file.contains("compose") {
                "services:\n  web:\n    build: .\n    ports:\n      - \"5000:5000\"\n"
            } else {
                ""
            };
            std::fs::write(dest.join(file), content)?;
        }
        Ok(())
    }

    fn update_branch(&self, _dest: &Path, branch: &str) -> DeployResult<()> {
        let mut state = self.state.borrow_mut();
        state.updates.push(branch.to_string());
        if state.update_fails {
            return Err(DeployError::Other("fake fetch failure".into()));
        }
        Ok(())
    }
}

/// Answers every request with the same status, or not at all.
pub struct FakeProbe(pub Option<u16>);

impl HttpProbe for FakeProbe {
    fn status(&self, _url: &str) -> Option<u16> {
        self.0
    }
}

/// Parameters for a deployment of `repo` to `203.0.113.7`, port 5000.
/// The returned key file must outlive the parameters' use.
pub fn params(repo: &str) -> (DeployParams, tempfile::NamedTempFile) {
    let key = tempfile::NamedTempFile::new().expect("temp key");
    let params = ParamsBuilder::new()
        .repo_url(repo)
        .branch("main")
        .ssh_user("deploy")
        .ssh_host("203.0.113.7")
        .ssh_key(key.path().to_str().expect("utf-8 path"))
        .app_port("5000")
        .build()
        .expect("valid params");
    (params, key)
}
