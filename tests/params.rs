use std::cell::RefCell;

use dropship::cmd;
use dropship::error::DeployResult;
use dropship::params::ParamsBuilder;
use dropship::prompt::{NoPrompt, Prompter};

/// Answers prompts in order and records the labels asked.
struct Scripted {
    answers: RefCell<Vec<&'static str>>,
    asked: RefCell<Vec<String>>,
}

impl Scripted {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().rev().copied().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for Scripted {
    fn input(&self, label: &str, default: Option<&str>) -> DeployResult<String> {
        self.asked.borrow_mut().push(label.to_string());
        let answer = self.answers.borrow_mut().pop().unwrap_or_default();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    fn secret(&self, label: &str) -> DeployResult<Option<String>> {
        self.asked.borrow_mut().push(label.to_string());
        let answer = self.answers.borrow_mut().pop().unwrap_or_default();
        Ok(Some(answer.to_string()).filter(|a| !a.is_empty()))
    }
}

#[test]
fn prompts_only_for_missing_values() {
    let key = tempfile::NamedTempFile::new().unwrap();
    let prompter = Scripted::new(&["", "", "ops", "8080"]);

    let params = ParamsBuilder::new()
        .repo_url("https://github.com/acme/widget.git")
        .ssh_host("203.0.113.7")
        .ssh_key(key.path().to_str().unwrap())
        .prompt_missing(&prompter)
        .unwrap()
        .build()
        .unwrap();

    let asked = prompter.asked.borrow();
    assert_eq!(asked.len(), 4);
    assert!(asked[0].starts_with("Access token"));
    assert_eq!(asked[1], "Branch");
    assert_eq!(params.token_value(), None);
    assert_eq!(params.branch, "main");
    assert_eq!(params.ssh_user, "ops");
    assert_eq!(params.app_port, 8080);
    assert_eq!(params.destination(), "ops@203.0.113.7");
}

#[test]
fn secret_answer_becomes_token() {
    let key = tempfile::NamedTempFile::new().unwrap();
    let prompter = Scripted::new(&["tok3n"]);

    let params = ParamsBuilder::new()
        .repo_url("https://example.org/acme/widget.git")
        .branch("main")
        .ssh_user("deploy")
        .ssh_host("203.0.113.7")
        .ssh_key(key.path().to_str().unwrap())
        .app_port("80")
        .prompt_missing(&prompter)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(params.token_value(), Some("tok3n"));
    assert_eq!(params.clone_url(), "https://tok3n@example.org/acme/widget.git");
}

#[test]
fn non_interactive_missing_values_fail_validation() {
    let err = ParamsBuilder::new()
        .repo_url("https://github.com/acme/widget.git")
        .prompt_missing(&NoPrompt)
        .unwrap()
        .build()
        .unwrap_err();

    assert!(err.to_string().contains("SSH username is required"));
}

#[test]
fn token_is_redacted_in_debug_output() {
    let key = tempfile::NamedTempFile::new().unwrap();
    let params = ParamsBuilder::new()
        .repo_url("https://github.com/acme/widget.git")
        .token("hunter2")
        .ssh_user("deploy")
        .ssh_host("203.0.113.7")
        .ssh_key(key.path().to_str().unwrap())
        .app_port("5000")
        .build()
        .unwrap();

    assert!(!format!("{params:?}").contains("hunter2"));
}

#[test]
fn encoded_token_never_reaches_command_output() {
    let key = tempfile::NamedTempFile::new().unwrap();
    let params = ParamsBuilder::new()
        .repo_url("https://gitlab.com/acme/widget.git")
        .token("glpat:ab/c d")
        .ssh_user("deploy")
        .ssh_host("203.0.113.7")
        .ssh_key(key.path().to_str().unwrap())
        .app_port("5000")
        .build()
        .unwrap();
    let url = params.clone_url();
    let values = params.masked_values();
    let masked: Vec<&str> = values.iter().map(String::as_str).collect();

    let out = cmd::run_masked("sh", &["-c", "echo \"cloning $0\"", &url], &masked).unwrap();
    assert_eq!(out, "cloning https://***@gitlab.com/acme/widget.git");

    let err = cmd::run_masked("sh", &["-c", "exit 128", &url], &masked).unwrap_err();
    assert!(!err.to_string().contains("glpat"));
    assert!(!format!("{err:?}").contains("glpat"));
}
