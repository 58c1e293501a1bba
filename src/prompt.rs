use std::io::{IsTerminal, Write};
use std::process::Command;

use dialoguer::{Input, Password};
use tracing::debug;

use crate::error::{DeployError, DeployResult};

/// Source of operator answers for parameters not given on the
/// command line.
pub trait Prompter {
    /// Ask for a plain value. Blank answers fall back to `default`
    /// when one is given.
    fn input(&self, label: &str, default: Option<&str>) -> DeployResult<String>;

    /// Ask for a hidden value. `None` when nothing was entered.
    fn secret(&self, label: &str) -> DeployResult<Option<String>>;
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, label: &str, default: Option<&str>) -> DeployResult<String> {
        let mut input = Input::<String>::new().with_prompt(label).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_error)
    }

    fn secret(&self, label: &str) -> DeployResult<Option<String>> {
        let value = Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }
}

/// Refuses every prompt. Used with `--non-interactive`, so that a
/// missing required value fails validation instead of blocking.
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn input(&self, _label: &str, default: Option<&str>) -> DeployResult<String> {
        Ok(default.unwrap_or_default().to_string())
    }

    fn secret(&self, _label: &str) -> DeployResult<Option<String>> {
        Ok(None)
    }
}

/// Undo what an interrupted prompt leaves behind: echo turned off by
/// a hidden prompt, or a hidden cursor. Does nothing when the standard
/// streams are not terminals.
pub fn restore_terminal() {
    if std::io::stdin().is_terminal() {
        match Command::new("stty").arg("sane").status() {
            Ok(status) if status.success() => {}
            Ok(status) => debug!("stty sane exited with {status}"),
            Err(e) => debug!("could not run stty: {e}"),
        }
    }

    let mut stderr = std::io::stderr();
    if stderr.is_terminal() {
        let _ = stderr.write_all(b"\x1b[?25h\n");
        let _ = stderr.flush();
    }
}

fn prompt_error(e: dialoguer::Error) -> DeployError {
    DeployError::Other(format!("prompt failed: {e}"))
}
