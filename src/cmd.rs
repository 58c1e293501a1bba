use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::{DeployError, DeployResult};

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code. Both output streams are written to
/// the log at debug level.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    run_masked(program, args, &[])
}

/// Like [`run`], but every occurrence of a `masked` value is
/// replaced with `***` in the logged command line and output.
pub fn run_masked(program: &str, args: &[&str], masked: &[&str]) -> DeployResult<String> {
    let command = mask(&format_command(program, args), masked);
    debug!("$ {command}");

    let output = spawn(program, args)?;
    finish(command, &output, masked)
}

/// Run a command that pipes its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> DeployResult<String> {
    use std::io::Write;

    let command = format_command(program, args);
    debug!("$ {command} (with {} bytes on stdin)", stdin_data.len());

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;
    finish(command, &output, &[])
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn finish(command: String, output: &Output, masked: &[&str]) -> DeployResult<String> {
    let stdout = mask(String::from_utf8_lossy(&output.stdout).trim(), masked);
    let stderr = mask(String::from_utf8_lossy(&output.stderr).trim(), masked);

    for line in stdout.lines() {
        debug!("  | {line}");
    }
    for line in stderr.lines() {
        debug!("  ! {line}");
    }

    if output.status.success() {
        Ok(stdout)
    } else {
        Err(DeployError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

fn spawn(program: &str, args: &[&str]) -> DeployResult<Output> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

fn not_found_or_io(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}

/// Replace each non-empty `masked` value in `text` with `***`.
/// Longer values go first so one never leaves a fragment of another.
#[must_use]
pub fn mask(text: &str, masked: &[&str]) -> String {
    let mut values: Vec<&str> = masked.iter().copied().filter(|m| !m.is_empty()).collect();
    values.sort_by_key(|m| std::cmp::Reverse(m.len()));
    values
        .into_iter()
        .fold(text.to_string(), |acc, m| acc.replace(m, "***"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_replaces_every_occurrence() {
        let text = "https://tok@host/repo.git failed for tok";
        assert_eq!(mask(text, &["tok"]), "https://***@host/repo.git failed for ***");
    }

    #[test]
    fn mask_prefers_longest_value() {
        assert_eq!(mask("https://a%25b@host", &["%", "a%25b"]), "https://***@host");
    }

    #[test]
    fn mask_ignores_empty_values() {
        assert_eq!(mask("unchanged", &[""]), "unchanged");
    }

    #[test]
    fn run_captures_stdout() {
        let out = run("sh", &["-c", "echo hello"]).expect("sh should run");
        assert_eq!(out, "hello");
    }

    #[test]
    fn run_reports_failure() {
        let err = run("sh", &["-c", "exit 3"]).unwrap_err();
        assert!(matches!(err, DeployError::CommandFailed { .. }));
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = run("dropship-definitely-missing", &[]).unwrap_err();
        assert!(matches!(err, DeployError::CommandNotFound(_)));
    }

    #[test]
    fn stdin_is_forwarded() {
        let out = run_with_stdin("cat", &[], b"piped").expect("cat should run");
        assert_eq!(out, "piped");
    }
}
