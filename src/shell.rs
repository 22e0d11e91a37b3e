use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("command is empty")]
    Empty,
    #[error("could not start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command '{command}' failed: {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

impl ShellError {
    /// Whatever the command printed before failing, if anything.
    pub fn output(&self) -> Option<&str> {
        match self {
            ShellError::Failed { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

fn display_argv(argv: &[String]) -> String {
    argv.join(" ")
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !err.trim().is_empty() {
        if !out.trim().is_empty() {
            out.push('\n');
        }
        out.push_str(&err);
    }
    out.trim().to_string()
}

/// Run `argv` to completion and return stdout and stderr, trimmed.
pub fn run_command(argv: &[String]) -> Result<String, ShellError> {
    let (bin, args) = argv.split_first().ok_or(ShellError::Empty)?;
    let command = display_argv(argv);
    tracing::debug!(%command, "running");

    let out = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ShellError::Spawn { command: command.clone(), source })?;

    let output = combine(&out.stdout, &out.stderr);
    if out.status.success() {
        Ok(output)
    } else {
        tracing::debug!(%command, status = %out.status, "command failed");
        Err(ShellError::Failed { command, status: out.status, output })
    }
}

/// Like [`run_command`] but keeps stdout only, untrimmed apart from the
/// trailing newline.
pub fn capture_stdout(argv: &[String]) -> Result<String, ShellError> {
    let (bin, args) = argv.split_first().ok_or(ShellError::Empty)?;
    let command = display_argv(argv);
    let out = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ShellError::Spawn { command: command.clone(), source })?;
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stdout = stdout.strip_suffix('\n').unwrap_or(&stdout);
    let stdout = stdout.strip_suffix('\r').unwrap_or(stdout).to_string();
    if out.status.success() {
        Ok(stdout)
    } else {
        Err(ShellError::Failed { command, status: out.status, output: stdout })
    }
}

/// Run `argv` and report only whether it exited successfully.
pub fn run_quiet(argv: &[String]) -> bool {
    let Some((bin, args)) = argv.split_first() else {
        return false;
    };
    Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Run `argv` with the parent's terminal attached.
pub fn run_inherited(argv: &[String]) -> Result<ExitStatus, ShellError> {
    let (bin, args) = argv.split_first().ok_or(ShellError::Empty)?;
    Command::new(bin)
        .args(args)
        .status()
        .map_err(|source| ShellError::Spawn { command: display_argv(argv), source })
}

pub fn command_exists(bin: &str) -> bool {
    which::which(bin).is_ok()
}
