//! Utilities for the deploy scripts: running the Aptos CLI, logging, and
//! operator prompts

use std::{
    env,
    fs::File,
    io::{self, Write},
    path::Path,
    process::Stdio,
    sync::Arc,
};

use chrono::Utc;
use itertools::Itertools;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
};
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    constants::{LOG_FILE_PREFIX, VERBOSE_ENV_VAR},
    errors::ScriptError,
};

/// The output captured from a successful command, one entry per line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Lines written to standard output
    pub stdout: Vec<String>,
    /// Lines written to standard error
    pub stderr: Vec<String>,
}

#[cfg(test)]
impl CommandOutput {
    /// Build an output consisting only of the given stdout lines
    pub fn from_stdout<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            stdout: lines.iter().map(|l| l.as_ref().to_string()).collect(),
            stderr: Vec::new(),
        }
    }
}

/// Executes invocations of an external command-line tool.
///
/// `args` never contain the program itself; implementations decide which
/// binary the arguments are passed to.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run the command to completion, capturing both output streams.
    ///
    /// Fails with [`ScriptError::CommandFailed`] if the process exits unsuccessfully.
    async fn execute(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, ScriptError>;

    /// Run the command with the terminal attached, for steps that interact with the operator
    async fn execute_interactive(&self, args: &[String], cwd: &Path) -> Result<(), ScriptError>;
}

/// A [`CommandRunner`] spawning a local binary
#[derive(Clone, Debug)]
pub struct CliRunner {
    /// The program every invocation runs
    program: String,
}

impl CliRunner {
    /// Create a runner for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The command line as it would be typed in a shell, used in logs and errors
    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().map(String::as_str))
            .join(" ")
    }

    /// Spawn a long-running process with inherited stdio, killed when the handle drops
    pub fn spawn_background(&self, args: &[String], cwd: &Path) -> Result<Child, ScriptError> {
        debug!("Spawning background command: {}", self.command_line(args));
        Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScriptError::CommandSpawn(format!("{}: {e}", self.command_line(args))))
    }
}

impl CommandRunner for CliRunner {
    async fn execute(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, ScriptError> {
        let command_line = self.command_line(args);
        debug!("Executing command: {command_line}");

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScriptError::CommandSpawn(format!("{command_line}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScriptError::CommandSpawn("stdout was not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScriptError::CommandSpawn("stderr was not piped".to_string()))?;

        // Drain both pipes from a single loop so that neither fills up and
        // blocks the child. Lines may hold invalid UTF-8.
        let mut stdout_lines = BufReader::new(stdout).split(b'\n');
        let mut stderr_lines = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut output = CommandOutput::default();

        while stdout_open || stderr_open {
            tokio::select! {
                segment = stdout_lines.next_segment(), if stdout_open => {
                    let segment = segment.map_err(|e| {
                        ScriptError::CommandSpawn(format!("{command_line}: reading stdout: {e}"))
                    })?;
                    match segment {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            debug!("[stdout] {line}");
                            output.stdout.push(line);
                        }
                        None => stdout_open = false,
                    }
                }
                segment = stderr_lines.next_segment(), if stderr_open => {
                    let segment = segment.map_err(|e| {
                        ScriptError::CommandSpawn(format!("{command_line}: reading stderr: {e}"))
                    })?;
                    match segment {
                        Some(bytes) => {
                            let line = decode_line(&bytes);
                            debug!("[stderr] {line}");
                            output.stderr.push(line);
                        }
                        None => stderr_open = false,
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ScriptError::CommandSpawn(format!("{command_line}: {e}")))?;

        if !status.success() {
            return Err(ScriptError::CommandFailed {
                command: command_line,
                code: status.code(),
                stdout: output.stdout.join("\n"),
                stderr: output.stderr.join("\n"),
            });
        }

        Ok(output)
    }

    async fn execute_interactive(&self, args: &[String], cwd: &Path) -> Result<(), ScriptError> {
        let command_line = self.command_line(args);
        debug!("Executing interactive command: {command_line}");

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ScriptError::CommandSpawn(format!("{command_line}: {e}")))?;

        if !status.success() {
            return Err(ScriptError::CommandFailed {
                command: command_line,
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}

/// Decode one line of process output, replacing invalid UTF-8
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

/// Convert a list of string slices into owned command arguments
pub fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Set up console and file logging.
///
/// The console honours `RUST_LOG`, falling back to `debug` when `VERBOSE=1`
/// and `info` otherwise. Everything at debug level and above is also written
/// to a timestamped log file in `log_dir`.
pub fn setup_logging(log_dir: &Path) -> Result<(), ScriptError> {
    let verbose = env::var(VERBOSE_ENV_VAR).is_ok_and(|v| v == "1");
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let log_path = log_dir.join(format!(
        "{LOG_FILE_PREFIX}{}.log",
        Utc::now().format("%Y-%m-%dT%H-%M-%SZ")
    ));
    let log_file = File::create(&log_path)
        .map_err(|e| ScriptError::Logging(format!("{}: {e}", log_path.display())))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file))
                .with_filter(LevelFilter::DEBUG),
        )
        .try_init()
        .map_err(|e| ScriptError::Logging(e.to_string()))
}

/// Run blocking work on the runtime's blocking pool
pub async fn run_blocking<T, F>(f: F) -> Result<T, ScriptError>
where
    F: FnOnce() -> Result<T, ScriptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScriptError::UserInput(e.to_string()))?
}

/// Prompt the operator and wait for a line of input
pub async fn prompt_for_input(prompt: &str) -> Result<String, ScriptError> {
    let prompt = prompt.to_string();
    run_blocking(move || read_line_from_stdin(&prompt)).await
}

/// Print the prompt and read one trimmed line from stdin
fn read_line_from_stdin(prompt: &str) -> Result<String, ScriptError> {
    print!("{}: ", prompt);
    io::stdout()
        .flush()
        .map_err(|e| ScriptError::UserInput(e.to_string()))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| ScriptError::UserInput(e.to_string()))?;

    Ok(input.trim().to_string())
}
