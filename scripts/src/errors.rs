//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error spawning an external command
    CommandSpawn(String),
    /// An external command exited unsuccessfully
    CommandFailed {
        /// The full command line that was executed
        command: String,
        /// The exit code, `None` if the process was killed by a signal
        code: Option<i32>,
        /// The captured standard output
        stdout: String,
        /// The captured standard error
        stderr: String,
    },
    /// An expected marker was not found exactly once in a command's output
    Parse(String),
    /// On-chain state disagrees with what the scripts expect
    Consistency(String),
    /// A transaction payload file has an unexpected shape
    Payload(String),
    /// Error reading a file
    ReadFile(String),
    /// Error writing a file
    WriteFile(String),
    /// Error de/serializing JSON
    Serde(String),
    /// A chunk size of zero was requested
    InvalidChunkSize,
    /// Error setting up logging
    Logging(String),
    /// Error reading input from the operator
    UserInput(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::CommandSpawn(s) => write!(f, "error spawning command: {}", s),
            ScriptError::CommandFailed {
                command,
                code,
                stdout,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "command `{}` failed with exit code {}", command, code)?,
                    None => write!(f, "command `{}` was terminated by a signal", command)?,
                }
                write!(f, "\nstdout:\n{}\nstderr:\n{}", stdout, stderr)
            }
            ScriptError::Parse(s) => write!(f, "error parsing command output: {}", s),
            ScriptError::Consistency(s) => write!(f, "consistency check failed: {}", s),
            ScriptError::Payload(s) => write!(f, "invalid transaction payload: {}", s),
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteFile(s) => write!(f, "error writing file: {}", s),
            ScriptError::Serde(s) => write!(f, "error de/serializing JSON: {}", s),
            ScriptError::InvalidChunkSize => write!(f, "chunk size must be positive"),
            ScriptError::Logging(s) => write!(f, "error setting up logging: {}", s),
            ScriptError::UserInput(s) => write!(f, "error reading user input: {}", s),
        }
    }
}

impl Error for ScriptError {}
