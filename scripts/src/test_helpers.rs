//! A recording stand-in for the Aptos CLI used by unit tests

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    errors::ScriptError,
    utils::{CommandOutput, CommandRunner},
};

/// A single recorded invocation
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// The arguments passed to the CLI
    pub args: Vec<String>,
    /// The working directory of the invocation
    pub cwd: PathBuf,
    /// Whether the call was interactive
    pub interactive: bool,
}

/// The canned response of the mock to a given argument list
type Responder = Box<dyn Fn(&[String]) -> Result<CommandOutput, ScriptError>>;

/// A [`CommandRunner`] that records every call and answers with a closure
pub struct MockRunner {
    /// Produces the output of every call
    responder: Responder,
    /// Every call made, in order
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    /// Create a mock answering every call with `responder`
    pub fn new(
        responder: impl Fn(&[String]) -> Result<CommandOutput, ScriptError> + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Append a call to the record
    fn record(&self, args: &[String], cwd: &Path, interactive: bool) {
        self.calls.lock().unwrap().push(RecordedCall {
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            interactive,
        });
    }
}

impl CommandRunner for MockRunner {
    async fn execute(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, ScriptError> {
        self.record(args, cwd, false);
        (self.responder)(args)
    }

    async fn execute_interactive(&self, args: &[String], cwd: &Path) -> Result<(), ScriptError> {
        self.record(args, cwd, true);
        (self.responder)(args).map(|_| ())
    }
}

/// The argument following `flag`, if present
pub fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Whether the call is an `aptos <group> <command>` invocation
pub fn is_command(args: &[String], group: &str, command: &str) -> bool {
    args.len() >= 2 && args[0] == group && args[1] == command
}

/// `account list` output reporting the given next sequence number
pub fn account_list_output(next_sequence_number: u64) -> CommandOutput {
    CommandOutput::from_stdout(&[
        "{".to_string(),
        "  \"Result\": [".to_string(),
        "    {".to_string(),
        "      \"0x1::multisig_account::MultisigAccount\": {".to_string(),
        format!("        \"next_sequence_number\": \"{next_sequence_number}\","),
        "        \"num_signatures_required\": \"1\"".to_string(),
        "      }".to_string(),
        "    }".to_string(),
        "  ]".to_string(),
        "}".to_string(),
    ])
}
