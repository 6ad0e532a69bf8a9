//! The address ledger: object addresses of deployed packages, kept as one
//! plain-text file per package so that later runs can wire dependencies.
//!
//! Files are not locked; concurrent runs against the same directory are not
//! supported.

use std::{fs, path::PathBuf};

use itertools::Itertools;
use tracing::debug;

use crate::{
    constants::{LEDGER_FILE_PREFIX, LEDGER_FILE_SUFFIX},
    errors::ScriptError,
};

/// A file-backed map from package named address to deployed object address
#[derive(Clone, Debug)]
pub struct AddressLedger {
    /// The directory holding the ledger files
    dir: PathBuf,
}

impl AddressLedger {
    /// Open a ledger rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path of the file recording the address of `package`
    pub fn path_for(&self, package: &str) -> PathBuf {
        self.dir
            .join(format!("{LEDGER_FILE_PREFIX}{package}{LEDGER_FILE_SUFFIX}"))
    }

    /// Retrieve the recorded object address of `package`
    pub fn get(&self, package: &str) -> Result<String, ScriptError> {
        let path = self.path_for(package);
        let contents = fs::read_to_string(&path).map_err(|e| {
            ScriptError::ReadFile(format!(
                "no deployed address for `{package}` at {}: {e}",
                path.display()
            ))
        })?;

        let address = contents.trim();
        if address.is_empty() {
            return Err(ScriptError::ReadFile(format!(
                "ledger file {} is empty",
                path.display()
            )));
        }

        Ok(address.to_string())
    }

    /// Record the object address of `package`, replacing any previous entry
    pub fn set(&self, package: &str, address: &str) -> Result<(), ScriptError> {
        let path = self.path_for(package);
        debug!("Recording {package} at {address} in {}", path.display());
        fs::write(&path, address)
            .map_err(|e| ScriptError::WriteFile(format!("{}: {e}", path.display())))
    }

    /// Render `name=address` pairs for the given packages, as expected by
    /// `--named-addresses`
    pub fn named_addresses(&self, packages: &[&str]) -> Result<Vec<String>, ScriptError> {
        packages
            .iter()
            .map(|name| self.get(name).map(|addr| format!("{name}={addr}")))
            .try_collect()
    }
}
