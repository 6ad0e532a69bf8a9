//! The JSON transaction payload produced by `aptos move build-publish-payload`
//! and consumed by `aptos multisig create-transaction --json-file`

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    constants::{OBJECT_CODE_UPGRADE_FUNCTION_ID, PUBLISH_PACKAGE_FUNCTION_ID},
    errors::ScriptError,
};

/// An entry function call as serialized by the Aptos CLI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    /// The fully qualified function id
    pub function_id: String,
    /// Type arguments of the call
    #[serde(default)]
    pub type_args: Vec<String>,
    /// Arguments of the call
    pub args: Vec<PayloadArg>,
    /// Any other fields the CLI emits, preserved on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed argument of an entry function call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadArg {
    /// The Move type of the argument, e.g. `hex` or `address`
    #[serde(rename = "type")]
    pub arg_type: String,
    /// The argument value, a string or an array of strings
    pub value: Value,
}

/// The decoded contents of a package publication payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagePublication {
    /// The serialized package metadata
    pub metadata: Vec<u8>,
    /// The bytecode of each module, in publication order
    pub modules: Vec<Vec<u8>>,
}

impl EntryFunctionPayload {
    /// Read a payload from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents).map_err(|e| ScriptError::Serde(e.to_string()))
    }

    /// Write the payload to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<(), ScriptError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| ScriptError::Serde(e.to_string()))?;
        fs::write(path, contents)
            .map_err(|e| ScriptError::WriteFile(format!("{}: {e}", path.display())))
    }

    /// Check that the payload publishes a package and decode its metadata and modules
    pub fn package_publication(&self) -> Result<PackagePublication, ScriptError> {
        self.check_is_publication()?;

        let metadata_arg = &self.args[0];
        check_arg_type(metadata_arg, "hex")?;
        let metadata = metadata_arg
            .value
            .as_str()
            .ok_or_else(|| ScriptError::Payload("metadata is not a hex string".to_string()))
            .and_then(decode_hex)?;

        let code_arg = &self.args[1];
        check_arg_type(code_arg, "hex")?;
        let modules = code_arg
            .value
            .as_array()
            .ok_or_else(|| ScriptError::Payload("code is not an array".to_string()))?
            .iter()
            .map(|module| {
                module
                    .as_str()
                    .ok_or_else(|| ScriptError::Payload("module is not a hex string".to_string()))
                    .and_then(decode_hex)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PackagePublication { metadata, modules })
    }

    /// Turn a package publication into an upgrade of the code deployed at `object_address`
    pub fn into_object_upgrade(mut self, object_address: &str) -> Result<Self, ScriptError> {
        self.check_is_publication()?;

        self.function_id = OBJECT_CODE_UPGRADE_FUNCTION_ID.to_string();
        self.args.push(PayloadArg {
            arg_type: "address".to_string(),
            value: Value::String(object_address.to_string()),
        });

        Ok(self)
    }

    /// Check that the payload calls `publish_package_txn` with metadata and code
    fn check_is_publication(&self) -> Result<(), ScriptError> {
        if self.function_id != PUBLISH_PACKAGE_FUNCTION_ID {
            return Err(ScriptError::Payload(format!(
                "expected a call to {PUBLISH_PACKAGE_FUNCTION_ID}, found {}",
                self.function_id
            )));
        }

        if self.args.len() != 2 {
            return Err(ScriptError::Payload(format!(
                "expected 2 arguments, found {}",
                self.args.len()
            )));
        }

        Ok(())
    }
}

/// Check the Move type tag of an argument
fn check_arg_type(arg: &PayloadArg, expected: &str) -> Result<(), ScriptError> {
    if arg.arg_type != expected {
        return Err(ScriptError::Payload(format!(
            "expected a `{expected}` argument, found `{}`",
            arg.arg_type
        )));
    }
    Ok(())
}

/// Decode a `0x`-prefixed hex string
fn decode_hex(s: &str) -> Result<Vec<u8>, ScriptError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ScriptError::Payload(format!("hex value `{s}` lacks a 0x prefix")))?;
    hex::decode(digits).map_err(|e| ScriptError::Payload(e.to_string()))
}
