//! Parsers scraping values out of the Aptos CLI's human-readable output.
//!
//! The CLI does not return every value we need in a structured form, so each
//! known output format gets a parser here. A marker that is missing or that
//! appears more than once is always an error: ambiguous output is never guessed.

use crate::{
    constants::{
        DEPLOYED_ADDRESS_NEEDLE, JSON_STRING_FIELD_SUFFIX, MULTISIG_ADDRESS_PREFIX,
        SEQUENCE_NUMBER_PREFIX, UPGRADED_ADDRESS_NEEDLE,
    },
    errors::ScriptError,
};

/// Find the single line which, once trimmed, starts with `prefix` and ends
/// with `suffix`, and return the text between the two.
///
/// `what` names the value in error messages.
pub fn find_unique_value(
    lines: &[String],
    prefix: &str,
    suffix: &str,
    what: &str,
) -> Result<String, ScriptError> {
    let mut found = None;
    for line in lines.iter().map(|l| l.trim()) {
        if line.len() < prefix.len() + suffix.len() {
            continue;
        }

        let value = match line
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
        {
            Some(value) => value,
            None => continue,
        };

        if found.is_some() {
            return Err(ScriptError::Parse(format!(
                "found more than one {what} in the output"
            )));
        }
        found = Some(value.to_string());
    }

    found.ok_or_else(|| ScriptError::Parse(format!("unable to find {what} in the output")))
}

/// Parse the next transaction sequence number out of `aptos account list` output
pub fn parse_next_sequence_number(lines: &[String]) -> Result<u64, ScriptError> {
    let value = find_unique_value(
        lines,
        SEQUENCE_NUMBER_PREFIX,
        JSON_STRING_FIELD_SUFFIX,
        "next sequence number",
    )?;

    value
        .parse::<u64>()
        .map_err(|e| ScriptError::Parse(format!("invalid sequence number `{value}`: {e}")))
}

/// Parse the address of a freshly created account out of `aptos multisig create` output
pub fn parse_multisig_address(lines: &[String]) -> Result<String, ScriptError> {
    let address = find_unique_value(
        lines,
        MULTISIG_ADDRESS_PREFIX,
        JSON_STRING_FIELD_SUFFIX,
        "multisig address",
    )?;

    Ok(format!("0x{address}"))
}

/// Parse the object address reported by `aptos move deploy-object` or
/// `aptos move upgrade-object`
pub fn parse_object_address(lines: &[String], upgrade: bool) -> Result<String, ScriptError> {
    let needle = if upgrade {
        UPGRADED_ADDRESS_NEEDLE
    } else {
        DEPLOYED_ADDRESS_NEEDLE
    };

    find_unique_value(lines, needle, "", "object address")
}
