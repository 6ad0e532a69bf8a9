//! Scripts for deploying, configuring and upgrading the Aave Move packages on Aptos.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod chunks;
pub mod cli;
mod commands;
pub mod constants;
pub mod deploy;
pub mod errors;
pub mod ledger;
pub mod multisig;
pub mod parsers;
pub mod payload;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_helpers;
