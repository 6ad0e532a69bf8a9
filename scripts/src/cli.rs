//! Definitions of CLI arguments and commands for the deploy scripts

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy_localnet, run_remote},
    constants::{
        APTOS_BIN, DEFAULT_CHUNK_SIZE, DEFAULT_LOCALNET_DEPLOYER, DEFAULT_MAX_GAS,
        LOCALNET_FAUCET_URL, LOCALNET_FULLNODE_URL, MAINNET_DEFAULTS, TESTNET_DEFAULTS,
    },
    errors::ScriptError,
    types::{Network, Package, SetupStep},
    utils::CliRunner,
};

/// Deploy, configure and upgrade the Aave Move packages with the Aptos CLI
#[derive(Parser)]
pub struct Cli {
    /// Path to the Aptos CLI binary
    #[arg(long, env = "APTOS_BIN", default_value = APTOS_BIN)]
    pub aptos_bin: String,

    /// Root directory of the Move project, also where addresses and logs are written
    #[arg(long, env = "PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// The network to deploy to
    #[command(subcommand)]
    pub command: Command,
}

/// The network to run against
#[derive(Subcommand)]
pub enum Command {
    /// Run the full deployment against a fresh local testnet
    Localnet(LocalnetArgs),
    /// Run a single deployment step on testnet
    Testnet(RemoteArgs),
    /// Run a single deployment step on mainnet
    Mainnet(RemoteArgs),
}

impl Command {
    /// Run the command, invoking the Aptos CLI through `runner`
    pub async fn run(self, runner: &CliRunner, project_dir: &Path) -> Result<(), ScriptError> {
        match self {
            Command::Localnet(args) => deploy_localnet(args, runner, project_dir).await,
            Command::Testnet(args) => {
                run_remote(args, Network::Testnet, runner, project_dir).await
            }
            Command::Mainnet(args) => {
                run_remote(args, Network::Mainnet, runner, project_dir).await
            }
        }
    }
}

/// Arguments of the local testnet deployment
#[derive(Args)]
pub struct LocalnetArgs {
    /// Profile name of the deployer account
    #[arg(long, env = "DEPLOYER", default_value = DEFAULT_LOCALNET_DEPLOYER)]
    pub deployer: String,

    /// Fullnode URL of the local testnet
    #[arg(long, env = "FULLNODE_URL", default_value = LOCALNET_FULLNODE_URL)]
    pub fullnode: String,

    /// Faucet URL of the local testnet
    #[arg(long, default_value = LOCALNET_FAUCET_URL)]
    pub faucet: String,
}

/// Arguments shared by the testnet and mainnet commands.
///
/// Every address left unset falls back to the defaults of the network.
#[derive(Args)]
pub struct RemoteArgs {
    /// Profile name of the deployer account
    #[arg(long, env = "DEPLOYER")]
    pub deployer: String,

    /// Fullnode URL of the network
    #[arg(long, env = "FULLNODE_URL")]
    pub fullnode: Option<String>,

    /// Address of the `LargePackages` module used for chunked upgrades
    #[arg(long)]
    pub large_packages_module: Option<String>,

    /// Address of the Chainlink platform package
    #[arg(long)]
    pub chainlink_platform: Option<String>,

    /// Address of the Chainlink data feeds package
    #[arg(long)]
    pub chainlink_data_feeds: Option<String>,

    /// The pool admin multisig account
    #[arg(long)]
    pub multisig_pool_admin: Option<String>,

    /// The multisig account owning `aave_config`
    #[arg(long)]
    pub multisig_aave_config: Option<String>,

    /// The multisig account owning `aave_acl`
    #[arg(long)]
    pub multisig_aave_acl: Option<String>,

    /// The multisig account owning `aave_math`
    #[arg(long)]
    pub multisig_aave_math: Option<String>,

    /// The multisig account owning `aave_mock_underlyings`
    #[arg(long)]
    pub multisig_mock_underlyings: Option<String>,

    /// The multisig account owning `aave_oracle`
    #[arg(long)]
    pub multisig_aave_oracle: Option<String>,

    /// The multisig account owning `aave_pool`
    #[arg(long)]
    pub multisig_aave_core: Option<String>,

    /// The multisig account owning `aave_data`
    #[arg(long)]
    pub multisig_aave_data: Option<String>,

    /// Maximum number of payload bytes staged per multisig transaction
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Gas limit of each transaction
    #[arg(long, default_value_t = DEFAULT_MAX_GAS)]
    pub max_gas: u64,

    /// Fetch the latest version of git dependencies when building packages
    #[arg(long)]
    pub fetch_latest_git_deps: bool,

    /// The step to run
    #[command(subcommand)]
    pub command: RemoteCommand,
}

/// A single deployment step on a remote network
#[derive(Subcommand)]
pub enum RemoteCommand {
    /// Clear the chunked publication staging area of the deployer or of a multisig account
    ClearStagingArea(ClearStagingAreaArgs),
    /// Publish a package to a newly created object
    Publish(PackageArgs),
    /// Configure the access control list for the initial launch
    ConfigureAcl,
    /// Propose an initial launch setup step to the pool admin multisig
    Setup(SetupArgs),
    /// Transfer a package to its multisig account
    ChangeOwner(PackageArgs),
    /// Propose an upgrade of a package owned by its multisig account
    Upgrade(PackageArgs),
}

/// Arguments of `clear-staging-area`
#[derive(Args)]
pub struct ClearStagingAreaArgs {
    /// Clear the staging area of this multisig account instead of the deployer's
    #[arg(long)]
    pub multisig_account: Option<String>,
}

/// Selects the package a command acts on
#[derive(Args)]
pub struct PackageArgs {
    /// The package
    #[arg(value_enum)]
    pub package: Package,
}

/// Selects a setup step
#[derive(Args)]
pub struct SetupArgs {
    /// The setup step
    #[arg(value_enum)]
    pub step: SetupStep,
}

/// Addresses and URLs of a remote network, resolved from flags and network defaults
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// The fullnode URL
    pub fullnode: String,
    /// The address of the `LargePackages` module
    pub large_packages_module: String,
    /// The address of the Chainlink platform package
    pub chainlink_platform: String,
    /// The address of the Chainlink data feeds package
    pub chainlink_data_feeds: String,
    /// The pool admin multisig account
    pub multisig_pool_admin: String,
    /// The multisig account owning `aave_config`
    pub multisig_aave_config: String,
    /// The multisig account owning `aave_acl`
    pub multisig_aave_acl: String,
    /// The multisig account owning `aave_math`
    pub multisig_aave_math: String,
    /// The multisig account owning `aave_mock_underlyings`
    pub multisig_mock_underlyings: String,
    /// The multisig account owning `aave_oracle`
    pub multisig_aave_oracle: String,
    /// The multisig account owning `aave_pool`
    pub multisig_aave_core: String,
    /// The multisig account owning `aave_data`
    pub multisig_aave_data: String,
}

impl NetworkConfig {
    /// The multisig account owning the given package
    pub fn multisig_for(&self, package: Package) -> &str {
        match package {
            Package::Config => &self.multisig_aave_config,
            Package::Acl => &self.multisig_aave_acl,
            Package::Math => &self.multisig_aave_math,
            Package::MockUnderlyings => &self.multisig_mock_underlyings,
            Package::Oracle => &self.multisig_aave_oracle,
            Package::Core => &self.multisig_aave_core,
            Package::Data => &self.multisig_aave_data,
        }
    }
}

impl RemoteArgs {
    /// Resolve the network configuration, preferring explicitly passed flags
    pub fn network_config(&self, network: Network) -> NetworkConfig {
        let defaults = match network {
            Network::Testnet => TESTNET_DEFAULTS,
            Network::Mainnet => MAINNET_DEFAULTS,
        };
        let or_default =
            |flag: &Option<String>, default: &str| flag.clone().unwrap_or(default.to_string());

        NetworkConfig {
            fullnode: or_default(&self.fullnode, defaults.fullnode),
            large_packages_module: or_default(
                &self.large_packages_module,
                defaults.large_packages_module,
            ),
            chainlink_platform: or_default(&self.chainlink_platform, defaults.chainlink_platform),
            chainlink_data_feeds: or_default(
                &self.chainlink_data_feeds,
                defaults.chainlink_data_feeds,
            ),
            multisig_pool_admin: or_default(
                &self.multisig_pool_admin,
                defaults.multisig_pool_admin,
            ),
            multisig_aave_config: or_default(
                &self.multisig_aave_config,
                defaults.multisig_aave_config,
            ),
            multisig_aave_acl: or_default(&self.multisig_aave_acl, defaults.multisig_aave_acl),
            multisig_aave_math: or_default(&self.multisig_aave_math, defaults.multisig_aave_math),
            multisig_mock_underlyings: or_default(
                &self.multisig_mock_underlyings,
                defaults.multisig_mock_underlyings,
            ),
            multisig_aave_oracle: or_default(
                &self.multisig_aave_oracle,
                defaults.multisig_aave_oracle,
            ),
            multisig_aave_core: or_default(&self.multisig_aave_core, defaults.multisig_aave_core),
            multisig_aave_data: or_default(&self.multisig_aave_data, defaults.multisig_aave_data),
        }
    }
}
