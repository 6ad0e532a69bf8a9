//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use clap::ValueEnum;

use crate::constants::V1_DEPLOYMENT_MODULE;

/// The remote networks the scripts can target
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// The Aptos testnet
    Testnet,
    /// The Aptos mainnet
    Mainnet,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Per-network default values for the remote deployment flags
#[derive(Clone, Copy, Debug)]
pub struct NetworkDefaults {
    /// The fullnode URL
    pub fullnode: &'static str,
    /// The address of the Aptos `LargePackages` module
    pub large_packages_module: &'static str,
    /// The address of the Chainlink platform package
    pub chainlink_platform: &'static str,
    /// The address of the Chainlink data feeds package
    pub chainlink_data_feeds: &'static str,
    /// The pool admin multisig account
    pub multisig_pool_admin: &'static str,
    /// The multisig account owning `aave_config`
    pub multisig_aave_config: &'static str,
    /// The multisig account owning `aave_acl`
    pub multisig_aave_acl: &'static str,
    /// The multisig account owning `aave_math`
    pub multisig_aave_math: &'static str,
    /// The multisig account owning `aave_mock_underlyings`
    pub multisig_mock_underlyings: &'static str,
    /// The multisig account owning `aave_oracle`
    pub multisig_aave_oracle: &'static str,
    /// The multisig account owning `aave_pool`
    pub multisig_aave_core: &'static str,
    /// The multisig account owning `aave_data`
    pub multisig_aave_data: &'static str,
}

/// Static description of a Move package managed by the scripts
#[derive(Debug, PartialEq, Eq)]
pub struct PackageSpec {
    /// The main named address of the package, also its ledger key
    pub address_name: &'static str,
    /// The path of the package, relative to the project directory
    pub path: &'static str,
    /// Named addresses of previously deployed packages this one depends on
    pub object_deps: &'static [&'static str],
    /// Other named addresses needed to build the package
    pub preset_addresses: &'static [(&'static str, &'static str)],
    /// Whether the package is too large for a single transaction
    pub chunked: bool,
}

/// The named address every oracle-dependent package must be built with
const ORACLE_RACC_PRESET: &[(&str, &str)] = &[("aave_oracle_racc_address", "0x0")];

/// The `aave_config` package
pub const AAVE_CONFIG: PackageSpec = PackageSpec {
    address_name: "aave_config",
    path: "aave-core/aave-config",
    object_deps: &[],
    preset_addresses: &[],
    chunked: false,
};

/// The `aave_acl` package
pub const AAVE_ACL: PackageSpec = PackageSpec {
    address_name: "aave_acl",
    path: "aave-core/aave-acl",
    object_deps: &["aave_config"],
    preset_addresses: &[],
    chunked: false,
};

/// The `aave_math` package
pub const AAVE_MATH: PackageSpec = PackageSpec {
    address_name: "aave_math",
    path: "aave-core/aave-math",
    object_deps: &["aave_config"],
    preset_addresses: &[],
    chunked: false,
};

/// The `aave_mock_underlyings` package
pub const AAVE_MOCK_UNDERLYINGS: PackageSpec = PackageSpec {
    address_name: "aave_mock_underlyings",
    path: "aave-core/aave-mock-underlyings",
    object_deps: &["aave_config"],
    preset_addresses: &[],
    chunked: false,
};

/// The Chainlink platform package, only published by the scripts on localnet
pub const CHAINLINK_PLATFORM: PackageSpec = PackageSpec {
    address_name: "platform",
    path: "aave-core/chainlink-platform",
    object_deps: &[],
    preset_addresses: ORACLE_RACC_PRESET,
    chunked: false,
};

/// The Chainlink data feeds package, only published by the scripts on localnet
pub const CHAINLINK_DATA_FEEDS: PackageSpec = PackageSpec {
    address_name: "data_feeds",
    path: "aave-core/chainlink-data-feeds",
    object_deps: &["platform"],
    preset_addresses: ORACLE_RACC_PRESET,
    chunked: false,
};

/// The `aave_oracle` package
pub const AAVE_ORACLE: PackageSpec = PackageSpec {
    address_name: "aave_oracle",
    path: "aave-core/aave-oracle",
    object_deps: &["aave_config", "aave_acl", "aave_math", "platform", "data_feeds"],
    preset_addresses: ORACLE_RACC_PRESET,
    chunked: false,
};

/// The `aave_pool` package
pub const AAVE_POOL: PackageSpec = PackageSpec {
    address_name: "aave_pool",
    path: "aave-core",
    object_deps: &[
        "aave_config",
        "aave_acl",
        "aave_math",
        "aave_oracle",
        "platform",
        "data_feeds",
    ],
    preset_addresses: ORACLE_RACC_PRESET,
    chunked: true,
};

/// The `aave_data` package
pub const AAVE_DATA: PackageSpec = PackageSpec {
    address_name: "aave_data",
    path: "aave-core/aave-data",
    object_deps: &[
        "aave_config",
        "aave_acl",
        "aave_math",
        "aave_mock_underlyings",
        "aave_oracle",
        "aave_pool",
        "platform",
        "data_feeds",
    ],
    preset_addresses: ORACLE_RACC_PRESET,
    chunked: true,
};

/// Every package, in the order in which it must be published
pub const PUBLICATION_ORDER: [&PackageSpec; 9] = [
    &AAVE_CONFIG,
    &AAVE_ACL,
    &AAVE_MATH,
    &AAVE_MOCK_UNDERLYINGS,
    &CHAINLINK_PLATFORM,
    &CHAINLINK_DATA_FEEDS,
    &AAVE_ORACLE,
    &AAVE_POOL,
    &AAVE_DATA,
];

/// The Aave packages that the scripts publish, own and upgrade
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Package {
    /// The `aave-config` package
    Config,
    /// The `aave-acl` package
    Acl,
    /// The `aave-math` package
    Math,
    /// The `aave-mock-underlyings` package
    MockUnderlyings,
    /// The `aave-oracle` package
    Oracle,
    /// The `aave-pool` package
    Core,
    /// The `aave-data` package
    Data,
}

impl Package {
    /// All Aave packages, in publication order
    pub const ALL: [Package; 7] = [
        Package::Config,
        Package::Acl,
        Package::Math,
        Package::MockUnderlyings,
        Package::Oracle,
        Package::Core,
        Package::Data,
    ];

    /// The static description of the package
    pub fn spec(self) -> &'static PackageSpec {
        match self {
            Package::Config => &AAVE_CONFIG,
            Package::Acl => &AAVE_ACL,
            Package::Math => &AAVE_MATH,
            Package::MockUnderlyings => &AAVE_MOCK_UNDERLYINGS,
            Package::Oracle => &AAVE_ORACLE,
            Package::Core => &AAVE_POOL,
            Package::Data => &AAVE_DATA,
        }
    }
}

impl Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().address_name)
    }
}

/// The initial-launch configuration steps run through the pool admin multisig
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetupStep {
    /// Configure the eMode categories
    ConfigureEmodes,
    /// Create the reserves
    CreateReserves,
    /// Configure the reserves
    ConfigureReserves,
    /// Configure the interest rate strategies
    ConfigureInterestRates,
    /// Configure the price feeds
    ConfigurePriceFeeds,
}

impl SetupStep {
    /// All setup steps, in the order they must run
    pub const ALL: [SetupStep; 5] = [
        SetupStep::ConfigureEmodes,
        SetupStep::CreateReserves,
        SetupStep::ConfigureReserves,
        SetupStep::ConfigureInterestRates,
        SetupStep::ConfigurePriceFeeds,
    ];

    /// The name of the `v1_deployment` entry function implementing the step
    pub fn function_name(self) -> &'static str {
        match self {
            SetupStep::ConfigureEmodes => "configure_emodes",
            SetupStep::CreateReserves => "create_reserves",
            SetupStep::ConfigureReserves => "configure_reserves",
            SetupStep::ConfigureInterestRates => "configure_interest_rates",
            SetupStep::ConfigurePriceFeeds => "configure_price_feeds",
        }
    }

    /// The fully qualified function id, given the `aave_data` object address
    pub fn function_id(self, aave_data_address: &str) -> String {
        format!(
            "{aave_data_address}::{V1_DEPLOYMENT_MODULE}::{}",
            self.function_name()
        )
    }
}

/// Parameters of the chunked publication flow
#[derive(Clone, Debug)]
pub struct ChunkedPublishConfig {
    /// Maximum number of payload bytes staged per transaction
    pub chunk_size: usize,
    /// Address of the Aptos `LargePackages` module
    pub large_packages_module: String,
}

#[cfg(test)]
mod tests {
    use super::{Package, SetupStep, PUBLICATION_ORDER};

    #[test]
    fn test_dependencies_published_first() {
        for (i, spec) in PUBLICATION_ORDER.iter().enumerate() {
            for dep in spec.object_deps {
                let dep_pos = PUBLICATION_ORDER
                    .iter()
                    .position(|s| s.address_name == *dep)
                    .unwrap();
                assert!(dep_pos < i, "{} depends on {}", spec.address_name, dep);
            }
        }
    }

    #[test]
    fn test_only_large_packages_are_chunked() {
        let chunked = Package::ALL
            .iter()
            .filter(|p| p.spec().chunked)
            .copied()
            .collect::<Vec<_>>();
        assert_eq!(chunked, vec![Package::Core, Package::Data]);
    }

    #[test]
    fn test_setup_function_id() {
        assert_eq!(
            SetupStep::CreateReserves.function_id("0xda7a"),
            "0xda7a::v1_deployment::create_reserves"
        );
    }
}
