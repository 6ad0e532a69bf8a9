//! Constants used in the deploy scripts

use crate::types::NetworkDefaults;

/// The default name of the Aptos CLI binary
pub const APTOS_BIN: &str = "aptos";

/// The default profile name of the deployer on localnet
pub const DEFAULT_LOCALNET_DEPLOYER: &str = "deployer";

/// The fullnode URL of a local testnet
pub const LOCALNET_FULLNODE_URL: &str = "http://localhost:8080";

/// The faucet URL of a local testnet
pub const LOCALNET_FAUCET_URL: &str = "http://localhost:8081";

/// The address of the large packages module on a local testnet
pub const LOCALNET_LARGE_PACKAGES_MODULE: &str = "0x7";

/// The amount of octas requested from the faucet when funding an account
pub const FAUCET_FUND_AMOUNT: u64 = 1_0000_0000 * 1000;

/// The default maximum gas for a transaction. Setting it also skips local simulation.
pub const DEFAULT_MAX_GAS: u64 = 100_0000;

/// The default chunk size, in bytes, for chunked publication
pub const DEFAULT_CHUNK_SIZE: usize = 40_000;

/// The prefix of the address ledger files
pub const LEDGER_FILE_PREFIX: &str = "deploy-";

/// The suffix of the address ledger files
pub const LEDGER_FILE_SUFFIX: &str = "-object.txt";

/// The prefix of the deployment log file
pub const LOG_FILE_PREFIX: &str = "deploy-";

/// The environment variable which, when set to `1`, enables debug output on the console
pub const VERBOSE_ENV_VAR: &str = "VERBOSE";

/// The name of the transaction payload file written by `build-publish-payload`
pub const TX_PAYLOAD_FILE_NAME: &str = "tx.json";

// ------------------
// | OUTPUT NEEDLES |
// ------------------

/// The line prefix announcing a freshly deployed object address
pub const DEPLOYED_ADDRESS_NEEDLE: &str = "Code was successfully deployed to object address ";

/// The line prefix announcing an upgraded object address
pub const UPGRADED_ADDRESS_NEEDLE: &str = "Code was successfully upgraded at object address ";

/// The line prefix of the next sequence number field in `account list` output
pub const SEQUENCE_NUMBER_PREFIX: &str = "\"next_sequence_number\": \"";

/// The line prefix of the multisig address field in `multisig create` output
pub const MULTISIG_ADDRESS_PREFIX: &str = "\"multisig_address\": \"";

/// The line suffix of a string field in the CLI's pretty-printed JSON output
pub const JSON_STRING_FIELD_SUFFIX: &str = "\",";

// ----------------
// | FUNCTION IDS |
// ----------------

/// The entry function that `build-publish-payload` targets
pub const PUBLISH_PACKAGE_FUNCTION_ID: &str = "0x1::code::publish_package_txn";

/// The entry function upgrading code deployed at an object
pub const OBJECT_CODE_UPGRADE_FUNCTION_ID: &str = "0x1::object_code_deployment::upgrade";

/// The entry function transferring an object
pub const OBJECT_TRANSFER_FUNCTION_ID: &str = "0x1::object::transfer";

/// The type argument of an object transfer
pub const OBJECT_CORE_TYPE: &str = "0x1::object::ObjectCore";

/// The large packages function staging a chunk
pub const STAGE_CODE_CHUNK_FN: &str = "large_packages::stage_code_chunk";

/// The large packages function staging the final chunk and upgrading the object code
pub const STAGE_CODE_CHUNK_AND_UPGRADE_FN: &str =
    "large_packages::stage_code_chunk_and_upgrade_object_code";

/// The large packages function clearing the staging area
pub const CLEANUP_STAGING_AREA_FN: &str = "large_packages::cleanup_staging_area";

/// The deployment module of the `aave_data` package
pub const V1_DEPLOYMENT_MODULE: &str = "v1_deployment";

/// The ACL management module of the `aave_acl` package
pub const ACL_MANAGE_MODULE: &str = "acl_manage";

// --------------------
// | NETWORK DEFAULTS |
// --------------------

/// The address of the large packages module on testnet and mainnet
const LARGE_PACKAGES_MODULE: &str =
    "0x0e1ca3011bdd07246d4d16d909dbb2d6953a86c4735d5acf5865d962c630cce7";

/// Default addresses used when deploying to testnet
pub const TESTNET_DEFAULTS: NetworkDefaults = NetworkDefaults {
    fullnode: "https://fullnode.testnet.aptoslabs.com",
    large_packages_module: LARGE_PACKAGES_MODULE,
    chainlink_platform: "0x516e771e1b4a903afe74c27d057c65849ecc1383782f6642d7ff21425f4f9c99",
    chainlink_data_feeds: "0xf1099f135ddddad1c065203431be328a408b0ca452ada70374ce26bd2b32fdd3",
    multisig_pool_admin: "0x859d111e05bd4deed6fc1a94cec995e12ac2ad7bbe7cec425ef6aaebfaf5238c",
    multisig_aave_config: "0xf62a5a73423621a47f3a606bf725fc08c4051967bd34fffc7a713f0fc7e4d2be",
    multisig_aave_acl: "0x85c7d9eb8c44dc353f999b9091e1b125890e2f18074f26407b6e1d52bb5e23f9",
    multisig_aave_math: "0x9b4ca390cedd6424f82ec9afaa59bdd6b0ae59de4d1ea3d9b478927ed2a967a9",
    multisig_mock_underlyings: "0x3d802c82f2df813778adbf6c2e1c503c4b4b6710b63c6d19aae3db3b0838853b",
    multisig_aave_oracle: "0x7b41f4d510b968a4d5104ce4036a8697ef363d04cf4061bb12b7f7caa1e66312",
    multisig_aave_core: "0xe3be2d728688ac509be29f42d8009c78864225fe2bbd859d07bd2759647ce412",
    multisig_aave_data: "0x108e14107cfe3d6d706fd208654e26ecc8b7a7f06ee82c4535477ba13aa03b52",
};

/// Default addresses used when deploying to mainnet
pub const MAINNET_DEFAULTS: NetworkDefaults = NetworkDefaults {
    fullnode: "https://fullnode.mainnet.aptoslabs.com",
    large_packages_module: LARGE_PACKAGES_MODULE,
    chainlink_platform: "0x9976bb288ed9177b542d568fa1ac386819dc99141630e582315804840f41928a",
    chainlink_data_feeds: "0x3f985798ce4975f430ef5c75776ff98a77b9f9d0fb38184d225adc9c1cc6b79b",
    multisig_pool_admin: "0x6b8d9c9f788bc100c2688ae5bddd849d5bd7308cb493f245b12e56a2d8c3ebec",
    multisig_aave_config: "0xf417afab0311d4af56757c1927456e0a85fe79180d45f75441c5d61ac493cbd7",
    multisig_aave_acl: "0x50dd0012a77fc9884b4bc460ec5c8249992e9a3d3e422b89883b4a982bfdcec9",
    multisig_aave_math: "0x056d32138643b7d247be191d6e27f0d1f5352b4049a1129e2fc69eba66296361",
    multisig_mock_underlyings: "0x00af70319d7b1adea014e941d07bf9276c969abd76d0f0134616025bed4061fe",
    multisig_aave_oracle: "0x766178015cb41f3e780d3950a20a7c91254a5f10f0c5fd373f78f36d0b7b480e",
    multisig_aave_core: "0xf8a3ea771666a366450100f9e4a54dc05fd756a778bd95253c7fe419404bc4e9",
    multisig_aave_data: "0xd68e3dbbc1295081bffce9a530ac5e17c37707e818512131f7e5078b9a59e6cb",
};
