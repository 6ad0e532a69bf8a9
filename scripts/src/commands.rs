//! Implementations of the deploy script commands

use std::path::Path;

use tokio::process::Child;
use tracing::{info, warn};

use crate::{
    cli::{ClearStagingAreaArgs, LocalnetArgs, PackageArgs, RemoteArgs, RemoteCommand, SetupArgs},
    constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_GAS, LOCALNET_LARGE_PACKAGES_MODULE},
    deploy::DeployContext,
    errors::ScriptError,
    ledger::AddressLedger,
    types::{
        ChunkedPublishConfig, Network, Package, SetupStep, CHAINLINK_DATA_FEEDS,
        CHAINLINK_PLATFORM, PUBLICATION_ORDER,
    },
    utils::{prompt_for_input, to_args, CliRunner, CommandRunner},
};

// ------------
// | LOCALNET |
// ------------

/// Launch a local testnet and run the whole deployment against it.
///
/// The local testnet is shut down whether or not the deployment succeeds.
pub async fn deploy_localnet(
    args: LocalnetArgs,
    runner: &CliRunner,
    project_dir: &Path,
) -> Result<(), ScriptError> {
    info!(
        "Starting deployment on localnet using deployer profile '{}'",
        args.deployer
    );

    let localnet = runner.spawn_background(
        &to_args(&[
            "node",
            "run-local-testnet",
            "--with-faucet",
            "--force-restart",
        ]),
        project_dir,
    )?;
    prompt_for_input("Press Enter when localnet is deployed (i.e., until \"Setup is complete\")")
        .await?;

    let res = run_localnet_deployment(&args, runner, project_dir).await;
    shutdown_localnet(localnet).await;
    res
}

/// Kill the local testnet process, logging rather than failing on error
async fn shutdown_localnet(mut localnet: Child) {
    if let Err(e) = localnet.kill().await {
        warn!("Failed to stop the local testnet: {e}");
    }
}

/// The deployment steps run against a freshly launched local testnet
pub async fn run_localnet_deployment<R: CommandRunner>(
    args: &LocalnetArgs,
    runner: &R,
    project_dir: &Path,
) -> Result<(), ScriptError> {
    let ledger = AddressLedger::new(project_dir);
    let ctx = DeployContext::new(runner, &ledger, &args.deployer, &args.fullnode, project_dir)
        .with_max_gas(Some(DEFAULT_MAX_GAS));

    init_deployer(&ctx, &args.faucet).await?;
    ctx.publish_all(&PUBLICATION_ORDER, false /* upgrade */)
        .await?;

    let multisig_pool_admin = ctx.create_multisig_account(&args.faucet).await?;
    ctx.configure_acl_localnet(&multisig_pool_admin).await?;
    setup_all(&ctx, &multisig_pool_admin, Network::Testnet).await?;

    ctx.publish_all(&PUBLICATION_ORDER, true /* upgrade */)
        .await?;

    let chunked = ChunkedPublishConfig {
        chunk_size: DEFAULT_CHUNK_SIZE,
        large_packages_module: LOCALNET_LARGE_PACKAGES_MODULE.to_string(),
    };
    transfer_and_upgrade_all(&ctx, &args.faucet, &chunked).await?;

    info!("Localnet deployment complete");
    Ok(())
}

/// Create the deployer profile on the local testnet and fund it
async fn init_deployer<R: CommandRunner>(
    ctx: &DeployContext<'_, R>,
    faucet: &str,
) -> Result<(), ScriptError> {
    // `aptos init` may ask the operator for input
    ctx.runner
        .execute_interactive(
            &to_args(&[
                "init",
                "--network",
                "local",
                "--profile",
                &ctx.profile,
                "--assume-yes",
            ]),
            &ctx.project_dir,
        )
        .await?;

    ctx.fund_with_faucet(None, faucet).await
}

/// Propose and execute every setup step through the pool admin multisig
async fn setup_all<R: CommandRunner>(
    ctx: &DeployContext<'_, R>,
    multisig_pool_admin: &str,
    network: Network,
) -> Result<(), ScriptError> {
    for step in SetupStep::ALL {
        ctx.run_setup_step(step, multisig_pool_admin, &network.to_string())
            .await?;
        ctx.execute_multisig(multisig_pool_admin).await?;
    }
    Ok(())
}

/// Hand every Aave package to a fresh multisig account, then upgrade it
/// through that account and execute the resulting transactions
async fn transfer_and_upgrade_all<R: CommandRunner>(
    ctx: &DeployContext<'_, R>,
    faucet: &str,
    chunked: &ChunkedPublishConfig,
) -> Result<(), ScriptError> {
    for package in Package::ALL {
        let spec = package.spec();

        let multisig = ctx.create_multisig_account(faucet).await?;
        ctx.change_ownership(spec.address_name, &multisig).await?;

        let txn_count = ctx
            .upgrade_via_multisig(spec, &multisig, spec.chunked.then_some(chunked))
            .await?;
        if !spec.chunked && txn_count != 1 {
            return Err(ScriptError::Consistency(format!(
                "upgrade of {package} created {txn_count} multisig transactions, expected 1"
            )));
        }

        for _ in 0..txn_count {
            ctx.execute_multisig(&multisig).await?;
        }
    }
    Ok(())
}

// ---------------------
// | TESTNET / MAINNET |
// ---------------------

/// Run a single deployment step on a remote network
pub async fn run_remote<R: CommandRunner>(
    args: RemoteArgs,
    network: Network,
    runner: &R,
    project_dir: &Path,
) -> Result<(), ScriptError> {
    info!(
        "Starting deployment on {network} using deployer profile '{}'",
        args.deployer
    );

    let config = args.network_config(network);
    let ledger = AddressLedger::new(project_dir);

    // The Chainlink packages are deployed by a third party
    ledger.set(CHAINLINK_PLATFORM.address_name, &config.chainlink_platform)?;
    ledger.set(CHAINLINK_DATA_FEEDS.address_name, &config.chainlink_data_feeds)?;

    let ctx = DeployContext::new(runner, &ledger, &args.deployer, &config.fullnode, project_dir)
        .with_max_gas(Some(args.max_gas))
        .with_fetch_latest_git_deps(args.fetch_latest_git_deps);

    match args.command {
        RemoteCommand::ClearStagingArea(ClearStagingAreaArgs { multisig_account }) => {
            ctx.clear_staging_area(multisig_account.as_deref(), &config.large_packages_module)
                .await
        }
        RemoteCommand::Publish(PackageArgs { package }) => {
            ctx.publish(package.spec(), false /* upgrade */).await
        }
        RemoteCommand::ConfigureAcl => {
            ctx.configure_acl(&config.multisig_aave_acl, &network.to_string())
                .await
        }
        RemoteCommand::Setup(SetupArgs { step }) => {
            let seq = ctx
                .run_setup_step(step, &config.multisig_pool_admin, &network.to_string())
                .await?;
            info!("Setup step proposed as multisig transaction {seq}");
            Ok(())
        }
        RemoteCommand::ChangeOwner(PackageArgs { package }) => {
            ctx.change_ownership(package.spec().address_name, config.multisig_for(package))
                .await
        }
        RemoteCommand::Upgrade(PackageArgs { package }) => {
            let spec = package.spec();
            let chunked = ChunkedPublishConfig {
                chunk_size: args.chunk_size,
                large_packages_module: config.large_packages_module.clone(),
            };

            let txn_count = ctx
                .upgrade_via_multisig(
                    spec,
                    config.multisig_for(package),
                    spec.chunked.then_some(&chunked),
                )
                .await?;
            info!("{txn_count} multisig transaction(s) await execution");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use serde_json::json;

    use super::{run_localnet_deployment, run_remote};
    use crate::{
        cli::{Cli, Command, LocalnetArgs},
        constants::TESTNET_DEFAULTS,
        ledger::AddressLedger,
        test_helpers::{account_list_output, arg_after, is_command, MockRunner},
        types::Network,
        utils::CommandOutput,
    };

    fn remote_args(argv: &[&str]) -> crate::cli::RemoteArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Testnet(args) | Command::Mainnet(args) => args,
            Command::Localnet(_) => panic!("expected a remote command"),
        }
    }

    /// Answers like the Aptos CLI would on a healthy local testnet
    fn localnet_responder(args: &[String]) -> Result<CommandOutput, crate::errors::ScriptError> {
        if is_command(args, "move", "deploy-object") {
            let name = arg_after(args, "--address-name").unwrap();
            Ok(CommandOutput::from_stdout(&[format!(
                "Code was successfully deployed to object address 0x{}",
                name.len()
            )]))
        } else if is_command(args, "move", "upgrade-object") {
            let address = arg_after(args, "--object-address").unwrap();
            Ok(CommandOutput::from_stdout(&[format!(
                "Code was successfully upgraded at object address {address}"
            )]))
        } else if is_command(args, "multisig", "create") {
            Ok(CommandOutput::from_stdout(&["\"multisig_address\": \"5ca1ab1e\","]))
        } else if is_command(args, "account", "list") {
            Ok(account_list_output(1))
        } else if is_command(args, "move", "build-publish-payload") {
            let path = arg_after(args, "--json-output-file").unwrap();
            let payload = json!({
                "function_id": "0x1::code::publish_package_txn",
                "type_args": [],
                "args": [
                    { "type": "hex", "value": "0x0102" },
                    { "type": "hex", "value": ["0x0304"] }
                ]
            });
            fs::write(path, payload.to_string()).unwrap();
            Ok(CommandOutput::default())
        } else {
            Ok(CommandOutput::default())
        }
    }

    #[tokio::test]
    async fn test_localnet_deployment_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new(localnet_responder);
        let args = LocalnetArgs {
            deployer: "deployer".to_string(),
            fullnode: "http://localhost:8080".to_string(),
            faucet: "http://localhost:8081".to_string(),
        };

        run_localnet_deployment(&args, &runner, dir.path())
            .await
            .unwrap();

        let calls = runner.calls();
        assert!(calls[0].interactive);
        assert_eq!(&calls[0].args[..1], ["init"]);

        let deployed = calls
            .iter()
            .filter(|c| is_command(&c.args, "move", "deploy-object"))
            .count();
        let upgraded = calls
            .iter()
            .filter(|c| is_command(&c.args, "move", "upgrade-object"))
            .count();
        assert_eq!((deployed, upgraded), (9, 9));

        // One pool admin multisig, then one per Aave package
        let multisigs = calls
            .iter()
            .filter(|c| is_command(&c.args, "multisig", "create"))
            .count();
        assert_eq!(multisigs, 8);

        // Five setup steps, then one upgrade transaction per package since
        // every payload fits in a single chunk
        let executed = calls
            .iter()
            .filter(|c| is_command(&c.args, "multisig", "execute"))
            .count();
        assert_eq!(executed, 5 + 7);

        let ledger = AddressLedger::new(dir.path());
        assert_eq!(ledger.get("aave_pool").unwrap(), "0x9");
    }

    #[tokio::test]
    async fn test_localnet_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new(|args| {
            if is_command(args, "move", "deploy-object")
                && arg_after(args, "--address-name") == Some("aave_math")
            {
                return Err(crate::errors::ScriptError::CommandFailed {
                    command: "aptos move deploy-object".to_string(),
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "compilation failed".to_string(),
                });
            }
            localnet_responder(args)
        });
        let args = LocalnetArgs {
            deployer: "deployer".to_string(),
            fullnode: "http://localhost:8080".to_string(),
            faucet: "http://localhost:8081".to_string(),
        };

        assert!(run_localnet_deployment(&args, &runner, dir.path())
            .await
            .is_err());
        let last = runner.calls().last().unwrap().clone();
        assert_eq!(arg_after(&last.args, "--address-name"), Some("aave_math"));
    }

    #[tokio::test]
    async fn test_remote_provisions_chainlink_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let args = remote_args(&[
            "deploy",
            "testnet",
            "--deployer",
            "ops",
            "clear-staging-area",
        ]);

        run_remote(args, Network::Testnet, &runner, dir.path())
            .await
            .unwrap();

        let ledger = AddressLedger::new(dir.path());
        assert_eq!(ledger.get("platform").unwrap(), TESTNET_DEFAULTS.chainlink_platform);
        assert_eq!(
            ledger.get("data_feeds").unwrap(),
            TESTNET_DEFAULTS.chainlink_data_feeds
        );
        assert_eq!(&runner.calls()[0].args[..2], ["move", "clear-staging-area"]);
    }

    #[tokio::test]
    async fn test_remote_change_owner_targets_package_multisig() {
        let dir = tempfile::tempdir().unwrap();
        AddressLedger::new(dir.path())
            .set("aave_oracle", "0x0rac1e")
            .unwrap();
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let args = remote_args(&[
            "deploy",
            "testnet",
            "--deployer",
            "ops",
            "--multisig-aave-oracle",
            "0xms",
            "change-owner",
            "oracle",
        ]);

        run_remote(args, Network::Testnet, &runner, dir.path())
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(arg_after(&call.args, "--profile"), Some("ops"));
        assert_eq!(call.args.last().unwrap(), "address:0xms");
    }

    #[tokio::test]
    async fn test_remote_clear_multisig_staging_area() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new(|args| {
            if is_command(args, "account", "list") {
                Ok(account_list_output(7))
            } else {
                Ok(CommandOutput::default())
            }
        });
        let args = remote_args(&[
            "deploy",
            "mainnet",
            "--deployer",
            "ops",
            "--large-packages-module",
            "0x1a",
            "clear-staging-area",
            "--multisig-account",
            "0xms",
        ]);

        run_remote(args, Network::Mainnet, &runner, dir.path())
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert!(is_command(&call.args, "multisig", "create-transaction"));
        assert_eq!(
            arg_after(&call.args, "--function-id"),
            Some("0x1a::large_packages::cleanup_staging_area")
        );
    }
}
