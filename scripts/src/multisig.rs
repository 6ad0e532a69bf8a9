//! Multisig transactions: creation, sequencing, execution, and the chunked
//! upgrade of packages owned by a multisig account

use std::path::Path;

use tracing::{debug, info};

use crate::{
    chunks::{StagedChunks, StagingPlan},
    constants::{
        FAUCET_FUND_AMOUNT, STAGE_CODE_CHUNK_AND_UPGRADE_FN, STAGE_CODE_CHUNK_FN,
        TX_PAYLOAD_FILE_NAME,
    },
    deploy::DeployContext,
    errors::ScriptError,
    parsers::{parse_multisig_address, parse_next_sequence_number},
    payload::EntryFunctionPayload,
    types::{ChunkedPublishConfig, PackageSpec, SetupStep},
    utils::{to_args, CommandRunner},
};

impl<'a, R: CommandRunner> DeployContext<'a, R> {
    /// `multisig create-transaction` arguments up to, but excluding, the payload
    fn create_transaction_args(&self, multisig_address: &str) -> Vec<String> {
        let mut args = to_args(&[
            "multisig",
            "create-transaction",
            "--multisig-address",
            multisig_address,
        ]);
        args.extend(self.profile_args());
        args.extend(to_args(&["--sender-account", &self.profile]));
        args
    }

    /// Query the sequence number the multisig account will assign to its next transaction
    pub async fn query_next_sequence_number(
        &self,
        multisig_address: &str,
    ) -> Result<u64, ScriptError> {
        let mut args = to_args(&["account", "list", "--account", multisig_address]);
        args.extend(self.profile_args());

        let output = self.execute(&args).await?;
        parse_next_sequence_number(&output.stdout)
    }

    /// Fetch the sequence number of the transaction just submitted to the multisig account
    async fn last_sequence_number(&self, multisig_address: &str) -> Result<u64, ScriptError> {
        let next = self.query_next_sequence_number(multisig_address).await?;
        next.checked_sub(1).ok_or_else(|| {
            ScriptError::Consistency(format!(
                "multisig {multisig_address} reports no transactions after a submission"
            ))
        })
    }

    /// Propose an entry function call to the multisig account, returning the
    /// sequence number of the new multisig transaction
    pub async fn create_multisig_transaction(
        &self,
        multisig_address: &str,
        function_id: &str,
        function_args: &[String],
    ) -> Result<u64, ScriptError> {
        let mut args = self.create_transaction_args(multisig_address);
        args.extend(to_args(&["--function-id", function_id]));
        if !function_args.is_empty() {
            args.push("--args".to_string());
            args.extend(function_args.iter().cloned());
        }

        self.execute(&args).await?;
        self.last_sequence_number(multisig_address).await
    }

    /// Propose the call described by a JSON payload file to the multisig
    /// account, returning the sequence number of the new multisig transaction
    pub async fn create_multisig_transaction_with_json(
        &self,
        multisig_address: &str,
        json_file: &Path,
    ) -> Result<u64, ScriptError> {
        let mut args = self.create_transaction_args(multisig_address);
        args.push("--json-file".to_string());
        args.push(json_file.display().to_string());

        self.execute(&args).await?;
        self.last_sequence_number(multisig_address).await
    }

    /// Execute the next pending transaction of the multisig account
    pub async fn execute_multisig(&self, multisig_address: &str) -> Result<(), ScriptError> {
        let mut args = to_args(&[
            "multisig",
            "execute",
            "--multisig-address",
            multisig_address,
        ]);
        args.extend(self.profile_args());
        args.push("--assume-yes".to_string());
        if let Some(max_gas) = self.max_gas {
            args.extend(["--max-gas".to_string(), max_gas.to_string()]);
        }

        self.execute(&args).await?;
        Ok(())
    }

    /// Fund an account from the faucet. `None` funds the deployer itself.
    pub async fn fund_with_faucet(
        &self,
        account: Option<&str>,
        faucet: &str,
    ) -> Result<(), ScriptError> {
        let mut args = to_args(&["account", "fund-with-faucet"]);
        if let Some(account) = account {
            args.extend(to_args(&["--account", account]));
        }
        args.extend(self.profile_args());
        args.extend(to_args(&[
            "--faucet-url",
            faucet,
            "--amount",
            &FAUCET_FUND_AMOUNT.to_string(),
        ]));

        self.execute(&args).await?;
        Ok(())
    }

    /// Create a 1-of-1 multisig account owned by the deployer and fund it,
    /// returning its address
    pub async fn create_multisig_account(&self, faucet: &str) -> Result<String, ScriptError> {
        let mut args = to_args(&["multisig", "create", "--num-signatures-required", "1"]);
        args.extend(self.profile_args());
        args.push("--assume-yes".to_string());

        let output = self.execute(&args).await?;
        let multisig_address = parse_multisig_address(&output.stdout)?;
        info!("Created multisig account {multisig_address}");

        self.fund_with_faucet(Some(&multisig_address), faucet)
            .await?;
        Ok(multisig_address)
    }

    /// Propose one of the initial-launch setup steps to the pool admin multisig
    pub async fn run_setup_step(
        &self,
        step: SetupStep,
        multisig_pool_admin: &str,
        network: &str,
    ) -> Result<u64, ScriptError> {
        info!("Setup: {}", step.function_name());

        let aave_data = self.ledger.get("aave_data")?;
        self.create_multisig_transaction(
            multisig_pool_admin,
            &step.function_id(&aave_data),
            &[format!("string:{network}")],
        )
        .await
    }

    /// Submit a single `LargePackages` staging transaction. Passing the object
    /// address turns it into the final stage-and-upgrade call.
    async fn stage_code_chunk(
        &self,
        multisig_address: &str,
        batch: &StagedChunks,
        upgrade_object: Option<&str>,
        large_packages_module: &str,
    ) -> Result<(), ScriptError> {
        let function = match upgrade_object {
            Some(_) => STAGE_CODE_CHUNK_AND_UPGRADE_FN,
            None => STAGE_CODE_CHUNK_FN,
        };

        let mut args = self.create_transaction_args(multisig_address);
        args.extend(to_args(&[
            "--function-id",
            &format!("{large_packages_module}::{function}"),
            "--args",
        ]));
        args.extend(batch.to_cli_args());
        if let Some(object_address) = upgrade_object {
            args.push(format!("address:{object_address}"));
        }

        self.execute(&args).await?;
        Ok(())
    }

    /// Upgrade a package hosted at `object_address`, owned by a multisig
    /// account, by staging its publication payload in chunks.
    ///
    /// Returns the number of multisig transactions created; each must be
    /// executed in order. A failure leaves earlier chunks in the multisig's
    /// staging area, to be removed with `clear_staging_area`.
    pub async fn execute_chunked_upgrade(
        &self,
        multisig_address: &str,
        object_address: &str,
        payload_file: &Path,
        config: &ChunkedPublishConfig,
    ) -> Result<usize, ScriptError> {
        let publication = EntryFunctionPayload::from_file(payload_file)?.package_publication()?;
        let plan = StagingPlan::new(
            &publication.metadata,
            &publication.modules,
            config.chunk_size,
        )?;

        for (i, batch) in plan.staged.iter().enumerate() {
            debug!("staging chunk {i}");
            self.stage_code_chunk(
                multisig_address,
                batch,
                None,
                &config.large_packages_module,
            )
            .await?;
        }

        debug!("staging final chunk {}", plan.staged.len());
        self.stage_code_chunk(
            multisig_address,
            &plan.finalize,
            Some(object_address),
            &config.large_packages_module,
        )
        .await?;

        Ok(plan.num_transactions())
    }

    /// Upgrade a package whose object is owned by a multisig account.
    ///
    /// Builds the publication payload, then either stages it in chunks (when
    /// `chunked` is given) or rewrites it into a single object code upgrade.
    /// Returns the number of multisig transactions created.
    pub async fn upgrade_via_multisig(
        &self,
        package: &PackageSpec,
        multisig_address: &str,
        chunked: Option<&ChunkedPublishConfig>,
    ) -> Result<usize, ScriptError> {
        let name = package.address_name;
        info!("Starting to upgrade package {name} via multisig");

        let tmp_dir = tempfile::tempdir()
            .map_err(|e| ScriptError::WriteFile(format!("temporary directory: {e}")))?;
        let tx_json = tmp_dir.path().join(TX_PAYLOAD_FILE_NAME);

        let object_address = self.ledger.get(name)?;
        let mut named_addresses = vec![format!("{name}={object_address}")];
        named_addresses.extend(self.ledger.named_addresses(package.object_deps)?);
        named_addresses.extend(
            package
                .preset_addresses
                .iter()
                .map(|(k, v)| format!("{k}={v}")),
        );

        let mut args = to_args(&["move", "build-publish-payload"]);
        args.extend(self.profile_args());
        args.extend(to_args(&["--included-artifacts", "sparse", "--json-output-file"]));
        args.push(tx_json.display().to_string());
        args.extend(["--named-addresses".to_string(), named_addresses.join(",")]);
        if chunked.is_some() {
            // Chunks are staged by hand below, so the CLI must not reject the size
            args.push("--override-size-check".to_string());
        }
        self.build_flags(&mut args);

        self.execute_in(&args, &self.project_dir.join(package.path))
            .await?;

        if let Some(config) = chunked {
            let count = self
                .execute_chunked_upgrade(multisig_address, &object_address, &tx_json, config)
                .await?;
            info!("Package '{name}' upgrade staged in {count} multisig transactions");
            return Ok(count);
        }

        EntryFunctionPayload::from_file(&tx_json)?
            .into_object_upgrade(&object_address)?
            .to_file(&tx_json)?;

        let seq = self
            .create_multisig_transaction_with_json(multisig_address, &tx_json)
            .await?;
        info!("Package '{name}' upgrade proposed as multisig transaction {seq}");
        Ok(1)
    }
}
