//! Publishing, upgrading and configuring packages with the deployer's own account

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    constants::{
        ACL_MANAGE_MODULE, CLEANUP_STAGING_AREA_FN, OBJECT_CORE_TYPE, OBJECT_TRANSFER_FUNCTION_ID,
        V1_DEPLOYMENT_MODULE,
    },
    errors::ScriptError,
    ledger::AddressLedger,
    parsers::parse_object_address,
    types::PackageSpec,
    utils::{to_args, CommandOutput, CommandRunner},
};

/// Everything needed to drive the Aptos CLI on behalf of a deployer profile
pub struct DeployContext<'a, R> {
    /// Runs the Aptos CLI
    pub(crate) runner: &'a R,
    /// Object addresses of deployed packages
    pub(crate) ledger: &'a AddressLedger,
    /// The Aptos CLI profile of the deployer
    pub(crate) profile: String,
    /// The fullnode URL of the chain
    pub(crate) fullnode: String,
    /// The root of the Move project
    pub(crate) project_dir: PathBuf,
    /// Gas limit of each transaction, `None` to let the CLI simulate
    pub(crate) max_gas: Option<u64>,
    /// Whether to let the CLI fetch the latest git dependencies
    pub(crate) fetch_latest_git_deps: bool,
}

impl<'a, R: CommandRunner> DeployContext<'a, R> {
    /// Create a context for the given deployer profile and fullnode
    pub fn new(
        runner: &'a R,
        ledger: &'a AddressLedger,
        profile: impl Into<String>,
        fullnode: impl Into<String>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            ledger,
            profile: profile.into(),
            fullnode: fullnode.into(),
            project_dir: project_dir.into(),
            max_gas: None,
            fetch_latest_git_deps: false,
        }
    }

    /// Cap the gas of every transaction, which also skips local simulation
    pub fn with_max_gas(mut self, max_gas: Option<u64>) -> Self {
        self.max_gas = max_gas;
        self
    }

    /// Let the CLI fetch the latest git dependencies when building
    pub fn with_fetch_latest_git_deps(mut self, fetch: bool) -> Self {
        self.fetch_latest_git_deps = fetch;
        self
    }

    /// Run the CLI from the project directory
    pub(crate) async fn execute(&self, args: &[String]) -> Result<CommandOutput, ScriptError> {
        self.runner.execute(args, &self.project_dir).await
    }

    /// Run the CLI from a package directory
    pub(crate) async fn execute_in(
        &self,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandOutput, ScriptError> {
        self.runner.execute(args, cwd).await
    }

    /// `--profile <deployer> --url <fullnode>`
    pub(crate) fn profile_args(&self) -> Vec<String> {
        to_args(&["--profile", &self.profile, "--url", &self.fullnode])
    }

    /// Build flags shared by every command that compiles a package
    pub(crate) fn build_flags(&self, args: &mut Vec<String>) {
        if let Some(max_gas) = self.max_gas {
            args.extend(["--max-gas".to_string(), max_gas.to_string()]);
        }
        if !self.fetch_latest_git_deps {
            args.push("--skip-fetch-latest-git-deps".to_string());
        }
    }

    /// Publish a package to a new object, or upgrade the object it was
    /// previously published to.
    ///
    /// On publication the object address is recorded in the ledger; on upgrade
    /// the CLI must report the address already recorded there.
    pub async fn publish(&self, package: &PackageSpec, upgrade: bool) -> Result<(), ScriptError> {
        let name = package.address_name;
        info!(
            "Starting to {} package {name}",
            if upgrade { "upgrade" } else { "publish" }
        );

        let mut named_addresses = self.ledger.named_addresses(package.object_deps)?;
        named_addresses.extend(
            package
                .preset_addresses
                .iter()
                .map(|(k, v)| format!("{k}={v}")),
        );

        let mut args = to_args(&[
            "move",
            if upgrade { "upgrade-object" } else { "deploy-object" },
        ]);
        args.extend(self.profile_args());
        args.extend(to_args(&[
            "--included-artifacts",
            "sparse",
            "--address-name",
            name,
        ]));
        if upgrade {
            args.extend(["--object-address".to_string(), self.ledger.get(name)?]);
        }
        if !named_addresses.is_empty() {
            args.extend(["--named-addresses".to_string(), named_addresses.join(",")]);
        }
        if package.chunked {
            args.push("--chunked-publish".to_string());
        }
        self.build_flags(&mut args);

        let output = self
            .execute_in(&args, &self.project_dir.join(package.path))
            .await?;
        let deployed_address = parse_object_address(&output.stdout, upgrade)?;

        if upgrade {
            let recorded = self.ledger.get(name)?;
            if deployed_address != recorded {
                return Err(ScriptError::Consistency(format!(
                    "package {name} was upgraded at {deployed_address}, but the ledger records {recorded}"
                )));
            }
            info!("Package '{name}' upgraded at {deployed_address}");
        } else {
            self.ledger.set(name, &deployed_address)?;
            info!("Package '{name}' deployed at {deployed_address}");
        }

        Ok(())
    }

    /// Publish (or upgrade in place) every given package, in order
    pub async fn publish_all(
        &self,
        packages: &[&PackageSpec],
        upgrade: bool,
    ) -> Result<(), ScriptError> {
        for package in packages {
            self.publish(package, upgrade).await?;
        }
        Ok(())
    }

    /// Call an entry function from the deployer's account
    pub async fn run_function(
        &self,
        function_id: &str,
        type_args: &[String],
        args: &[String],
    ) -> Result<(), ScriptError> {
        let mut cmd = to_args(&["move", "run"]);
        cmd.extend(self.profile_args());
        cmd.extend(to_args(&[
            "--sender-account",
            &self.profile,
            "--function-id",
            function_id,
        ]));
        if !type_args.is_empty() {
            cmd.push("--type-args".to_string());
            cmd.extend(type_args.iter().cloned());
        }
        if !args.is_empty() {
            cmd.push("--args".to_string());
            cmd.extend(args.iter().cloned());
        }

        self.execute(&cmd).await?;
        Ok(())
    }

    /// Transfer the object hosting `package_name` to `new_owner`
    pub async fn change_ownership(
        &self,
        package_name: &str,
        new_owner: &str,
    ) -> Result<(), ScriptError> {
        info!(
            "Changing ownership for package '{package_name}' from deployer '{}' to address {new_owner}",
            self.profile
        );

        let deployed_address = self.ledger.get(package_name)?;
        self.run_function(
            OBJECT_TRANSFER_FUNCTION_ID,
            &[OBJECT_CORE_TYPE.to_string()],
            &[
                format!("address:{deployed_address}"),
                format!("address:{new_owner}"),
            ],
        )
        .await
    }

    /// Configure the ACL for the initial launch, then hand the default admin
    /// role over to the ACL multisig and renounce it
    pub async fn configure_acl(
        &self,
        multisig_aave_acl: &str,
        network: &str,
    ) -> Result<(), ScriptError> {
        info!("Setup: ACL");

        let aave_data = self.ledger.get("aave_data")?;
        self.run_function(
            &format!("{aave_data}::{V1_DEPLOYMENT_MODULE}::configure_acl"),
            &[],
            &[format!("string:{network}")],
        )
        .await?;

        let aave_acl = self.ledger.get("aave_acl")?;
        self.run_function(
            &format!("{aave_acl}::{ACL_MANAGE_MODULE}::add_default_admin"),
            &[],
            &[format!("address:{multisig_aave_acl}")],
        )
        .await?;
        self.run_function(
            &format!("{aave_acl}::{ACL_MANAGE_MODULE}::renounce_default_admin"),
            &[],
            &[],
        )
        .await
    }

    /// Simplified ACL configuration for localnet: grant the pool admin role
    /// to the pool admin multisig
    pub async fn configure_acl_localnet(
        &self,
        multisig_pool_admin: &str,
    ) -> Result<(), ScriptError> {
        info!("Setup: ACL");

        let aave_acl = self.ledger.get("aave_acl")?;
        self.run_function(
            &format!("{aave_acl}::{ACL_MANAGE_MODULE}::add_pool_admin"),
            &[],
            &[format!("address:{multisig_pool_admin}")],
        )
        .await
    }

    /// Clear the chunked publication staging area, either the deployer's own
    /// or, through a multisig transaction, that of a multisig account
    pub async fn clear_staging_area(
        &self,
        multisig_address: Option<&str>,
        large_packages_module: &str,
    ) -> Result<(), ScriptError> {
        match multisig_address {
            None => {
                info!("Clearing the staging area of '{}'", self.profile);
                let mut args = to_args(&["move", "clear-staging-area"]);
                args.extend(self.profile_args());
                self.execute(&args).await?;
            }
            Some(multisig) => {
                info!("Clearing the staging area of multisig {multisig}");
                let function_id = format!("{large_packages_module}::{CLEANUP_STAGING_AREA_FN}");
                let seq = self
                    .create_multisig_transaction(multisig, &function_id, &[])
                    .await?;
                info!("Staging area cleanup queued as multisig transaction {seq}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        errors::ScriptError,
        ledger::AddressLedger,
        test_helpers::{arg_after, MockRunner},
        types::{AAVE_ACL, AAVE_CONFIG, AAVE_POOL},
        utils::CommandOutput,
    };

    use super::DeployContext;

    #[tokio::test]
    async fn test_publish_records_address() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        let runner = MockRunner::new(|_| {
            Ok(CommandOutput::from_stdout(&[
                "Code was successfully deployed to object address 0xc0f1",
            ]))
        });
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path())
            .with_max_gas(Some(1000));

        ctx.publish(&AAVE_CONFIG, false).await.unwrap();

        assert_eq!(ledger.get("aave_config").unwrap(), "0xc0f1");
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cwd, dir.path().join("aave-core/aave-config"));
        assert_eq!(&calls[0].args[..2], ["move", "deploy-object"]);
        assert_eq!(arg_after(&calls[0].args, "--address-name"), Some("aave_config"));
        assert_eq!(arg_after(&calls[0].args, "--max-gas"), Some("1000"));
        assert!(calls[0].args.contains(&"--skip-fetch-latest-git-deps".to_string()));
        assert!(!calls[0].args.contains(&"--named-addresses".to_string()));
    }

    #[tokio::test]
    async fn test_publish_wires_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        for dep in AAVE_POOL.object_deps {
            ledger.set(dep, &format!("0x{}", dep.len())).unwrap();
        }
        let runner = MockRunner::new(|_| {
            Ok(CommandOutput::from_stdout(&[
                "Code was successfully deployed to object address 0x9001",
            ]))
        });
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        ctx.publish(&AAVE_POOL, false).await.unwrap();

        let args = &runner.calls()[0].args;
        let named = arg_after(args, "--named-addresses").unwrap();
        assert!(named.starts_with("aave_config=0x11,aave_acl=0x8,"));
        assert!(named.ends_with(",aave_oracle_racc_address=0x0"));
        assert!(args.contains(&"--chunked-publish".to_string()));
    }

    #[tokio::test]
    async fn test_publish_missing_dependency_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        let err = ctx.publish(&AAVE_ACL, false).await.unwrap_err();
        assert!(matches!(err, ScriptError::ReadFile(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_checks_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        ledger.set("aave_config", "0xc0f1").unwrap();
        let runner = MockRunner::new(|_| {
            Ok(CommandOutput::from_stdout(&[
                "Code was successfully upgraded at object address 0xbad",
            ]))
        });
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        let err = ctx.publish(&AAVE_CONFIG, true).await.unwrap_err();
        assert!(matches!(err, ScriptError::Consistency(_)));
        assert_eq!(
            arg_after(&runner.calls()[0].args, "--object-address"),
            Some("0xc0f1")
        );
        // The ledger is left untouched
        assert_eq!(ledger.get("aave_config").unwrap(), "0xc0f1");
    }

    #[tokio::test]
    async fn test_publish_without_address_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        let runner = MockRunner::new(|_| Ok(CommandOutput::from_stdout(&["{}"])));
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        let err = ctx.publish(&AAVE_CONFIG, false).await.unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
        assert!(!ledger.path_for("aave_config").exists());
    }

    #[tokio::test]
    async fn test_change_ownership() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        ledger.set("aave_math", "0xma7h").unwrap();
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        ctx.change_ownership("aave_math", "0xms").await.unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.cwd, dir.path());
        assert_eq!(arg_after(&call.args, "--function-id"), Some("0x1::object::transfer"));
        assert_eq!(arg_after(&call.args, "--type-args"), Some("0x1::object::ObjectCore"));
        let args_pos = call.args.iter().position(|a| a == "--args").unwrap();
        assert_eq!(call.args[args_pos + 1..], ["address:0xma7h", "address:0xms"]);
    }

    #[tokio::test]
    async fn test_configure_acl_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        ledger.set("aave_data", "0xda7a").unwrap();
        ledger.set("aave_acl", "0xac1").unwrap();
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        ctx.configure_acl("0xms", "mainnet").await.unwrap();

        let function_ids = runner
            .calls()
            .iter()
            .map(|c| arg_after(&c.args, "--function-id").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            function_ids,
            vec![
                "0xda7a::v1_deployment::configure_acl",
                "0xac1::acl_manage::add_default_admin",
                "0xac1::acl_manage::renounce_default_admin",
            ]
        );
        assert!(!runner.calls()[2].args.contains(&"--args".to_string()));
    }

    #[tokio::test]
    async fn test_clear_own_staging_area() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AddressLedger::new(dir.path());
        let runner = MockRunner::new(|_| Ok(CommandOutput::default()));
        let ctx = DeployContext::new(&runner, &ledger, "deployer", "http://node", dir.path());

        ctx.clear_staging_area(None, "0x7").await.unwrap();

        assert_eq!(runner.calls().len(), 1);
        assert_eq!(&runner.calls()[0].args[..2], ["move", "clear-staging-area"]);
    }
}
