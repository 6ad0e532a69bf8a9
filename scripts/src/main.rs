use clap::Parser;
use scripts::{
    cli::Cli,
    errors::ScriptError,
    utils::{setup_logging, CliRunner},
};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        aptos_bin,
        project_dir,
        command,
    } = Cli::parse();

    setup_logging(&project_dir)?;

    let runner = CliRunner::new(aptos_bin);
    command.run(&runner, &project_dir).await.map_err(|e| {
        error!("{e}");
        e
    })
}
