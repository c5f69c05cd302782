use clap::Parser;

use wallet_guard::cli::{Cli, run_command};
use wallet_guard::config::Config;
use wallet_guard::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env_with_toml(cli.config.as_deref())?;
    logging::init(config.log_format);

    tracing::debug!(
        chain_id = %config.network.chain_id,
        network = %config.network.display_name,
        "Configuration loaded"
    );

    if !run_command(cli.command, config).await? {
        std::process::exit(1);
    }
    Ok(())
}
