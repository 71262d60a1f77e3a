//! bridgeforge is a CLI tool that deploys the bridge mediator contract
//! suite to an EVM network and verifies it against a block explorer.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use bridgeforge_deploy::{DeployConfig, Pipeline};
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config_path = PathBuf::from(&cli.config);
    let mut config = DeployConfig::load_from_file(&config_path)?;

    // CLI overrides for the reuse-by-address knobs.
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(address) = cli.token_factory {
        config.token_factory = Some(address);
    }
    if let Some(address) = cli.token_image {
        config.token_image = Some(address);
    }
    if let Some(address) = cli.weth_address {
        config.weth_address = Some(address);
    }
    if cli.skip_verify {
        config.explorer = None;
    }

    tracing::info!(
        network = %config.network,
        rpc_url = %config.rpc_url,
        sender = %config.sender,
        "Starting bridge mediator deployment..."
    );

    let result = Pipeline::new(config).run().await?;

    tracing::info!(
        mediator = %result.mediator,
        token_factory = %result.token_factory,
        gas_limit_manager = %result.gas_limit_manager,
        "Bridge mediator deployment finished"
    );
    if let Some(router) = result.weth_router {
        tracing::info!(weth_router = %router, "WETH router helper deployed");
    }

    Ok(())
}
