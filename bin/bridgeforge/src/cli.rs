use alloy_core::primitives::Address;
use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "bridgeforge")]
#[command(
    author,
    version,
    about = "Deploy and verify the bridge mediator contract suite"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "BRIDGEFORGE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a Bridgeforge.toml configuration file, or to a directory
    /// containing one.
    #[arg(long, alias = "conf", env = "BRIDGEFORGE_CONFIG", default_value = "Bridgeforge.toml")]
    pub config: String,

    /// Override the configured RPC endpoint.
    #[arg(long, alias = "rpc", env = "BRIDGEFORGE_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Reuse an existing token factory instead of deploying one.
    #[arg(long, env = "BRIDGEFORGE_TOKEN_FACTORY")]
    pub token_factory: Option<Address>,

    /// Reuse an existing token image instead of deploying one. Ignored
    /// when a token factory is reused.
    #[arg(long, env = "BRIDGEFORGE_TOKEN_IMAGE")]
    pub token_image: Option<Address>,

    /// Wrapped-native-asset address; enables the WETH router helper.
    #[arg(long, env = "BRIDGEFORGE_WETH_ADDRESS")]
    pub weth_address: Option<Address>,

    /// Skip explorer verification even when an explorer is configured.
    #[arg(long, env = "BRIDGEFORGE_SKIP_VERIFY", default_value_t = false)]
    pub skip_verify: bool,
}
