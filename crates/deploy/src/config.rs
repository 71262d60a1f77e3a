//! Deployment configuration.
//!
//! The whole run is described by one TOML file that can be checked in and
//! replayed. Reuse of already-deployed infrastructure is expressed by
//! filling in the optional addresses: a configured token factory (or token
//! image, or WETH address) short-circuits the corresponding deployment
//! steps.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The default name for the bridgeforge configuration file.
pub const CONFIG_FILENAME: &str = "Bridgeforge.toml";

/// Configuration for a bridge mediator deployment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Human-readable name of the target network, used in logs and in the
    /// deployment record.
    pub network: String,
    /// JSON-RPC endpoint of the target network.
    pub rpc_url: String,
    /// Sender account for every transaction in the run. The node must be
    /// able to sign for it (unlocked or impersonated account).
    pub sender: Address,
    /// Owner assigned to the deployed contracts.
    pub owner: Address,
    /// Address of the arbitrary-message bridge the mediator relays through.
    pub amb_bridge: Address,
    /// Default gas limit for mediator requests passed to the gas limit
    /// manager constructor.
    pub request_gas_limit: u64,
    /// Suffix appended to bridged token names by the mediator.
    pub token_name_suffix: String,

    /// Reuse an existing token factory instead of deploying one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_factory: Option<Address>,
    /// Reuse an existing token image instead of deploying one. Ignored
    /// when `token_factory` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_image: Option<Address>,
    /// Wrapped-native-asset address. When set, the WETH router helper is
    /// deployed against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weth_address: Option<Address>,

    /// Directory holding the compiled contract artifacts (Truffle layout).
    pub build_dir: PathBuf,
    /// Directory holding flattened sources for verification.
    #[serde(default = "default_flats_dir")]
    pub flats_dir: PathBuf,
    /// Directory holding precompiled legacy flattened sources.
    #[serde(default = "default_precompiled_dir")]
    pub precompiled_dir: PathBuf,
    /// Output directory for the deployment record.
    pub outdata: PathBuf,

    /// Transaction submission settings.
    #[serde(default)]
    pub tx: TxConfig,
    /// Explorer verification settings; verification is skipped entirely
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerConfig>,
}

/// Gas and confirmation settings for submitted transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxConfig {
    /// Gas limit for each transaction.
    pub gas: u64,
    /// Gas price in wei.
    pub gas_price: u64,
    /// How long to wait for a transaction to be mined before failing the
    /// run, in seconds.
    pub receipt_timeout_secs: u64,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            gas: 10_000_000,
            gas_price: 100_000_000_000,
            receipt_timeout_secs: 300,
        }
    }
}

/// Block explorer verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Explorer API endpoint. The dialect is inferred from this URL.
    pub api_url: String,
    /// API key; only the Etherscan dialect requires one.
    #[serde(default)]
    pub api_key: String,
    /// Maximum verification attempts per contract.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_max_attempts() -> usize {
    10
}

fn default_flats_dir() -> PathBuf {
    PathBuf::from("flats")
}

fn default_precompiled_dir() -> PathBuf {
    PathBuf::from("precompiled")
}

impl DeployConfig {
    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, or from the default file
    /// name inside a directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file or directory not found: {}",
                path.display()
            );
        }

        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config(outdata: PathBuf) -> DeployConfig {
        DeployConfig {
            network: "testnet".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            sender: Address::repeat_byte(0x11),
            owner: Address::repeat_byte(0x22),
            amb_bridge: Address::repeat_byte(0x33),
            request_gas_limit: 2_000_000,
            token_name_suffix: " on Testnet".to_string(),
            token_factory: None,
            token_image: None,
            weth_address: None,
            build_dir: PathBuf::from("build/contracts"),
            flats_dir: default_flats_dir(),
            precompiled_dir: default_precompiled_dir(),
            outdata,
            tx: TxConfig::default(),
            explorer: None,
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = test_config(PathBuf::from("/tmp/bridgeforge-test"));
        config.token_factory = Some(Address::repeat_byte(0x44));
        config.explorer = Some(ExplorerConfig {
            api_url: "https://blockscout.example/api".to_string(),
            api_key: String::new(),
            max_attempts: 10,
        });

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: DeployConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_defaults_applied() {
        let toml = r#"
            network = "testnet"
            rpc_url = "http://localhost:8545"
            sender = "0x1111111111111111111111111111111111111111"
            owner = "0x2222222222222222222222222222222222222222"
            amb_bridge = "0x3333333333333333333333333333333333333333"
            request_gas_limit = 2000000
            token_name_suffix = " on Testnet"
            build_dir = "build/contracts"
            outdata = "data"
        "#;

        let config: DeployConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tx, TxConfig::default());
        assert_eq!(config.flats_dir, PathBuf::from("flats"));
        assert_eq!(config.precompiled_dir, PathBuf::from("precompiled"));
        assert!(config.explorer.is_none());
        assert!(config.token_factory.is_none());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir::TempDir::new("config-test").unwrap();
        let config = test_config(dir.path().to_path_buf());
        config
            .save_to_file(&dir.path().join(CONFIG_FILENAME))
            .unwrap();

        let loaded = DeployConfig::load_from_file(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_path() {
        let result = DeployConfig::load_from_file(Path::new("/nonexistent/Bridgeforge.toml"));
        assert!(result.is_err());
    }
}
