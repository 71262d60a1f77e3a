//! Compiled contract artifacts.
//!
//! Artifacts are the Truffle-layout JSON files produced by the contract
//! build: one file per contract under the build directory, carrying the
//! deployment bytecode, the source path and the compiler metadata blob the
//! explorer verification needs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::DeployConfig;

/// Contract name of the precompiled legacy token image. Its flattened
/// source lives in the precompiled directory instead of the flats
/// directory, and its verification parameters fall back to the settings it
/// was originally compiled with when its metadata does not parse.
pub const LEGACY_TOKEN_IMAGE: &str = "PermittableToken";

/// A compiled contract artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_path: String,
    pub bytecode: String,
    pub compiler: CompilerInfo,
    /// Compiler metadata as the raw JSON string the compiler emitted.
    #[serde(default)]
    pub metadata: String,
}

/// Compiler identification from the artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerInfo {
    pub version: String,
}

impl Artifact {
    /// Load `<build_dir>/<name>.json`.
    pub fn load(build_dir: &Path, name: &str) -> Result<Self> {
        let path = build_dir.join(format!("{}.json", name));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }
}

/// The artifact set the deployment workflow operates on.
///
/// Loaded up front so a missing or corrupt build output fails the run
/// before any transaction is submitted.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub storage_proxy: Artifact,
    pub token_image: Artifact,
    pub token_factory: Artifact,
    pub gas_limit_manager: Artifact,
    pub mediator: Artifact,
    /// Only loaded when a wrapped-native-asset address is configured.
    pub weth_router: Option<Artifact>,
}

/// Artifact name of the upgradeable storage shell.
pub const STORAGE_PROXY: &str = "EternalStorageProxy";
/// Artifact name of the token factory.
pub const TOKEN_FACTORY: &str = "TokenFactory";
/// Artifact name of the gas limit manager.
pub const GAS_LIMIT_MANAGER: &str = "TokenGasLimitManager";
/// Artifact name of the mediator implementation.
pub const MEDIATOR: &str = "BridgeMediator";
/// Artifact name of the optional WETH router helper.
pub const WETH_ROUTER: &str = "WethTokenRouter";

impl ArtifactSet {
    pub fn load(config: &DeployConfig) -> Result<Self> {
        let dir = &config.build_dir;
        Ok(Self {
            storage_proxy: Artifact::load(dir, STORAGE_PROXY)?,
            token_image: Artifact::load(dir, LEGACY_TOKEN_IMAGE)?,
            token_factory: Artifact::load(dir, TOKEN_FACTORY)?,
            gas_limit_manager: Artifact::load(dir, GAS_LIMIT_MANAGER)?,
            mediator: Artifact::load(dir, MEDIATOR)?,
            weth_router: config
                .weth_address
                .map(|_| Artifact::load(dir, WETH_ROUTER))
                .transpose()?,
        })
    }
}
