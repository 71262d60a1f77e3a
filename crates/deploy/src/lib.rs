//! bridgeforge-deploy - Deployment library for the bridge mediator suite.
//!
//! This crate deploys the mediator contract set (storage proxy, token
//! image/factory, gas limit manager, mediator implementation, optional
//! WETH router) to an EVM network as one nonce-sequenced run, and then
//! verifies the deployed sources against an Etherscan- or
//! Blockscout-dialect block explorer.

pub mod artifact;
pub mod calldata;
pub mod config;
pub mod nonce;
pub mod pipeline;
pub mod planner;
pub mod rpc;
pub mod verify;

pub use artifact::{Artifact, ArtifactSet};
pub use config::{CONFIG_FILENAME, DeployConfig, ExplorerConfig, TxConfig};
pub use nonce::NonceSequencer;
pub use pipeline::Pipeline;
pub use planner::{
    DeployedArtifact, DeployedContract, DeploymentPlan, DeploymentReport, DeploymentResult, Stage,
    deploy_contract, upgrade_proxy,
};
pub use rpc::{ChainClient, HttpChainClient};
pub use verify::{ExplorerDialect, VerifyRequest, select_dialect, verify};
