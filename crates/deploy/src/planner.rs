//! Deployment workflow for the bridge mediator contract suite.
//!
//! The workflow is a straight line: every step depends on the nonce and/or
//! an address produced by an earlier step, each step has an irreversible
//! on-chain effect, and a failed step fails the whole run (the nonce
//! sequence after it would be wrong anyway). Re-running with the reuse
//! addresses filled in is the recovery path.

use alloy_core::primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::artifact::{Artifact, ArtifactSet};
use crate::calldata::{self, AbiValue};
use crate::config::DeployConfig;
use crate::nonce::NonceSequencer;
use crate::rpc::ChainClient;

/// Version label for the initial proxy-to-implementation link.
const INITIAL_VERSION: u64 = 1;

/// A contract created by this run.
#[derive(Debug, Clone)]
pub struct DeployedContract {
    pub address: Address,
    pub network: String,
}

/// Terminal output of a deployment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    /// The mediator address callers interact with (the storage proxy).
    pub mediator: Address,
    pub token_factory: Address,
    pub gas_limit_manager: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weth_router: Option<Address>,
}

/// A freshly created contract plus everything needed to verify it later.
#[derive(Debug, Clone)]
pub struct DeployedArtifact {
    pub artifact: Artifact,
    pub address: Address,
    /// ABI-encoded constructor arguments, hex without a `0x` prefix.
    pub constructor_args: String,
}

/// Outcome of [`DeploymentPlan::run`]: the result record plus the list of
/// contracts this run created, in deployment order.
#[derive(Debug)]
pub struct DeploymentReport {
    pub result: DeploymentResult,
    pub deployed: Vec<DeployedArtifact>,
}

/// Observable progress of the workflow. Stages only ever advance; a
/// failure leaves the run at the last reached stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stage {
    StorageDeployed,
    TokenInfraResolved,
    GasManagerDeployed,
    ImplementationDeployed,
    Linked,
    HelperDeployed,
    Complete,
}

/// How the token factory address is obtained, decided once per run.
enum TokenFactorySource {
    Preconfigured(Address),
    Deploy(TokenImageSource),
}

/// How the token image address is obtained when a factory is deployed.
enum TokenImageSource {
    Preconfigured(Address),
    Deploy,
}

fn token_factory_source(config: &DeployConfig) -> TokenFactorySource {
    match config.token_factory {
        Some(address) => TokenFactorySource::Preconfigured(address),
        None => TokenFactorySource::Deploy(match config.token_image {
            Some(address) => TokenImageSource::Preconfigured(address),
            None => TokenImageSource::Deploy,
        }),
    }
}

/// Constructor arguments for a fresh token image: empty name and symbol,
/// zero decimals, the network chain id.
fn token_image_args(chain_id: u64) -> Vec<AbiValue> {
    vec![
        AbiValue::Str(String::new()),
        AbiValue::Str(String::new()),
        AbiValue::Uint(U256::ZERO),
        AbiValue::Uint(U256::from(chain_id)),
    ]
}

/// Submit a contract-creation transaction and wait until it is mined.
///
/// This is the single primitive every deployment step builds on. Failures
/// propagate immediately: a failed creation invalidates the nonce sequence
/// for everything after it.
pub async fn deploy_contract<C: ChainClient>(
    client: &C,
    network: &str,
    artifact: &Artifact,
    args: &[AbiValue],
    nonce: u64,
) -> Result<DeployedContract> {
    tracing::info!(contract = %artifact.contract_name, network = %network, nonce, "Deploying contract");

    let data = calldata::creation_data(&artifact.bytecode, args);
    let address = client
        .submit_contract_creation(&data, nonce)
        .await
        .with_context(|| format!("Failed to deploy {}", artifact.contract_name))?;

    tracing::info!(contract = %artifact.contract_name, address = %address, "Contract deployed");
    Ok(DeployedContract {
        address,
        network: network.to_string(),
    })
}

/// Point an upgradeable storage shell at an implementation contract.
pub async fn upgrade_proxy<C: ChainClient>(
    client: &C,
    proxy: Address,
    implementation: Address,
    version: u64,
    nonce: u64,
) -> Result<()> {
    tracing::info!(proxy = %proxy, implementation = %implementation, version, nonce, "Linking storage to implementation");

    let data = calldata::encode_call(
        "upgradeTo(uint256,address)",
        &[
            AbiValue::Uint(U256::from(version)),
            AbiValue::Address(implementation),
        ],
    );
    client
        .submit_call(proxy, &data, nonce)
        .await
        .context("Failed to link the storage proxy to the implementation")?;

    Ok(())
}

/// The fixed deployment workflow.
pub struct DeploymentPlan<'a, C> {
    client: &'a C,
    config: &'a DeployConfig,
    artifacts: &'a ArtifactSet,
    deployed: Vec<DeployedArtifact>,
}

impl<'a, C: ChainClient> DeploymentPlan<'a, C> {
    pub fn new(client: &'a C, config: &'a DeployConfig, artifacts: &'a ArtifactSet) -> Self {
        Self {
            client,
            config,
            artifacts,
            deployed: Vec::new(),
        }
    }

    /// Execute the workflow:
    ///
    /// 1. Deploy the storage proxy shell.
    /// 2. Resolve the token factory (reuse or deploy, resolving the token
    ///    image the same way first).
    /// 3. Deploy the gas limit manager.
    /// 4. Deploy the mediator implementation.
    /// 5. Link the shell to the implementation.
    /// 6. Deploy the WETH router helper when a WETH address is configured.
    pub async fn run(mut self) -> Result<DeploymentReport> {
        let config = self.config;
        let artifacts = self.artifacts;

        let mut nonces = NonceSequencer::init(self.client, config.sender).await?;

        tracing::info!(network = %config.network, sender = %config.sender, "Deploying bridge mediator storage");
        let storage = self
            .create(&artifacts.storage_proxy, &[], nonces.next())
            .await?;
        self.advance(Stage::StorageDeployed);

        let token_factory = match token_factory_source(config) {
            TokenFactorySource::Preconfigured(address) => {
                tracing::info!(token_factory = %address, "Using existing token factory");
                address
            }
            TokenFactorySource::Deploy(image_source) => {
                let image = match image_source {
                    TokenImageSource::Preconfigured(address) => {
                        tracing::info!(token_image = %address, "Using existing token image");
                        address
                    }
                    TokenImageSource::Deploy => {
                        let chain_id = self
                            .client
                            .chain_id()
                            .await
                            .context("Failed to fetch the chain id for the token image")?;
                        tracing::info!(chain_id, "Deploying new token image");
                        self.create(
                            &artifacts.token_image,
                            &token_image_args(chain_id),
                            nonces.next(),
                        )
                        .await?
                        .address
                    }
                };

                tracing::info!(owner = %config.owner, token_image = %image, "Deploying new token factory");
                self.create(
                    &artifacts.token_factory,
                    &[AbiValue::Address(config.owner), AbiValue::Address(image)],
                    nonces.next(),
                )
                .await?
                .address
            }
        };
        self.advance(Stage::TokenInfraResolved);

        tracing::info!(
            amb_bridge = %config.amb_bridge,
            owner = %config.owner,
            request_gas_limit = config.request_gas_limit,
            "Deploying gas limit manager"
        );
        let gas_limit_manager = self
            .create(
                &artifacts.gas_limit_manager,
                &[
                    AbiValue::Address(config.amb_bridge),
                    AbiValue::Address(config.owner),
                    AbiValue::Uint(U256::from(config.request_gas_limit)),
                ],
                nonces.next(),
            )
            .await?;
        tracing::info!("Per-selector request gas limits still need manual setup on the manager");
        self.advance(Stage::GasManagerDeployed);

        tracing::info!(token_name_suffix = %config.token_name_suffix, "Deploying bridge mediator implementation");
        let implementation = self
            .create(
                &artifacts.mediator,
                &[AbiValue::Str(config.token_name_suffix.clone())],
                nonces.next(),
            )
            .await?;
        self.advance(Stage::ImplementationDeployed);

        upgrade_proxy(
            self.client,
            storage.address,
            implementation.address,
            INITIAL_VERSION,
            nonces.next(),
        )
        .await?;
        self.advance(Stage::Linked);

        let weth_router = if let Some(weth) = config.weth_address {
            let artifact = artifacts
                .weth_router
                .as_ref()
                .context("WETH address configured but the router artifact was not loaded")?;
            tracing::info!(weth = %weth, "WETH address configured, deploying router helper");
            let router = self
                .create(
                    artifact,
                    &[
                        AbiValue::Address(storage.address),
                        AbiValue::Address(weth),
                        AbiValue::Address(config.owner),
                    ],
                    nonces.next(),
                )
                .await?;
            self.advance(Stage::HelperDeployed);
            Some(router.address)
        } else {
            None
        };

        self.advance(Stage::Complete);

        let result = DeploymentResult {
            mediator: storage.address,
            token_factory,
            gas_limit_manager: gas_limit_manager.address,
            weth_router,
        };
        tracing::info!(
            mediator = %result.mediator,
            token_factory = %result.token_factory,
            gas_limit_manager = %result.gas_limit_manager,
            "Bridge mediator deployment complete"
        );

        Ok(DeploymentReport {
            result,
            deployed: self.deployed,
        })
    }

    /// Deploy one contract and record it for later verification.
    async fn create(
        &mut self,
        artifact: &Artifact,
        args: &[AbiValue],
        nonce: u64,
    ) -> Result<DeployedContract> {
        let contract =
            deploy_contract(self.client, &self.config.network, artifact, args, nonce).await?;
        self.deployed.push(DeployedArtifact {
            artifact: artifact.clone(),
            address: contract.address,
            constructor_args: calldata::encode_args(args),
        });
        Ok(contract)
    }

    fn advance(&self, stage: Stage) {
        tracing::info!(stage = %stage, "Deployment stage reached");
    }
}
