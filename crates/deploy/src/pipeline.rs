//! End-to-end deployment and verification pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::artifact::ArtifactSet;
use crate::config::DeployConfig;
use crate::planner::{DeploymentPlan, DeploymentReport, DeploymentResult};
use crate::rpc::HttpChainClient;
use crate::verify::{self, VerifyRequest};

/// File name of the persisted deployment record.
pub const RESULT_FILENAME: &str = "deployment.json";

/// Runs a full deployment: plan execution, result persistence, then
/// best-effort explorer verification of everything the run created.
pub struct Pipeline {
    config: DeployConfig,
}

impl Pipeline {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<DeploymentResult> {
        let client =
            HttpChainClient::new(&self.config.rpc_url, self.config.sender, &self.config.tx)?;
        let artifacts =
            ArtifactSet::load(&self.config).context("Failed to load contract artifacts")?;

        let report = DeploymentPlan::new(&client, &self.config, &artifacts)
            .run()
            .await?;

        self.write_result(&report.result)?;
        self.verify_deployed(&report).await;

        Ok(report.result)
    }

    /// Persist the deployment record next to the run's other outputs.
    fn write_result(&self, result: &DeploymentResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.outdata).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.outdata.display()
            )
        })?;

        let path = self.config.outdata.join(RESULT_FILENAME);
        let content = serde_json::to_string_pretty(result)
            .context("Failed to serialize the deployment result")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(path = %path.display(), "Deployment record saved");
        Ok(path)
    }

    /// Verify every contract this run deployed. Verification is advisory:
    /// failures are logged and never fail the pipeline.
    async fn verify_deployed(&self, report: &DeploymentReport) {
        let Some(explorer) = &self.config.explorer else {
            tracing::info!("No explorer configured, skipping verification");
            return;
        };

        let http = match verify::create_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Could not create the explorer client, skipping verification");
                return;
            }
        };

        for deployed in &report.deployed {
            let request = VerifyRequest {
                artifact: &deployed.artifact,
                address: deployed.address,
                constructor_args: deployed.constructor_args.clone(),
                api_url: explorer.api_url.clone(),
                api_key: explorer.api_key.clone(),
                flats_dir: self.config.flats_dir.clone(),
                precompiled_dir: self.config.precompiled_dir.clone(),
            };

            if let Err(e) = verify::verify(&http, &request, explorer.max_attempts).await {
                tracing::warn!(
                    contract = %deployed.artifact.contract_name,
                    address = %deployed.address,
                    error = %e,
                    "Verification failed"
                );
            }
        }
    }
}
