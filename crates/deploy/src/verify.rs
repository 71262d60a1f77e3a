//! Explorer source verification.
//!
//! Two explorer API dialects accept the same verification intent with
//! incompatible wire shapes; everything dialect-specific is confined to
//! [`form_fields`]. Verification is advisory: a run that deployed
//! successfully is never failed because an explorer would not accept the
//! sources.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use serde_json::Value;

use crate::artifact::{Artifact, LEGACY_TOKEN_IMAGE};

/// Success marker in the explorer's `message` field, shared by both
/// dialects.
const SUCCESS_MARKER: &str = "OK";

/// Free-text marker the explorers use while a deployment has not reached
/// their indexer yet. Expected during normal operation, so rejections
/// carrying it are not warned about.
const CODE_NOT_INDEXED: &str = "Unable to locate ContractCode";

/// Default timeout for explorer requests; explorers are slower than RPC
/// nodes.
const EXPLORER_TIMEOUT: Duration = Duration::from_secs(30);

/// Explorer API dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExplorerDialect {
    Etherscan,
    Blockscout,
}

/// Select the dialect for an explorer API URL.
///
/// Total over every input: a URL with "etherscan" in it speaks the
/// Etherscan dialect, everything else (including no URL at all) is treated
/// as Blockscout.
pub fn select_dialect(api_url: Option<&str>) -> ExplorerDialect {
    match api_url {
        Some(url) if url.contains("etherscan") => ExplorerDialect::Etherscan,
        _ => ExplorerDialect::Blockscout,
    }
}

/// Everything needed to verify one deployed contract.
#[derive(Debug)]
pub struct VerifyRequest<'a> {
    pub artifact: &'a Artifact,
    pub address: Address,
    /// ABI-encoded constructor arguments, hex without a `0x` prefix.
    pub constructor_args: String,
    pub api_url: String,
    pub api_key: String,
    pub flats_dir: PathBuf,
    pub precompiled_dir: PathBuf,
}

/// Create an HTTP client configured for explorer requests.
pub fn create_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(EXPLORER_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Submit a contract's source to the explorer and retry with exponential
/// backoff until it is accepted or `max_attempts` submissions have been
/// made.
///
/// Returns `Ok(true)` when the explorer confirmed the source match and
/// `Ok(false)` when the retry budget ran out. Errors are reserved for
/// build-artifact problems (missing flattened source, undecodable
/// metadata), which no amount of retrying would fix.
pub async fn verify(
    http: &reqwest::Client,
    request: &VerifyRequest<'_>,
    max_attempts: usize,
) -> Result<bool> {
    let backoff = ExponentialBuilder::default().with_max_times(max_attempts.saturating_sub(1));
    verify_with_backoff(http, request, backoff).await
}

async fn verify_with_backoff(
    http: &reqwest::Client,
    request: &VerifyRequest<'_>,
    backoff: ExponentialBuilder,
) -> Result<bool> {
    let dialect = select_dialect(Some(&request.api_url));
    tracing::info!(
        contract = %request.artifact.contract_name,
        address = %request.address,
        explorer = %dialect,
        "Verifying contract"
    );

    let source = flattened_source(request.artifact, &request.flats_dir, &request.precompiled_dir)?;
    let params = build_params(request.artifact)?;

    let submit = || async { attempt(http, dialect, request, &params, &source).await };
    let outcome = submit
        .retry(backoff)
        .notify(|err: &anyhow::Error, dur: Duration| {
            tracing::debug!(error = %err, retry_in = ?dur, "Verification not accepted, retrying...");
        })
        .await;

    match outcome {
        Ok(()) => {
            tracing::info!(address = %request.address, explorer = %dialect, "Contract verified");
            Ok(true)
        }
        Err(_) => {
            tracing::warn!(
                address = %request.address,
                explorer = %dialect,
                "Verification attempts exhausted, contract remains unverified"
            );
            Ok(false)
        }
    }
}

/// One verification submission. Returns `Err` for anything short of a
/// confirmed match so the caller's retry policy drives repetition.
async fn attempt(
    http: &reqwest::Client,
    dialect: ExplorerDialect,
    request: &VerifyRequest<'_>,
    params: &VerifyParams,
    source: &str,
) -> Result<()> {
    let fields = form_fields(dialect, request, params, source);
    let response = http
        .post(&request.api_url)
        .form(&fields)
        .send()
        .await
        .context("Failed to send verification request")?;

    let body: ExplorerResponse = response
        .json()
        .await
        .context("Failed to parse explorer response")?;

    match interpret(&body) {
        Outcome::Verified => Ok(()),
        Outcome::NotIndexed => {
            tracing::debug!(address = %request.address, "Contract code not indexed by the explorer yet");
            anyhow::bail!("contract code not located by the explorer yet")
        }
        Outcome::Rejected(reason) => {
            tracing::warn!(address = %request.address, reason = %reason, "Explorer rejected the verification submission");
            anyhow::bail!("verification submission rejected")
        }
    }
}

/// Normalized verification parameters derived from artifact metadata.
#[derive(Debug, Clone, PartialEq)]
struct VerifyParams {
    compiler: String,
    optimization_used: bool,
    runs: u64,
    evm_version: String,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    settings: MetadataSettings,
}

#[derive(Debug, Deserialize)]
struct MetadataSettings {
    optimizer: OptimizerSettings,
    #[serde(rename = "evmVersion", default = "default_evm_version")]
    evm_version: String,
}

#[derive(Debug, Deserialize)]
struct OptimizerSettings {
    enabled: bool,
    runs: u64,
}

fn default_evm_version() -> String {
    "default".to_string()
}

/// Compiler version string in the explorers' expected shape: a `v` prefix
/// and no internal build-tag suffix.
fn compiler_label(artifact: &Artifact) -> String {
    format!("v{}", artifact.compiler.version.replace(".Emscripten.clang", ""))
}

fn build_params(artifact: &Artifact) -> Result<VerifyParams> {
    match serde_json::from_str::<Metadata>(&artifact.metadata) {
        Ok(metadata) => Ok(VerifyParams {
            compiler: compiler_label(artifact),
            optimization_used: metadata.settings.optimizer.enabled,
            runs: metadata.settings.optimizer.runs,
            evm_version: metadata.settings.evm_version,
        }),
        // The precompiled legacy image ships without decodable metadata;
        // these are the settings it was built with.
        Err(_) if artifact.contract_name == LEGACY_TOKEN_IMAGE => Ok(VerifyParams {
            compiler: compiler_label(artifact),
            optimization_used: true,
            runs: 200,
            evm_version: default_evm_version(),
        }),
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to decode compiler metadata for {}",
                artifact.contract_name
            )
        }),
    }
}

/// Derive the flattened filename from an artifact source path.
fn flattened_filename(source_path: &str) -> String {
    let name = source_path.rsplit('/').next().unwrap_or(source_path);
    name.replace(".sol", "_flat.sol")
}

/// Load the flattened source text for an artifact. The legacy token image
/// is looked up by contract name in the precompiled directory; everything
/// else derives its filename from the artifact's source path.
fn flattened_source(
    artifact: &Artifact,
    flats_dir: &Path,
    precompiled_dir: &Path,
) -> Result<String> {
    let path = if artifact.contract_name == LEGACY_TOKEN_IMAGE {
        precompiled_dir.join(format!("{}_flat.sol", LEGACY_TOKEN_IMAGE))
    } else {
        flats_dir.join(flattened_filename(&artifact.source_path))
    };

    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read flattened source {}", path.display()))
}

/// Map the shared verification intent onto a dialect's wire fields.
fn form_fields(
    dialect: ExplorerDialect,
    request: &VerifyRequest<'_>,
    params: &VerifyParams,
    source: &str,
) -> Vec<(&'static str, String)> {
    match dialect {
        ExplorerDialect::Etherscan => vec![
            ("apikey", request.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("sourceCode", source.to_string()),
            ("codeformat", "solidity-single-file".to_string()),
            ("contractname", request.artifact.contract_name.clone()),
            ("compilerversion", params.compiler.clone()),
            (
                "optimizationUsed",
                if params.optimization_used { "1" } else { "0" }.to_string(),
            ),
            ("runs", params.runs.to_string()),
            // The misspelling is Etherscan's.
            ("constructorArguements", request.constructor_args.clone()),
            ("evmversion", params.evm_version.clone()),
        ],
        ExplorerDialect::Blockscout => vec![
            ("module", "contract".to_string()),
            ("action", "verify".to_string()),
            ("addressHash", request.address.to_string()),
            ("contractSourceCode", source.to_string()),
            ("name", request.artifact.contract_name.clone()),
            ("compilerVersion", params.compiler.clone()),
            ("optimization", params.optimization_used.to_string()),
            ("optimizationRuns", params.runs.to_string()),
            ("constructorArguments", request.constructor_args.clone()),
            ("evmVersion", params.evm_version.clone()),
        ],
    }
}

/// The subset of the explorer response body the client inspects.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// What an explorer response means for the retry loop.
#[derive(Debug, PartialEq)]
enum Outcome {
    Verified,
    /// The deployment has not reached the explorer's indexer yet.
    NotIndexed,
    Rejected(String),
}

fn interpret(response: &ExplorerResponse) -> Outcome {
    if response.message.as_deref() == Some(SUCCESS_MARKER) {
        return Outcome::Verified;
    }

    let result = response
        .result
        .as_ref()
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if result.contains(CODE_NOT_INDEXED) {
        Outcome::NotIndexed
    } else {
        Outcome::Rejected(result.to_string())
    }
}
