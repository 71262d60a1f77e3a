//! JSON-RPC chain access for the deployment pipeline.
//!
//! The pipeline depends on the network only through [`ChainClient`];
//! transport, signing and chain selection stay behind it. The shipped
//! implementation talks JSON-RPC over HTTP and relies on the node to sign
//! for the sender account.

use std::time::{Duration, Instant};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::TxConfig;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between receipt polling attempts.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Chain operations the deployment pipeline depends on.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Current transaction count (the next usable nonce) for an account.
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    /// Chain id of the connected network.
    async fn chain_id(&self) -> Result<u64>;

    /// Submit a contract-creation transaction with the given nonce and
    /// block until it is mined. Returns the created contract address.
    async fn submit_contract_creation(&self, data: &str, nonce: u64) -> Result<Address>;

    /// Submit a call transaction with the given nonce and block until it
    /// is mined.
    async fn submit_call(&self, to: Address, data: &str, nonce: u64) -> Result<()>;
}

/// JSON-RPC [`ChainClient`] over HTTP.
pub struct HttpChainClient {
    client: reqwest::Client,
    url: Url,
    sender: Address,
    gas: u64,
    gas_price: u64,
    receipt_deadline: Duration,
}

/// The subset of a transaction receipt the pipeline inspects.
#[derive(Debug, Deserialize)]
struct TransactionReceipt {
    status: Option<String>,
    #[serde(rename = "contractAddress")]
    contract_address: Option<Address>,
}

impl HttpChainClient {
    pub fn new(rpc_url: &str, sender: Address, tx: &TxConfig) -> Result<Self> {
        let url = Url::parse(rpc_url).with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            sender,
            gas: tx.gas,
            gas_price: tx.gas_price,
            receipt_deadline: Duration::from_secs(tx.receipt_timeout_secs),
        })
    }

    /// Make a JSON-RPC call and deserialize the result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let result: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = result.get("error") {
            anyhow::bail!(
                "RPC error: {}",
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
            );
        }

        let result_value = result
            .get("result")
            .context("No result in response")?
            .clone();

        serde_json::from_value(result_value)
            .with_context(|| format!("Failed to deserialize {} result", method))
    }

    /// Submit a transaction via `eth_sendTransaction` and return its hash.
    async fn send_transaction(&self, to: Option<Address>, data: &str, nonce: u64) -> Result<String> {
        let mut tx = serde_json::json!({
            "from": self.sender,
            "data": data,
            "nonce": format!("0x{:x}", nonce),
            "gas": format!("0x{:x}", self.gas),
            "gasPrice": format!("0x{:x}", self.gas_price),
        });
        if let Some(to) = to {
            tx["to"] = serde_json::json!(to);
        }

        let tx_hash: String = self
            .call("eth_sendTransaction", vec![tx])
            .await
            .context("Failed to submit transaction")?;

        tracing::debug!(tx_hash = %tx_hash, nonce, "Transaction submitted");
        Ok(tx_hash)
    }

    /// Poll for the transaction receipt until it appears or the deadline
    /// expires. Transient query failures are retried within the deadline.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        let start = Instant::now();

        loop {
            if start.elapsed() > self.receipt_deadline {
                anyhow::bail!("Timed out waiting for transaction {} to be mined", tx_hash);
            }

            match self
                .call::<Option<TransactionReceipt>>(
                    "eth_getTransactionReceipt",
                    vec![serde_json::json!(tx_hash)],
                )
                .await
            {
                Ok(Some(receipt)) => {
                    if receipt.status.as_deref() == Some("0x0") {
                        anyhow::bail!("Transaction {} reverted", tx_hash);
                    }
                    return Ok(receipt);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::trace!(error = %e, tx_hash = %tx_hash, "Receipt query failed, retrying...");
                }
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

impl ChainClient for HttpChainClient {
    async fn transaction_count(&self, address: Address) -> Result<u64> {
        let count: String = self
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("latest")],
            )
            .await?;
        parse_hex_u64(&count).context("Failed to parse transaction count")
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: String = self.call("eth_chainId", vec![]).await?;
        parse_hex_u64(&id).context("Failed to parse chain id")
    }

    async fn submit_contract_creation(&self, data: &str, nonce: u64) -> Result<Address> {
        let tx_hash = self.send_transaction(None, data, nonce).await?;
        let receipt = self.wait_for_receipt(&tx_hash).await?;

        receipt
            .contract_address
            .with_context(|| format!("No contract address in receipt for {}", tx_hash))
    }

    async fn submit_call(&self, to: Address, data: &str, nonce: u64) -> Result<()> {
        let tx_hash = self.send_transaction(Some(to), data, nonce).await?;
        self.wait_for_receipt(&tx_hash).await?;
        Ok(())
    }
}

/// Parse a 0x-prefixed hex quantity to u64.
fn parse_hex_u64(s: &str) -> Result<u64> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .with_context(|| format!("Invalid hex quantity: {}", s))
}
