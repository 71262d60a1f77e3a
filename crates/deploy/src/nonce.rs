//! Per-run transaction nonce sequencing.

use alloy_core::primitives::Address;
use anyhow::{Context, Result};

use crate::rpc::ChainClient;

/// Hands out the nonce for each transaction in a deployment run.
///
/// The starting value is fetched from the network once per run; after that
/// every transaction consumes exactly one `next()` value, in submission
/// order, so dependent deployments line up without re-querying the chain
/// between steps.
#[derive(Debug)]
pub struct NonceSequencer {
    next: u64,
}

impl NonceSequencer {
    /// Start a sequence at a known nonce.
    pub fn new(initial: u64) -> Self {
        Self { next: initial }
    }

    /// Fetch the sender's current transaction count and start the
    /// sequence there. Failing here aborts the run before anything has
    /// been submitted.
    pub async fn init<C: ChainClient>(client: &C, sender: Address) -> Result<Self> {
        let initial = client
            .transaction_count(sender)
            .await
            .context("Failed to fetch the initial nonce for the deployment account")?;
        tracing::debug!(sender = %sender, nonce = initial, "Nonce sequence initialized");
        Ok(Self::new(initial))
    }

    /// Return the next nonce and advance the sequence.
    pub fn next(&mut self) -> u64 {
        let nonce = self.next;
        self.next += 1;
        nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_gap_free() {
        for initial in [0u64, 1, 17, 40_000] {
            let mut sequencer = NonceSequencer::new(initial);
            for k in 0..25 {
                assert_eq!(sequencer.next(), initial + k);
            }
        }
    }

    #[test]
    fn test_values_are_unique() {
        let mut sequencer = NonceSequencer::new(7);
        let issued: Vec<u64> = (0..10).map(|_| sequencer.next()).collect();

        let mut deduped = issued.clone();
        deduped.dedup();
        assert_eq!(issued, deduped);
        assert!(issued.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
