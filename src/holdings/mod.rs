/// Post-hoc holdings verification
///
/// Given a token and the wallets that produced its signal, re-query each
/// wallet's current holdings and classify it as still holding or sold out.
/// Runs strictly one wallet at a time with a pacing sleep in between: the
/// holdings endpoint gets no burst traffic from this path, ever. A failed
/// lookup reads as "not holding"; the false-negative bias is acceptable for
/// a verification pass.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::client::TrackerClient;
use crate::scan::normalize;

const WALLET_PACING_MS: u64 = 500;

/// Classification label for one signal wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingStatus {
    #[serde(rename = "HOLDING")]
    Holding,
    #[serde(rename = "SOLD")]
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletHoldingStatus {
    pub still_holding: bool,
    pub status: HoldingStatus,
}

impl WalletHoldingStatus {
    fn classify(still_holding: bool) -> Self {
        Self {
            still_holding,
            status: if still_holding {
                HoldingStatus::Holding
            } else {
                HoldingStatus::Sold
            },
        }
    }
}

/// Summary plus per-wallet detail for one verification run. Nothing is
/// retained across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsReport {
    pub token: String,
    pub total_wallets: usize,
    pub still_holding: usize,
    pub sold: usize,
    pub wallets: BTreeMap<String, WalletHoldingStatus>,
}

impl HoldingsReport {
    /// Build the summary from per-wallet classifications. Holding plus
    /// sold always add up to the total by construction.
    pub fn from_statuses(token: &str, statuses: BTreeMap<String, WalletHoldingStatus>) -> Self {
        let total_wallets = statuses.len();
        let still_holding = statuses.values().filter(|s| s.still_holding).count();
        Self {
            token: token.to_string(),
            total_wallets,
            still_holding,
            sold: total_wallets - still_holding,
            wallets: statuses,
        }
    }
}

pub struct HoldingsVerifier {
    client: Arc<TrackerClient>,
}

impl HoldingsVerifier {
    pub fn new(client: Arc<TrackerClient>) -> Self {
        Self { client }
    }

    /// Check which of `wallets` still hold `token` right now.
    #[instrument(skip(self, wallets), fields(wallet_count = wallets.len()))]
    pub async fn check_token_holdings(&self, token: &str, wallets: &[String]) -> HoldingsReport {
        info!(%token, wallets = wallets.len(), "verifying holdings for signal wallets");

        let mut statuses = BTreeMap::new();
        for wallet in wallets {
            let body = self
                .client
                .fetch(&format!("/wallet/{wallet}/holdings"), &[])
                .await;
            let still_holding = normalize::holds_token(&body, token);
            debug!(%wallet, still_holding, "holdings checked");
            statuses.insert(wallet.clone(), WalletHoldingStatus::classify(still_holding));
            tokio::time::sleep(Duration::from_millis(WALLET_PACING_MS)).await;
        }

        let report = HoldingsReport::from_statuses(token, statuses);
        info!(
            %token,
            holding = report.still_holding,
            sold = report.sold,
            "holdings verification complete"
        );
        report
    }
}
