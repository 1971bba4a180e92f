/// Core data types for the co-purchase scan engine

use serde::{Deserialize, Serialize};

use super::aggregate::SignalAccumulator;

/// A single wallet trade after payload normalization.
///
/// Upstream trade records arrive with wildly inconsistent field names and
/// units; this is the fixed shape the rest of the engine works with. Every
/// field is optional because real payloads omit any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Unix timestamp in seconds (already divided down from milliseconds)
    pub timestamp: Option<i64>,

    /// Lowercased direction label, `None` when the record carried no
    /// direction field at all
    pub side: Option<String>,

    /// Counterparty token address, resolved via the field fallback chain
    pub token: Option<String>,
}

/// Buy/sell classification used for the metrics tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
    /// Unrecognized or missing direction label; tallies in neither column
    Neutral,
}

impl Trade {
    /// Classify the trade for the buy/sell tally.
    pub fn direction(&self) -> Direction {
        let Some(side) = self.side.as_deref() else {
            return Direction::Neutral;
        };
        if side.contains("buy") || side.contains("receive") || side.contains("mint") {
            Direction::Buy
        } else if side.contains("sell") || side.contains("send") {
            Direction::Sell
        } else {
            Direction::Neutral
        }
    }

    /// Whether the trade falls inside the lookback window. Trades without a
    /// timestamp are never recent.
    pub fn is_recent(&self, now: i64, lookback_seconds: i64) -> bool {
        match self.timestamp {
            Some(ts) => ts > now - lookback_seconds,
            None => false,
        }
    }

    /// Whether the trade counts toward co-purchase aggregation.
    ///
    /// A missing direction label does NOT exclude the trade; only an
    /// explicit label that is not buy-like does. `purchase` is accepted
    /// here even though the metrics tally ignores it; the two
    /// classifications are intentionally not the same.
    pub fn buy_side_eligible(&self) -> bool {
        match self.side.as_deref() {
            None => true,
            Some(side) => {
                side.contains("buy")
                    || side.contains("receive")
                    || side.contains("mint")
                    || side.contains("purchase")
            }
        }
    }
}

/// Derived activity and quality metrics for one wallet, computed once per
/// scan from its trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetrics {
    /// Wallet address
    pub wallet: String,

    /// Buy-classified plus sell-classified trades; direction-less trades
    /// tally in neither column
    pub total_trades: u32,

    /// Trades whose direction label reads as a buy
    pub buy_trades: u32,

    /// Trades whose direction label reads as a sell
    pub sell_trades: u32,

    /// Trades inside the lookback window, direction ignored
    pub recent_activity: u32,

    /// Mirror of recent_activity kept for artifact-schema stability
    pub estimated_activity_score: u32,

    /// buy_trades / total_trades as a percentage, 0 when no classified trades
    pub win_rate: f64,

    /// Reserved zero until cost-basis data exists upstream
    pub roi: f64,

    /// Reserved zero until cost-basis data exists upstream
    pub total_investment: f64,

    /// Reserved zero until cost-basis data exists upstream
    pub total_returns: f64,

    /// Reserved zero until cost-basis data exists upstream
    pub pnl: f64,
}

impl WalletMetrics {
    /// All-zero record for a wallet whose trade list was empty or malformed.
    pub fn empty(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_string(),
            total_trades: 0,
            buy_trades: 0,
            sell_trades: 0,
            recent_activity: 0,
            estimated_activity_score: 0,
            win_rate: 0.0,
            roi: 0.0,
            total_investment: 0.0,
            total_returns: 0.0,
            pnl: 0.0,
        }
    }
}

/// A token bought by multiple distinct quality wallets inside the lookback
/// window. The scan's primary output record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSignal {
    /// Token address
    pub token: String,

    /// Distinct buying wallets, sorted for stable artifacts
    pub wallets: Vec<String>,

    /// Always equals wallets.len()
    pub count: usize,
}

/// Where in the per-wallet pipeline a task gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// All fetch attempts against the trades endpoint were exhausted
    FetchTrades,
    /// The response body had no recognizable trade list shape
    NormalizeTrades,
}

/// Structured record of a per-wallet failure. Failures never abort a scan;
/// they are collected so callers can see how much of the universe actually
/// contributed.
#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub wallet: String,
    pub phase: ScanPhase,
    pub cause: String,
}

/// Per-wallet worker result funneled back to the collecting task.
#[derive(Debug)]
pub struct WalletScan {
    pub wallet: String,
    pub metrics: Option<WalletMetrics>,
    /// Whether the wallet cleared the quality filter
    pub quality: bool,
    /// token -> buying wallets contribution, empty unless quality
    pub tokens: SignalAccumulator,
    pub failure: Option<ScanFailure>,
}

impl WalletScan {
    /// Result for a wallet whose task could not produce anything.
    pub fn failed(wallet: &str, phase: ScanPhase, cause: impl Into<String>) -> Self {
        Self {
            wallet: wallet.to_string(),
            metrics: None,
            quality: false,
            tokens: SignalAccumulator::new(),
            failure: Some(ScanFailure {
                wallet: wallet.to_string(),
                phase,
                cause: cause.into(),
            }),
        }
    }
}

/// Everything one completed scan produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Ranked candidate signals, best first
    pub signals: Vec<CandidateSignal>,

    /// Metrics for every wallet that was successfully analyzed, quality or not
    pub metrics: Vec<WalletMetrics>,

    /// Per-wallet failures observed during the scan
    pub failures: Vec<ScanFailure>,

    /// Wallets in the fetched top-trader universe
    pub universe_size: usize,

    /// Wallets that cleared the quality filter
    pub quality_wallets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(side: Option<&str>) -> Trade {
        Trade {
            timestamp: Some(1_700_000_000),
            side: side.map(str::to_string),
            token: Some("So11111111111111111111111111111111111111112".to_string()),
        }
    }

    #[test]
    fn direction_classification_matches_label_substrings() {
        assert_eq!(trade(Some("buy")).direction(), Direction::Buy);
        assert_eq!(trade(Some("token_receive")).direction(), Direction::Buy);
        assert_eq!(trade(Some("mint_to")).direction(), Direction::Buy);
        assert_eq!(trade(Some("sell")).direction(), Direction::Sell);
        assert_eq!(trade(Some("send")).direction(), Direction::Sell);
        assert_eq!(trade(Some("swap")).direction(), Direction::Neutral);
        assert_eq!(trade(None).direction(), Direction::Neutral);
    }

    #[test]
    fn missing_direction_is_eligible_but_neutral() {
        let t = trade(None);
        assert!(t.buy_side_eligible());
        assert_eq!(t.direction(), Direction::Neutral);
    }

    #[test]
    fn purchase_label_is_eligible_but_not_a_buy_for_the_tally() {
        let t = trade(Some("purchase"));
        assert!(t.buy_side_eligible());
        assert_eq!(t.direction(), Direction::Neutral);
    }

    #[test]
    fn explicit_non_buy_labels_are_excluded_from_aggregation() {
        assert!(!trade(Some("sell")).buy_side_eligible());
        assert!(!trade(Some("swap")).buy_side_eligible());
    }

    #[test]
    fn recency_requires_a_timestamp() {
        let now = 1_700_000_100;
        assert!(trade(Some("buy")).is_recent(now, 3600));
        let mut old = trade(Some("buy"));
        old.timestamp = Some(now - 7200);
        assert!(!old.is_recent(now, 3600));
        old.timestamp = None;
        assert!(!old.is_recent(now, 3600));
    }
}
