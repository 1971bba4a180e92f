/// Token co-purchase aggregation
///
/// Each quality wallet contributes a token -> {wallet} accumulator built
/// from its recent buy-side trades; the orchestrating task merges those
/// partial accumulators by set union only. Union-merge is idempotent and
/// commutative, so the non-deterministic completion order of the worker
/// pool cannot change the final mapping; only the tie order of equally
/// strong signals follows merge order.

use std::collections::{HashMap, HashSet};

use super::types::{CandidateSignal, Trade};

/// Token -> distinct buying wallets, remembering the order tokens were
/// first seen. Owned exclusively by one task at a time: built by a worker,
/// merged on the collecting side.
#[derive(Debug, Default)]
pub struct SignalAccumulator {
    buyers: HashMap<String, HashSet<String>>,
    discovery_order: Vec<String>,
}

/// Collect the tokens `wallet` bought inside the lookback window.
///
/// Trades without a timestamp or resolvable token are skipped; an explicit
/// non-buy-like direction excludes a trade, a missing direction does not.
pub fn accumulate(
    wallet: &str,
    trades: &[Trade],
    now: i64,
    lookback_seconds: i64,
) -> SignalAccumulator {
    let mut acc = SignalAccumulator::new();

    for trade in trades {
        if !trade.is_recent(now, lookback_seconds) || !trade.buy_side_eligible() {
            continue;
        }
        let Some(token) = &trade.token else { continue };
        acc.insert(token, wallet);
    }

    acc
}

impl SignalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one wallet as a buyer of one token.
    pub fn insert(&mut self, token: &str, wallet: &str) {
        match self.buyers.get_mut(token) {
            Some(existing) => {
                existing.insert(wallet.to_string());
            }
            None => {
                self.discovery_order.push(token.to_string());
                self.buyers
                    .insert(token.to_string(), HashSet::from([wallet.to_string()]));
            }
        }
    }

    /// Union another accumulator into this one, preserving its internal
    /// discovery order for tokens this one has not seen yet.
    pub fn merge(&mut self, mut other: SignalAccumulator) {
        for token in std::mem::take(&mut other.discovery_order) {
            let Some(wallets) = other.buyers.remove(&token) else {
                continue;
            };
            match self.buyers.get_mut(&token) {
                Some(existing) => existing.extend(wallets),
                None => {
                    self.discovery_order.push(token.clone());
                    self.buyers.insert(token, wallets);
                }
            }
        }
    }

    /// Number of distinct tokens seen so far.
    pub fn token_count(&self) -> usize {
        self.buyers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buyers.is_empty()
    }

    /// Finalize into ranked candidate signals: tokens with at least
    /// `min_wallets` distinct buyers, sorted descending by buyer count,
    /// ties keeping first-discovery order.
    pub fn into_signals(self, min_wallets: usize) -> Vec<CandidateSignal> {
        let Self {
            mut buyers,
            discovery_order,
        } = self;

        let mut signals: Vec<CandidateSignal> = discovery_order
            .into_iter()
            .filter_map(|token| {
                let wallets = buyers.remove(&token)?;
                if wallets.len() < min_wallets {
                    return None;
                }
                let count = wallets.len();
                let mut wallets: Vec<String> = wallets.into_iter().collect();
                wallets.sort();
                Some(CandidateSignal {
                    token,
                    wallets,
                    count,
                })
            })
            .collect();

        // Stable sort: equal counts keep discovery order.
        signals.sort_by(|a, b| b.count.cmp(&a.count));
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const LOOKBACK: i64 = 6 * 60 * 60;

    fn trade(token: &str, side: Option<&str>, age_secs: i64) -> Trade {
        Trade {
            timestamp: Some(NOW - age_secs),
            side: side.map(str::to_string),
            token: Some(token.to_string()),
        }
    }

    fn contribution(wallet: &str, tokens: &[&str]) -> SignalAccumulator {
        let trades: Vec<Trade> = tokens
            .iter()
            .map(|t| trade(t, Some("buy"), 60))
            .collect();
        accumulate(wallet, &trades, NOW, LOOKBACK)
    }

    fn ranked(acc: SignalAccumulator, min_wallets: usize) -> Vec<(String, usize)> {
        acc.into_signals(min_wallets)
            .into_iter()
            .map(|s| (s.token, s.count))
            .collect()
    }

    #[test]
    fn accumulate_keeps_recent_buy_side_trades_only() {
        let trades = vec![
            trade("T1", Some("buy"), 60),
            trade("T2", None, 60),
            trade("T3", Some("purchase"), 60),
            trade("T4", Some("sell"), 60),
            trade("T5", Some("swap"), 60),
            trade("T6", Some("buy"), LOOKBACK + 60),
        ];
        let acc = accumulate("W", &trades, NOW, LOOKBACK);
        assert_eq!(
            ranked(acc, 1),
            vec![
                ("T1".to_string(), 1),
                ("T2".to_string(), 1),
                ("T3".to_string(), 1)
            ]
        );
    }

    #[test]
    fn accumulate_skips_unresolvable_tokens() {
        let mut no_token = trade("T1", Some("buy"), 60);
        no_token.token = None;
        assert!(accumulate("W", &[no_token], NOW, LOOKBACK).is_empty());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["T1", "T2"]));
        acc.merge(contribution("W1", &["T1", "T2"]));
        let signals = acc.into_signals(1);
        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.count == 1));
    }

    #[test]
    fn merge_is_commutative() {
        let finalize = |order: [&str; 2]| -> Vec<(String, Vec<String>)> {
            let mut acc = SignalAccumulator::new();
            for wallet in order {
                acc.merge(contribution(wallet, &["T1", "T2"]));
            }
            let mut result: Vec<(String, Vec<String>)> = acc
                .into_signals(1)
                .into_iter()
                .map(|s| (s.token, s.wallets))
                .collect();
            result.sort();
            result
        };
        assert_eq!(finalize(["W1", "W2"]), finalize(["W2", "W1"]));
    }

    #[test]
    fn two_buyers_clear_the_signal_threshold() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["T"]));
        acc.merge(contribution("W2", &["T"]));
        let signals = acc.into_signals(2);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].token, "T");
        assert_eq!(signals[0].count, 2);
        assert_eq!(signals[0].wallets.len(), 2);
    }

    #[test]
    fn below_threshold_tokens_are_dropped() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["T1", "T2"]));
        acc.merge(contribution("W2", &["T1"]));
        assert_eq!(ranked(acc, 2), vec![("T1".to_string(), 2)]);
    }

    #[test]
    fn count_always_matches_the_wallet_set_size() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["T1", "T2"]));
        acc.merge(contribution("W2", &["T1"]));
        acc.merge(contribution("W2", &["T1"]));
        for signal in acc.into_signals(1) {
            assert_eq!(signal.count, signal.wallets.len());
        }
    }

    #[test]
    fn ranking_is_descending_by_buyer_count() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["A", "B", "C"]));
        acc.merge(contribution("W2", &["B", "C"]));
        acc.merge(contribution("W3", &["C"]));
        assert_eq!(
            ranked(acc, 1),
            vec![
                ("C".to_string(), 3),
                ("B".to_string(), 2),
                ("A".to_string(), 1)
            ]
        );
    }

    #[test]
    fn equal_counts_keep_first_discovery_order() {
        let mut acc = SignalAccumulator::new();
        acc.merge(contribution("W1", &["X", "Y", "Z"]));
        acc.merge(contribution("W2", &["Z", "Y", "X"]));
        assert_eq!(
            ranked(acc, 1),
            vec![
                ("X".to_string(), 2),
                ("Y".to_string(), 2),
                ("Z".to_string(), 2)
            ]
        );
    }
}
