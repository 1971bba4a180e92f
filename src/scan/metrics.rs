/// Wallet activity metrics and the quality gate
///
/// Metrics are derived purely from a wallet's normalized trade history; the
/// caller supplies the clock so the computation stays side-effect free. The
/// pnl-family fields stay zero until the upstream data carries cost basis.

use super::types::{Direction, Trade, WalletMetrics};

/// Derive activity metrics for one wallet.
pub fn compute_wallet_metrics(
    wallet: &str,
    trades: &[Trade],
    now: i64,
    lookback_seconds: i64,
) -> WalletMetrics {
    if trades.is_empty() {
        return WalletMetrics::empty(wallet);
    }

    let mut buy_trades = 0u32;
    let mut sell_trades = 0u32;
    let mut recent_activity = 0u32;

    for trade in trades {
        if trade.is_recent(now, lookback_seconds) {
            recent_activity += 1;
        }
        match trade.direction() {
            Direction::Buy => buy_trades += 1,
            Direction::Sell => sell_trades += 1,
            Direction::Neutral => {}
        }
    }

    let total_trades = buy_trades + sell_trades;
    let win_rate = if total_trades > 0 {
        f64::from(buy_trades) / f64::from(total_trades) * 100.0
    } else {
        0.0
    };

    WalletMetrics {
        wallet: wallet.to_string(),
        total_trades,
        buy_trades,
        sell_trades,
        recent_activity,
        estimated_activity_score: recent_activity,
        win_rate,
        roi: 0.0,
        total_investment: 0.0,
        total_returns: 0.0,
        pnl: 0.0,
    }
}

/// Gate deciding whether a wallet's metrics are significant enough for its
/// trades to contribute co-purchase signal. A rejected wallet still has its
/// metrics reported: trusting a wallet as a signal source and learning
/// about it are separate questions.
#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    pub min_total_trades: u32,
    pub min_recent_activity: u32,
}

impl QualityFilter {
    pub fn passes(&self, metrics: &WalletMetrics) -> bool {
        metrics.total_trades >= self.min_total_trades
            && metrics.recent_activity >= self.min_recent_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const LOOKBACK: i64 = 6 * 60 * 60;

    fn trade(side: Option<&str>, age_secs: i64) -> Trade {
        Trade {
            timestamp: Some(NOW - age_secs),
            side: side.map(str::to_string),
            token: None,
        }
    }

    #[test]
    fn empty_history_yields_all_zero_metrics() {
        let m = compute_wallet_metrics("W", &[], NOW, LOOKBACK);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.recent_activity, 0);
        assert_eq!(m.win_rate, 0.0);
    }

    #[test]
    fn tallies_follow_direction_and_recency() {
        // Five classified trades, three of them recent buys.
        let trades = vec![
            trade(Some("buy"), 60),
            trade(Some("buy"), 120),
            trade(Some("receive"), 600),
            trade(Some("sell"), LOOKBACK + 100),
            trade(Some("send"), LOOKBACK + 200),
        ];
        let m = compute_wallet_metrics("W", &trades, NOW, LOOKBACK);
        assert_eq!(m.total_trades, 5);
        assert_eq!(m.buy_trades, 3);
        assert_eq!(m.sell_trades, 2);
        assert_eq!(m.recent_activity, 3);
        assert_eq!(m.win_rate, 60.0);
        assert_eq!(m.pnl, 0.0);
    }

    #[test]
    fn unlabeled_trades_count_as_recent_but_not_toward_totals() {
        let trades = vec![trade(None, 60), trade(Some("swap"), 60)];
        let m = compute_wallet_metrics("W", &trades, NOW, LOOKBACK);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.recent_activity, 2);
    }

    #[test]
    fn filter_thresholds_are_inclusive() {
        let trades = vec![trade(Some("buy"), 60)];
        let m = compute_wallet_metrics("W", &trades, NOW, LOOKBACK);
        let filter = QualityFilter {
            min_total_trades: 1,
            min_recent_activity: 1,
        };
        assert!(filter.passes(&m));
    }

    #[test]
    fn raising_either_threshold_only_shrinks_the_passing_set() {
        let wallets: Vec<WalletMetrics> = (0..20)
            .map(|i| {
                let trades: Vec<Trade> = (0..i)
                    .map(|n| trade(Some("buy"), if n % 2 == 0 { 60 } else { LOOKBACK + 60 }))
                    .collect();
                compute_wallet_metrics(&format!("W{i}"), &trades, NOW, LOOKBACK)
            })
            .collect();

        let passing = |f: QualityFilter| -> Vec<&str> {
            wallets
                .iter()
                .filter(|m| f.passes(m))
                .map(|m| m.wallet.as_str())
                .collect()
        };

        let base = passing(QualityFilter {
            min_total_trades: 2,
            min_recent_activity: 1,
        });
        for (trades_min, recent_min) in [(5, 1), (2, 4), (8, 6)] {
            let tightened = passing(QualityFilter {
                min_total_trades: trades_min,
                min_recent_activity: recent_min,
            });
            assert!(tightened.iter().all(|w| base.contains(w)));
        }
    }
}
