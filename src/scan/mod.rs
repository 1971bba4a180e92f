/// Scan orchestration
///
/// One scan walks FETCH_UNIVERSE -> DISPATCH -> COLLECT -> RANK_AND_PERSIST:
/// fetch the top-trader universe, fan the wallets out across a bounded
/// worker pool, merge per-wallet results as they complete, then rank and
/// persist the surviving signals. Workers only ever return private partial
/// results over a channel; the collecting task is the single writer of the
/// aggregate state. A wallet that fails contributes a failure record and
/// nothing else; the scan always runs to completion with whatever data it
/// could get.

pub mod aggregate;
pub mod metrics;
pub mod normalize;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::client::TrackerClient;
use crate::config::Config;
use crate::sink::SignalSink;

use aggregate::SignalAccumulator;
use metrics::QualityFilter;
use types::{ScanOutcome, ScanPhase, Trade, WalletScan};

/// One unit of work on the dispatch queue.
struct WalletJob {
    wallet: String,
    index: usize,
    total: usize,
}

pub struct Scanner {
    client: Arc<TrackerClient>,
    config: Arc<Config>,
    sink: Arc<dyn SignalSink>,
}

impl Scanner {
    pub fn new(client: Arc<TrackerClient>, config: Arc<Config>, sink: Arc<dyn SignalSink>) -> Self {
        Self {
            client,
            config,
            sink,
        }
    }

    /// Run one complete scan. Per-wallet failures degrade to failure
    /// records; only a sink that cannot write the artifacts errors out.
    #[instrument(skip(self))]
    pub async fn generate_scan(&self) -> Result<ScanOutcome> {
        info!("starting co-purchase scan");

        let wallets = self.fetch_universe().await;
        if wallets.is_empty() {
            warn!("top-trader universe is empty, nothing to scan");
            self.sink.persist_scan(&[], &[])?;
            return Ok(ScanOutcome::default());
        }

        let total = wallets.len();
        info!(
            wallets = total,
            workers = self.config.max_workers,
            "dispatching wallet analysis"
        );

        // Every job is queued up front; the capped worker set drains the
        // queue and the queue closing is the workers' shutdown signal.
        let (job_tx, job_rx) = mpsc::channel(total);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel(self.config.max_workers.max(1));

        for (index, wallet) in wallets.into_iter().enumerate() {
            let job = WalletJob {
                wallet,
                index: index + 1,
                total,
            };
            job_tx
                .send(job)
                .await
                .expect("job queue is sized to the universe");
        }
        drop(job_tx);

        for _ in 0..self.config.max_workers {
            tokio::spawn(scan_worker(
                Arc::clone(&self.client),
                Arc::clone(&self.config),
                Arc::clone(&job_rx),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        // COLLECT: merge in completion order; this task is the only writer.
        let mut accumulator = SignalAccumulator::new();
        let mut wallet_metrics = Vec::new();
        let mut failures = Vec::new();
        let mut quality_wallets = 0usize;

        while let Some(scan) = result_rx.recv().await {
            if let Some(failure) = scan.failure {
                warn!(
                    wallet = %failure.wallet,
                    phase = ?failure.phase,
                    cause = %failure.cause,
                    "wallet contributed nothing"
                );
                failures.push(failure);
            }
            if let Some(m) = scan.metrics {
                if scan.quality {
                    quality_wallets += 1;
                }
                wallet_metrics.push(m);
            }
            accumulator.merge(scan.tokens);
        }

        info!(
            quality_wallets,
            analyzed = wallet_metrics.len(),
            universe = total,
            tokens_seen = accumulator.token_count(),
            failed = failures.len(),
            "wallet analysis finished"
        );

        let signals = accumulator.into_signals(self.config.min_wallets_for_signal);
        self.sink.persist_scan(&signals, &wallet_metrics)?;

        info!(signals = signals.len(), "scan complete");
        Ok(ScanOutcome {
            signals,
            metrics: wallet_metrics,
            failures,
            universe_size: total,
            quality_wallets,
        })
    }

    async fn fetch_universe(&self) -> Vec<String> {
        let body = self
            .client
            .fetch(
                "/top-traders/all",
                &[("limit", self.config.top_traders_limit.to_string())],
            )
            .await;

        let wallets = normalize::wallet_addresses(&body);
        if self.config.dedupe_universe {
            normalize::dedupe_preserving_order(wallets)
        } else {
            wallets
        }
    }
}

/// Worker loop: pull jobs until the queue closes. The pacing sleep runs
/// while the worker slot is still held, so wall-time throttling scales with
/// the pool size, not the wallet count.
async fn scan_worker(
    client: Arc<TrackerClient>,
    config: Arc<Config>,
    jobs: Arc<Mutex<mpsc::Receiver<WalletJob>>>,
    results: mpsc::Sender<WalletScan>,
) {
    loop {
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else { break };

        let scan = analyze_wallet(&client, &config, &job).await;
        tokio::time::sleep(Duration::from_secs_f64(config.request_delay_secs)).await;

        if results.send(scan).await.is_err() {
            break;
        }
    }
}

/// The per-wallet pipeline: fetch trades, normalize, compute metrics,
/// gate on quality, and aggregate co-purchases for passing wallets.
async fn analyze_wallet(client: &TrackerClient, config: &Config, job: &WalletJob) -> WalletScan {
    if job.index % 10 == 0 {
        info!(index = job.index, total = job.total, "wallet analysis progress");
    }

    let body = client
        .fetch(
            &format!("/wallet/{}/trades", job.wallet),
            &[("limit", config.trades_page_limit.to_string())],
        )
        .await;
    if body.is_null() {
        return WalletScan::failed(
            &job.wallet,
            ScanPhase::FetchTrades,
            "all fetch attempts exhausted",
        );
    }

    let Some(raw_trades) = normalize::unwrap_list(&body, "trades") else {
        return WalletScan::failed(
            &job.wallet,
            ScanPhase::NormalizeTrades,
            "response body had no recognizable trade list",
        );
    };
    let trades: Vec<Trade> = raw_trades.iter().filter_map(normalize::trade).collect();

    let now = Utc::now().timestamp();
    let wallet_metrics =
        metrics::compute_wallet_metrics(&job.wallet, &trades, now, config.lookback_seconds);

    let filter = QualityFilter {
        min_total_trades: config.min_total_trades,
        min_recent_activity: config.min_recent_activity,
    };
    let quality = filter.passes(&wallet_metrics);

    let tokens = if quality {
        debug!(
            wallet = %job.wallet,
            total_trades = wallet_metrics.total_trades,
            recent = wallet_metrics.recent_activity,
            "quality wallet"
        );
        aggregate::accumulate(&job.wallet, &trades, now, config.lookback_seconds)
    } else {
        debug!(
            wallet = %job.wallet,
            total_trades = wallet_metrics.total_trades,
            recent = wallet_metrics.recent_activity,
            "wallet below quality thresholds"
        );
        SignalAccumulator::new()
    };

    WalletScan {
        wallet: job.wallet.clone(),
        metrics: Some(wallet_metrics),
        quality,
        tokens,
        failure: None,
    }
}
