/// Scan engine configuration
///
/// Loaded once at startup from a TOML file; every field has a default
/// matching the original deployment, so a partial file works. The process
/// refuses to start without at least one API key; everything downstream
/// assumes a non-empty credential pool.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Upstream API credential pool, rotated per request
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Upstream data API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Universe size cap for the top-traders fetch
    #[serde(default = "default_top_traders_limit")]
    pub top_traders_limit: u32,

    /// Trailing window in which activity counts as recent
    #[serde(default = "default_lookback_seconds")]
    pub lookback_seconds: i64,

    /// Distinct buying wallets required before a token becomes a signal
    #[serde(default = "default_min_wallets_for_signal")]
    pub min_wallets_for_signal: usize,

    /// Worker pool size; also the de facto upstream rate limit
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Pacing sleep after each wallet's work, seconds
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: f64,

    /// Quality gate: minimum classified trades in the wallet history
    #[serde(default = "default_min_total_trades")]
    pub min_total_trades: u32,

    /// Quality gate: minimum trades inside the lookback window
    #[serde(default = "default_min_recent_activity")]
    pub min_recent_activity: u32,

    /// Drop duplicate wallets from the universe before dispatch. Off by
    /// default: the upstream list may repeat heavy traders and letting
    /// duplicates through preserves that weighting.
    #[serde(default)]
    pub dedupe_universe: bool,

    /// Page size for the per-wallet trades fetch
    #[serde(default = "default_trades_page_limit")]
    pub trades_page_limit: u32,

    /// Directory the scan artifacts are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing config file {path}"))?;
        Ok(config)
    }

    /// Startup-time sanity checks for settings nothing downstream can
    /// recover from.
    pub fn validate(&self) -> Result<()> {
        if self.api_keys.is_empty() {
            bail!("configuration has no api_keys; at least one upstream credential is required");
        }
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.lookback_seconds <= 0 {
            bail!("lookback_seconds must be positive");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: default_base_url(),
            top_traders_limit: default_top_traders_limit(),
            lookback_seconds: default_lookback_seconds(),
            min_wallets_for_signal: default_min_wallets_for_signal(),
            max_workers: default_max_workers(),
            request_delay_secs: default_request_delay_secs(),
            min_total_trades: default_min_total_trades(),
            min_recent_activity: default_min_recent_activity(),
            dedupe_universe: false,
            trades_page_limit: default_trades_page_limit(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_base_url() -> String {
    "https://data.solanatracker.io".to_string()
}

fn default_top_traders_limit() -> u32 {
    3000
}

fn default_lookback_seconds() -> i64 {
    6 * 60 * 60
}

fn default_min_wallets_for_signal() -> usize {
    2
}

// Conservative on purpose; the worker pool is the only throttle the
// upstream rate limit ever sees.
fn default_max_workers() -> usize {
    1
}

fn default_request_delay_secs() -> f64 {
    1.0
}

fn default_min_total_trades() -> u32 {
    1
}

fn default_min_recent_activity() -> u32 {
    1
}

fn default_trades_page_limit() -> u32 {
    200
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
