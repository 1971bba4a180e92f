/// Scan artifact persistence
///
/// The engine hands its two outputs, ranked signals and the wallet metrics
/// table, to a sink after every completed scan. The file sink writes each
/// output twice: a JSON array-of-objects for programmatic consumers and a
/// CSV for spreadsheets. Files are overwritten whole; there is no append or
/// versioning. Readers get an explicit `None` for missing or unreadable
/// artifacts instead of an error.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::scan::types::{CandidateSignal, WalletMetrics};

pub const SIGNALS_JSON: &str = "copurchase_signals.json";
pub const SIGNALS_CSV: &str = "copurchase_signals.csv";
pub const METRICS_JSON: &str = "wallet_metrics.json";
pub const METRICS_CSV: &str = "wallet_metrics.csv";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact csv write failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Where completed scans are durably written. The engine only ever calls
/// this once per scan, with the full result set.
pub trait SignalSink: Send + Sync {
    fn persist_scan(
        &self,
        signals: &[CandidateSignal],
        metrics: &[WalletMetrics],
    ) -> Result<(), SinkError>;
}

/// Sink writing the four artifact files into one directory.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the last persisted signals, if any.
    pub fn read_signals(&self) -> Option<Vec<CandidateSignal>> {
        let content = std::fs::read_to_string(self.dir.join(SIGNALS_JSON)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Look one token up in the last persisted signals.
    pub fn find_signal(&self, token: &str) -> Option<CandidateSignal> {
        self.read_signals()?
            .into_iter()
            .find(|signal| signal.token == token)
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, records: &[T]) -> Result<(), SinkError> {
        let mut file = File::create(self.dir.join(name))?;
        file.write_all(serde_json::to_string_pretty(records)?.as_bytes())?;
        Ok(())
    }

    fn write_signals_csv(&self, path: &Path, signals: &[CandidateSignal]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["token", "count", "wallets"])?;
        for signal in signals {
            writer.write_record([
                signal.token.as_str(),
                &signal.count.to_string(),
                &signal.wallets.join(";"),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_metrics_csv(&self, path: &Path, metrics: &[WalletMetrics]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in metrics {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl SignalSink for FileSink {
    fn persist_scan(
        &self,
        signals: &[CandidateSignal],
        metrics: &[WalletMetrics],
    ) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir)?;

        self.write_json(SIGNALS_JSON, signals)?;
        self.write_signals_csv(&self.dir.join(SIGNALS_CSV), signals)?;
        self.write_json(METRICS_JSON, metrics)?;
        self.write_metrics_csv(&self.dir.join(METRICS_CSV), metrics)?;

        info!(
            dir = %self.dir.display(),
            signals = signals.len(),
            wallets = metrics.len(),
            "scan artifacts persisted"
        );
        Ok(())
    }
}
