// Co-purchase signal scan engine
pub mod client;
pub mod config;
pub mod holdings;
pub mod scan;
pub mod sink;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the types the presentation layer works with
pub use client::TrackerClient;
pub use config::Config;
pub use holdings::{HoldingsReport, HoldingsVerifier};
pub use scan::types::{CandidateSignal, ScanOutcome, WalletMetrics};
pub use scan::Scanner;
pub use sink::{FileSink, SignalSink};
