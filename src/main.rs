use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flock::{Config, FileSink, HoldingsVerifier, Scanner, TrackerClient};

fn init_tracing() -> Result<()> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all("logs")?;

    // Create file appender for logs
    let file_appender = tracing_appender::rolling::daily("logs", "flock.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // Create console layer with formatting
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    // Create file layer with JSON formatting
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    // Initialize subscriber with both console and file layers
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Leak the guard to prevent the file appender from being dropped
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config_path =
        std::env::var("FLOCK_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load_from_file(&config_path)?;
    config.validate()?;
    let config = Arc::new(config);

    let client = Arc::new(TrackerClient::new(
        &config.base_url,
        config.api_keys.clone(),
    )?);
    let sink = Arc::new(FileSink::new(config.output_dir.clone()));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("scan") => {
            let scanner = Scanner::new(Arc::clone(&client), Arc::clone(&config), sink);
            let outcome = scanner.generate_scan().await?;
            info!(
                signals = outcome.signals.len(),
                quality_wallets = outcome.quality_wallets,
                universe = outcome.universe_size,
                failed_wallets = outcome.failures.len(),
                "scan finished"
            );
        }
        Some("holdings") => {
            let Some(token) = args.get(1) else {
                bail!("usage: flock holdings <token>");
            };
            let Some(signals) = sink.read_signals() else {
                bail!("no scan data found; run `flock scan` first");
            };
            let Some(signal) = signals.into_iter().find(|s| &s.token == token) else {
                bail!("token {token} not found in the last scan");
            };

            let verifier = HoldingsVerifier::new(client);
            let report = verifier.check_token_holdings(token, &signal.wallets).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(other) => bail!("unknown command {other}; expected `scan` or `holdings <token>`"),
    }

    Ok(())
}
