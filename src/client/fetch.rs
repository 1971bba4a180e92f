/// Rate-limited upstream access with credential rotation
///
/// One logical fetch makes up to two attempts per pooled key, drawing a
/// fresh key each time and backing off briefly between attempts. Exhaustion
/// degrades to an empty result instead of an error: a single wallet's
/// failed lookup must never abort a whole scan, so nothing here is allowed
/// to propagate.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::keys::KeyRotator;

const REQUEST_TIMEOUT_SECS: u64 = 25;
const ATTEMPT_BACKOFF_MS: u64 = 500;
const ATTEMPTS_PER_KEY: usize = 2;
const LOGGED_BODY_CHARS: usize = 120;

pub struct TrackerClient {
    http: Client,
    keys: KeyRotator,
    base_url: String,
}

impl TrackerClient {
    pub fn new(base_url: &str, keys: Vec<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            keys: KeyRotator::new(keys),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` with the given query, rotating credentials across
    /// attempts. Returns the parsed JSON body on HTTP 200, `Value::Null`
    /// once every attempt is spent. Callers treat null as "no data".
    pub async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Value {
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.keys.pool_size() * ATTEMPTS_PER_KEY;

        for attempt in 1..=attempts {
            match self.attempt(&url, query).await {
                Ok(body) => return body,
                Err(cause) => {
                    warn!(%url, attempt, attempts, %cause, "upstream request failed");
                }
            }
            tokio::time::sleep(Duration::from_millis(ATTEMPT_BACKOFF_MS)).await;
        }

        debug!(%url, "fetch attempts exhausted, returning empty result");
        Value::Null
    }

    async fn attempt(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .header("x-api-key", self.keys.next_key())
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(LOGGED_BODY_CHARS).collect();
            return Err(anyhow!("status {status}: {snippet}"));
        }

        Ok(response.json().await?)
    }
}
