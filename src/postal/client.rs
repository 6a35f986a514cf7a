//! HTTP client for the postal-code lookup service.

use super::code::PostalCode;
use super::history::{SearchHistory, SearchRecord, SearchStats};
use super::payload::AddressPayload;
use super::status::{classify, LookupStatus};
use crate::error::{LabError, Result};
use crate::retry::{RetryPolicy, RetryReport};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.cepaberto.com/api/v3";

/// Configuration for the lookup client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalConfig {
    /// Base URL of the service, without trailing slash
    pub base_url: String,
    /// API token sent as `Token token=<token>`
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(10),
            user_agent: format!("labkit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PostalConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a lookup that reached the service.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Box<AddressPayload>),
    NotFound(PostalCode),
}

impl LookupOutcome {
    pub fn address(&self) -> Option<&AddressPayload> {
        match self {
            LookupOutcome::Found(payload) => Some(payload),
            LookupOutcome::NotFound(_) => None,
        }
    }
}

/// Result for one input of a batch lookup.
#[derive(Debug)]
pub struct BatchEntry {
    pub input: String,
    pub result: Result<LookupOutcome>,
}

/// Lookup client; owns the history of its own attempts.
pub struct PostalClient {
    config: PostalConfig,
    http: reqwest::Client,
    history: Mutex<SearchHistory>,
}

impl PostalClient {
    pub fn new(config: PostalConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(LabError::config_error("postal lookup token is empty"));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Token token={}", config.token))
            .map_err(|e| LabError::config_error(format!("invalid token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LabError::config_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            history: Mutex::new(SearchHistory::new()),
        })
    }

    pub fn config(&self) -> &PostalConfig {
        &self.config
    }

    /// Validate `raw` and look it up once.
    pub async fn lookup(&self, raw: &str) -> Result<LookupOutcome> {
        let code = PostalCode::parse(raw)?;
        self.fetch(code).await
    }

    /// Validate `raw`, then look it up under `policy`. Validation failures
    /// are returned before the executor runs.
    pub async fn lookup_with_retry(
        &self,
        raw: &str,
        policy: &RetryPolicy,
    ) -> Result<RetryReport<LookupOutcome>> {
        let code = PostalCode::parse(raw)?;
        Ok(policy.execute(|| self.fetch(code.clone())).await)
    }

    /// Look up each input in order, pausing `interval` between requests.
    pub async fn lookup_many<S: AsRef<str>>(&self, inputs: &[S], interval: Duration) -> Vec<BatchEntry> {
        let total = inputs.len();
        let mut entries = Vec::with_capacity(total);

        info!(total, "starting batch lookup");
        for (idx, input) in inputs.iter().enumerate() {
            let input = input.as_ref();
            let result = self.lookup(input).await;
            debug!(position = idx + 1, total, input, ok = result.is_ok(), "batch lookup step");
            entries.push(BatchEntry {
                input: input.to_string(),
                result,
            });

            if idx + 1 < total {
                tokio::time::sleep(interval).await;
            }
        }

        let found = entries
            .iter()
            .filter(|e| matches!(e.result, Ok(LookupOutcome::Found(_))))
            .count();
        info!(found, total, "batch lookup finished");
        entries
    }

    /// Copy of every recorded attempt, in order.
    pub fn history(&self) -> Vec<SearchRecord> {
        self.lock_history().records().to_vec()
    }

    pub fn stats(&self) -> SearchStats {
        self.lock_history().stats()
    }

    async fn fetch(&self, code: PostalCode) -> Result<LookupOutcome> {
        let url = format!("{}/cep", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("cep", code.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(code = %code, "lookup request failed: {}", e);
                LabError::from(e)
            })?;

        let status = response.status().as_u16();
        self.lock_history().record(code.clone(), status, Utc::now());

        match classify(status) {
            LookupStatus::Found => {
                let raw: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| LabError::remote(format!("undecodable payload: {}", e)))?;
                let payload = AddressPayload::from_raw(raw);
                info!(code = %code, address = %payload.address.summary(), "postal code found");
                Ok(LookupOutcome::Found(Box::new(payload)))
            }
            LookupStatus::NotFound => {
                info!(code = %code, "postal code not found");
                Ok(LookupOutcome::NotFound(code))
            }
            LookupStatus::Unauthorized => {
                warn!("lookup rejected the configured token");
                Err(LabError::unauthorized("lookup service rejected the token"))
            }
            LookupStatus::RateLimited => {
                warn!(code = %code, "lookup rate limit reached");
                Err(LabError::transient(format!("status {} for {}", status, code)))
            }
            LookupStatus::OtherError => Err(LabError::remote(format!("status {} for {}", status, code))),
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, SearchHistory> {
        // Appends cannot leave the history half-written, so a poisoned lock is still usable.
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
