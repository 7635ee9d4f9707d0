//! HTTP client for the FairScale reputation API.
//!
//! A single endpoint matters here: `GET /fairScore?wallet=<address>`,
//! authenticated with a `fairkey` header. Score lookups happen on hot paths
//! (profile creation, cache refresh), so transient failures are retried with
//! back-off before the error reaches the caller.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::FairscaleError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.fairscale.xyz";

/// Retry settings for transient upstream failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
        }
    }
}

/// Response shape of `GET /fairScore`.
///
/// The service omits `fair_score` for wallets it has never scored; callers
/// decide what absence means (profile creation treats it as zero).
#[derive(Debug, Deserialize)]
struct FairScoreResponse {
    #[serde(default)]
    fair_score: Option<i64>,
}

/// Client for the FairScale reputation API.
pub struct FairscaleClient {
    client: Client,
    api_key: String,
    base_url: Url,
    retry: RetryPolicy,
}

impl FairscaleClient {
    /// Creates a new client pointed at the production FairScale API.
    ///
    /// # Errors
    ///
    /// Returns [`FairscaleError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self, FairscaleError> {
        Self::with_base_url(api_key, timeout_secs, retry, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FairscaleError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FairscaleError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        retry: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, FairscaleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tapred/0.1 (social-frontend)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| FairscaleError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            retry,
        })
    }

    /// Fetches the FairScore for a wallet address.
    ///
    /// Returns `None` when the service has no score for the wallet. Transient
    /// failures (timeouts, connection errors, 5xx) are retried per the
    /// configured [`RetryPolicy`] before surfacing.
    ///
    /// # Errors
    ///
    /// - [`FairscaleError::Api`] on a non-success upstream status.
    /// - [`FairscaleError::Http`] on network failure.
    /// - [`FairscaleError::Deserialize`] if the response is not valid JSON of
    ///   the expected shape.
    pub async fn get_fair_score(&self, wallet: &str) -> Result<Option<i64>, FairscaleError> {
        let mut url = self.base_url.join("fairScore").map_err(|e| {
            FairscaleError::InvalidBaseUrl(format!("{}: {e}", self.base_url))
        })?;
        url.query_pairs_mut().append_pair("wallet", wallet);

        let response = retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            self.fetch(url.clone())
        })
        .await?;

        Ok(response.fair_score)
    }

    async fn fetch(&self, url: Url) -> Result<FairScoreResponse, FairscaleError> {
        let response = self
            .client
            .get(url.clone())
            .header("fairkey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "fairscale request failed");
            return Err(FairscaleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FairscaleError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
