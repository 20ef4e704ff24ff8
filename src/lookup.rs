//! ISP lookup over HTTP.
//!
//! One `GET {base_url}{address}` per address, strictly one at a time. The
//! answer is always a string: either the provider name or a fixed message that
//! stands in for it. Transport failures and non-200 statuses produce the same
//! message, so callers cannot (and need not) tell them apart.
//!
//! Expected body: `{"status": "success" | <other>, "isp": "<name>"}`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::LookupConfig;
use crate::errors::{IspCheckError, Result};
use crate::throttle::{Pacer, RateLimitPolicy, TokioPacer};

/// Text reported for non-200 responses and connection failures alike.
pub const CONNECTION_PROBLEM: &str = "Some problems with connection to IP determining service";

/// Why a lookup produced no provider name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The service answered but has no record for the address.
    NoInformation { address: String },
    /// No response, or a status other than 200.
    Connection,
    /// A 200 response whose body does not fit the expected schema.
    MalformedResponse { address: String, reason: String },
}

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupFailure::NoInformation { address } => write!(
                f,
                "No information about ISP for IP: {address} in remote service database."
            ),
            LookupFailure::Connection => f.write_str(CONNECTION_PROBLEM),
            LookupFailure::MalformedResponse { address, .. } => write!(
                f,
                "Unexpected response from IP determining service for IP: {address}"
            ),
        }
    }
}

/// Provider name or the reason there is none.
pub type IspVerdict = std::result::Result<String, LookupFailure>;

/// Response body schema.
#[derive(Debug, Deserialize)]
struct IspResponse {
    status: String,
    #[serde(default)]
    isp: Option<String>,
}

/// Anything that can turn an address into provider text.
#[async_trait]
pub trait IspResolver: Send + Sync {
    /// Never fails: failures come back as their message.
    async fn resolve_isp(&self, address: &str) -> String;
}

/// HTTP client for the lookup service.
pub struct LookupClient {
    http: reqwest::Client,
    base_url: String,
    policy: RateLimitPolicy,
    pacer: Arc<dyn Pacer>,
}

impl LookupClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ispcheck/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| IspCheckError::HttpClient { source })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            policy: RateLimitPolicy::from_config(config),
            pacer: Arc::new(TokioPacer),
        })
    }

    /// Replace the rate-limit wait implementation.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn url_for(&self, address: &str) -> String {
        format!("{}{}", self.base_url, address)
    }

    /// Look up one address.
    ///
    /// If the response says the quota is exhausted, this waits out the
    /// advertised retry-after (plus margin) before returning, so the next call
    /// starts inside a fresh quota window.
    pub async fn lookup(&self, address: &str) -> IspVerdict {
        let url = self.url_for(address);
        debug!(%url, "Requesting ISP information");

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(address, "ISP lookup failed: {e}");
                return Err(LookupFailure::Connection);
            }
        };

        let status = response.status();
        let wait = self.policy.backoff(response.headers());
        let body = response.bytes().await;

        if let Some(wait) = wait {
            info!(
                "Requests limit is reached. Need to wait for {} seconds.",
                wait.as_secs()
            );
            self.pacer.pause(wait).await;
        }

        if status != StatusCode::OK {
            warn!(address, %status, "ISP lookup returned a non-200 status");
            return Err(LookupFailure::Connection);
        }

        match body {
            Ok(bytes) => classify_body(address, &bytes),
            Err(e) => {
                warn!(address, "Failed to read ISP lookup body: {e}");
                Err(LookupFailure::Connection)
            }
        }
    }
}

#[async_trait]
impl IspResolver for LookupClient {
    async fn resolve_isp(&self, address: &str) -> String {
        match self.lookup(address).await {
            Ok(isp) => isp,
            Err(failure) => failure.to_string(),
        }
    }
}

/// Interpret a 200 response body.
pub fn classify_body(address: &str, body: &[u8]) -> IspVerdict {
    let parsed: IspResponse =
        serde_json::from_slice(body).map_err(|e| LookupFailure::MalformedResponse {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    if parsed.status != "success" {
        return Err(LookupFailure::NoInformation {
            address: address.to_string(),
        });
    }

    parsed.isp.ok_or_else(|| LookupFailure::MalformedResponse {
        address: address.to_string(),
        reason: "missing 'isp' field".to_string(),
    })
}
