use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use refharvest_core::RetrySettings;

use crate::error::{HarvestError, Result};

/// Upstream error bodies are cut to this many characters.
const BODY_EXCERPT_CHARS: usize = 200;

// ─── Transport ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whole seconds requested by `Retry-After`, or the Zotero `Backoff` header.
    pub fn retry_hint(&self) -> Option<u64> {
        let raw = self
            .headers
            .get(RETRY_AFTER)
            .or_else(|| self.headers.get("backoff"))?
            .to_str()
            .ok()?
            .trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok()
    }
}

/// One HTTP GET, no retries. Network-level failures are reported as
/// [`HarvestError::Network`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse> {
        (**self).get(url, headers).await
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| HarvestError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| HarvestError::Network(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ─── Sleeper ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        sleep(duration).await
    }
}

// ─── RetryPolicy ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub fallback_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fallback_step: Duration::from_secs(2),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            fallback_step: Duration::from_secs(settings.fallback_step_secs),
        }
    }
}

impl RetryPolicy {
    /// Rate limiting and server-side faults.
    pub fn is_retriable_status(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    /// Delay used when upstream gives no hint: `attempt × step`.
    pub fn fallback_delay(&self, attempt: u32) -> Duration {
        self.fallback_step * attempt
    }
}

// ─── RetryingClient ───────────────────────────────────────────────────────────

pub struct RetryingClient {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(transport: impl Transport + 'static, policy: RetryPolicy) -> Self {
        Self {
            transport: Box::new(transport),
            sleeper: Box::new(TokioSleeper),
            policy,
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// GET `url`, retrying transient failures up to the policy's attempt bound.
    ///
    /// `endpoint` names the call in logs and errors.
    pub async fn get_text(&self, endpoint: &str, url: &str, headers: &HeaderMap) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(endpoint, attempt, url, "GET");

            let outcome = match self.transport.get(url, headers).await {
                Ok(resp) => classify(endpoint, resp),
                Err(e) => Err(e),
            };
            let failure = match outcome {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            if attempt >= max_attempts {
                return Err(exhausted(endpoint, attempt, failure));
            }

            let delay = match &failure {
                HarvestError::Transient {
                    retry_after: Some(secs),
                    ..
                } => Duration::from_secs(*secs),
                _ => self.policy.fallback_delay(attempt),
            };
            warn!(
                endpoint,
                attempt,
                delay_secs = delay.as_secs(),
                error = %failure,
                "transient failure, backing off"
            );
            self.sleeper.sleep(delay).await;
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<T> {
        let text = self.get_text(endpoint, url, headers).await?;
        serde_json::from_str(&text)
            .map_err(|e| HarvestError::Parse(format!("invalid JSON from {endpoint}: {e}")))
    }
}

fn classify(endpoint: &str, resp: HttpResponse) -> Result<String> {
    if resp.is_success() {
        return Ok(resp.body);
    }
    if RetryPolicy::is_retriable_status(resp.status) {
        return Err(HarvestError::Transient {
            endpoint: endpoint.to_string(),
            status: resp.status,
            retry_after: resp.retry_hint(),
            body: excerpt(&resp.body),
        });
    }
    Err(HarvestError::Api {
        endpoint: endpoint.to_string(),
        status: resp.status,
        body: excerpt(&resp.body),
    })
}

fn exhausted(endpoint: &str, attempts: u32, last: HarvestError) -> HarvestError {
    match last {
        HarvestError::Transient { status, body, .. } => HarvestError::RetriesExhausted {
            endpoint: endpoint.to_string(),
            attempts,
            status,
            body,
        },
        HarvestError::Network(message) => HarvestError::Unreachable {
            endpoint: endpoint.to_string(),
            attempts,
            message,
        },
        other => other,
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
