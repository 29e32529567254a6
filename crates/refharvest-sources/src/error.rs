use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Retriable upstream condition. Recovered inside the fetcher and never
    /// returned by [`crate::http::RetryingClient`].
    #[error("transient failure from {endpoint}: HTTP {status}")]
    Transient {
        endpoint: String,
        status: u16,
        /// Upstream retry hint in whole seconds.
        retry_after: Option<u64>,
        body: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {endpoint}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} still failing after {attempts} attempts (last: HTTP {status}): {body}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        status: u16,
        body: String,
    },

    #[error("network error calling {endpoint} after {attempts} attempts: {message}")]
    Unreachable {
        endpoint: String,
        attempts: u32,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Core(#[from] refharvest_core::CoreError),
}

impl HarvestError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Network(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Core(refharvest_core::CoreError::ConfigError(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
