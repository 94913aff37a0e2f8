//! Client configuration, resolved once at startup.

use crate::{ClientError, ClientResult};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.as_ref().trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got {base_url:?}"
            )));
        }
        if timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "HTTP timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url: base_url.to_string(),
            timeout,
        })
    }

    /// Builds a config from raw environment values, falling back to defaults when unset.
    pub fn from_env_values(url: Option<String>, timeout_secs: Option<String>) -> ClientResult<Self> {
        let url = url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match timeout_secs.map(|v| v.trim().to_string()) {
            Some(raw) if !raw.is_empty() => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    ClientError::InvalidConfig(format!("HTTP timeout must be whole seconds, got {raw:?}"))
                })?;
                Duration::from_secs(secs)
            }
            _ => DEFAULT_HTTP_TIMEOUT,
        };

        Self::new(url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
