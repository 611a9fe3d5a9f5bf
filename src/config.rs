//! Client configuration and its loaders.
//!
//! The transport core only ever receives a built `Config`; reading files or
//! the environment happens here, at construction time.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::token::DEFAULT_REFRESH_BUFFER;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub token_issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Headers added to every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub refresh_buffer_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Config {
    pub fn new(
        base_url: impl Into<String>,
        token_issuer_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_issuer_url: token_issuer_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            headers: BTreeMap::new(),
            refresh_buffer_secs: None,
            request_timeout_ms: None,
            user_agent: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Stored in whole seconds, rounded up so a sub-second buffer is not
    /// mistaken for "unset".
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        let secs = buffer
            .as_secs()
            .saturating_add(u64::from(buffer.subsec_nanos() > 0));
        self.refresh_buffer_secs = Some(secs);
        self
    }

    /// Stored in milliseconds, rounded up.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_millis() + u128::from(timeout.subsec_nanos() % 1_000_000 > 0);
        self.request_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reads `CLOUD_API_BASE_URL`, `CLOUD_API_TOKEN_URL`, `CLOUD_API_CLIENT_ID`,
    /// `CLOUD_API_CLIENT_SECRET` and, optionally, `CLOUD_API_REFRESH_BUFFER_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::new(
            required_env("CLOUD_API_BASE_URL")?,
            required_env("CLOUD_API_TOKEN_URL")?,
            required_env("CLOUD_API_CLIENT_ID")?,
            required_env("CLOUD_API_CLIENT_SECRET")?,
        );
        if let Ok(raw) = std::env::var("CLOUD_API_REFRESH_BUFFER_SECS") {
            let secs = raw.parse().map_err(|e| {
                Error::Config(format!("Invalid CLOUD_API_REFRESH_BUFFER_SECS '{raw}': {e}"))
            })?;
            config.refresh_buffer_secs = Some(secs);
        }
        Ok(config)
    }

    /// Checks required fields, URL syntax and the request timeout.
    pub fn validate(&self) -> Result<(), Error> {
        require(&self.base_url, "base_url")?;
        require(&self.token_issuer_url, "token_issuer_url")?;
        require(&self.client_id, "client_id")?;
        require(&self.client_secret, "client_secret")?;
        if self.request_timeout_ms == Some(0) {
            return Err(Error::Config("request_timeout_ms must be greater than zero".into()));
        }
        for (field, value) in [
            ("base_url", &self.base_url),
            ("token_issuer_url", &self.token_issuer_url),
        ] {
            reqwest::Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {field} '{value}': {e}")))?;
        }
        Ok(())
    }

    /// Configured refresh buffer; unset or zero means the 5-minute default.
    pub fn refresh_buffer(&self) -> Duration {
        match self.refresh_buffer_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_REFRESH_BUFFER,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("token_issuer_url", &self.token_issuer_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("headers", &self.headers)
            .field("refresh_buffer_secs", &self.refresh_buffer_secs)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("Missing {name} env var")))
}

fn require(value: &str, field: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{field} is required")));
    }
    Ok(())
}
