use std::collections::BTreeMap;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use crate::errors::Error;

/// A request under construction, before interceptors run and it is handed
/// to the HTTP client. Built fresh for every call.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the dispatcher base URL, e.g. `/projects/p1/vpcs`.
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        self.set_header(name, value)?;
        Ok(self)
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidRequest(format!("invalid value for header '{name}': {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Per-call state shared by every interceptor in the chain.
#[derive(Clone)]
pub struct InterceptContext {
    request_id: Uuid,
    token: Option<String>,
}

impl InterceptContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Bearer token obtained by the dispatcher for this call.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl Default for InterceptContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterceptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptContext")
            .field("request_id", &self.request_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
