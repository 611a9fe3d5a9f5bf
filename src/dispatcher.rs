use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::errors::Error;
use crate::interceptor::InterceptorChain;
use crate::request::{InterceptContext, OutboundRequest};
use crate::response::Response;
use crate::token::CredentialCache;

/// Sends authenticated requests to the API.
///
/// Every call obtains a token, runs the interceptor chain, and only then
/// touches the network. Nothing is retried.
pub struct RequestDispatcher {
    base_url: String,
    http: Client,
    credentials: Arc<CredentialCache>,
    chain: InterceptorChain,
    timeout: Option<Duration>,
}

impl RequestDispatcher {
    pub fn new(
        base_url: impl Into<String>,
        http: Client,
        credentials: Arc<CredentialCache>,
        chain: InterceptorChain,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            credentials,
            chain,
            timeout: None,
        }
    }

    /// Per-request deadline, applied on top of the client's own settings.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Builds a request from its parts and sends it. A present body is sent
    /// as `application/json` unless `headers` says otherwise.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        query_params: &BTreeMap<String, String>,
        headers: &BTreeMap<String, String>,
    ) -> Result<reqwest::Response, Error> {
        let mut request = OutboundRequest::new(method, path);
        request.query.extend(query_params.clone());
        if let Some(body) = body {
            request.set_header(CONTENT_TYPE.as_str(), "application/json")?;
            request.body = Some(body);
        }
        for (name, value) in headers {
            request.set_header(name, value)?;
        }
        self.send(request).await
    }

    /// Sends a prepared request and returns the raw response. The body has
    /// not been read; it is released when the response is dropped.
    pub async fn send(&self, mut request: OutboundRequest) -> Result<reqwest::Response, Error> {
        let token = self.credentials.get_token().await?;
        let ctx = InterceptContext::new().with_token(token);

        if let Err(err) = self.chain.intercept(&ctx, Some(&mut request)) {
            error!(request_id = %ctx.request_id(), error = %err, "failed to prepare request");
            return Err(err);
        }

        let url = self.url_for(&request)?;
        debug!(
            request_id = %ctx.request_id(),
            method = %request.method,
            url = %url,
            headers = ?redacted(&request.headers),
            "dispatching request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|err| {
            error!(request_id = %ctx.request_id(), error = %err, "request failed");
            Error::Transport(err)
        })?;
        debug!(
            request_id = %ctx.request_id(),
            status = %resp.status(),
            "received response"
        );
        Ok(resp)
    }

    /// Sends `request` and parses the response into `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<Response<T>, Error> {
        let raw = self.send(request).await?;
        Response::parse(raw).await
    }

    /// Serializes `body` as JSON, sends it, and parses the response into `T`.
    pub async fn call_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Response<T>, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body).map_err(Error::Encode)?;
        let request = OutboundRequest::new(method, path)
            .with_header(CONTENT_TYPE.as_str(), "application/json")?
            .with_body(body);
        self.call(request).await
    }

    fn url_for(&self, request: &OutboundRequest) -> Result<Url, Error> {
        let raw = format!("{}{}", self.base_url, request.path);
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::InvalidRequest(format!("invalid request url '{raw}': {e}")))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn redacted(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                "Bearer [REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
