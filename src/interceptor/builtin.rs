use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, USER_AGENT};

use crate::errors::{BoxError, Error};
use crate::request::{InterceptContext, OutboundRequest};

use super::{Interceptable, Interceptor, SharedInterceptor};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Sets `Authorization: Bearer <token>` from the token the dispatcher
/// obtained for this call.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerAuth;

impl BearerAuth {
    /// Registers bearer injection with any interceptable component.
    pub fn bind_to<T: Interceptable>(self, target: &mut T) -> Result<(), Error> {
        let interceptor: SharedInterceptor = Arc::new(self);
        target.bind([Some(interceptor)])
    }
}

impl Interceptor for BearerAuth {
    fn name(&self) -> &str {
        "bearer_auth"
    }

    fn intercept(&self, ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError> {
        let token = ctx
            .token()
            .filter(|t| !t.is_empty())
            .ok_or("no bearer token available for request")?;
        request.set_header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))?;
        Ok(())
    }
}

/// Statically configured headers applied to every request, overriding any
/// per-call value of the same name.
#[derive(Clone, Debug, Default)]
pub struct StaticHeaders {
    headers: BTreeMap<String, String>,
}

impl StaticHeaders {
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self { headers }
    }
}

impl Interceptor for StaticHeaders {
    fn name(&self) -> &str {
        "static_headers"
    }

    fn intercept(&self, _ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError> {
        for (name, value) in &self.headers {
            request.set_header(name, value)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct UserAgent(String);

impl UserAgent {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self(user_agent.into())
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self(format!("cloud-transport-rust/{}", env!("CARGO_PKG_VERSION")))
    }
}

impl Interceptor for UserAgent {
    fn name(&self) -> &str {
        "user_agent"
    }

    fn intercept(&self, _ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError> {
        request.set_header(USER_AGENT.as_str(), &self.0)?;
        Ok(())
    }
}

/// Propagates the per-call request id so server-side logs can be correlated.
#[derive(Clone, Debug)]
pub struct RequestIdHeader {
    header: String,
}

impl RequestIdHeader {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl Default for RequestIdHeader {
    fn default() -> Self {
        Self::new(REQUEST_ID_HEADER)
    }
}

impl Interceptor for RequestIdHeader {
    fn name(&self) -> &str {
        "request_id"
    }

    fn intercept(&self, ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError> {
        request.set_header(&self.header, &ctx.request_id().to_string())?;
        Ok(())
    }
}
