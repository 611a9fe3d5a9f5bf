//! Authenticated HTTP transport for a cloud provider REST API.
//!
//! Resource clients build a path and body, then go through
//! [`RequestDispatcher`]: it obtains a bearer token from the
//! [`CredentialCache`], runs the [`InterceptorChain`], performs the call, and
//! [`Response`] classifies what came back.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod telemetry;
pub mod token;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::Config;
pub use dispatcher::RequestDispatcher;
pub use errors::{BoxError, CredentialError, Error};
pub use interceptor::{Interceptable, Interceptor, InterceptorChain, SharedInterceptor};
pub use request::{InterceptContext, OutboundRequest};
pub use response::{ProblemDetails, Response};
pub use token::{CredentialCache, RefreshPolicy};
