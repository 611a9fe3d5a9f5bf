//! Ordered request mutators that run before a request leaves the process.

mod builtin;
mod chain;

use std::sync::Arc;

use crate::errors::{BoxError, Error};
use crate::request::{InterceptContext, OutboundRequest};

pub use builtin::{BearerAuth, REQUEST_ID_HEADER, RequestIdHeader, StaticHeaders, UserAgent};
pub use chain::InterceptorChain;

/// A single request-mutating step.
pub trait Interceptor: Send + Sync {
    /// Label used in logs and in `Error::Interceptor`.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Mutates the request in place. Returning an error aborts the chain and
    /// no HTTP call is made.
    fn intercept(&self, ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError>;
}

pub type SharedInterceptor = Arc<dyn Interceptor>;

/// Components that accept interceptors into their execution chain.
pub trait Interceptable {
    /// Appends `interceptors` in order. A `None` entry rejects the whole
    /// batch and leaves the target unchanged.
    fn bind<I>(&mut self, interceptors: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Option<SharedInterceptor>>;
}

/// Interceptor backed by a closure.
pub struct FnInterceptor<F> {
    name: String,
    f: F,
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&InterceptContext, &mut OutboundRequest) -> Result<(), BoxError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn intercept(&self, ctx: &InterceptContext, request: &mut OutboundRequest) -> Result<(), BoxError> {
        (self.f)(ctx, request)
    }
}

pub fn from_fn<F>(name: impl Into<String>, f: F) -> SharedInterceptor
where
    F: Fn(&InterceptContext, &mut OutboundRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(FnInterceptor {
        name: name.into(),
        f,
    })
}
