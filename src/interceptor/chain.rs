use tracing::trace;

use crate::errors::Error;
use crate::request::{InterceptContext, OutboundRequest};

use super::{Interceptable, SharedInterceptor};

/// Append-only list of interceptors executed strictly in bind order.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<SharedInterceptor>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from an initial batch, with the same all-or-nothing
    /// validation as `bind`.
    pub fn with_interceptors<I>(interceptors: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Option<SharedInterceptor>>,
    {
        let mut chain = Self::new();
        chain.bind(interceptors)?;
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Runs every interceptor against `request`, stopping at the first
    /// failure. A missing request is rejected before any interceptor runs.
    pub fn intercept(
        &self,
        ctx: &InterceptContext,
        request: Option<&mut OutboundRequest>,
    ) -> Result<(), Error> {
        let Some(request) = request else {
            return Err(Error::InvalidRequest(
                "a missing request cannot be intercepted".into(),
            ));
        };

        for (step, interceptor) in self.interceptors.iter().enumerate() {
            trace!(step, name = interceptor.name(), "intercept");
            interceptor
                .intercept(ctx, request)
                .map_err(|source| Error::Interceptor {
                    step,
                    name: interceptor.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Interceptable for InterceptorChain {
    fn bind<I>(&mut self, interceptors: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Option<SharedInterceptor>>,
    {
        let mut batch = Vec::new();
        for (position, interceptor) in interceptors.into_iter().enumerate() {
            match interceptor {
                Some(interceptor) => batch.push(interceptor),
                None => {
                    return Err(Error::InvalidInterceptor(format!(
                        "entry {position} is missing; nothing was bound"
                    )));
                }
            }
        }
        self.interceptors.extend(batch);
        Ok(())
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
