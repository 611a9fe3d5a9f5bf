use std::sync::Arc;

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::Config;
use crate::dispatcher::RequestDispatcher;
use crate::errors::Error;
use crate::interceptor::{
    BearerAuth, Interceptable, InterceptorChain, SharedInterceptor, StaticHeaders, UserAgent,
};
use crate::request::OutboundRequest;
use crate::response::Response;
use crate::token::{ClientCredentials, Clock, CredentialCache, RefreshPolicy};

/// Entry point for resource clients: a configured dispatcher with its own
/// credential cache.
pub struct ApiClient {
    config: Config,
    dispatcher: RequestDispatcher,
}

impl ApiClient {
    pub fn builder(config: Config) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Builds the client without contacting the token endpoint; the first
    /// request fetches the token.
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::builder(config).build()
    }

    /// Builds the client and obtains the initial token, so bad credentials
    /// surface here rather than on the first request.
    pub async fn connect(config: Config) -> Result<Self, Error> {
        let client = Self::new(config)?;
        client.credentials().obtain_token().await?;
        info!(
            client_id = %client.config.client_id,
            "initial token acquired"
        );
        Ok(client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        self.dispatcher.credentials()
    }

    pub async fn get_token(&self) -> Result<String, Error> {
        self.credentials().get_token().await
    }

    pub async fn call<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<Response<T>, Error> {
        self.dispatcher.call(request).await
    }

    pub async fn call_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Response<T>, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatcher.call_json(method, path, body).await
    }
}

/// Assembles the chain `[before_auth.., user agent, bearer auth, static
/// headers, after_auth..]` around a credential cache built from `Config`.
pub struct ApiClientBuilder {
    config: Config,
    http: Option<Client>,
    policy: Option<RefreshPolicy>,
    clock: Option<Arc<dyn Clock>>,
    before_auth: Vec<SharedInterceptor>,
    after_auth: Vec<SharedInterceptor>,
}

impl ApiClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            policy: None,
            clock: None,
            before_auth: Vec::new(),
            after_auth: Vec::new(),
        }
    }

    /// HTTP client shared by the token exchange and API calls.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Overrides the policy derived from `Config::refresh_buffer`.
    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn before_auth(mut self, interceptor: SharedInterceptor) -> Self {
        self.before_auth.push(interceptor);
        self
    }

    pub fn after_auth(mut self, interceptor: SharedInterceptor) -> Self {
        self.after_auth.push(interceptor);
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        let config = self.config;
        config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = config.request_timeout() {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?
            }
        };

        let policy = self
            .policy
            .unwrap_or_else(|| RefreshPolicy::new(config.refresh_buffer()));
        let issuer = ClientCredentials::new(
            config.token_issuer_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        let mut cache = CredentialCache::new(issuer, http.clone(), policy);
        if let Some(clock) = self.clock {
            cache = cache.with_clock(clock);
        }

        let user_agent = match &config.user_agent {
            Some(ua) => UserAgent::new(ua.clone()),
            None => UserAgent::default(),
        };
        let user_agent: SharedInterceptor = Arc::new(user_agent);
        let static_headers: SharedInterceptor = Arc::new(StaticHeaders::new(config.headers.clone()));

        let mut chain = InterceptorChain::new();
        chain.bind(self.before_auth.into_iter().map(Some))?;
        chain.bind([Some(user_agent)])?;
        BearerAuth.bind_to(&mut chain)?;
        chain.bind([Some(static_headers)])?;
        chain.bind(self.after_auth.into_iter().map(Some))?;

        let dispatcher = RequestDispatcher::new(config.base_url.clone(), http, Arc::new(cache), chain);
        Ok(ApiClient { config, dispatcher })
    }
}
