use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::Client;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::errors::{CredentialError, Error};
use crate::telemetry::refresh::{RefreshOutcome, RefreshTelemetry};

use super::{ClientCredentials, Clock, Credential, RefreshPolicy, SystemClock};

/// Holds the current bearer token and refreshes it against the issuer.
///
/// Readers share the lock while the token is fresh. A refresh takes the
/// exclusive lock for the whole round trip to the token endpoint, so callers
/// that observe a stale token at the same moment queue behind a single
/// request and then reuse its result. Dropping a pending refresh releases the
/// lock and leaves the previous credential in place.
pub struct CredentialCache {
    issuer: ClientCredentials,
    http: Client,
    policy: RefreshPolicy,
    clock: Arc<dyn Clock>,
    state: RwLock<Credential>,
}

impl CredentialCache {
    pub fn new(issuer: ClientCredentials, http: Client, policy: RefreshPolicy) -> Self {
        Self {
            issuer,
            http,
            policy,
            clock: Arc::new(SystemClock),
            state: RwLock::new(Credential::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer(&self) -> &ClientCredentials {
        &self.issuer
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Returns a token that is valid for at least the refresh buffer,
    /// contacting the issuer only when the cached one is stale.
    pub async fn get_token(&self) -> Result<String, Error> {
        {
            let credential = self.state.read().await;
            if self.is_fresh(&credential) {
                return Ok(credential.token().to_string());
            }
        }

        let credential = self.refresh(false).await?;
        Ok(credential.token().to_string())
    }

    /// Unconditionally exchanges the client credentials for a new token.
    pub async fn obtain_token(&self) -> Result<(), Error> {
        self.refresh(true).await.map(|_| ())
    }

    pub async fn is_valid(&self) -> bool {
        let credential = self.state.read().await;
        self.is_fresh(&credential)
    }

    /// Time until the real expiry of the cached token.
    pub async fn remaining_time(&self) -> Duration {
        self.state.read().await.remaining(self.clock.now())
    }

    pub async fn expires_at(&self) -> Option<SystemTime> {
        self.state.read().await.expires_at()
    }

    /// Copy of the cached credential together with its current validity.
    pub async fn token_info(&self) -> (Credential, bool) {
        let credential = self.state.read().await;
        (credential.clone(), self.is_fresh(&credential))
    }

    /// Forgets the cached token; the next `get_token` goes to the issuer.
    pub async fn clear(&self) {
        *self.state.write().await = Credential::default();
    }

    fn is_fresh(&self, credential: &Credential) -> bool {
        credential.is_fresh(self.clock.now(), self.policy.refresh_buffer)
    }

    async fn refresh(&self, force: bool) -> Result<RwLockReadGuard<'_, Credential>, Error> {
        let mut credential = self.state.write().await;

        // Callers queued behind another refresh find its result here.
        if !force && self.is_fresh(&credential) {
            let telemetry = RefreshTelemetry::new(self.issuer.token_url());
            let now = self.clock.now();
            telemetry.emit_success(RefreshOutcome::AlreadyFresh, credential.remaining(now), now);
            return Ok(RwLockWriteGuard::downgrade(credential));
        }

        let telemetry = RefreshTelemetry::new(self.issuer.token_url());
        telemetry.emit_start(self.clock.now());
        let response = match self.issuer.exchange(&self.http).await {
            Ok(response) => response,
            Err(err) => {
                telemetry.emit_failure(&err, self.clock.now());
                return Err(err.into());
            }
        };

        let expires_in = Duration::from_secs(response.expires_in);
        let issued_at = self.clock.now();
        let Some(issued) = Credential::issued(response.access_token, issued_at, expires_in) else {
            let err = CredentialError::InvalidExpiresIn(response.expires_in);
            telemetry.emit_failure(&err, issued_at);
            return Err(err.into());
        };
        if expires_in <= self.policy.refresh_buffer {
            warn!(
                expires_in_secs = expires_in.as_secs(),
                refresh_buffer_secs = self.policy.refresh_buffer.as_secs(),
                "issued token is shorter-lived than the refresh buffer; every call will refresh"
            );
        }
        *credential = issued;
        debug!(client_id = %self.issuer.client_id(), "stored refreshed token");
        telemetry.emit_success(RefreshOutcome::Refreshed, expires_in, issued_at);

        Ok(RwLockWriteGuard::downgrade(credential))
    }
}
