use std::time::{Duration, SystemTime};

/// A bearer token plus the instant it stops being accepted by the issuer.
///
/// An empty token is never valid, whatever its expiry says.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: Option<SystemTime>,
}

impl Credential {
    pub fn new(token: String, expires_at: SystemTime) -> Self {
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Builds a credential from an issuer response received at `issued_at`.
    /// Returns `None` when the expiry is not representable.
    pub fn issued(token: String, issued_at: SystemTime, expires_in: Duration) -> Option<Self> {
        let expires_at = issued_at.checked_add(expires_in)?;
        Some(Self::new(token, expires_at))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// True while `now` is more than `buffer` ahead of the real expiry.
    pub fn is_fresh(&self, now: SystemTime, buffer: Duration) -> bool {
        if self.token.is_empty() {
            return false;
        }
        match self.expires_at {
            // A buffer reaching past the end of time can never be satisfied.
            Some(expires_at) => now
                .checked_add(buffer)
                .is_some_and(|threshold| threshold < expires_at),
            None => false,
        }
    }

    /// Time left before the real expiry, zero once it has passed.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        if self.token.is_empty() {
            return Duration::ZERO;
        }
        self.expires_at
            .and_then(|expires_at| expires_at.duration_since(now).ok())
            .unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &format_args!("[REDACTED; len={}]", self.token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
