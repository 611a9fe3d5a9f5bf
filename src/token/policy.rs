use std::time::Duration;

use rand::Rng;

/// Default margin before real expiry at which a token is considered stale.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Business rules governing proactive refresh behaviour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// A token is treated as expired this long before its real expiry.
    pub refresh_buffer: Duration,
}

impl RefreshPolicy {
    /// A buffer larger than the token lifetime is accepted as-is; such tokens
    /// are stale as soon as they are issued.
    pub fn new(refresh_buffer: Duration) -> Self {
        Self { refresh_buffer }
    }

    /// Adds a random drift of `1..=max_drift_secs` seconds to the buffer so
    /// that many processes sharing one client id do not refresh in lockstep.
    pub fn with_random_drift(self, max_drift_secs: u32) -> Self {
        if max_drift_secs == 0 {
            return self;
        }
        let drift = rand::thread_rng().gen_range(1..=max_drift_secs as u64);
        Self {
            refresh_buffer: self.refresh_buffer.saturating_add(Duration::from_secs(drift)),
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_BUFFER)
    }
}
