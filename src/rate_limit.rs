use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Window shared by the relay endpoint and the admin login.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Idle keys are pruned once the table grows past this.
const MAX_TRACKED_KEYS: usize = 4096;

/// In-memory sliding-window limiter keyed by `bucket:ip_hash`.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt and return true if it is still under `max_attempts`
    /// within `window`. Rejected attempts are not recorded.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    pub fn remaining(&self, key: &str, max_attempts: u64, window: Duration) -> u64 {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        max_attempts.saturating_sub(attempts.len() as u64)
    }

    /// Drop keys with no attempts younger than `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        map.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Check and record one attempt for `key` within [`WINDOW`].
pub fn admit(limiter: &RateLimiter, key: &str, max_attempts: u64) -> bool {
    if limiter.tracked_keys() > MAX_TRACKED_KEYS {
        limiter.cleanup(WINDOW);
    }
    limiter.check_and_record(key, max_attempts, WINDOW)
}

/// Limiter key for a client. Addresses are hashed so raw IPs never sit in
/// memory; requests without a known peer share one bucket.
pub fn client_key(bucket: &str, ip: Option<std::net::IpAddr>) -> String {
    let raw = ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{}:{}", bucket, hex::encode(hasher.finalize()))
}
