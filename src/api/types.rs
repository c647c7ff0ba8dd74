//! Shared types for the API layer.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core_state::CoreState;

/// Requests per sliding minute, per client.
pub const RATE_LIMIT_PER_MINUTE: u32 = 100;
/// Requests per sliding hour, per client.
pub const RATE_LIMIT_PER_HOUR: u32 = 1000;
/// Checks between sweeps of idle clients.
const RATE_CLEANUP_INTERVAL: u32 = 256;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific state.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub api_keys: Arc<ApiKeyRegistry>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>, api_keys: &[String]) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
            api_keys: Arc::new(ApiKeyRegistry::from_plaintext(api_keys)),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Client context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware. `client_id` never contains the key itself.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub client_id: String,
}

// ═══════════════════════════════════════════════════════════
// API keys
// ═══════════════════════════════════════════════════════════

/// Accepted bearer keys, held only as SHA-256 hashes.
#[derive(Debug, Default)]
pub struct ApiKeyRegistry {
    hashes: Vec<[u8; 32]>,
}

impl ApiKeyRegistry {
    pub fn from_plaintext(keys: &[String]) -> Self {
        Self {
            hashes: keys
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(hash_token)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Resolve a presented token to a client id, or `None` if unknown.
    pub fn authenticate(&self, token: &str) -> Option<ClientContext> {
        let presented = hash_token(token);
        self.hashes
            .iter()
            .any(|h| constant_time_eq(h, &presented))
            .then(|| ClientContext {
                client_id: client_id_for(&presented),
            })
    }
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Stable, non-secret identifier: `key:` + first 8 hex digits of the hash.
fn client_id_for(hash: &[u8; 32]) -> String {
    let mut id = String::from("key:");
    for byte in &hash[..4] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random API key (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
    checks_since_cleanup: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT_PER_MINUTE, RATE_LIMIT_PER_HOUR)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
            checks_since_cleanup: 0,
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        self.checks_since_cleanup += 1;
        if self.checks_since_cleanup >= RATE_CLEANUP_INTERVAL {
            self.cleanup();
        }

        let now = Instant::now();
        let entries = self.windows.entry(key.to_string()).or_default();

        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    /// Drop timestamps older than an hour and clients left with none.
    fn cleanup(&mut self) {
        let now = Instant::now();
        for entries in self.windows.values_mut() {
            entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));
        }
        self.windows.retain(|_, entries| !entries.is_empty());
        self.checks_since_cleanup = 0;
    }

    #[cfg(test)]
    pub(crate) fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
