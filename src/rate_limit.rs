//! Tiered token-bucket rate limiting.
//!
//! Three tiers wrap the route tree: `global` covers everything, `api` covers
//! `/api/v1`, and `admin` covers `/api/v1/admin`. Buckets refill
//! continuously from elapsed time, not in ticks tied to request arrival.

use std::sync::Mutex;
use std::time::Instant;

use dashmap::DashMap;

use crate::settings::SettingsCache;

pub const TIER_GLOBAL: &str = "global";
pub const TIER_API: &str = "api";
pub const TIER_ADMIN: &str = "admin";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Sustained refill rate in requests per second.
    pub requests_per_second: f64,
    /// Maximum tokens the bucket can hold (instantaneous burst).
    pub burst: f64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Single token bucket. Starts full.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BucketState {
                tokens: config.burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if available; never waits.
    pub fn try_acquire(&self) -> bool {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.tokens =
            (state.tokens + elapsed * self.config.requests_per_second).min(self.config.burst);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Buckets for every tier, keyed by tier name.
pub struct RateLimiter {
    buckets: DashMap<&'static str, TokenBucket>,
}

impl RateLimiter {
    /// Build the tier buckets from settings-cache values, falling back to
    /// the bootstrap defaults when a value has the wrong shape.
    pub fn from_settings(settings: &SettingsCache) -> Self {
        let limiter = Self {
            buckets: DashMap::new(),
        };
        limiter.add_tier(
            TIER_GLOBAL,
            tier_config(settings, "rate.global_rps", "rate.global_burst", 100, 200),
        );
        limiter.add_tier(
            TIER_API,
            tier_config(settings, "rate.api_rps", "rate.api_burst", 50, 100),
        );
        limiter.add_tier(
            TIER_ADMIN,
            tier_config(settings, "rate.admin_rps", "rate.admin_burst", 10, 20),
        );
        limiter
    }

    pub fn add_tier(&self, tier: &'static str, config: RateLimitConfig) {
        self.buckets.insert(tier, TokenBucket::new(config));
    }

    /// Consume one token from the tier's bucket. Unknown tiers pass.
    pub fn try_acquire(&self, tier: &str) -> bool {
        match self.buckets.get(tier) {
            Some(bucket) => bucket.try_acquire(),
            None => true,
        }
    }
}

fn tier_config(
    settings: &SettingsCache,
    rps_key: &str,
    burst_key: &str,
    default_rps: i64,
    default_burst: i64,
) -> RateLimitConfig {
    RateLimitConfig {
        requests_per_second: settings.get_int(rps_key).unwrap_or(default_rps) as f64,
        burst: settings.get_int(burst_key).unwrap_or(default_burst) as f64,
    }
}
