//! Configuration types for the bot detector.

use serde::{Deserialize, Serialize};

/// Main configuration for [`BotDetector`](crate::BotDetector).
///
/// Every field has a default, so `DetectorConfig::default()` (or an empty
/// JSON object) yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Request header carrying the base64-encoded client fingerprint
    pub header_name: String,

    /// Cookie carrying the session id
    pub session_cookie_name: String,

    /// Session idle time-to-live in milliseconds
    pub session_ttl_ms: u64,

    /// Sliding-window rate limit settings
    pub rate_limit: RateLimitConfig,

    /// ML scoring settings
    pub ml: MlConfig,

    /// POST path where the transport should route telemetry bodies
    pub telemetry_path: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            header_name: "x-bot-features".to_string(),
            session_cookie_name: "bd_sid".to_string(),
            session_ttl_ms: 30 * 60 * 1000,
            rate_limit: RateLimitConfig::default(),
            ml: MlConfig::default(),
            telemetry_path: "/_bot/telemetry".to_string(),
        }
    }
}

/// Sliding-window rate limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in milliseconds
    pub window_ms: u64,

    /// Hits per key per window before escalation
    pub max: usize,

    /// Maximum distinct keys tracked before arbitrary eviction.
    ///
    /// The reference behavior is unbounded; this cap guards against key
    /// enumeration via spoofed `x-forwarded-for` values.
    pub max_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max: 120,
            max_keys: 100_000,
        }
    }
}

/// ML scoring settings.
///
/// The prediction strategy itself is supplied via
/// [`BotDetector::with_scorer`](crate::BotDetector::with_scorer), not
/// through configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    /// Run the feature extractor and scorer when a fingerprint is present
    pub enabled: bool,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
