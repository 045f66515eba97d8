//! Bot detection pipeline for inbound HTTP requests.
//!
//! Classifies requests as automated ("bot") or human by combining
//! server-observable request metadata with optional client-supplied
//! telemetry, producing a per-request score, a boolean verdict, and a
//! persisted session record.
//!
//! # Components
//!
//! - Heuristic rule evaluation over headers and fingerprint
//! - Fixed-weight logistic scorer over extracted features
//! - Concurrent session store with TTL eviction
//! - Per-key sliding-window rate limiter
//! - Orchestrator combining the above into one verdict per request
//!
//! # Example
//!
//! ```
//! use botscreen::{BotDetector, DetectorConfig, RequestContext};
//!
//! let detector = BotDetector::new(DetectorConfig::default());
//! let request = RequestContext::builder()
//!     .header("user-agent", "curl/8.0")
//!     .remote_addr("203.0.113.9")
//!     .build();
//! let outcome = detector.handle(&request);
//! assert!(outcome.result.heuristic.score > 0.0);
//! ```
//!
//! Transport wiring (cookie parsing, JSON bodies, routing) is the caller's
//! responsibility: adapters translate host-framework requests into
//! [`RequestContext`] and apply the returned [`SessionCookie`] and verdict.

pub mod config;
pub mod context;
pub mod detector;
pub mod fingerprint;
pub mod heuristics;
pub mod ml;
pub mod rate;
pub mod session;

pub use config::{DetectorConfig, MlConfig, RateLimitConfig};
pub use context::RequestContext;
pub use detector::{
    BotDetectionResult, BotDetector, DetectionOutcome, SessionCookie, TelemetryError,
    TelemetryVerdict,
};
pub use fingerprint::ClientFingerprint;
pub use heuristics::{HeuristicEvaluator, HeuristicResult};
pub use ml::{FeatureVector, LogisticScorer, MlLabel, MlScore, Scorer};
pub use rate::RateLimiter;
pub use session::{CleanupTask, SessionRecord, SessionStore};
