//! Detection orchestrator.
//!
//! One [`BotDetector::handle`] call per inbound request: resolves or mints
//! the session id, decodes the optional fingerprint header, runs the
//! heuristic evaluator and the ML scorer, applies rate-limit escalation,
//! upserts the session, and returns the verdict together with any cookie
//! the transport should set.

use crate::config::DetectorConfig;
use crate::context::RequestContext;
use crate::fingerprint::{decode_fingerprint_header, ClientFingerprint};
use crate::heuristics::{HeuristicEvaluator, HeuristicResult};
use crate::ml::{FeatureVector, LogisticScorer, MlScore, Scorer};
use crate::rate::RateLimiter;
use crate::session::{now_ms, CleanupTask, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Scores at or above this are classified as bots.
const BOT_THRESHOLD: f64 = 0.5;

/// Heuristic floor forced when the rate limit is exceeded.
const RATE_ESCALATION_FLOOR: f64 = 0.8;

/// Combined per-request verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotDetectionResult {
    pub is_bot: bool,
    /// `max(heuristic.score, ml.score)` in [0, 1]
    pub score: f64,
    pub heuristic: HeuristicResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml: Option<MlScore>,
    pub session_id: String,
}

/// Session cookie the transport should set on the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub http_only: bool,
    pub same_site: String,
    pub max_age_ms: u64,
}

/// Result of one request pass.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub result: BotDetectionResult,
    /// Present when the inbound request carried no session cookie
    pub set_cookie: Option<SessionCookie>,
}

/// Response body for the telemetry endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryVerdict {
    pub score: f64,
    pub heuristic: HeuristicResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml: Option<MlScore>,
    pub is_bot: bool,
}

/// Telemetry ingestion errors; both map to a 400 at the transport.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Missing body")]
    MissingBody,
    #[error("Invalid body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Per-request bot detection orchestrator.
///
/// Owns the session store and rate limiter; safe to share behind an `Arc`
/// and invoke concurrently.
pub struct BotDetector {
    config: DetectorConfig,
    evaluator: HeuristicEvaluator,
    scorer: Box<dyn Scorer>,
    sessions: Arc<SessionStore>,
    rate_limiter: RateLimiter,
}

impl BotDetector {
    /// Create a detector with the default fixed-weight logistic scorer.
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_scorer(config, Box::new(LogisticScorer))
    }

    /// Create a detector with a custom prediction strategy.
    pub fn with_scorer(config: DetectorConfig, scorer: Box<dyn Scorer>) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl_ms));
        let rate_limiter = RateLimiter::new(&config.rate_limit);
        Self {
            config,
            evaluator: HeuristicEvaluator::new(),
            scorer,
            sessions,
            rate_limiter,
        }
    }

    /// The detector's configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The session store, for direct inspection by callers.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Spawn the periodic session-cleanup task. Requires a tokio runtime;
    /// the task stops when the returned handle is dropped.
    pub fn spawn_session_cleanup(&self) -> CleanupTask {
        self.sessions.spawn_cleanup()
    }

    /// Classify one inbound request.
    pub fn handle(&self, request: &RequestContext) -> DetectionOutcome {
        let cookie_name = &self.config.session_cookie_name;
        let cookie_present = request.cookie(cookie_name).is_some();

        // Cookie value wins; a request header named like the cookie serves
        // cookie-less clients.
        let session_id = request
            .cookie(cookie_name)
            .or_else(|| request.header(cookie_name))
            .map(str::to_string)
            .unwrap_or_else(mint_session_id);

        let fingerprint = request
            .header(&self.config.header_name)
            .and_then(decode_fingerprint_header);

        let mut heuristic = self.evaluator.evaluate(request, fingerprint.as_ref());
        debug!(
            score = heuristic.score,
            reasons = heuristic.reasons.len(),
            "Heuristic evaluation complete"
        );

        let ml = match (&fingerprint, self.config.ml.enabled) {
            (Some(fp), true) => {
                let features = FeatureVector::from_fingerprint(fp);
                let prediction = self.scorer.predict(&features);
                debug!(score = prediction.score, "ML prediction complete");
                Some(prediction)
            }
            _ => None,
        };

        let ip = request.client_ip().to_string();
        let ua = request.user_agent().unwrap_or("").to_string();
        let rate_key = format!("{ip}|{ua}");
        let hits = self.rate_limiter.hit(&rate_key);
        if hits > self.config.rate_limit.max {
            heuristic.escalate(RATE_ESCALATION_FLOOR, "rate:too_many_requests");
            debug!(hits, key = %rate_key, "Rate limit exceeded, heuristic escalated");
        }

        let score = combined_score(&heuristic, ml.as_ref());
        let is_bot = score >= BOT_THRESHOLD;

        let session = self
            .sessions
            .upsert(&session_id, &ip, &ua, Some(heuristic.clone()), ml);

        info!(
            session_id = %session.id,
            ip = %ip,
            score,
            is_bot,
            request_count = session.request_count,
            "Bot detection complete"
        );

        let set_cookie = (!cookie_present).then(|| SessionCookie {
            name: cookie_name.clone(),
            value: session.id.clone(),
            http_only: false,
            same_site: "Lax".to_string(),
            max_age_ms: self.config.session_ttl_ms,
        });

        DetectionOutcome {
            result: BotDetectionResult {
                is_bot,
                score,
                heuristic,
                ml,
                session_id: session.id,
            },
            set_cookie,
        }
    }

    /// Score a POSTed fingerprint independent of the session flow.
    ///
    /// Runs heuristics (with the telemetry request's own headers) and the
    /// scorer only; no rate limiting, no session upsert. A missing body is
    /// a client error rather than a silent default.
    pub fn handle_telemetry(
        &self,
        request: &RequestContext,
        body: Option<&str>,
    ) -> Result<TelemetryVerdict, TelemetryError> {
        let body = body.ok_or(TelemetryError::MissingBody)?;
        let fingerprint: ClientFingerprint = serde_json::from_str(body)?;

        let heuristic = self.evaluator.evaluate(request, Some(&fingerprint));
        let ml = self.config.ml.enabled.then(|| {
            let features = FeatureVector::from_fingerprint(&fingerprint);
            self.scorer.predict(&features)
        });

        let score = combined_score(&heuristic, ml.as_ref());
        Ok(TelemetryVerdict {
            score,
            heuristic,
            ml,
            is_bot: score >= BOT_THRESHOLD,
        })
    }
}

/// Combination law: `max(heuristic, ml or 0)`, clamped to [0, 1].
fn combined_score(heuristic: &HeuristicResult, ml: Option<&MlScore>) -> f64 {
    heuristic
        .score
        .max(ml.map_or(0.0, |m| m.score))
        .clamp(0.0, 1.0)
}

/// Mint a session id from a random component and the current time, so
/// collisions stay negligible even across process restarts.
fn mint_session_id() -> String {
    format!("{:016x}{:x}", rand::random::<u64>(), now_ms())
}
