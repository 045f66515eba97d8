//! Heuristic rule evaluation.
//!
//! Additive rule table over request headers and the optional client
//! fingerprint. Each matching rule contributes a fixed delta and a reason
//! tag; the final score is clamped to [0, 1]. Evaluation is deterministic
//! and total: absent signals simply contribute nothing.

use crate::context::RequestContext;
use crate::fingerprint::ClientFingerprint;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Headless/bot/tool keywords checked against the request User-Agent.
static BOT_UA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HeadlessChrome|PhantomJS|Puppeteer|Playwright|node\.js|curl|wget|bot|spider")
        .expect("bot UA pattern is valid")
});

/// Automation keywords checked against the fingerprint-reported User-Agent.
static HEADLESS_FP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HeadlessChrome|Puppeteer|Playwright").expect("headless pattern is valid")
});

/// Headers real browsers send on navigation requests.
const REQUIRED_HEADERS: [&str; 3] = ["user-agent", "accept", "accept-language"];

/// Heuristic suspicion score with the rules that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeuristicResult {
    /// Suspicion score in [0, 1]; 0 = likely human, 1 = likely bot
    pub score: f64,
    /// Tags of the rules that fired, in evaluation order
    pub reasons: Vec<String>,
}

impl HeuristicResult {
    /// Raise the score to at least `floor`, clamped to [0, 1], recording a
    /// reason. Never lowers an already-higher score.
    pub fn escalate(&mut self, floor: f64, reason: impl Into<String>) {
        self.reasons.push(reason.into());
        self.score = self.score.max(floor).min(1.0);
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEvaluator;

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the rule table against a request and optional fingerprint.
    pub fn evaluate(
        &self,
        request: &RequestContext,
        fingerprint: Option<&ClientFingerprint>,
    ) -> HeuristicResult {
        let mut score = 0.0f64;
        let mut reasons = Vec::new();

        for header in REQUIRED_HEADERS {
            if request.header(header).is_none() {
                reasons.push(format!("missing:{header}"));
                score += 0.1;
            }
        }

        let ua = request.user_agent().unwrap_or("");
        if BOT_UA_PATTERN.is_match(ua) {
            reasons.push("ua:headless_or_bot_keyword".to_string());
            score += 0.4;
        }

        if request.header("sec-ch-ua").is_none() {
            reasons.push("missing:sec-ch-ua".to_string());
            score += 0.05;
        }

        if let Some(fp) = fingerprint {
            if !fp.js_enabled {
                reasons.push("js:not_executed".to_string());
                score += 0.5;
            }

            let moves = fp.interactions.mouse_moves;
            let keys = fp.interactions.key_presses;
            let time = fp.interactions.time_on_page_ms.unwrap_or(0.0);
            if time > 1500.0 && moves == 0.0 && keys == 0.0 {
                reasons.push("no_interaction".to_string());
                score += 0.2;
            }

            if HEADLESS_FP_PATTERN.is_match(&fp.user_agent) {
                reasons.push("fp:headless_ua".to_string());
                score += 0.3;
            }
        }

        HeuristicResult {
            score: score.clamp(0.0, 1.0),
            reasons,
        }
    }
}
