//! Feature extraction and fixed-weight logistic scoring.
//!
//! The scorer is a strategy: callers may swap in any [`Scorer`]
//! implementation with the same `FeatureVector -> MlScore` contract. The
//! default [`LogisticScorer`] carries compile-time constants that must stay
//! byte-for-byte stable for wire compatibility with existing deployments.

use crate::fingerprint::ClientFingerprint;
use serde::{Deserialize, Serialize};

/// Fixed-size numeric feature vector derived from a fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub mouse_moves: f64,
    pub key_presses: f64,
    pub touch_events: f64,
    pub avg_mouse_speed: f64,
    pub screen_width: f64,
    pub screen_height: f64,
    pub device_pixel_ratio: f64,
    /// 1 if a timezone was reported, else 0
    pub timezone_present: f64,
    /// 1 if JavaScript executed, else 0
    pub js_enabled: f64,
}

impl FeatureVector {
    /// Extract features from a fingerprint with explicit defaults: missing
    /// numerics are 0, missing `devicePixelRatio` is 1. Total; never fails.
    pub fn from_fingerprint(fp: &ClientFingerprint) -> Self {
        Self {
            mouse_moves: fp.interactions.mouse_moves,
            key_presses: fp.interactions.key_presses,
            touch_events: fp.interactions.touch_events,
            avg_mouse_speed: fp.interactions.avg_mouse_speed.unwrap_or(0.0),
            screen_width: fp.screen.as_ref().map_or(0.0, |s| s.width),
            screen_height: fp.screen.as_ref().map_or(0.0, |s| s.height),
            device_pixel_ratio: fp.device_pixel_ratio.unwrap_or(1.0),
            timezone_present: if fp.timezone.is_some() { 1.0 } else { 0.0 },
            js_enabled: if fp.js_enabled { 1.0 } else { 0.0 },
        }
    }
}

/// Classification label derived by thresholding the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MlLabel {
    Bot,
    Human,
}

/// Probability and label from the scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MlScore {
    /// Bot probability in [0, 1]
    pub score: f64,
    pub label: MlLabel,
}

/// Prediction strategy over extracted features.
pub trait Scorer: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> MlScore;
}

/// Weights of the default logistic model. Negative weights reward
/// interaction and JS execution; kept identical to deployed values.
const WEIGHT_MOUSE_MOVES: f64 = -0.002;
const WEIGHT_KEY_PRESSES: f64 = -0.01;
const WEIGHT_TOUCH_EVENTS: f64 = -0.02;
const WEIGHT_AVG_MOUSE_SPEED: f64 = 0.0005;
const WEIGHT_SCREEN_WIDTH: f64 = 0.0001;
const WEIGHT_SCREEN_HEIGHT: f64 = 0.0001;
const WEIGHT_DEVICE_PIXEL_RATIO: f64 = 0.05;
const WEIGHT_TIMEZONE_PRESENT: f64 = -0.2;
const WEIGHT_JS_ENABLED: f64 = -0.6;
const BIAS: f64 = 0.2;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Default fixed-weight logistic scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticScorer;

impl Scorer for LogisticScorer {
    fn predict(&self, features: &FeatureVector) -> MlScore {
        let z = BIAS
            + features.mouse_moves * WEIGHT_MOUSE_MOVES
            + features.key_presses * WEIGHT_KEY_PRESSES
            + features.touch_events * WEIGHT_TOUCH_EVENTS
            + features.avg_mouse_speed * WEIGHT_AVG_MOUSE_SPEED
            + features.screen_width * WEIGHT_SCREEN_WIDTH
            + features.screen_height * WEIGHT_SCREEN_HEIGHT
            + features.device_pixel_ratio * WEIGHT_DEVICE_PIXEL_RATIO
            + features.timezone_present * WEIGHT_TIMEZONE_PRESENT
            + features.js_enabled * WEIGHT_JS_ENABLED;

        let score = sigmoid(z).clamp(0.0, 1.0);
        MlScore {
            score,
            label: if score > 0.5 { MlLabel::Bot } else { MlLabel::Human },
        }
    }
}
