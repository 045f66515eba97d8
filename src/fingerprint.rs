//! Client fingerprint types and header decoding.
//!
//! The fingerprint is produced by an in-browser collector and delivered as
//! base64-encoded JSON, either in a request header or as a POSTed telemetry
//! body. It is untrusted input: every group is optional and decode failures
//! degrade to "no fingerprint".

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Client-reported browser/device signals and interaction counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientFingerprint {
    /// User agent as seen by the client runtime
    pub user_agent: String,
    /// Preferred languages, most specific first
    pub languages: Vec<String>,
    /// IANA timezone name, if resolvable
    pub timezone: Option<String>,
    /// Screen geometry
    pub screen: Option<ScreenInfo>,
    /// Device pixel ratio
    pub device_pixel_ratio: Option<f64>,
    /// WebGL vendor/renderer strings
    pub webgl: Option<WebGlInfo>,
    /// Canvas rendering hash
    pub canvas_hash: Option<String>,
    /// Whether JavaScript executed on the client
    pub js_enabled: bool,
    /// Interaction counters collected on the page
    pub interactions: Interactions,
    /// Collection timestamps
    pub timestamps: Option<Timestamps>,
}

/// Screen geometry reported by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenInfo {
    pub width: f64,
    pub height: f64,
    pub color_depth: Option<u32>,
}

/// WebGL vendor/renderer strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebGlInfo {
    pub vendor: Option<String>,
    pub renderer: Option<String>,
}

/// Interaction counters collected on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interactions {
    pub mouse_moves: f64,
    pub key_presses: f64,
    pub touch_events: f64,
    /// Average mouse speed in pixels per event
    pub avg_mouse_speed: Option<f64>,
    pub time_on_page_ms: Option<f64>,
}

/// Collection start and emit times, epoch milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timestamps {
    pub start: u64,
    pub now: u64,
}

/// Decode a fingerprint header value: base64 → UTF-8 JSON → fingerprint.
///
/// Any failure along the way yields `None`; a malformed header must never
/// fail the request it rides on.
pub fn decode_fingerprint_header(value: &str) -> Option<ClientFingerprint> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}
