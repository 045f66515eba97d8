//! Concurrent session store with TTL eviction.
//!
//! Sessions correlate repeated requests from the same client via a
//! cookie-carried id. Records are evicted lazily on read and proactively by
//! a periodic cleanup task owned by the store.

use crate::heuristics::HeuristicResult;
use crate::ml::MlScore;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::debug;

/// Interval ceiling for the periodic cleanup sweep.
const MAX_CLEANUP_INTERVAL_MS: u64 = 60_000;

/// Per-session record. Owned exclusively by the store and mutated only
/// through [`SessionStore::upsert`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stable id for the lifetime of the session cookie
    pub id: String,
    /// Last observed client IP
    pub ip: String,
    /// Last observed user-agent string
    pub ua: String,
    /// Creation time, epoch milliseconds
    pub created_at: u64,
    /// Last activity time, epoch milliseconds
    pub last_seen: u64,
    /// Requests observed for this id; +1 per upsert
    pub request_count: u64,
    /// Latest heuristic classification
    pub heuristic: Option<HeuristicResult>,
    /// Latest ML classification
    pub ml: Option<MlScore>,
}

/// Concurrent, TTL-evicting map from session id to session record.
pub struct SessionStore {
    sessions: DashMap<String, SessionRecord>,
    ttl_ms: u64,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl SessionStore {
    /// Create a store with the given idle TTL.
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_ms,
        }
    }

    /// The configured idle TTL in milliseconds.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Number of live entries (including not-yet-swept expired ones).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Get a session if it exists and is within TTL; evicts it otherwise.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.get_at(id, now_ms())
    }

    fn get_at(&self, id: &str, now: u64) -> Option<SessionRecord> {
        let expired = match self.sessions.get(id) {
            Some(record) => {
                if now.saturating_sub(record.last_seen) <= self.ttl_ms {
                    return Some(record.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.sessions.remove(id);
        }
        None
    }

    /// Merge the latest observation into the session for `id`, creating it
    /// if absent or expired. `request_count` advances by exactly 1;
    /// `created_at` is never reset for a live session.
    pub fn upsert(
        &self,
        id: &str,
        ip: &str,
        ua: &str,
        heuristic: Option<HeuristicResult>,
        ml: Option<MlScore>,
    ) -> SessionRecord {
        self.upsert_at(id, ip, ua, heuristic, ml, now_ms())
    }

    fn upsert_at(
        &self,
        id: &str,
        ip: &str,
        ua: &str,
        heuristic: Option<HeuristicResult>,
        ml: Option<MlScore>,
        now: u64,
    ) -> SessionRecord {
        let mut entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            SessionRecord {
                id: id.to_string(),
                ip: String::new(),
                ua: String::new(),
                created_at: now,
                last_seen: now,
                request_count: 0,
                heuristic: None,
                ml: None,
            }
        });

        // An expired record that was never swept starts over
        if now.saturating_sub(entry.last_seen) > self.ttl_ms {
            entry.created_at = now;
            entry.request_count = 0;
        }

        entry.ip = ip.to_string();
        entry.ua = ua.to_string();
        entry.heuristic = heuristic;
        entry.ml = ml;
        entry.last_seen = now;
        entry.request_count += 1;
        entry.clone()
    }

    /// Sweep all entries and evict those past TTL.
    pub fn cleanup(&self) {
        self.cleanup_at(now_ms());
    }

    fn cleanup_at(&self, now: u64) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, record| now.saturating_sub(record.last_seen) <= self.ttl_ms);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "Session sweep complete");
        }
    }

    /// Spawn the recurring cleanup task at `min(ttl, 60s)` intervals.
    ///
    /// The returned handle stops the task when dropped or via
    /// [`CleanupTask::stop`]; the store itself outlives the task.
    pub fn spawn_cleanup(self: &Arc<Self>) -> CleanupTask {
        let store = Arc::clone(self);
        let interval_ms = self.ttl_ms.min(MAX_CLEANUP_INTERVAL_MS).max(1);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            // The first tick fires immediately; skip it so a fresh store
            // is not swept before it has served a request.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.cleanup();
            }
        });
        CleanupTask { handle }
    }
}

/// Scoped handle for the background cleanup task.
pub struct CleanupTask {
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Stop the cleanup task.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
