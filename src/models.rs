//! Data models for the streaming search client.
//!
//! This module contains the core data structures used throughout the
//! application: search sessions, per-site results, category buckets,
//! and the wire shapes of the server-sent event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle state of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No search has been started yet.
    Idle,
    /// A stream is open and events are being consumed.
    Running,
    /// The backend signalled completion.
    Completed,
    /// The user stopped the search.
    Cancelled,
    /// The stream transport failed.
    Errored,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "Idle"),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::Completed => write!(f, "Completed"),
            SessionStatus::Cancelled => write!(f, "Cancelled"),
            SessionStatus::Errored => write!(f, "Errored"),
        }
    }
}

impl SessionStatus {
    /// Returns true once the session has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Errored
        )
    }
}

/// Token identifying one search session.
///
/// Events are tagged with the id of the session they belong to; events
/// carrying a stale id (e.g. delivered after a cancel) are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One run of an enumeration search from start to terminal state.
#[derive(Debug, Clone)]
pub struct SearchSession {
    /// Session identity, minted by the aggregator.
    pub id: SessionId,
    /// The subject identifier being searched.
    pub query: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Total number of sites the backend will probe.
    /// Unknown until the stream emits `search_started`.
    pub total_sites: Option<u64>,
    /// Number of sites probed so far. Non-decreasing while running.
    pub checked: u64,
    /// When the session started, for report metadata.
    pub started_at: DateTime<Utc>,
}

impl SearchSession {
    /// Creates a fresh running session for `query`.
    pub fn new(id: SessionId, query: String) -> Self {
        Self {
            id,
            query,
            status: SessionStatus::Running,
            total_sites: None,
            checked: 0,
            started_at: Utc::now(),
        }
    }

    /// Returns true while the stream is being consumed.
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }
}

/// Summary statistics exposed to the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Sites probed so far.
    pub scanned: u64,
    /// Total sites the backend will probe (0 until known).
    pub total: u64,
    /// Positive matches accumulated so far.
    pub found: u64,
}

/// A positive match on one external site.
///
/// Immutable once appended to its category bucket; identity is its
/// append position within the bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteResult {
    /// Display name of the site that matched.
    pub site_name: String,
    /// Free-form grouping label attached by the backend.
    #[serde(default)]
    pub category: String,
    /// URL of the discovered account page.
    #[serde(default)]
    pub url: String,
    /// HTTP status the probe observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Probe round-trip time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// When the probe ran, as reported by the backend. Kept as the raw
    /// string because backends are inconsistent about timestamp formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<String>,
    /// Arbitrary per-site profile payload. Shape varies by source site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_data: Option<Map<String, Value>>,
}

impl SiteResult {
    /// Returns the profile payload if the backend extracted one with at
    /// least one field.
    pub fn profile_fields(&self) -> Option<&Map<String, Value>> {
        self.profile_data.as_ref().filter(|m| !m.is_empty())
    }

    /// Probe round-trip time in whole milliseconds.
    pub fn response_time_ms(&self) -> u64 {
        self.response_time
            .map(|secs| (secs * 1000.0).round() as u64)
            .unwrap_or(0)
    }
}

/// Ordered collection of results sharing one category label.
///
/// Bucket keys are compared exactly as the backend sent them; labels
/// differing only in case form separate buckets (matching upstream).
#[derive(Debug, Clone, Default)]
pub struct CategoryBucket {
    /// Category label, case preserved for display.
    pub name: String,
    /// Results in arrival order.
    pub results: Vec<SiteResult>,
}

impl CategoryBucket {
    /// Creates an empty bucket for `name`.
    pub fn new(name: String) -> Self {
        Self {
            name,
            results: Vec::new(),
        }
    }

    /// Number of results in the bucket.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true when no result has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// === Wire shapes ===

/// One discrete server-pushed message, before typed decoding.
///
/// Only `event_type` is interpreted up front; `data` is decoded per
/// event type so unknown types can be skipped without an error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

/// Payload of a `search_started` event.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchStartedData {
    pub total_sites: u64,
}

/// Payload of a `site_checking` event.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteCheckingData {
    pub site_name: String,
}

/// Backend progress counters carried piggyback on `site_result` events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub checked: u64,
    pub total: u64,
    pub percentage: f64,
}

/// Payload of a `site_result` event.
///
/// Only events whose `status` is `"found"` produce a [`SiteResult`];
/// everything else is progress bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteResultData {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub result: SiteResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressInfo>,
}

impl SiteResultData {
    /// Status value marking a positive match.
    pub const STATUS_FOUND: &'static str = "found";

    /// Returns true when the probe found an account.
    pub fn is_found(&self) -> bool {
        self.status == Self::STATUS_FOUND
    }
}

// === Snapshots ===

/// Stats section of a serialized snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SnapshotStats {
    #[serde(default)]
    pub scanned: u64,
    #[serde(default)]
    pub total: u64,
}

/// Serialized form of a completed session, used to redisplay past
/// searches without reopening a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The query the session searched for, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub stats: SnapshotStats,
    /// Raw result payloads; entries without `status == "found"` are
    /// skipped on replay.
    #[serde(default)]
    pub results: Vec<SiteResultData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_display_and_terminal() {
        assert_eq!(SessionStatus::Running.to_string(), "Running");
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(SessionStatus::Errored.is_terminal());
    }

    #[test]
    fn test_parse_site_result_event() {
        let data = json!({
            "status": "found",
            "site_name": "GitHub",
            "category": "developer",
            "url": "https://github.com/octocat",
            "status_code": 200,
            "response_time": 0.42,
            "checked_at": "2024-05-01T12:00:00Z",
            "profile_data": { "followers": 100 },
            "progress": { "checked": 10, "total": 50, "percentage": 20.0 }
        });

        let payload: SiteResultData = serde_json::from_value(data).unwrap();
        assert!(payload.is_found());
        assert_eq!(payload.result.site_name, "GitHub");
        assert_eq!(payload.result.status_code, Some(200));
        assert_eq!(payload.result.response_time_ms(), 420);
        assert_eq!(payload.progress.unwrap().checked, 10);
        assert_eq!(
            payload.result.profile_fields().unwrap().get("followers"),
            Some(&json!(100))
        );
    }

    #[test]
    fn test_parse_site_result_minimal() {
        let payload: SiteResultData =
            serde_json::from_value(json!({ "status": "not_found", "site_name": "X" })).unwrap();
        assert!(!payload.is_found());
        assert!(payload.result.profile_fields().is_none());
        assert!(payload.progress.is_none());
        assert_eq!(payload.result.response_time_ms(), 0);
    }

    #[test]
    fn test_empty_profile_data_is_ignored() {
        let result = SiteResult {
            site_name: "X".to_string(),
            category: "social".to_string(),
            url: String::new(),
            status_code: None,
            response_time: None,
            checked_at: None,
            profile_data: Some(Map::new()),
        };
        assert!(result.profile_fields().is_none());
    }

    #[test]
    fn test_parse_snapshot() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "query": "octocat",
            "stats": { "scanned": 50, "total": 50 },
            "results": [
                { "status": "found", "site_name": "GitHub", "category": "developer" },
                { "status": "not_found", "site_name": "Reddit" }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.query.as_deref(), Some("octocat"));
        assert_eq!(snapshot.stats.total, 50);
        assert_eq!(snapshot.results.len(), 2);
        assert_eq!(snapshot.results.iter().filter(|r| r.is_found()).count(), 1);
    }

    #[test]
    fn test_raw_event_unknown_type_still_parses() {
        let event: RawEvent =
            serde_json::from_str(r#"{"event_type": "heartbeat", "data": {}}"#).unwrap();
        assert_eq!(event.event_type, "heartbeat");
    }
}
