//! The streamed-search aggregator.
//!
//! Consumes the decoded event stream of one enumeration search,
//! accumulates positive matches into category buckets, and exposes a
//! read model (session, buckets, stats) the view renders incrementally.
//! All session state lives inside the aggregator; there are no globals.

use serde_json::from_value;
use tracing::{debug, trace, warn};

use crate::models::{
    CategoryBucket, RawEvent, SearchSession, SearchStartedData, SearchStats, SessionId,
    SessionStatus, SiteCheckingData, SiteResult, SiteResultData, Snapshot,
};
use crate::search::observer::SearchObserver;

/// Owns the lifecycle and state of enumeration searches.
///
/// At most one session is live at a time. Every stream event is tagged
/// with the [`SessionId`] it was read for; events whose id no longer
/// matches the live session (a trailing wake-up after cancel, or a
/// message from a torn-down stream) are dropped without side effects.
pub struct SearchAggregator<O: SearchObserver> {
    session: Option<SearchSession>,
    buckets: Vec<CategoryBucket>,
    stats: SearchStats,
    current_site: Option<String>,
    next_session_id: u64,
    observer: O,
}

impl<O: SearchObserver> SearchAggregator<O> {
    /// Creates an idle aggregator reporting to `observer`.
    pub fn new(observer: O) -> Self {
        Self {
            session: None,
            buckets: Vec::new(),
            stats: SearchStats::default(),
            current_site: None,
            next_session_id: 0,
            observer,
        }
    }

    // === Lifecycle ===

    /// Starts a new session for `query`.
    ///
    /// No-op returning `None` when a session is already running or the
    /// trimmed query is empty. Otherwise all prior state is discarded
    /// and a fresh running session is created.
    pub fn start(&mut self, query: &str) -> Option<SessionId> {
        if self.session.as_ref().is_some_and(SearchSession::is_running) {
            debug!("Ignoring start: a search is already running");
            return None;
        }

        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring start: empty query");
            return None;
        }

        self.reset();
        let id = self.mint_session_id();
        let session = SearchSession::new(id, query.to_string());
        self.observer.on_started(&session);
        self.session = Some(session);
        Some(id)
    }

    /// Cancels the running session, if any. Idempotent.
    pub fn cancel(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_running() {
            return;
        }
        session.status = SessionStatus::Cancelled;
        self.current_site = None;
        debug!("Session {} cancelled", session.id);
        self.observer.on_cancelled();
    }

    /// Marks the running session as errored after a transport failure.
    /// Terminal; the aggregator performs no retries.
    pub fn fail(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_running() {
            return;
        }
        session.status = SessionStatus::Errored;
        self.current_site = None;
        warn!("Session {} errored: stream transport failed", session.id);
    }

    /// Rehydrates the read model from a previously saved snapshot
    /// without opening a stream. Prior state is discarded; each saved
    /// result with a found status is replayed as if it had arrived on
    /// the stream, then the stats are applied directly.
    pub fn load_completed(&mut self, snapshot: Snapshot) {
        self.reset();

        let id = self.mint_session_id();
        let mut session = SearchSession::new(id, snapshot.query.unwrap_or_default());
        session.total_sites = Some(snapshot.stats.total);
        session.checked = snapshot.stats.scanned;
        self.session = Some(session);

        self.stats.total = snapshot.stats.total;
        self.stats.scanned = snapshot.stats.scanned;

        for payload in snapshot.results {
            if payload.is_found() {
                self.append_result(payload.result);
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.status = SessionStatus::Completed;
        }
    }

    // === Event ingestion ===

    /// Parses and dispatches one raw stream message.
    ///
    /// A message that is not valid JSON is dropped and logged; it never
    /// terminates the session.
    pub fn handle_message(&mut self, id: SessionId, raw: &str) {
        match serde_json::from_str::<RawEvent>(raw) {
            Ok(event) => self.handle_event(id, event),
            Err(e) => warn!("Dropping malformed stream message: {}", e),
        }
    }

    /// Dispatches one decoded event against the live session.
    ///
    /// Events for a stale or missing session are ignored, as are
    /// unknown event types (forward compatibility). A payload that
    /// fails typed decoding drops only that event.
    pub fn handle_event(&mut self, id: SessionId, event: RawEvent) {
        let Some(session) = self.session.as_ref() else {
            trace!("Ignoring event: no session");
            return;
        };
        if session.id != id || !session.is_running() {
            trace!("Ignoring event for stale session {}", id);
            return;
        }

        match event.event_type.as_str() {
            "search_started" => match from_value::<SearchStartedData>(event.data) {
                Ok(data) => self.apply_search_started(data),
                Err(e) => warn!("Dropping malformed search_started payload: {}", e),
            },
            "site_checking" => match from_value::<SiteCheckingData>(event.data) {
                Ok(data) => self.apply_site_checking(data),
                Err(e) => warn!("Dropping malformed site_checking payload: {}", e),
            },
            "site_result" => match from_value::<SiteResultData>(event.data) {
                Ok(data) => self.apply_site_result(data),
                Err(e) => warn!("Dropping malformed site_result payload: {}", e),
            },
            "search_completed" => {
                debug!("Search completed: {}", event.data);
                self.complete();
            }
            other => trace!("Ignoring unknown event type '{}'", other),
        }
    }

    fn apply_search_started(&mut self, data: SearchStartedData) {
        if let Some(session) = self.session.as_mut() {
            session.total_sites = Some(data.total_sites);
        }
        self.stats.total = data.total_sites;
        self.observer.on_progress(&self.stats);
    }

    fn apply_site_checking(&mut self, data: SiteCheckingData) {
        self.observer.on_checking(&data.site_name);
        self.current_site = Some(data.site_name);
    }

    fn apply_site_result(&mut self, data: SiteResultData) {
        if data.is_found() {
            self.append_result(data.result);
        }

        if let Some(progress) = data.progress {
            if let Some(session) = self.session.as_mut() {
                // checked is monotone even if the backend misbehaves
                session.checked = session.checked.max(progress.checked);
                self.stats.scanned = session.checked;
            }
            self.current_site = None;
            self.observer.on_progress(&self.stats);
        }
    }

    fn complete(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.status = SessionStatus::Completed;
        }
        self.current_site = None;
        self.observer.on_completed(&self.stats);
    }

    fn append_result(&mut self, result: SiteResult) {
        // exact-match bucket lookup, case preserved (matches upstream)
        let idx = match self
            .buckets
            .iter()
            .position(|b| b.name == result.category)
        {
            Some(idx) => idx,
            None => {
                self.buckets.push(CategoryBucket::new(result.category.clone()));
                self.observer.on_category_created(&result.category);
                self.buckets.len() - 1
            }
        };

        self.stats.found += 1;
        self.observer.on_result_found(&result);
        self.buckets[idx].results.push(result);
    }

    fn reset(&mut self) {
        self.session = None;
        self.buckets.clear();
        self.stats = SearchStats::default();
        self.current_site = None;
    }

    fn mint_session_id(&mut self) -> SessionId {
        self.next_session_id += 1;
        SessionId(self.next_session_id)
    }

    // === Read model ===

    /// The live or most recent session, if any.
    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    /// Current summary statistics.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Category buckets in first-seen order.
    pub fn buckets(&self) -> &[CategoryBucket] {
        &self.buckets
    }

    /// The site currently being probed, between `site_checking` and the
    /// next progress update.
    pub fn current_site(&self) -> Option<&str> {
        self.current_site.as_deref()
    }

    /// All accumulated results in bucket order.
    pub fn results(&self) -> impl Iterator<Item = &SiteResult> {
        self.buckets.iter().flat_map(|b| b.results.iter())
    }

    /// Borrows the observer, e.g. to finalize its display.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Consumes the aggregator and hands the observer back.
    pub fn into_observer(self) -> O {
        self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Observer recording every notification, for ordering assertions.
    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
    }

    impl SearchObserver for Recording {
        fn on_started(&mut self, session: &SearchSession) {
            self.calls.push(format!("started:{}", session.query));
        }
        fn on_progress(&mut self, stats: &SearchStats) {
            self.calls
                .push(format!("progress:{}/{}", stats.scanned, stats.total));
        }
        fn on_checking(&mut self, site_name: &str) {
            self.calls.push(format!("checking:{}", site_name));
        }
        fn on_result_found(&mut self, result: &SiteResult) {
            self.calls.push(format!("found:{}", result.site_name));
        }
        fn on_category_created(&mut self, category: &str) {
            self.calls.push(format!("category:{}", category));
        }
        fn on_completed(&mut self, _stats: &SearchStats) {
            self.calls.push("completed".to_string());
        }
        fn on_cancelled(&mut self) {
            self.calls.push("cancelled".to_string());
        }
    }

    fn raw(event_type: &str, data: serde_json::Value) -> RawEvent {
        RawEvent {
            event_type: event_type.to_string(),
            data,
        }
    }

    fn found_result(site: &str, category: &str) -> RawEvent {
        raw(
            "site_result",
            json!({
                "status": "found",
                "site_name": site,
                "category": category,
                "url": format!("https://{}.example/u", site.to_lowercase()),
            }),
        )
    }

    #[test]
    fn test_start_trims_and_rejects_empty_query() {
        let mut agg = SearchAggregator::new(());
        assert!(agg.start("").is_none());
        assert!(agg.start("   ").is_none());
        assert!(agg.session().is_none());

        let id = agg.start("  octocat  ").unwrap();
        let session = agg.session().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.query, "octocat");
        assert!(session.is_running());
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();
        agg.handle_event(id, found_result("GitHub", "developer"));

        assert!(agg.start("bob").is_none());
        // session identity, buckets, and stats unchanged
        assert_eq!(agg.session().unwrap().id, id);
        assert_eq!(agg.session().unwrap().query, "alice");
        assert_eq!(agg.stats().found, 1);
        assert_eq!(agg.buckets().len(), 1);
    }

    #[test]
    fn test_found_count_matches_found_events() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        agg.handle_event(id, found_result("GitHub", "developer"));
        agg.handle_event(id, found_result("GitLab", "developer"));
        agg.handle_event(id, found_result("Reddit", "social"));

        assert_eq!(agg.stats().found, 3);
        let bucket_sum: usize = agg.buckets().iter().map(CategoryBucket::len).sum();
        assert_eq!(bucket_sum as u64, agg.stats().found);
        assert_eq!(agg.buckets()[0].name, "developer");
        assert_eq!(agg.buckets()[0].len(), 2);
        assert_eq!(agg.buckets()[1].name, "social");
    }

    #[test]
    fn test_not_found_results_change_nothing() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        agg.handle_event(
            id,
            raw(
                "site_result",
                json!({ "status": "not_found", "site_name": "Reddit", "category": "social" }),
            ),
        );

        assert_eq!(agg.stats().found, 0);
        assert!(agg.buckets().is_empty());
    }

    #[test]
    fn test_progress_updates_and_clears_current_site() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        agg.handle_event(id, raw("site_checking", json!({ "site_name": "Steam" })));
        assert_eq!(agg.current_site(), Some("Steam"));

        agg.handle_event(
            id,
            raw(
                "site_result",
                json!({
                    "status": "not_found",
                    "site_name": "Steam",
                    "progress": { "checked": 7, "total": 50, "percentage": 14.0 }
                }),
            ),
        );

        assert_eq!(agg.current_site(), None);
        assert_eq!(agg.stats().scanned, 7);
        assert_eq!(agg.session().unwrap().checked, 7);
    }

    #[test]
    fn test_checked_count_is_monotone() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        for checked in [5u64, 3, 9] {
            agg.handle_event(
                id,
                raw(
                    "site_result",
                    json!({
                        "status": "not_found",
                        "site_name": "X",
                        "progress": { "checked": checked, "total": 50, "percentage": 0.0 }
                    }),
                ),
            );
        }
        assert_eq!(agg.stats().scanned, 9);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut agg = SearchAggregator::new(Recording::default());
        agg.start("alice");

        agg.cancel();
        agg.cancel();

        assert_eq!(
            agg.session().unwrap().status,
            SessionStatus::Cancelled
        );
        let cancels = agg
            .into_observer()
            .calls
            .iter()
            .filter(|c| *c == "cancelled")
            .count();
        assert_eq!(cancels, 1);
    }

    #[test]
    fn test_cancel_without_session_is_noop() {
        let mut agg = SearchAggregator::new(());
        agg.cancel();
        assert!(agg.session().is_none());
    }

    #[test]
    fn test_malformed_message_is_dropped() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        agg.handle_message(id, "this is not json");

        let session = agg.session().unwrap();
        assert!(session.is_running());
        assert_eq!(session.checked, 0);
        assert_eq!(agg.stats(), SearchStats::default());
    }

    #[test]
    fn test_malformed_payload_drops_only_that_event() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();

        // total_sites has the wrong type
        agg.handle_event(id, raw("search_started", json!({ "total_sites": "many" })));
        assert!(agg.session().unwrap().is_running());
        assert_eq!(agg.stats().total, 0);

        agg.handle_event(id, raw("search_started", json!({ "total_sites": 50 })));
        assert_eq!(agg.stats().total, 50);
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();
        agg.handle_event(id, raw("heartbeat", json!({})));
        assert!(agg.session().unwrap().is_running());
    }

    #[test]
    fn test_octocat_scenario() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("octocat").unwrap();

        agg.handle_event(id, raw("search_started", json!({ "total_sites": 50 })));
        agg.handle_event(
            id,
            raw(
                "site_result",
                json!({
                    "status": "found",
                    "site_name": "GitHub",
                    "category": "developer",
                    "profile_data": { "followers": 100 }
                }),
            ),
        );

        assert_eq!(agg.stats().total, 50);
        assert_eq!(agg.stats().found, 1);
        assert_eq!(agg.buckets().len(), 1);
        let bucket = &agg.buckets()[0];
        assert_eq!(bucket.name, "developer");
        assert_eq!(bucket.len(), 1);

        let summary =
            crate::profile::extract(bucket.results[0].profile_fields().unwrap());
        assert_eq!(summary.followers, Some(100));
    }

    #[test]
    fn test_events_after_cancel_are_ignored() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("octocat").unwrap();
        agg.cancel();

        agg.handle_event(id, raw("search_started", json!({ "total_sites": 50 })));
        agg.handle_event(id, found_result("GitHub", "developer"));

        assert_eq!(agg.stats(), SearchStats::default());
        assert!(agg.buckets().is_empty());
        assert_eq!(agg.session().unwrap().status, SessionStatus::Cancelled);
    }

    #[test]
    fn test_stale_session_id_is_ignored() {
        let mut agg = SearchAggregator::new(());
        let old_id = agg.start("alice").unwrap();
        agg.cancel();
        let new_id = agg.start("bob").unwrap();
        assert_ne!(old_id, new_id);

        agg.handle_event(old_id, found_result("GitHub", "developer"));
        assert_eq!(agg.stats().found, 0);

        agg.handle_event(new_id, found_result("GitHub", "developer"));
        assert_eq!(agg.stats().found, 1);
    }

    #[test]
    fn test_completed_tears_down() {
        let mut agg = SearchAggregator::new(Recording::default());
        let id = agg.start("alice").unwrap();
        agg.handle_event(id, raw("search_completed", json!({})));

        assert_eq!(agg.session().unwrap().status, SessionStatus::Completed);
        assert!(agg.into_observer().calls.contains(&"completed".to_string()));
    }

    #[test]
    fn test_fail_marks_session_errored() {
        let mut agg = SearchAggregator::new(());
        agg.start("alice");
        agg.fail();
        assert_eq!(agg.session().unwrap().status, SessionStatus::Errored);
        // terminal: a second fail or cancel changes nothing
        agg.cancel();
        assert_eq!(agg.session().unwrap().status, SessionStatus::Errored);
    }

    #[test]
    fn test_case_sensitive_buckets_preserved() {
        let mut agg = SearchAggregator::new(());
        let id = agg.start("alice").unwrap();
        agg.handle_event(id, found_result("A", "Social"));
        agg.handle_event(id, found_result("B", "social"));
        // labels differing only in case form separate buckets, as upstream
        assert_eq!(agg.buckets().len(), 2);
    }

    #[test]
    fn test_load_completed_replays_snapshot() {
        let mut agg = SearchAggregator::new(Recording::default());
        let snapshot: Snapshot = serde_json::from_value(json!({
            "query": "octocat",
            "stats": { "scanned": 50, "total": 50 },
            "results": [
                { "status": "found", "site_name": "GitHub", "category": "developer" },
                { "status": "found", "site_name": "Reddit", "category": "social" },
                { "status": "not_found", "site_name": "Steam" }
            ]
        }))
        .unwrap();

        agg.load_completed(snapshot);

        let session = agg.session().unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.query, "octocat");
        assert_eq!(agg.stats().found, 2);
        assert_eq!(agg.stats().scanned, 50);
        assert_eq!(agg.stats().total, 50);
        assert_eq!(agg.buckets().len(), 2);

        let observer = agg.into_observer();
        assert!(observer.calls.contains(&"category:developer".to_string()));
        assert!(observer.calls.contains(&"found:Reddit".to_string()));
    }

    #[test]
    fn test_start_after_load_resets_state() {
        let mut agg = SearchAggregator::new(());
        let snapshot: Snapshot = serde_json::from_value(json!({
            "results": [{ "status": "found", "site_name": "GitHub", "category": "developer" }]
        }))
        .unwrap();
        agg.load_completed(snapshot);
        assert_eq!(agg.stats().found, 1);

        agg.start("fresh").unwrap();
        assert_eq!(agg.stats(), SearchStats::default());
        assert!(agg.buckets().is_empty());
    }
}
