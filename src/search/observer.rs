//! Subscription seam between the aggregator and the view.

use crate::models::{SearchSession, SearchStats, SiteResult};

/// Receives notifications as the aggregator mutates its state.
///
/// The view layer implements this trait and holds no search logic of
/// its own; every method defaults to a no-op so implementations only
/// handle what they render. `()` serves as the null observer.
pub trait SearchObserver {
    /// A new session transitioned to running.
    fn on_started(&mut self, _session: &SearchSession) {}

    /// Progress counters changed (total became known, or more sites
    /// were checked).
    fn on_progress(&mut self, _stats: &SearchStats) {}

    /// The backend is currently probing `_site_name`.
    fn on_checking(&mut self, _site_name: &str) {}

    /// A positive match was appended to its category bucket.
    fn on_result_found(&mut self, _result: &SiteResult) {}

    /// A category bucket was created on first use.
    fn on_category_created(&mut self, _category: &str) {}

    /// The session reached `Completed`.
    fn on_completed(&mut self, _stats: &SearchStats) {}

    /// The session was cancelled by the user.
    fn on_cancelled(&mut self) {}
}

impl SearchObserver for () {}
