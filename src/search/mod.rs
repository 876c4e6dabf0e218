//! Search session state machine.
//!
//! This module owns the lifecycle of one enumeration search: the
//! aggregator translates stream events into state mutations, and the
//! observer trait is the seam through which a view subscribes to them.

pub mod aggregator;
pub mod observer;

pub use aggregator::SearchAggregator;
pub use observer::SearchObserver;
