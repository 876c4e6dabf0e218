//! Profile payload interpretation.
//!
//! Per-site profile payloads are arbitrary JSON whose shape varies by
//! source site. This module derives a normalized summary from them
//! (best-effort synonym matching), formats values for display, and
//! renders the full payload recursively.

pub mod extract;
pub mod format;
pub mod render;

pub use extract::{extract, ProfileSummary};
pub use render::render_profile;
