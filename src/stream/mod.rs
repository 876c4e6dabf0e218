//! Server-sent event transport.
//!
//! This module owns the connection to the search backend's streaming
//! endpoint: URL composition, SSE frame decoding, and the typed error
//! surface for transport failures.

pub mod client;
pub mod error;
pub mod sse;

pub use client::{EventStream, StreamClient};
pub use error::StreamError;
