//! HTTP client for the backend's streaming search endpoint.
//!
//! Opens one GET request against the username-search stream and exposes
//! the decoded event payloads one at a time. There is no read timeout
//! on the open stream: a hung connection is only terminated by user
//! cancellation or a transport-level error.

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use reqwest::{header, Client, Url};
use tracing::debug;

use crate::stream::error::StreamError;
use crate::stream::sse::SseDecoder;

/// Path of the streaming username-search endpoint.
const STREAM_PATH: &str = "/api/username/search/stream";

/// Feature flags appended to every search request. These mirror what
/// the backend expects and are deliberately not user-configurable.
const FIXED_QUERY_FLAGS: &[(&str, &str)] =
    &[("include_duckduckgo", "false"), ("extract_profile", "true")];

type ByteChunks = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// Client for opening enumeration search streams.
pub struct StreamClient {
    client: Client,
    endpoint: Url,
}

impl StreamClient {
    /// Creates a client for the given backend endpoint.
    ///
    /// `connect_timeout_secs` bounds connection establishment only;
    /// the stream itself has no read deadline.
    pub fn new(endpoint: &str, connect_timeout_secs: u64) -> Result<Self, StreamError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| StreamError::InvalidEndpoint(endpoint.to_string()))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(concat!("namescan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Composes the full stream URL for `query`, including the fixed
    /// feature flags.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(STREAM_PATH);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("username", query);
            for (key, value) in FIXED_QUERY_FLAGS {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Opens the event stream for `query`.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Connect`] — the backend could not be reached.
    /// - [`StreamError::UnexpectedStatus`] — non-2xx response.
    /// - [`StreamError::Transport`] — any other request failure.
    pub async fn open(&self, query: &str) -> Result<EventStream, StreamError> {
        let url = self.search_url(query);
        debug!("Opening event stream: {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    StreamError::Connect {
                        endpoint: self.endpoint.to_string(),
                        source: e,
                    }
                } else {
                    StreamError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::UnexpectedStatus(status));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(EventStream::new(chunks))
    }
}

/// An open server-sent event stream, yielding one JSON payload per
/// backend message.
pub struct EventStream {
    chunks: ByteChunks,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

impl EventStream {
    fn new(chunks: ByteChunks) -> Self {
        Self {
            chunks,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Returns the next event payload, `Ok(None)` once the backend
    /// closes the stream, or the transport error that ended it.
    pub async fn next_event(&mut self) -> Result<Option<String>, StreamError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    for event in self.decoder.feed(&chunk) {
                        self.pending.push_back(event);
                    }
                }
                Some(Err(e)) => return Err(StreamError::Transport(e)),
                None => {
                    self.done = true;
                    if let Some(event) = self.decoder.finish() {
                        self.pending.push_back(event);
                    }
                }
            }
        }
    }
}
