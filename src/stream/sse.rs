//! Incremental server-sent event decoder.
//!
//! Reassembles SSE records from arbitrary byte chunks. A record ends at
//! a blank line; the payload is the concatenation of its `data:` lines.
//! Comment lines and non-`data` fields (`event:`, `id:`, `retry:`) are
//! skipped, matching what a browser `EventSource` would deliver to
//! `onmessage`.

/// Streaming SSE record decoder.
///
/// Feed it raw chunks as they arrive; complete event payloads come back
/// in arrival order. Partial records (including split UTF-8 sequences)
/// are buffered until the terminating blank line shows up.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one transport chunk and returns every event payload it
    /// completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, sep_len)) = find_record_boundary(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..end + sep_len).collect();
            if let Some(data) = decode_record(&record[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Flushes a trailing record that was never terminated by a blank
    /// line. Call once when the transport signals end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        decode_record(&rest)
    }
}

/// Finds the earliest record separator (`\n\n` or `\r\n\r\n`) and
/// returns its offset and length.
fn find_record_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find_subslice(buf, b"\n\n").map(|i| (i, 2));
    let crlf = find_subslice(buf, b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Extracts the joined `data:` payload from one raw record, or `None`
/// when the record carries no data lines.
fn decode_record(record: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(record);
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line == "data" {
            data_lines.push("");
        }
    }

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"event_type\":\"search_started\"}\n\n");
        assert_eq!(events, vec!["{\"event_type\":\"search_started\"}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\":").is_empty());
        assert!(decoder.feed(b"1}").is_empty());
        let events = decoder.feed(b"\n\n");
        assert_eq!(events, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: one\n\ndata: two\n\ndata: thr");
        assert_eq!(events, vec!["one", "two"]);
        assert_eq!(decoder.feed(b"ee\n\n"), vec!["three"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: hello\r\n\r\n");
        assert_eq!(events, vec!["hello"]);
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: first\ndata: second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn test_comments_and_other_fields_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\nevent: message\nid: 7\ndata: payload\n\n");
        assert_eq!(events, vec!["payload"]);
    }

    #[test]
    fn test_record_without_data_yields_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b": ping\n\n").is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_record() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let payload = "data: caf\u{e9}\n\n".as_bytes();
        let (head, tail) = payload.split_at(9); // splits the two-byte é
        assert!(decoder.feed(head).is_empty());
        assert_eq!(decoder.feed(tail), vec!["caf\u{e9}"]);
    }
}
