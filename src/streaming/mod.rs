//! Line framing for streamed upstream responses
//!
//! Upstream streaming responses are consumed as text lines. Bytes arrive in
//! chunks that do not align with line boundaries (or UTF-8 boundaries), so
//! chunks are buffered until a full line is available.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::relay::{LineStream, RelayResult};

/// Buffer for accumulating incomplete lines across chunk boundaries.
///
/// Lines are split on `\n`; a trailing `\r` is removed. Empty lines are kept,
/// since they are event separators the consumer may rely on.
///
/// # Example
/// ```
/// use gemini_relay::streaming::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
///
/// let lines1 = buffer.feed(b"data: {\"text\":\"hel");
/// assert!(lines1.is_empty());
///
/// let lines2 = buffer.feed(b"lo\"}\r\n\r\n");
/// assert_eq!(lines2, vec!["data: {\"text\":\"hello\"}", ""]);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Bytes after the last complete line
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the buffer and return any complete lines.
    ///
    /// Invalid UTF-8 inside a complete line is replaced with U+FFFD. A
    /// multi-byte character split across chunks is decoded intact.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;

        while let Some(offset) = self.pending[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
            from = start;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();
        lines
    }

    /// Take the unterminated trailing line, if any, at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Turn a byte stream into a stream of lines.
///
/// The first error ends the sequence; a trailing unterminated line is
/// flushed when the byte stream ends cleanly.
pub fn lines<S>(bytes: S) -> LineStream
where
    S: Stream<Item = RelayResult<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut buffer = LineBuffer::new();
        let mut bytes = Box::pin(bytes);

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for line in buffer.feed(&chunk) {
                        yield Ok(line);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(line) = buffer.finish() {
            yield Ok(line);
        }
    })
}
