//! Line stream decoding
//!
//! The analysis service answers each phase with a chunked body holding one
//! JSON record per line. Chunk boundaries are arbitrary: a line, or a single
//! multi-byte character, may be split across chunks.

use std::collections::VecDeque;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::event::StreamEvent;
use crate::error::{GeoError, Result};

/// Incremental decoder that buffers partial lines across chunks
///
/// Lines are split on the raw `\n` byte, which never occurs inside a
/// multi-byte UTF-8 sequence, so text is only decoded once a line is whole.
pub struct LineDecoder {
    /// Bytes of the line currently being received
    buffer: Vec<u8>,
    /// Buffer offset already searched for a terminator
    scanned: usize,
    /// Decoded records not yet handed out
    pending: VecDeque<Result<StreamEvent>>,
    /// Set after the first bad line; nothing is decoded afterwards
    failed: bool,
    stream_start: Instant,
    lines_decoded: usize,
    bytes_received: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            pending: VecDeque::new(),
            failed: false,
            stream_start: Instant::now(),
            lines_decoded: 0,
            bytes_received: 0,
        }
    }

    /// Feed one chunk; complete lines become available via [`next_event`](Self::next_event)
    pub fn push(&mut self, chunk: &[u8]) {
        if self.failed {
            return;
        }
        self.bytes_received += chunk.len();
        self.buffer.extend_from_slice(chunk);
        debug!(
            "Stream chunk received: {} bytes (total: {} bytes)",
            chunk.len(),
            self.bytes_received
        );

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;
            self.decode_line(&line[..line.len() - 1]);
            if self.failed {
                self.buffer.clear();
                return;
            }
        }
        self.scanned = self.buffer.len();
    }

    /// End of stream: an unterminated trailing line is decoded as the last one
    pub fn finish(&mut self) {
        info!(
            "Line decoder finishing: {:?} elapsed, {} lines, {} bytes total",
            self.stream_start.elapsed(),
            self.lines_decoded,
            self.bytes_received
        );
        if self.failed || self.buffer.is_empty() {
            return;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        self.decode_line(&rest);
    }

    /// Next decoded record, in arrival order
    pub fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        self.pending.pop_front()
    }

    /// Whether a bad line has terminated decoding
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn decode_line(&mut self, raw: &[u8]) {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                self.fail(GeoError::framing(format!("line is not valid UTF-8: {e}")));
                return;
            }
        };

        // Blank lines (including a lone `\r`) separate nothing
        let line = text.trim();
        if line.is_empty() {
            return;
        }

        self.lines_decoded += 1;
        match StreamEvent::parse_line(line) {
            Ok(event) => {
                debug!(
                    "Stream record #{} at {:?}: stage={}",
                    self.lines_decoded,
                    self.stream_start.elapsed(),
                    event.stage_name()
                );
                self.pending.push_back(Ok(event));
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: GeoError) {
        warn!(
            "Stream decoding stopped at line #{}: {}",
            self.lines_decoded, err
        );
        self.failed = true;
        self.pending.push_back(Err(err));
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a stream of byte chunks into a stream of decoded records
///
/// The returned stream ends after the first error, whether it came from the
/// transport or from a malformed line.
pub fn decode_events<S, B>(chunks: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    futures::stream::unfold(
        (chunks, LineDecoder::new(), false),
        |(mut chunks, mut decoder, mut done)| async move {
            loop {
                if let Some(item) = decoder.next_event() {
                    return Some((item, (chunks, decoder, done)));
                }
                if done || decoder.has_failed() {
                    return None;
                }
                match chunks.next().await {
                    Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
                    Some(Err(err)) => {
                        warn!("Stream transport failed: {}", err);
                        return Some((Err(err), (chunks, decoder, true)));
                    }
                    None => {
                        decoder.finish();
                        done = true;
                    }
                }
            }
        },
    )
}
