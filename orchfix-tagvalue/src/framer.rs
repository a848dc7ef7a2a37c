/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Message framing over raw log chunks.
//!
//! Log files are read in fixed-size chunks that can cut a message anywhere.
//! The framer scans a chunk for complete messages — begin-string marker,
//! then the checksum field that follows it, then the delimiter byte that
//! terminates the checksum field — and reports how many leading bytes it
//! consumed. The caller advances its cursor by exactly that amount and
//! re-reads the remainder together with fresh data, so a message spanning a
//! chunk boundary is parsed whole on the next pass.
//!
//! Anything that cannot be framed (a begin string with no checksum before
//! the next begin string or end of input) is dropped and counted, never
//! fatal.

use crate::SOH;
use memchr::{memchr, memchr_iter, memmem};
use std::ops::Range;

/// Marker that opens every message.
const BEGIN_STRING: &[u8] = b"8=FIX";

/// Delimited start of the checksum field.
const CHECKSUM: &[u8] = b"\x0110=";

/// One complete message located in a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Byte range of the message within the scanned chunk.
    pub range: Range<usize>,
    /// 1-based line number of the message start within the source file.
    pub line: u64,
}

/// Result of scanning one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameScan {
    /// Complete messages found, in input order.
    pub frames: Vec<Frame>,
    /// Leading bytes consumed. The caller must retain `chunk[consumed..]`
    /// and prepend it to the next chunk.
    pub consumed: usize,
    /// Line numbers of started messages that had to be dropped.
    pub dropped: Vec<u64>,
}

/// Stateful scanner for one log file.
///
/// The framer carries the running line number across chunks and counts
/// units it could not frame.
#[derive(Debug)]
pub struct MessageFramer {
    /// 1-based line number of the first byte of the next chunk.
    line: u64,
    /// Units dropped because no checksum could be located for them.
    bad_messages: u64,
}

impl MessageFramer {
    /// Creates a framer positioned at the start of a file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line: 1,
            bad_messages: 0,
        }
    }

    /// Returns the number of units dropped so far.
    #[inline]
    #[must_use]
    pub const fn bad_messages(&self) -> u64 {
        self.bad_messages
    }

    /// Scans a chunk for complete messages.
    ///
    /// # Arguments
    /// * `chunk` - Retained remainder of the previous scan plus fresh bytes
    /// * `is_final` - True when no more bytes will follow this chunk
    pub fn scan(&mut self, chunk: &[u8], is_final: bool) -> FrameScan {
        let mut frames = Vec::new();
        let mut dropped = Vec::new();
        let mut lines = LineCounter::new(chunk);
        let mut cursor = 0usize;

        let consumed = loop {
            let Some(rel) = memmem::find(&chunk[cursor..], BEGIN_STRING) else {
                // No further marker. Retain a tail that could be the first
                // bytes of a marker split across the chunk boundary.
                break if is_final {
                    chunk.len()
                } else {
                    chunk
                        .len()
                        .saturating_sub(BEGIN_STRING.len() - 1)
                        .max(cursor)
                };
            };
            let start = cursor + rel;
            let next_marker = memmem::find(&chunk[start + 1..], BEGIN_STRING).map(|p| start + 1 + p);
            let end = frame_end(&chunk[start..]).map(|len| start + len);

            match (end, next_marker) {
                (Some(end), None) => {
                    frames.push(Frame {
                        range: start..end,
                        line: self.line + lines.newlines_to(start),
                    });
                    cursor = end;
                }
                (Some(end), Some(next)) if end <= next => {
                    frames.push(Frame {
                        range: start..end,
                        line: self.line + lines.newlines_to(start),
                    });
                    cursor = end;
                }
                (_, Some(next)) => {
                    // The located checksum (if any) belongs to a later
                    // message; the current unit is unterminated.
                    self.bad_messages += 1;
                    dropped.push(self.line + lines.newlines_to(start));
                    cursor = next;
                }
                (None, None) => {
                    break if is_final {
                        self.bad_messages += 1;
                        dropped.push(self.line + lines.newlines_to(start));
                        chunk.len()
                    } else {
                        // Incomplete tail: wait for more data.
                        start
                    };
                }
            }
        };

        self.line += lines.newlines_to(consumed);

        FrameScan {
            frames,
            consumed,
            dropped,
        }
    }
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the frame length for a buffer starting at a begin-string marker,
/// if its checksum field is complete.
fn frame_end(buf: &[u8]) -> Option<usize> {
    let p = memmem::find(buf, CHECKSUM)?;
    let value_start = p + CHECKSUM.len();
    let q = memchr(SOH, &buf[value_start..])?;
    Some(value_start + q + 1)
}

/// Incremental newline counter over one chunk. Positions must be queried in
/// nondecreasing order.
struct LineCounter<'a> {
    chunk: &'a [u8],
    pos: usize,
    newlines: u64,
}

impl<'a> LineCounter<'a> {
    fn new(chunk: &'a [u8]) -> Self {
        Self {
            chunk,
            pos: 0,
            newlines: 0,
        }
    }

    /// Returns the number of newlines in `chunk[..to]`.
    fn newlines_to(&mut self, to: usize) -> u64 {
        if to > self.pos {
            self.newlines += memchr_iter(b'\n', &self.chunk[self.pos..to]).count() as u64;
            self.pos = to;
        }
        self.newlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(body: &str) -> Vec<u8> {
        format!("8=FIX.4.4\x019={}\x01{}10=123\x01", body.len(), body).into_bytes()
    }

    #[test]
    fn test_single_complete_message() {
        let mut framer = MessageFramer::new();
        let data = msg("35=0\x01");
        let scan = framer.scan(&data, true);

        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.frames[0].range, 0..data.len());
        assert_eq!(scan.frames[0].line, 1);
        assert_eq!(scan.consumed, data.len());
        assert_eq!(framer.bad_messages(), 0);
    }

    #[test]
    fn test_two_messages_with_log_decoration() {
        let mut framer = MessageFramer::new();
        let mut data = b"2026-01-12 time \n".to_vec();
        data.extend_from_slice(&msg("35=0\x01"));
        data.extend_from_slice(b"\nnoise ");
        data.extend_from_slice(&msg("35=1\x01"));
        let scan = framer.scan(&data, true);

        assert_eq!(scan.frames.len(), 2);
        assert_eq!(scan.frames[0].line, 2);
        assert_eq!(scan.frames[1].line, 3);
        assert_eq!(scan.consumed, data.len());
    }

    #[test]
    fn test_partial_message_retained() {
        let mut framer = MessageFramer::new();
        let full = msg("35=0\x01");
        let mut data = msg("35=1\x01");
        let partial_start = data.len();
        data.extend_from_slice(&full[..full.len() - 4]);

        let scan = framer.scan(&data, false);
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.consumed, partial_start);
        assert!(scan.dropped.is_empty());
        assert_eq!(framer.bad_messages(), 0);
    }

    #[test]
    fn test_split_marker_tail_retained() {
        let mut framer = MessageFramer::new();
        // Chunk ends inside the "8=FIX" marker itself.
        let data = b"garbage 8=F".to_vec();
        let scan = framer.scan(&data, false);

        assert!(scan.frames.is_empty());
        // At most marker-length-minus-one tail bytes are held back.
        assert_eq!(scan.consumed, data.len() - (BEGIN_STRING.len() - 1));
    }

    #[test]
    fn test_unterminated_message_before_next() {
        let mut framer = MessageFramer::new();
        let mut data = b"8=FIX.4.4\x019=10\x0135=0\x01".to_vec();
        data.extend_from_slice(&msg("35=1\x01"));
        let scan = framer.scan(&data, true);

        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.dropped, vec![1]);
        assert_eq!(framer.bad_messages(), 1);
    }

    #[test]
    fn test_unterminated_message_at_eof() {
        let mut framer = MessageFramer::new();
        let data = b"8=FIX.4.4\x019=10\x0135=0\x01".to_vec();
        let scan = framer.scan(&data, true);

        assert!(scan.frames.is_empty());
        assert_eq!(scan.consumed, data.len());
        assert_eq!(framer.bad_messages(), 1);
    }

    #[test]
    fn test_chunk_boundary_continuity() {
        // The same frames must come out wherever the boundary falls.
        let mut whole = Vec::new();
        whole.extend_from_slice(&msg("35=8\x01150=F\x01"));
        whole.extend_from_slice(b"\n");
        whole.extend_from_slice(&msg("35=8\x0139=2\x01"));

        let mut reference = MessageFramer::new();
        let expected: Vec<Vec<u8>> = reference
            .scan(&whole, true)
            .frames
            .iter()
            .map(|f| whole[f.range.clone()].to_vec())
            .collect();
        assert_eq!(expected.len(), 2);

        for split in 1..whole.len() {
            let mut framer = MessageFramer::new();
            let mut collected = Vec::new();
            let mut buffer = whole[..split].to_vec();

            let scan = framer.scan(&buffer, false);
            for frame in &scan.frames {
                collected.push(buffer[frame.range.clone()].to_vec());
            }
            buffer.drain(..scan.consumed);
            buffer.extend_from_slice(&whole[split..]);

            let scan = framer.scan(&buffer, true);
            for frame in &scan.frames {
                collected.push(buffer[frame.range.clone()].to_vec());
            }

            assert_eq!(collected, expected, "split at {split}");
        }
    }

    #[test]
    fn test_line_number_carries_across_chunks() {
        let mut framer = MessageFramer::new();
        let first = b"line one\nline two\n".to_vec();
        let scan = framer.scan(&first, false);
        assert!(scan.frames.is_empty());

        let mut second = first[scan.consumed..].to_vec();
        second.extend_from_slice(&msg("35=0\x01"));
        let scan = framer.scan(&second, true);
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.frames[0].line, 3);
    }
}
