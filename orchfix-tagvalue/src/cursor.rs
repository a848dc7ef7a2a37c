/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Field cursor over a framed message.
//!
//! The cursor walks `tag=value` fields: tag bytes up to `=`, value bytes up
//! to the SOH delimiter. The one exception is raw-data fields: when the
//! previous field's tag is registered as a length-type field, the next
//! field's value is exactly that many raw bytes, regardless of embedded SOH
//! bytes. FIX permits delimiter bytes inside signature and raw-data values;
//! the preceding length field is the only reliable boundary.

use crate::{EQUALS, SOH};
use memchr::memchr;
use orchfix_core::error::TagError;
use orchfix_core::field::{FieldInstance, MessageInstance};
use std::collections::HashSet;

/// Cursor over the fields of one framed message.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    /// Input buffer, one complete framed message.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Tags whose value is the byte length of the following field's value.
    /// Tag 9 (message length) must not be in this set.
    data_length_tags: &'a HashSet<u32>,
    /// Pending raw-value length announced by the previous field.
    pending: Option<usize>,
}

impl<'a> FieldCursor<'a> {
    /// Creates a cursor over a framed message.
    ///
    /// # Arguments
    /// * `input` - The framed message bytes
    /// * `data_length_tags` - Tags registered as length-type fields
    #[must_use]
    pub fn new(input: &'a [u8], data_length_tags: &'a HashSet<u32>) -> Self {
        Self {
            input,
            offset: 0,
            data_length_tags,
            pending: None,
        }
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Parses the next field.
    ///
    /// Returns `None` when the buffer is exhausted. A malformed field yields
    /// `Some(Err(_))`; the cursor resynchronizes on the next delimiter so
    /// iteration can continue.
    pub fn next_field(&mut self) -> Option<Result<FieldInstance, TagError>> {
        if self.offset >= self.input.len() {
            return None;
        }

        let remaining = &self.input[self.offset..];

        let Some(eq_pos) = memchr(EQUALS, remaining) else {
            // No separator in the rest of the frame; nothing parseable left.
            self.offset = self.input.len();
            return Some(Err(TagError::InvalidTag {
                text: String::from_utf8_lossy(remaining).into_owned(),
            }));
        };

        let tag_bytes = &remaining[..eq_pos];
        if tag_bytes.is_empty() {
            self.resync(eq_pos + 1);
            return Some(Err(TagError::EmptyTag));
        }
        let Some(tag) = parse_tag(tag_bytes) else {
            self.resync(eq_pos + 1);
            return Some(Err(TagError::InvalidTag {
                text: String::from_utf8_lossy(tag_bytes).into_owned(),
            }));
        };

        let value_start = eq_pos + 1;

        // A pending length from the previous field overrides delimiter
        // scanning: the value is exactly that many raw bytes.
        let value: &[u8] = if let Some(declared) = self.pending.take() {
            let available = remaining.len() - value_start;
            if declared > available {
                self.offset = self.input.len();
                return Some(Err(TagError::TruncatedData {
                    tag,
                    declared,
                    available,
                }));
            }
            let value = &remaining[value_start..value_start + declared];
            let mut end = value_start + declared;
            if remaining.get(end) == Some(&SOH) {
                end += 1;
            }
            self.offset += end;
            value
        } else {
            match memchr(SOH, &remaining[value_start..]) {
                Some(soh_pos) => {
                    let value = &remaining[value_start..value_start + soh_pos];
                    self.offset += value_start + soh_pos + 1;
                    value
                }
                None => {
                    // Tolerate a missing trailing delimiter on the last field.
                    let value = &remaining[value_start..];
                    self.offset = self.input.len();
                    value
                }
            }
        };

        if self.data_length_tags.contains(&tag) {
            match std::str::from_utf8(value).ok().and_then(|s| s.parse().ok()) {
                Some(len) => self.pending = Some(len),
                None => {
                    return Some(Err(TagError::InvalidLength {
                        tag,
                        text: String::from_utf8_lossy(value).into_owned(),
                    }));
                }
            }
        }

        Some(Ok(FieldInstance::new(
            tag,
            String::from_utf8_lossy(value).into_owned(),
        )))
    }

    /// Skips past the next SOH so iteration can continue after a malformed
    /// field.
    fn resync(&mut self, from: usize) {
        let start = self.offset + from;
        match memchr(SOH, &self.input[start.min(self.input.len())..]) {
            Some(pos) => self.offset = start + pos + 1,
            None => self.offset = self.input.len(),
        }
    }
}

/// Parses a complete framed message into a [`MessageInstance`].
///
/// Malformed fields are collected separately; well-formed fields around them
/// are kept.
///
/// # Arguments
/// * `frame` - The framed message bytes
/// * `data_length_tags` - Tags registered as length-type fields
/// * `line` - 1-based source line of the frame start
#[must_use]
pub fn parse_message(
    frame: &[u8],
    data_length_tags: &HashSet<u32>,
    line: u64,
) -> (MessageInstance, Vec<TagError>) {
    let mut cursor = FieldCursor::new(frame, data_length_tags);
    let mut message = MessageInstance::new(line);
    let mut errors = Vec::new();

    while let Some(result) = cursor.next_field() {
        match result {
            Ok(field) => message.push(field),
            Err(err) => errors.push(err),
        }
    }

    (message, errors)
}

/// Parses a tag number from ASCII bytes.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_data_tags() -> HashSet<u32> {
        HashSet::new()
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"10"), Some(10));
        assert_eq!(parse_tag(b"95"), Some(95));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"abc"), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_next_field_sequence() {
        let tags = no_data_tags();
        let input = b"8=FIX.4.4\x019=5\x0135=0\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        let f1 = cursor.next_field().unwrap().unwrap();
        assert_eq!((f1.tag, f1.value.as_str()), (8, "FIX.4.4"));
        let f2 = cursor.next_field().unwrap().unwrap();
        assert_eq!((f2.tag, f2.value.as_str()), (9, "5"));
        let f3 = cursor.next_field().unwrap().unwrap();
        assert_eq!((f3.tag, f3.value.as_str()), (35, "0"));
        assert!(cursor.next_field().is_none());
    }

    #[test]
    fn test_empty_tag_resyncs() {
        let tags = no_data_tags();
        let input = b"=junk\x0135=D\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        assert_eq!(cursor.next_field().unwrap(), Err(TagError::EmptyTag));
        let next = cursor.next_field().unwrap().unwrap();
        assert_eq!((next.tag, next.value.as_str()), (35, "D"));
    }

    #[test]
    fn test_invalid_tag_resyncs() {
        let tags = no_data_tags();
        let input = b"3x=1\x0149=SENDER\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        assert!(matches!(
            cursor.next_field().unwrap(),
            Err(TagError::InvalidTag { .. })
        ));
        let next = cursor.next_field().unwrap().unwrap();
        assert_eq!(next.tag, 49);
    }

    #[test]
    fn test_length_prefixed_value_with_embedded_soh() {
        let tags: HashSet<u32> = [93].into_iter().collect();
        // 93 declares 5 raw bytes for tag 89; the value contains SOH and '='.
        let input = b"93=5\x0189=ab\x01=c\x0110=123\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        let len_field = cursor.next_field().unwrap().unwrap();
        assert_eq!((len_field.tag, len_field.value.as_str()), (93, "5"));

        let data = cursor.next_field().unwrap().unwrap();
        assert_eq!(data.tag, 89);
        assert_eq!(data.value.as_bytes(), b"ab\x01=c");

        let checksum = cursor.next_field().unwrap().unwrap();
        assert_eq!((checksum.tag, checksum.value.as_str()), (10, "123"));
        assert!(cursor.next_field().is_none());
    }

    #[test]
    fn test_truncated_raw_value() {
        let tags: HashSet<u32> = [93].into_iter().collect();
        let input = b"93=9\x0189=ab\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        cursor.next_field().unwrap().unwrap();
        assert!(matches!(
            cursor.next_field().unwrap(),
            Err(TagError::TruncatedData {
                tag: 89,
                declared: 9,
                ..
            })
        ));
        assert!(cursor.next_field().is_none());
    }

    #[test]
    fn test_invalid_length_value() {
        let tags: HashSet<u32> = [93].into_iter().collect();
        let input = b"93=abc\x0189=xy\x01";
        let mut cursor = FieldCursor::new(input, &tags);

        assert!(matches!(
            cursor.next_field().unwrap(),
            Err(TagError::InvalidLength { tag: 93, .. })
        ));
        // The following field falls back to delimiter scanning.
        let next = cursor.next_field().unwrap().unwrap();
        assert_eq!((next.tag, next.value.as_str()), (89, "xy"));
    }

    #[test]
    fn test_missing_trailing_delimiter_tolerated() {
        let tags = no_data_tags();
        let input = b"35=0\x0158=last";
        let mut cursor = FieldCursor::new(input, &tags);

        cursor.next_field().unwrap().unwrap();
        let last = cursor.next_field().unwrap().unwrap();
        assert_eq!((last.tag, last.value.as_str()), (58, "last"));
        assert!(cursor.next_field().is_none());
    }

    #[test]
    fn test_parse_message_collects_errors() {
        let tags = no_data_tags();
        let input = b"8=FIX.4.4\x019=12\x0135=8\x01=bad\x01150=F\x0110=000\x01";
        let (message, errors) = parse_message(input, &tags, 4);

        assert_eq!(message.line, 4);
        assert_eq!(message.msg_type(), Some("8"));
        assert_eq!(message.value_of(150), Some("F"));
        assert_eq!(errors, vec![TagError::EmptyTag]);
    }
}
