/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Parsed field and message instances.
//!
//! This module provides:
//! - [`FieldInstance`]: one `tag=value` pair lifted out of a log message
//! - [`MessageInstance`]: the ordered flat field sequence of one message
//! - Tag-range helpers for user-defined fields
//!
//! Instances are owned: values are copied out of the read buffer so the
//! chunk can be released before replay finishes with the message.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The canonical scenario name. Every other scenario is derived from it.
pub const BASE_SCENARIO: &str = "base";

/// Fixed position of the MsgType field within a message: BeginString,
/// BodyLength, MsgType. The value is taken by position, not by scanning
/// for tag 35.
const MSG_TYPE_POSITION: usize = 2;

/// First tag of the user-defined field registry range.
pub const UDF_RANGE_START: u32 = 5000;

/// Last tag of the user-defined field registry range.
pub const UDF_RANGE_END: u32 = 9999;

/// Returns true if the tag falls in the user-defined field range.
#[inline]
#[must_use]
pub const fn is_user_defined(tag: u32) -> bool {
    tag >= UDF_RANGE_START && tag <= UDF_RANGE_END
}

/// A single `tag=value` pair from a parsed log message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInstance {
    /// Field tag number.
    pub tag: u32,
    /// Field value. Raw-data values with embedded delimiter bytes are
    /// carried verbatim (lossily re-coded to UTF-8 where needed).
    pub value: String,
}

impl FieldInstance {
    /// Creates a new field instance.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - The field value text
    #[must_use]
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns true if this tag is in the user-defined range.
    #[inline]
    #[must_use]
    pub const fn is_user_defined(&self) -> bool {
        is_user_defined(self.tag)
    }
}

impl fmt::Display for FieldInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, self.value)
    }
}

/// The ordered field sequence of one framed log message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInstance {
    /// Fields in wire order.
    pub fields: SmallVec<[FieldInstance; 16]>,
    /// 1-based line number of the message start within its source file.
    pub line: u64,
}

impl MessageInstance {
    /// Creates an empty message instance for the given source line.
    #[must_use]
    pub fn new(line: u64) -> Self {
        Self {
            fields: SmallVec::new(),
            line,
        }
    }

    /// Appends a field.
    #[inline]
    pub fn push(&mut self, field: FieldInstance) {
        self.fields.push(field);
    }

    /// Returns the message type, defined as the value of the third field.
    ///
    /// Logs with non-standard header ordering will be misclassified; the
    /// positional convention is deliberate.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.fields
            .get(MSG_TYPE_POSITION)
            .map(|f| f.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Returns the value of the first field carrying `tag`, if present.
    #[must_use]
    pub fn value_of(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the message carries no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over the fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldInstance> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MessageInstance {
        let mut msg = MessageInstance::new(7);
        msg.push(FieldInstance::new(8, "FIX.4.4"));
        msg.push(FieldInstance::new(9, "62"));
        msg.push(FieldInstance::new(35, "8"));
        msg.push(FieldInstance::new(150, "F"));
        msg
    }

    #[test]
    fn test_msg_type_by_position() {
        assert_eq!(sample().msg_type(), Some("8"));
    }

    #[test]
    fn test_msg_type_absent_when_short() {
        let mut msg = MessageInstance::new(1);
        msg.push(FieldInstance::new(8, "FIX.4.4"));
        assert_eq!(msg.msg_type(), None);
    }

    #[test]
    fn test_msg_type_is_positional_not_tag_35() {
        let mut msg = MessageInstance::new(1);
        msg.push(FieldInstance::new(8, "FIX.4.4"));
        msg.push(FieldInstance::new(35, "D"));
        msg.push(FieldInstance::new(9, "100"));
        // Third field is tag 9 here, so its value wins.
        assert_eq!(msg.msg_type(), Some("100"));
    }

    #[test]
    fn test_value_of() {
        let msg = sample();
        assert_eq!(msg.value_of(150), Some("F"));
        assert_eq!(msg.value_of(39), None);
    }

    #[test]
    fn test_user_defined_range() {
        assert!(!is_user_defined(4999));
        assert!(is_user_defined(5000));
        assert!(is_user_defined(9999));
        assert!(!is_user_defined(10000));
    }
}
