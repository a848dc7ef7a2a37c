/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Recoverable field-level errors.
//!
//! OrchFix distinguishes two failure classes. Terminal failures (unreadable
//! or malformed reference documents, I/O errors) are defined next to the
//! code that raises them and abort the run. The errors in this module are
//! the other class: per-field malformations inside a log message. They are
//! reported to the caller, converted to warnings, and never propagate.

use thiserror::Error;

/// Errors produced while walking the fields of a single framed message.
///
/// Every variant is recoverable: the replay layer records a warning and
/// continues with the next field or message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A field started with the `=` separator, leaving no tag bytes.
    #[error("empty tag before '=' separator")]
    EmptyTag,

    /// Tag bytes were present but not a valid positive integer.
    #[error("invalid tag format: {text}")]
    InvalidTag {
        /// The raw tag text as found in the log.
        text: String,
    },

    /// A length-type field carried a value that is not a byte count.
    #[error("invalid length value '{text}' for tag {tag}")]
    InvalidLength {
        /// The length-type field's tag.
        tag: u32,
        /// The raw value text.
        text: String,
    },

    /// A raw-data value was declared longer than the remaining input.
    #[error("raw value for tag {tag} truncated: declared {declared} bytes, {available} available")]
    TruncatedData {
        /// The data field's tag.
        tag: u32,
        /// Declared byte count.
        declared: usize,
        /// Bytes actually remaining.
        available: usize,
    },
}
