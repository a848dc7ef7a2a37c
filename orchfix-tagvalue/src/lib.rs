/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Tag-Value
//!
//! Chunked FIX tag=value framing and field parsing for the OrchFix analyzer.
//!
//! This crate reads captured log text rather than live sessions, so it is
//! built for tolerance instead of validation:
//!
//! - **Framing**: [`MessageFramer`] scans a chunk for complete messages
//!   (begin string through checksum field) and tells the caller exactly how
//!   many leading bytes it consumed, so a message straddling a chunk
//!   boundary is re-read whole with the next chunk.
//! - **Field parsing**: [`FieldCursor`] walks `tag=value` fields, honoring
//!   length-prefixed raw values that may contain the delimiter byte.
//! - **Failure policy**: malformed units are skipped and counted, never
//!   fatal.

pub mod cursor;
pub mod framer;

pub use cursor::{FieldCursor, parse_message};
pub use framer::{Frame, FrameScan, MessageFramer};

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';
