/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Warning log.
//!
//! Recoverable input problems are recorded here with the source file and
//! 1-based line number, then replay continues. The log is exportable as
//! plain text grouped by file.

use crate::error::TagError;
use std::fmt;

/// The kind of a tolerated input problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The message had no third field to take a msgType from.
    AbsentMsgType,
    /// A field could not be parsed.
    MalformedField(TagError),
    /// A begin-string marker was found but no checksum field completed it.
    Unframed,
    /// An unknown field arrived exactly at a repeating group's final
    /// instance boundary; its placement inside or after the group is a
    /// guess.
    AmbiguousUdfPlacement {
        /// The unknown field's tag.
        tag: u32,
        /// Name of the group whose boundary was ambiguous.
        group: String,
    },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsentMsgType => write!(f, "message has no msgType, skipped"),
            Self::MalformedField(err) => write!(f, "malformed field skipped: {err}"),
            Self::Unframed => write!(f, "begin string without checksum, message skipped"),
            Self::AmbiguousUdfPlacement { tag, group } => write!(
                f,
                "user-defined field {tag} at final instance boundary of group {group}, placed inside"
            ),
        }
    }
}

/// One recorded warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Source file the message came from.
    pub file: String,
    /// 1-based line number of the message start.
    pub line: u64,
    /// What was tolerated.
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.kind)
    }
}

/// Accumulated warnings for a run, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn record(&mut self, file: impl Into<String>, line: u64, kind: WarningKind) {
        self.entries.push(Warning {
            file: file.into(),
            line,
            kind,
        });
    }

    /// Returns the recorded warnings in encounter order.
    #[must_use]
    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    /// Returns the number of recorded warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends all entries of another log.
    pub fn merge(&mut self, other: WarningLog) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for WarningLog {
    /// Renders the log as text, one warning per line, grouped by file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current_file: Option<&str> = None;
        for entry in &self.entries {
            if current_file != Some(entry.file.as_str()) {
                writeln!(f, "{}:", entry.file)?;
                current_file = Some(entry.file.as_str());
            }
            writeln!(f, "  line {}: {}", entry.line, entry.kind)?;
        }
        Ok(())
    }
}
