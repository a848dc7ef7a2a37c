/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Run statistics.
//!
//! Counters accumulated across replay and reconciliation and returned to the
//! caller as part of the run report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Added/removed/used counters for one element class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStats {
    /// Elements added to the output document.
    pub added: u64,
    /// Elements removed from the output document.
    pub removed: u64,
    /// Elements observed in at least one replayed message.
    pub used: u64,
}

impl ElementStats {
    /// Returns true if no counter moved.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.used == 0
    }
}

impl fmt::Display for ElementStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added {}, removed {}, used {}",
            self.added, self.removed, self.used
        )
    }
}

/// Summary statistics for one analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Message element counters.
    pub messages: ElementStats,
    /// Scenario counters (non-base message variants).
    pub scenarios: ElementStats,
    /// Field element counters (definitions and references).
    pub fields: ElementStats,
    /// Component element counters.
    pub components: ElementStats,
    /// Group element counters.
    pub groups: ElementStats,
    /// Code element counters.
    pub codes: ElementStats,
    /// User-defined fields first seen in the logs.
    pub user_defined_fields: u64,
    /// Messages that could not be framed or classified.
    pub bad_messages: u64,
    /// Messages successfully replayed.
    pub replayed_messages: u64,
}

impl RunStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a second pass over identical input would report this:
    /// nothing added and nothing removed anywhere.
    #[must_use]
    pub const fn is_fixed_point(&self) -> bool {
        self.messages.added == 0
            && self.messages.removed == 0
            && self.scenarios.added == 0
            && self.scenarios.removed == 0
            && self.fields.added == 0
            && self.fields.removed == 0
            && self.components.added == 0
            && self.components.removed == 0
            && self.groups.added == 0
            && self.groups.removed == 0
            && self.codes.added == 0
            && self.codes.removed == 0
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "messages:   {}", self.messages)?;
        writeln!(f, "scenarios:  {}", self.scenarios)?;
        writeln!(f, "fields:     {}", self.fields)?;
        writeln!(f, "components: {}", self.components)?;
        writeln!(f, "groups:     {}", self.groups)?;
        writeln!(f, "codes:      {}", self.codes)?;
        writeln!(f, "user-defined fields: {}", self.user_defined_fields)?;
        writeln!(f, "replayed messages:   {}", self.replayed_messages)?;
        write!(f, "bad messages:        {}", self.bad_messages)
    }
}
