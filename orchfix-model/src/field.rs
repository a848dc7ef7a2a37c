/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Field and code definitions.
//!
//! This module defines the leaf elements of the schema model:
//! - [`FieldDef`]: a field definition keyed by (name, scenario) and
//!   (id, scenario)
//! - [`Codeset`] / [`Code`]: enumerated values associated with a field's
//!   datatype
//! - [`Presence`]: the presence annotation carried by structure members

use orchfix_core::field::BASE_SCENARIO;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Datatype name that marks length-type fields. Fields of this datatype
/// announce the byte length of the following raw-data field.
pub const DATATYPE_LENGTH: &str = "Length";

/// Datatype assigned to fields synthesized for unknown tags.
pub const DEFAULT_DATATYPE: &str = "String";

/// Presence annotation on a structure member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    /// The member may appear.
    #[default]
    Optional,
    /// The member must appear.
    Required,
    /// The member must not appear.
    Forbidden,
    /// The member is ignored when it appears.
    Ignored,
    /// The member carries a constant value.
    Constant,
}

impl Presence {
    /// Parses a presence attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "optional" => Self::Optional,
            "required" => Self::Required,
            "forbidden" => Self::Forbidden,
            "ignored" => Self::Ignored,
            "constant" => Self::Constant,
            _ => return None,
        })
    }

    /// Returns the attribute value for this presence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Forbidden => "forbidden",
            Self::Ignored => "ignored",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Definition of a FIX field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field tag number.
    pub id: u32,
    /// Field name.
    pub name: String,
    /// Field datatype; names a codeset when the field is enumerated.
    pub datatype: String,
    /// Scenario this definition belongs to.
    pub scenario: String,
    /// Times the field was observed under this scenario.
    pub uses: u64,
}

impl FieldDef {
    /// Creates a base-scenario field definition.
    ///
    /// # Arguments
    /// * `id` - The field tag number
    /// * `name` - The field name
    /// * `datatype` - The field datatype
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            datatype: datatype.into(),
            scenario: BASE_SCENARIO.to_string(),
            uses: 0,
        }
    }

    /// Sets the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Synthesizes a definition for a tag never declared in the reference
    /// document.
    #[must_use]
    pub fn synthetic(id: u32) -> Self {
        Self::new(id, format!("Field{id}"), DEFAULT_DATATYPE)
    }

    /// Clones this definition into another scenario with a zeroed usage
    /// count. The id is preserved.
    #[must_use]
    pub fn clone_for_scenario(&self, scenario: &str) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            datatype: self.datatype.clone(),
            scenario: scenario.to_string(),
            uses: 0,
        }
    }
}

/// One enumerated value of a codeset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Code {
    /// Code name.
    pub name: String,
    /// Wire value.
    pub value: String,
    /// Times the value was observed.
    pub uses: u64,
    /// Whether the code is flagged supported.
    pub supported: bool,
}

impl Code {
    /// Creates a code.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            uses: 0,
            supported: true,
        }
    }

    /// Creates a code for a value observed in the logs but absent from the
    /// reference document. The raw value doubles as the name.
    #[must_use]
    pub fn ad_hoc(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }
}

/// An enumerated value set, keyed by (name, scenario).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Codeset {
    /// Codeset id.
    pub id: u32,
    /// Codeset name; fields reference it through their datatype.
    pub name: String,
    /// Underlying wire datatype of the values.
    pub datatype: String,
    /// Scenario this set belongs to.
    pub scenario: String,
    /// Codes, looked up by name or by value.
    pub codes: Vec<Code>,
}

impl Codeset {
    /// Creates an empty base-scenario codeset.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            datatype: datatype.into(),
            scenario: BASE_SCENARIO.to_string(),
            codes: Vec::new(),
        }
    }

    /// Sets the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Adds a code.
    pub fn add_code(&mut self, code: Code) {
        self.codes.push(code);
    }

    /// Looks up a code by wire value.
    #[must_use]
    pub fn code_by_value(&self, value: &str) -> Option<&Code> {
        self.codes.iter().find(|c| c.value == value)
    }

    /// Looks up a code by wire value, mutably.
    pub fn code_by_value_mut(&mut self, value: &str) -> Option<&mut Code> {
        self.codes.iter_mut().find(|c| c.value == value)
    }

    /// Looks up a code by name.
    #[must_use]
    pub fn code_by_name(&self, name: &str) -> Option<&Code> {
        self.codes.iter().find(|c| c.name == name)
    }

    /// Returns the sum of all code usage counts.
    #[must_use]
    pub fn total_uses(&self) -> u64 {
        self.codes.iter().map(|c| c.uses).sum()
    }

    /// Clones this set into another scenario, zeroing every usage count.
    #[must_use]
    pub fn clone_for_scenario(&self, scenario: &str) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            datatype: self.datatype.clone(),
            scenario: scenario.to_string(),
            codes: self
                .codes
                .iter()
                .map(|c| Code {
                    name: c.name.clone(),
                    value: c.value.clone(),
                    uses: 0,
                    supported: c.supported,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_round_trip() {
        for p in [
            Presence::Optional,
            Presence::Required,
            Presence::Forbidden,
            Presence::Ignored,
            Presence::Constant,
        ] {
            assert_eq!(Presence::parse(p.as_str()), Some(p));
        }
        assert_eq!(Presence::parse("sometimes"), None);
    }

    #[test]
    fn test_field_clone_resets_uses() {
        let mut field = FieldDef::new(150, "ExecType", "ExecTypeCodeSet");
        field.uses = 12;
        let clone = field.clone_for_scenario("ExecType-Trade");

        assert_eq!(clone.id, 150);
        assert_eq!(clone.scenario, "ExecType-Trade");
        assert_eq!(clone.uses, 0);
        assert_eq!(field.uses, 12);
    }

    #[test]
    fn test_synthetic_field() {
        let field = FieldDef::synthetic(5042);
        assert_eq!(field.name, "Field5042");
        assert_eq!(field.datatype, DEFAULT_DATATYPE);
        assert_eq!(field.scenario, BASE_SCENARIO);
    }

    #[test]
    fn test_codeset_lookups() {
        let mut set = Codeset::new(150, "ExecTypeCodeSet", "char");
        set.add_code(Code::new("Trade", "F"));
        set.add_code(Code::new("New", "0"));

        assert_eq!(set.code_by_value("F").unwrap().name, "Trade");
        assert_eq!(set.code_by_name("New").unwrap().value, "0");
        assert!(set.code_by_value("9").is_none());
    }

    #[test]
    fn test_codeset_clone_zeroes_codes() {
        let mut set = Codeset::new(150, "ExecTypeCodeSet", "char");
        let mut code = Code::new("Trade", "F");
        code.uses = 7;
        set.add_code(code);

        let clone = set.clone_for_scenario("Fills");
        assert_eq!(clone.scenario, "Fills");
        assert_eq!(clone.code_by_value("F").unwrap().uses, 0);
        assert_eq!(set.total_uses(), 7);
    }
}
