/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Structures and their members.
//!
//! This module defines:
//! - [`StructKey`]: opaque handle addressing a structure in the repository
//!   arena
//! - [`StructureMember`]: the field/component/group reference variants
//! - [`StructureModel`]: a message, component or repeating group with its
//!   ordered member list

use crate::field::Presence;
use orchfix_core::field::BASE_SCENARIO;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a structure stored in the repository arena.
///
/// Handles stay valid for the lifetime of the repository; structures are
/// never removed from the arena, only omitted from output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct StructKey(u32);

impl StructKey {
    /// Creates a handle from an arena index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StructKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Member kind discriminant, aligned with the document element names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// A field reference.
    Field,
    /// A component reference.
    Component,
    /// A group reference.
    Group,
}

impl MemberKind {
    /// Returns the document element local name for this kind.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::Field => "fieldRef",
            Self::Component => "componentRef",
            Self::Group => "groupRef",
        }
    }

    /// Parses a document element local name.
    #[must_use]
    pub fn from_element_name(name: &str) -> Option<Self> {
        Some(match name {
            "fieldRef" => Self::Field,
            "componentRef" => Self::Component,
            "groupRef" => Self::Group,
            _ => return None,
        })
    }
}

/// Reference to a field within a structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRef {
    /// Referenced field id.
    pub id: u32,
    /// Scenario the reference resolves in.
    pub scenario: String,
    /// Presence annotation.
    pub presence: Presence,
    /// Whether the reference is flagged supported.
    pub supported: bool,
    /// Times the field was observed at this position.
    pub uses: u64,
    /// Handle of the owning structure. Non-owning back-reference.
    pub parent: Option<StructKey>,
}

impl FieldRef {
    /// Creates an optional field reference in the given scenario.
    #[must_use]
    pub fn new(id: u32, scenario: impl Into<String>) -> Self {
        Self {
            id,
            scenario: scenario.into(),
            presence: Presence::Optional,
            supported: true,
            uses: 0,
            parent: None,
        }
    }

    /// Sets the presence annotation.
    #[must_use]
    pub const fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }
}

/// Reference to a component within a structure. Resolves lazily by
/// (id, scenario) against the repository's component collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Referenced component id.
    pub id: u32,
    /// Scenario the reference resolves in.
    pub scenario: String,
    /// Presence annotation.
    pub presence: Presence,
    /// Whether the reference is flagged supported.
    pub supported: bool,
    /// Times a field was observed through this reference.
    pub uses: u64,
    /// Handle of the owning structure. Non-owning back-reference.
    pub parent: Option<StructKey>,
}

impl ComponentRef {
    /// Creates an optional component reference in the given scenario.
    #[must_use]
    pub fn new(id: u32, scenario: impl Into<String>) -> Self {
        Self {
            id,
            scenario: scenario.into(),
            presence: Presence::Optional,
            supported: true,
            uses: 0,
            parent: None,
        }
    }
}

/// Reference to a repeating group within a structure. Resolves lazily by
/// (id, scenario) against the repository's group collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRef {
    /// Referenced group id.
    pub id: u32,
    /// Scenario the reference resolves in.
    pub scenario: String,
    /// Presence annotation.
    pub presence: Presence,
    /// Whether the reference is flagged supported.
    pub supported: bool,
    /// Times a field was observed through this reference.
    pub uses: u64,
    /// Handle of the owning structure. Non-owning back-reference.
    pub parent: Option<StructKey>,
}

impl GroupRef {
    /// Creates an optional group reference in the given scenario.
    #[must_use]
    pub fn new(id: u32, scenario: impl Into<String>) -> Self {
        Self {
            id,
            scenario: scenario.into(),
            presence: Presence::Optional,
            supported: true,
            uses: 0,
            parent: None,
        }
    }
}

/// One member of a structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StructureMember {
    /// A field reference.
    Field(FieldRef),
    /// A component reference.
    Component(ComponentRef),
    /// A group reference.
    Group(GroupRef),
}

impl StructureMember {
    /// Returns the referenced element id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        match self {
            Self::Field(m) => m.id,
            Self::Component(m) => m.id,
            Self::Group(m) => m.id,
        }
    }

    /// Returns the member kind.
    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        match self {
            Self::Field(_) => MemberKind::Field,
            Self::Component(_) => MemberKind::Component,
            Self::Group(_) => MemberKind::Group,
        }
    }

    /// Returns the scenario the reference resolves in.
    #[must_use]
    pub fn scenario(&self) -> &str {
        match self {
            Self::Field(m) => &m.scenario,
            Self::Component(m) => &m.scenario,
            Self::Group(m) => &m.scenario,
        }
    }

    /// Replaces the scenario the reference resolves in.
    pub fn set_scenario(&mut self, scenario: &str) {
        let target = match self {
            Self::Field(m) => &mut m.scenario,
            Self::Component(m) => &mut m.scenario,
            Self::Group(m) => &mut m.scenario,
        };
        *target = scenario.to_string();
    }

    /// Returns the usage count.
    #[must_use]
    pub const fn uses(&self) -> u64 {
        match self {
            Self::Field(m) => m.uses,
            Self::Component(m) => m.uses,
            Self::Group(m) => m.uses,
        }
    }

    /// Records one observation.
    pub fn add_use(&mut self) {
        match self {
            Self::Field(m) => m.uses += 1,
            Self::Component(m) => m.uses += 1,
            Self::Group(m) => m.uses += 1,
        }
    }

    /// Zeroes the usage count.
    pub fn reset_uses(&mut self) {
        match self {
            Self::Field(m) => m.uses = 0,
            Self::Component(m) => m.uses = 0,
            Self::Group(m) => m.uses = 0,
        }
    }

    /// Returns the presence annotation.
    #[must_use]
    pub const fn presence(&self) -> Presence {
        match self {
            Self::Field(m) => m.presence,
            Self::Component(m) => m.presence,
            Self::Group(m) => m.presence,
        }
    }

    /// Returns the owning structure handle.
    #[must_use]
    pub const fn parent(&self) -> Option<StructKey> {
        match self {
            Self::Field(m) => m.parent,
            Self::Component(m) => m.parent,
            Self::Group(m) => m.parent,
        }
    }

    /// Sets the owning structure handle.
    pub fn set_parent(&mut self, parent: StructKey) {
        let target = match self {
            Self::Field(m) => &mut m.parent,
            Self::Component(m) => &mut m.parent,
            Self::Group(m) => &mut m.parent,
        };
        *target = Some(parent);
    }
}

/// Kind-specific payload of a structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StructureKind {
    /// A message.
    Message {
        /// MsgType wire value (tag 35).
        msg_type: String,
        /// Key-field code names derived from the scenario name, cached on
        /// first classification.
        key_values: Option<Vec<Option<String>>>,
    },
    /// A reusable component.
    Component,
    /// A repeating group.
    Group {
        /// Synthesized reference for the repeat-counter field.
        num_in_group: FieldRef,
    },
}

impl StructureKind {
    /// Returns the document element local name for this kind.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Component => "component",
            Self::Group { .. } => "group",
        }
    }
}

/// A message, component or repeating group with its ordered members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureModel {
    /// Structure id.
    pub id: u32,
    /// Structure name.
    pub name: String,
    /// Scenario this structure belongs to.
    pub scenario: String,
    /// Owned ordered member list.
    pub members: Vec<StructureMember>,
    /// Times the structure participated in a replayed message.
    pub uses: u64,
    /// Kind-specific payload.
    pub kind: StructureKind,
}

impl StructureModel {
    /// Creates a base-scenario message.
    #[must_use]
    pub fn message(id: u32, name: impl Into<String>, msg_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scenario: BASE_SCENARIO.to_string(),
            members: Vec::new(),
            uses: 0,
            kind: StructureKind::Message {
                msg_type: msg_type.into(),
                key_values: None,
            },
        }
    }

    /// Creates a base-scenario component.
    #[must_use]
    pub fn component(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scenario: BASE_SCENARIO.to_string(),
            members: Vec::new(),
            uses: 0,
            kind: StructureKind::Component,
        }
    }

    /// Creates a base-scenario repeating group, synthesizing the field
    /// reference for its repeat-counter field.
    #[must_use]
    pub fn group(id: u32, name: impl Into<String>, counter_id: u32) -> Self {
        Self {
            id,
            name: name.into(),
            scenario: BASE_SCENARIO.to_string(),
            members: Vec::new(),
            uses: 0,
            kind: StructureKind::Group {
                num_in_group: FieldRef::new(counter_id, BASE_SCENARIO),
            },
        }
    }

    /// Sets the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Appends a member.
    pub fn push_member(&mut self, member: StructureMember) {
        self.members.push(member);
    }

    /// Returns the MsgType value for messages.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        match &self.kind {
            StructureKind::Message { msg_type, .. } => Some(msg_type),
            _ => None,
        }
    }

    /// Returns the repeat-counter field id for groups.
    #[must_use]
    pub fn counter_id(&self) -> Option<u32> {
        match &self.kind {
            StructureKind::Group { num_in_group } => Some(num_in_group.id),
            _ => None,
        }
    }

    /// Returns the id of the first member, the group delimiter by FIX
    /// convention.
    #[must_use]
    pub fn first_member_id(&self) -> Option<u32> {
        self.members.first().map(StructureMember::id)
    }

    /// Returns true for messages.
    #[must_use]
    pub const fn is_message(&self) -> bool {
        matches!(self.kind, StructureKind::Message { .. })
    }

    /// Returns true for groups.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self.kind, StructureKind::Group { .. })
    }

    /// Looks up a member by kind and referenced id.
    #[must_use]
    pub fn member(&self, kind: MemberKind, id: u32) -> Option<&StructureMember> {
        self.members
            .iter()
            .find(|m| m.kind() == kind && m.id() == id)
    }

    /// Clones this structure into another scenario: usage counts are
    /// zeroed, the id is preserved, field references move to the new
    /// scenario. Component and group references keep their source scenario;
    /// the repository retargets them after registering their own clones.
    #[must_use]
    pub fn clone_for_scenario(&self, scenario: &str) -> Self {
        let mut clone = self.clone();
        clone.scenario = scenario.to_string();
        clone.uses = 0;
        for member in &mut clone.members {
            member.reset_uses();
            if matches!(member, StructureMember::Field(_)) {
                member.set_scenario(scenario);
            }
        }
        match &mut clone.kind {
            StructureKind::Message { key_values, .. } => *key_values = None,
            StructureKind::Group { num_in_group } => {
                num_in_group.uses = 0;
                num_in_group.scenario = scenario.to_string();
            }
            StructureKind::Component => {}
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_accessors() {
        let mut member = StructureMember::Field(FieldRef::new(55, BASE_SCENARIO));
        assert_eq!(member.id(), 55);
        assert_eq!(member.kind(), MemberKind::Field);
        assert_eq!(member.uses(), 0);

        member.add_use();
        member.add_use();
        assert_eq!(member.uses(), 2);

        member.set_parent(StructKey::new(3));
        assert_eq!(member.parent(), Some(StructKey::new(3)));
    }

    #[test]
    fn test_member_kind_element_names() {
        assert_eq!(MemberKind::Field.element_name(), "fieldRef");
        assert_eq!(
            MemberKind::from_element_name("groupRef"),
            Some(MemberKind::Group)
        );
        assert_eq!(MemberKind::from_element_name("field"), None);
    }

    #[test]
    fn test_group_counter() {
        let group = StructureModel::group(2010, "Parties", 453);
        assert_eq!(group.counter_id(), Some(453));
        assert!(group.is_group());
        assert!(!group.is_message());
    }

    #[test]
    fn test_clone_for_scenario() {
        let mut msg = StructureModel::message(9, "ExecutionReport", "8");
        msg.uses = 4;
        let mut field = FieldRef::new(150, BASE_SCENARIO);
        field.uses = 4;
        msg.push_member(StructureMember::Field(field));
        msg.push_member(StructureMember::Component(ComponentRef::new(
            1000,
            BASE_SCENARIO,
        )));

        let clone = msg.clone_for_scenario("ExecType-Trade");
        assert_eq!(clone.scenario, "ExecType-Trade");
        assert_eq!(clone.uses, 0);
        assert_eq!(clone.members[0].uses(), 0);
        assert_eq!(clone.members[0].scenario(), "ExecType-Trade");
        // Component references are retargeted by the repository, not here.
        assert_eq!(clone.members[1].scenario(), BASE_SCENARIO);
        assert_eq!(msg.uses, 4);
    }
}
