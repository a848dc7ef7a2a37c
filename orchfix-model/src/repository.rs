/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! The schema repository.
//!
//! Five keyed collections — fields, codesets, components, groups, messages —
//! each addressed by (name, scenario) with auxiliary (id, scenario) indices.
//! Messages are additionally indexed by msgType and groups by their
//! repeat-counter field id. Structure nodes live in one arena and are
//! addressed by [`StructKey`] handles, so parent back-references never form
//! an ownership cycle.

use crate::field::{Codeset, FieldDef, DATATYPE_LENGTH};
use crate::structure::{StructKey, StructureKind, StructureMember, StructureModel};
use orchfix_core::field::BASE_SCENARIO;
use std::collections::HashMap;

/// The in-memory schema model.
#[derive(Debug, Default)]
pub struct Repository {
    /// Structure arena; handles index into it.
    structures: Vec<StructureModel>,
    fields: Vec<FieldDef>,
    codesets: Vec<Codeset>,

    field_by_key: HashMap<(String, String), usize>,
    field_by_id: HashMap<(u32, String), usize>,
    codeset_by_key: HashMap<(String, String), usize>,
    codeset_by_id: HashMap<(u32, String), usize>,

    messages_by_key: HashMap<(String, String), StructKey>,
    messages_by_id: HashMap<(u32, String), StructKey>,
    messages_by_type: HashMap<String, Vec<StructKey>>,
    components_by_key: HashMap<(String, String), StructKey>,
    components_by_id: HashMap<(u32, String), StructKey>,
    groups_by_key: HashMap<(String, String), StructKey>,
    groups_by_id: HashMap<(u32, String), StructKey>,
    groups_by_counter: HashMap<(u32, String), StructKey>,

    /// Component id of the standard header, shared by every scenario.
    header_id: Option<u32>,
    /// Component id of the standard trailer, shared by every scenario.
    trailer_id: Option<u32>,
}

impl Repository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- fields ------------------------------------------------------

    /// Adds a field definition, returning its slot.
    pub fn add_field(&mut self, field: FieldDef) -> usize {
        let slot = self.fields.len();
        self.field_by_key
            .insert((field.name.clone(), field.scenario.clone()), slot);
        self.field_by_id
            .insert((field.id, field.scenario.clone()), slot);
        self.fields.push(field);
        slot
    }

    /// Returns all field definitions.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns the field definition in a slot.
    #[must_use]
    pub fn field_at(&self, slot: usize) -> &FieldDef {
        &self.fields[slot]
    }

    /// Returns the field definition in a slot, mutably.
    pub fn field_at_mut(&mut self, slot: usize) -> &mut FieldDef {
        &mut self.fields[slot]
    }

    /// Looks up a field by (name, scenario).
    #[must_use]
    pub fn field(&self, name: &str, scenario: &str) -> Option<&FieldDef> {
        self.field_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .map(|&slot| &self.fields[slot])
    }

    /// Looks up a field by (id, scenario).
    #[must_use]
    pub fn field_by_id(&self, id: u32, scenario: &str) -> Option<&FieldDef> {
        self.field_by_id
            .get(&(id, scenario.to_string()))
            .map(|&slot| &self.fields[slot])
    }

    /// Looks up a field by (id, scenario), mutably.
    pub fn field_by_id_mut(&mut self, id: u32, scenario: &str) -> Option<&mut FieldDef> {
        self.field_by_id
            .get(&(id, scenario.to_string()))
            .map(|&slot| &mut self.fields[slot])
    }

    /// Returns the ids of all base-scenario fields with the given datatype.
    #[must_use]
    pub fn field_ids_of_datatype(&self, datatype: &str) -> Vec<u32> {
        self.fields
            .iter()
            .filter(|f| f.scenario == BASE_SCENARIO && f.datatype == datatype)
            .map(|f| f.id)
            .collect()
    }

    /// Returns the ids of all length-type fields, excluding tag 9: the
    /// message length frames the whole message, not a raw-data value.
    #[must_use]
    pub fn data_length_field_ids(&self) -> Vec<u32> {
        self.field_ids_of_datatype(DATATYPE_LENGTH)
            .into_iter()
            .filter(|&id| id != 9)
            .collect()
    }

    /// Ensures a field definition exists for (id, scenario), cloning the
    /// base definition — and its codeset — on first use. Returns the slot,
    /// or `None` when the id has no definition in any reachable scenario.
    pub fn specialize_field(&mut self, id: u32, scenario: &str) -> Option<usize> {
        if let Some(&slot) = self.field_by_id.get(&(id, scenario.to_string())) {
            return Some(slot);
        }
        let base_slot = *self.field_by_id.get(&(id, BASE_SCENARIO.to_string()))?;
        let clone = self.fields[base_slot].clone_for_scenario(scenario);
        let datatype = clone.datatype.clone();
        let slot = self.add_field(clone);

        // An enumerated field drags its codeset into the scenario with it.
        if self
            .codeset_by_key
            .get(&(datatype.clone(), scenario.to_string()))
            .is_none()
        {
            if let Some(&set_slot) = self
                .codeset_by_key
                .get(&(datatype, BASE_SCENARIO.to_string()))
            {
                let set_clone = self.codesets[set_slot].clone_for_scenario(scenario);
                self.add_codeset(set_clone);
            }
        }
        Some(slot)
    }

    // ---- codesets ----------------------------------------------------

    /// Adds a codeset, returning its slot.
    pub fn add_codeset(&mut self, set: Codeset) -> usize {
        let slot = self.codesets.len();
        self.codeset_by_key
            .insert((set.name.clone(), set.scenario.clone()), slot);
        self.codeset_by_id.insert((set.id, set.scenario.clone()), slot);
        self.codesets.push(set);
        slot
    }

    /// Returns all codesets.
    #[must_use]
    pub fn codesets(&self) -> &[Codeset] {
        &self.codesets
    }

    /// Looks up a codeset by (name, scenario).
    #[must_use]
    pub fn codeset(&self, name: &str, scenario: &str) -> Option<&Codeset> {
        self.codeset_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .map(|&slot| &self.codesets[slot])
    }

    /// Looks up a codeset by (id, scenario).
    #[must_use]
    pub fn codeset_by_id(&self, id: u32, scenario: &str) -> Option<&Codeset> {
        self.codeset_by_id
            .get(&(id, scenario.to_string()))
            .map(|&slot| &self.codesets[slot])
    }

    /// Looks up a codeset by (name, scenario), mutably.
    pub fn codeset_mut(&mut self, name: &str, scenario: &str) -> Option<&mut Codeset> {
        self.codeset_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .map(|&slot| &mut self.codesets[slot])
    }

    /// Looks up the codeset a field's values resolve against: the field's
    /// scenario first, then base.
    #[must_use]
    pub fn codeset_for(&self, datatype: &str, scenario: &str) -> Option<&Codeset> {
        self.codeset(datatype, scenario)
            .or_else(|| self.codeset(datatype, BASE_SCENARIO))
    }

    /// Like [`Self::codeset_for`], mutably.
    pub fn codeset_for_mut(&mut self, datatype: &str, scenario: &str) -> Option<&mut Codeset> {
        let slot = self
            .codeset_by_key
            .get(&(datatype.to_string(), scenario.to_string()))
            .or_else(|| {
                self.codeset_by_key
                    .get(&(datatype.to_string(), BASE_SCENARIO.to_string()))
            })
            .copied()?;
        Some(&mut self.codesets[slot])
    }

    // ---- structures --------------------------------------------------

    /// Registers a structure in the arena, fixing member parent handles and
    /// all indices. Returns its handle.
    pub fn add_structure(&mut self, mut structure: StructureModel) -> StructKey {
        let key = StructKey::new(self.structures.len() as u32);
        for member in &mut structure.members {
            member.set_parent(key);
        }
        if let StructureKind::Group { num_in_group } = &mut structure.kind {
            num_in_group.parent = Some(key);
        }

        let by_key = (structure.name.clone(), structure.scenario.clone());
        let by_id = (structure.id, structure.scenario.clone());
        match &structure.kind {
            StructureKind::Message { msg_type, .. } => {
                self.messages_by_key.insert(by_key, key);
                self.messages_by_id.insert(by_id, key);
                self.messages_by_type
                    .entry(msg_type.clone())
                    .or_default()
                    .push(key);
            }
            StructureKind::Component => {
                self.components_by_key.insert(by_key, key);
                self.components_by_id.insert(by_id, key);
            }
            StructureKind::Group { num_in_group } => {
                self.groups_by_counter
                    .insert((num_in_group.id, structure.scenario.clone()), key);
                self.groups_by_key.insert(by_key, key);
                self.groups_by_id.insert(by_id, key);
            }
        }

        self.structures.push(structure);
        key
    }

    /// Returns all structures in arena order.
    #[must_use]
    pub fn structures(&self) -> &[StructureModel] {
        &self.structures
    }

    /// Returns the structure behind a handle.
    #[must_use]
    pub fn structure(&self, key: StructKey) -> &StructureModel {
        &self.structures[key.index()]
    }

    /// Returns the structure behind a handle, mutably.
    pub fn structure_mut(&mut self, key: StructKey) -> &mut StructureModel {
        &mut self.structures[key.index()]
    }

    /// Looks up a message by (name, scenario).
    #[must_use]
    pub fn message(&self, name: &str, scenario: &str) -> Option<StructKey> {
        self.messages_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .copied()
    }

    /// Returns every message model registered for a msgType.
    #[must_use]
    pub fn messages_by_type(&self, msg_type: &str) -> &[StructKey] {
        self.messages_by_type
            .get(msg_type)
            .map_or(&[], Vec::as_slice)
    }

    /// Looks up a component by (name, scenario).
    #[must_use]
    pub fn component(&self, name: &str, scenario: &str) -> Option<StructKey> {
        self.components_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .copied()
    }

    /// Looks up a group by (name, scenario).
    #[must_use]
    pub fn group(&self, name: &str, scenario: &str) -> Option<StructKey> {
        self.groups_by_key
            .get(&(name.to_string(), scenario.to_string()))
            .copied()
    }

    /// Looks up a component by (id, scenario).
    #[must_use]
    pub fn component_by_id(&self, id: u32, scenario: &str) -> Option<StructKey> {
        self.components_by_id.get(&(id, scenario.to_string())).copied()
    }

    /// Looks up a group by (id, scenario).
    #[must_use]
    pub fn group_by_id(&self, id: u32, scenario: &str) -> Option<StructKey> {
        self.groups_by_id.get(&(id, scenario.to_string())).copied()
    }

    /// Looks up a component by (id, scenario), falling back to base. This
    /// is the resolution rule for references: the shared header and trailer
    /// keep base-scenario references everywhere.
    #[must_use]
    pub fn resolve_component(&self, id: u32, scenario: &str) -> Option<StructKey> {
        self.component_by_id(id, scenario)
            .or_else(|| self.component_by_id(id, BASE_SCENARIO))
    }

    /// Looks up a group by (id, scenario), falling back to base.
    #[must_use]
    pub fn resolve_group(&self, id: u32, scenario: &str) -> Option<StructKey> {
        self.group_by_id(id, scenario)
            .or_else(|| self.group_by_id(id, BASE_SCENARIO))
    }

    /// Looks up a group by its repeat-counter field id.
    #[must_use]
    pub fn group_by_counter(&self, counter_id: u32, scenario: &str) -> Option<StructKey> {
        self.groups_by_counter
            .get(&(counter_id, scenario.to_string()))
            .copied()
    }

    /// Returns the highest message id in use, 0 when none.
    #[must_use]
    pub fn max_message_id(&self) -> u32 {
        self.structures
            .iter()
            .filter(|s| s.is_message())
            .map(|s| s.id)
            .max()
            .unwrap_or(0)
    }

    // ---- standard header / trailer ----------------------------------

    /// Designates the standard header component id.
    pub fn set_header_id(&mut self, id: u32) {
        self.header_id = Some(id);
    }

    /// Designates the standard trailer component id.
    pub fn set_trailer_id(&mut self, id: u32) {
        self.trailer_id = Some(id);
    }

    /// Returns true if the id names the shared standard header or trailer.
    #[must_use]
    pub const fn is_shared(&self, id: u32) -> bool {
        matches!(self.header_id, Some(h) if h == id)
            || matches!(self.trailer_id, Some(t) if t == id)
    }

    // ---- scenario cloning -------------------------------------------

    /// Clones a structure into another scenario and returns the clone's
    /// handle.
    ///
    /// The copy is deep: members are cloned with zeroed usage counts, and
    /// referenced components and groups are cloned transitively so every
    /// reference resolves within the new scenario. The standard header and
    /// trailer are never duplicated — the shared object's handle is
    /// returned and references to it stay in the base scenario.
    pub fn clone_for_scenario(&mut self, key: StructKey, scenario: &str) -> StructKey {
        let source = &self.structures[key.index()];
        if !source.is_message() && self.is_shared(source.id) {
            return key;
        }

        let lookup = (source.name.clone(), scenario.to_string());
        let existing = match &source.kind {
            StructureKind::Message { .. } => self.messages_by_key.get(&lookup),
            StructureKind::Component => self.components_by_key.get(&lookup),
            StructureKind::Group { .. } => self.groups_by_key.get(&lookup),
        };
        if let Some(&existing) = existing {
            return existing;
        }

        let clone = source.clone_for_scenario(scenario);
        let new_key = self.add_structure(clone);

        // Retarget component and group references, cloning their targets
        // into the scenario first.
        let referenced: Vec<(usize, bool, u32, String)> = self.structures[new_key.index()]
            .members
            .iter()
            .enumerate()
            .filter_map(|(slot, member)| match member {
                StructureMember::Component(c) => {
                    Some((slot, false, c.id, c.scenario.clone()))
                }
                StructureMember::Group(g) => Some((slot, true, g.id, g.scenario.clone())),
                StructureMember::Field(_) => None,
            })
            .collect();

        for (slot, is_group, id, source_scenario) in referenced {
            if self.is_shared(id) {
                self.structures[new_key.index()].members[slot].set_scenario(BASE_SCENARIO);
                continue;
            }
            let target = if is_group {
                self.group_by_id(id, &source_scenario)
                    .or_else(|| self.group_by_id(id, BASE_SCENARIO))
            } else {
                self.component_by_id(id, &source_scenario)
                    .or_else(|| self.component_by_id(id, BASE_SCENARIO))
            };
            if let Some(target) = target {
                self.clone_for_scenario(target, scenario);
            }
            self.structures[new_key.index()].members[slot].set_scenario(scenario);
        }

        new_key
    }
}
