/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Scenario classification.
//!
//! Each replayed message is matched to a scenario of its message
//! definition. The key-field values extracted from the instance — mapped
//! to code names through the base codesets — are compared against the
//! key-value vector each candidate scenario's name encodes. The first
//! exact match wins; with no match, the base scenario is cloned under a
//! newly generated name.

use crate::keys::KeyFieldConfig;
use orchfix_core::field::BASE_SCENARIO;
use orchfix_core::stats::RunStats;
use orchfix_core::MessageInstance;
use orchfix_model::scenario;
use orchfix_model::{Repository, StructKey, StructureKind, StructureModel};
use tracing::debug;

/// Classifies message instances into message-model scenarios.
#[derive(Debug)]
pub struct ScenarioClassifier {
    keys: KeyFieldConfig,
}

impl ScenarioClassifier {
    /// Creates a classifier over a key-field configuration.
    #[must_use]
    pub fn new(keys: KeyFieldConfig) -> Self {
        Self { keys }
    }

    /// Resolves the message model the instance belongs to, deriving a new
    /// scenario or creating an empty base model when needed.
    ///
    /// # Arguments
    /// * `repo` - The repository to search and grow
    /// * `msg_type` - The instance's msgType
    /// * `instance` - The message instance
    /// * `stats` - Run statistics, for the scenario-added counter
    pub fn classify(
        &self,
        repo: &mut Repository,
        msg_type: &str,
        instance: &MessageInstance,
        stats: &mut RunStats,
    ) -> StructKey {
        let Some(key_ids) = self.keys.get(msg_type) else {
            // No key for this msgType: everything lands in base.
            return self.base_model(repo, msg_type);
        };
        let key_ids = key_ids.to_vec();

        let extracted: Vec<Option<String>> = key_ids
            .iter()
            .map(|&id| {
                instance
                    .value_of(id)
                    .map(|value| code_name(repo, id, value))
            })
            .collect();

        let candidates: Vec<StructKey> = repo.messages_by_type(msg_type).to_vec();
        for &candidate in &candidates {
            if self.key_values(repo, candidate, &key_ids) == extracted {
                return candidate;
            }
        }

        // No scenario matches this key tuple: derive one from base.
        let base = candidates
            .iter()
            .find(|&&key| repo.structure(key).scenario == BASE_SCENARIO)
            .copied()
            .or_else(|| candidates.first().copied())
            .unwrap_or_else(|| self.base_model(repo, msg_type));

        let parts: Vec<(String, Option<String>)> = key_ids
            .iter()
            .zip(extracted.iter())
            .map(|(&id, value)| (field_name(repo, id), value.clone()))
            .collect();
        let name = scenario::generate_name(&parts);

        let clone = repo.clone_for_scenario(base, &name);
        if let StructureKind::Message { key_values, .. } = &mut repo.structure_mut(clone).kind {
            *key_values = Some(extracted);
        }
        stats.scenarios.added += 1;
        debug!(msg_type, scenario = %name, "derived message scenario");
        clone
    }

    /// Returns the base model for a msgType, creating an empty one named
    /// after the msgType on first sight.
    fn base_model(&self, repo: &mut Repository, msg_type: &str) -> StructKey {
        let existing = repo
            .messages_by_type(msg_type)
            .iter()
            .find(|&&key| repo.structure(key).scenario == BASE_SCENARIO)
            .copied();
        if let Some(key) = existing {
            return key;
        }

        let id = repo.max_message_id() + 1;
        debug!(msg_type, id, "creating message model for unknown msgType");
        repo.add_structure(StructureModel::message(id, msg_type, msg_type))
    }

    /// Returns the key-value vector a candidate's scenario name encodes,
    /// computing and caching it on first use.
    fn key_values(
        &self,
        repo: &mut Repository,
        candidate: StructKey,
        key_ids: &[u32],
    ) -> Vec<Option<String>> {
        if let StructureKind::Message {
            key_values: Some(cached),
            ..
        } = &repo.structure(candidate).kind
        {
            return cached.clone();
        }

        let field_names: Vec<String> = key_ids.iter().map(|&id| field_name(repo, id)).collect();
        let name = repo.structure(candidate).scenario.clone();
        let derived = scenario::parse_name(&name, &field_names);

        if let StructureKind::Message { key_values, .. } =
            &mut repo.structure_mut(candidate).kind
        {
            *key_values = Some(derived.clone());
        }
        derived
    }
}

/// Maps a field value to its code name through the base codeset; unknown
/// values and fields without a codeset compare as themselves.
fn code_name(repo: &Repository, field_id: u32, value: &str) -> String {
    repo.field_by_id(field_id, BASE_SCENARIO)
        .and_then(|field| repo.codeset_for(&field.datatype, BASE_SCENARIO))
        .and_then(|set| set.code_by_value(value))
        .map_or_else(|| value.to_string(), |code| code.name.clone())
}

/// Returns a field's base-scenario name, or a generic one for undeclared
/// tags.
fn field_name(repo: &Repository, field_id: u32) -> String {
    repo.field_by_id(field_id, BASE_SCENARIO)
        .map_or_else(|| format!("Field{field_id}"), |field| field.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchfix_core::FieldInstance;
    use orchfix_model::{Code, Codeset, FieldDef, FieldRef, StructureMember};

    fn build() -> Repository {
        let mut repo = Repository::new();
        repo.add_field(FieldDef::new(150, "ExecType", "ExecTypeCodeSet"));
        repo.add_field(FieldDef::new(39, "OrdStatus", "OrdStatusCodeSet"));

        let mut exec_type = Codeset::new(150, "ExecTypeCodeSet", "char");
        exec_type.add_code(Code::new("New", "0"));
        exec_type.add_code(Code::new("Trade", "F"));
        repo.add_codeset(exec_type);

        let mut ord_status = Codeset::new(39, "OrdStatusCodeSet", "char");
        ord_status.add_code(Code::new("New", "0"));
        ord_status.add_code(Code::new("Filled", "2"));
        repo.add_codeset(ord_status);

        let mut msg = StructureModel::message(9, "ExecutionReport", "8");
        msg.push_member(StructureMember::Field(FieldRef::new(150, BASE_SCENARIO)));
        msg.push_member(StructureMember::Field(FieldRef::new(39, BASE_SCENARIO)));
        repo.add_structure(msg);
        repo
    }

    fn instance(pairs: &[(u32, &str)]) -> MessageInstance {
        let mut msg = MessageInstance::new(1);
        msg.push(FieldInstance::new(8, "FIX.4.4"));
        msg.push(FieldInstance::new(9, "100"));
        msg.push(FieldInstance::new(35, "8"));
        for (tag, value) in pairs {
            msg.push(FieldInstance::new(*tag, *value));
        }
        msg
    }

    fn keys() -> KeyFieldConfig {
        let mut config = KeyFieldConfig::empty();
        config.insert("8", vec![150, 39]);
        config
    }

    #[test]
    fn test_same_key_tuple_reuses_scenario() {
        let mut repo = build();
        let classifier = ScenarioClassifier::new(keys());
        let mut stats = RunStats::new();

        let first = classifier.classify(&mut repo, "8", &instance(&[(150, "F"), (39, "0")]), &mut stats);
        let second =
            classifier.classify(&mut repo, "8", &instance(&[(150, "F"), (39, "0")]), &mut stats);

        assert_eq!(first, second);
        assert_eq!(stats.scenarios.added, 1);
        assert_eq!(
            repo.structure(first).scenario,
            "ExecType-Trade_OrdStatus-New"
        );
    }

    #[test]
    fn test_distinct_key_tuple_derives_new_scenario() {
        let mut repo = build();
        let classifier = ScenarioClassifier::new(keys());
        let mut stats = RunStats::new();

        let first = classifier.classify(&mut repo, "8", &instance(&[(150, "F"), (39, "0")]), &mut stats);
        let third =
            classifier.classify(&mut repo, "8", &instance(&[(150, "4"), (39, "2")]), &mut stats);

        assert_ne!(first, third);
        assert_eq!(stats.scenarios.added, 2);
        // Value 4 has no code in the set, so it compares as itself.
        assert_eq!(repo.structure(third).scenario, "ExecType-4_OrdStatus-Filled");
    }

    #[test]
    fn test_absent_key_field_uses_sentinel() {
        let mut repo = build();
        let classifier = ScenarioClassifier::new(keys());
        let mut stats = RunStats::new();

        let key = classifier.classify(&mut repo, "8", &instance(&[(150, "F")]), &mut stats);
        assert_eq!(repo.structure(key).scenario, "ExecType-Trade_OrdStatus-None");

        // The same shape, absent field included, matches again.
        let again = classifier.classify(&mut repo, "8", &instance(&[(150, "F")]), &mut stats);
        assert_eq!(key, again);
        assert_eq!(stats.scenarios.added, 1);
    }

    #[test]
    fn test_no_key_resolves_to_base() {
        let mut repo = build();
        let classifier = ScenarioClassifier::new(KeyFieldConfig::empty());
        let mut stats = RunStats::new();

        let key = classifier.classify(&mut repo, "8", &instance(&[(150, "F")]), &mut stats);
        assert_eq!(repo.structure(key).scenario, BASE_SCENARIO);
        assert_eq!(stats.scenarios.added, 0);
    }

    #[test]
    fn test_unknown_msg_type_creates_empty_model() {
        let mut repo = build();
        let classifier = ScenarioClassifier::new(KeyFieldConfig::empty());
        let mut stats = RunStats::new();

        let key = classifier.classify(&mut repo, "UX", &instance(&[]), &mut stats);
        let model = repo.structure(key);
        assert_eq!(model.name, "UX");
        assert_eq!(model.msg_type(), Some("UX"));
        assert_eq!(model.scenario, BASE_SCENARIO);
        assert!(model.members.is_empty());
        assert_eq!(model.id, 10);
    }
}
