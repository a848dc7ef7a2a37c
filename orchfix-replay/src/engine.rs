/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! The replay engine.
//!
//! One message at a time: classify it into a scenario, walk its fields
//! against the message structure while tracking repeating-group context,
//! grow the model for unknown elements, and accumulate usage counts on
//! every element touched.

use crate::classifier::ScenarioClassifier;
use crate::keys::KeyFieldConfig;
use crate::resolver::{resolve, FieldLoc, Resolution};
use crate::tracker::GroupTracker;
use orchfix_core::field::{is_user_defined, FieldInstance, MessageInstance, BASE_SCENARIO};
use orchfix_core::stats::RunStats;
use orchfix_core::warnings::{WarningKind, WarningLog};
use orchfix_model::{
    Code, FieldDef, FieldRef, Repository, StructKey, StructureKind, StructureMember,
};
use tracing::{debug, warn};

/// Replays parsed messages against the schema model.
#[derive(Debug)]
pub struct ReplayEngine {
    classifier: ScenarioClassifier,
    tracker: GroupTracker,
    /// Run statistics accumulated so far.
    pub stats: RunStats,
    /// Warnings accumulated so far.
    pub warnings: WarningLog,
}

impl ReplayEngine {
    /// Creates an engine over a key-field configuration.
    #[must_use]
    pub fn new(keys: KeyFieldConfig) -> Self {
        Self {
            classifier: ScenarioClassifier::new(keys),
            tracker: GroupTracker::new(),
            stats: RunStats::new(),
            warnings: WarningLog::new(),
        }
    }

    /// Replays one message. Group-tracking state never carries over from
    /// the previous message.
    ///
    /// # Arguments
    /// * `repo` - The repository to search and grow
    /// * `instance` - The parsed message
    /// * `file` - Source file name, for warnings
    pub fn replay(&mut self, repo: &mut Repository, instance: &MessageInstance, file: &str) {
        let Some(msg_type) = instance.msg_type() else {
            warn!(file, line = instance.line, "message without msgType skipped");
            self.warnings
                .record(file, instance.line, WarningKind::AbsentMsgType);
            self.stats.bad_messages += 1;
            return;
        };
        let msg_type = msg_type.to_string();

        let message = self
            .classifier
            .classify(repo, &msg_type, instance, &mut self.stats);
        let scenario = repo.structure(message).scenario.clone();
        debug!(file, line = instance.line, %msg_type, %scenario, "replaying message");

        self.tracker.reset();
        for field in instance.iter() {
            self.replay_field(repo, message, &scenario, field, instance.line, file);
        }
        self.stats.replayed_messages += 1;
    }

    fn replay_field(
        &mut self,
        repo: &mut Repository,
        message: StructKey,
        scenario: &str,
        field: &FieldInstance,
        line: u64,
        file: &str,
    ) {
        let resolution = match resolve(repo, message, field.tag) {
            Some(resolution) => {
                self.tracker.update(repo, &resolution, field.tag, &field.value);
                resolution
            }
            None => self.append_unknown(repo, message, field.tag, line, file),
        };
        self.touch(repo, &resolution, scenario, field);
    }

    /// Appends an unknown field to the innermost open group instance, or to
    /// the message root when no group can still take it.
    fn append_unknown(
        &mut self,
        repo: &mut Repository,
        message: StructKey,
        tag: u32,
        line: u64,
        file: &str,
    ) -> Resolution {
        if repo.field_by_id(tag, BASE_SCENARIO).is_none() {
            debug!(tag, "synthesizing field definition for unknown tag");
            repo.add_field(FieldDef::synthetic(tag));
            if is_user_defined(tag) {
                self.stats.user_defined_fields += 1;
            }
        }

        let owner = match self.tracker.top() {
            Some(context) if context.instance <= context.count => {
                if context.instance == context.count && is_user_defined(tag) {
                    // The group's final instance is complete as declared;
                    // the field could equally belong after the group.
                    self.warnings.record(
                        file,
                        line,
                        WarningKind::AmbiguousUdfPlacement {
                            tag,
                            group: repo.structure(context.group).name.clone(),
                        },
                    );
                }
                context.group
            }
            _ => message,
        };

        let owner_scenario = repo.structure(owner).scenario.clone();
        let mut reference = FieldRef::new(tag, owner_scenario);
        reference.parent = Some(owner);
        repo.structure_mut(owner)
            .members
            .push(StructureMember::Field(reference));
        let index = repo.structure(owner).members.len() - 1;

        Resolution {
            loc: FieldLoc::Member { owner, index },
            container: owner,
            path: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Increments usage on everything the field touches: the reference,
    /// its containing structure, every reference traversed to reach it,
    /// the scenario-specialized field definition, and the observed code.
    fn touch(
        &mut self,
        repo: &mut Repository,
        resolution: &Resolution,
        scenario: &str,
        field: &FieldInstance,
    ) {
        let slot = match repo.specialize_field(field.tag, scenario) {
            Some(slot) => slot,
            None => {
                // A reference declared without a backing definition.
                repo.add_field(FieldDef::synthetic(field.tag));
                if is_user_defined(field.tag) {
                    self.stats.user_defined_fields += 1;
                }
                repo.specialize_field(field.tag, scenario)
                    .expect("base definition was just added")
            }
        };

        let definition = repo.field_at_mut(slot);
        definition.uses += 1;
        let datatype = definition.datatype.clone();
        let def_scenario = definition.scenario.clone();

        if let Some(set) = repo.codeset_for_mut(&datatype, &def_scenario) {
            match set.code_by_value_mut(&field.value) {
                Some(code) => code.uses += 1,
                None => {
                    let mut code = Code::ad_hoc(field.value.clone());
                    code.uses = 1;
                    set.add_code(code);
                }
            }
        }

        match resolution.loc {
            FieldLoc::Member { owner, index } => {
                repo.structure_mut(owner).members[index].add_use();
            }
            FieldLoc::GroupCounter(group) => {
                if let StructureKind::Group { num_in_group } =
                    &mut repo.structure_mut(group).kind
                {
                    num_in_group.uses += 1;
                }
            }
        }
        repo.structure_mut(resolution.container).uses += 1;
        for &(owner, index) in &resolution.path {
            repo.structure_mut(owner).members[index].add_use();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchfix_model::{Codeset, GroupRef, MemberKind, StructureModel};

    /// ExecutionReport { 150, Parties[453]{448} } with an ExecType codeset.
    fn build() -> Repository {
        let mut repo = Repository::new();
        repo.add_field(FieldDef::new(8, "BeginString", "String"));
        repo.add_field(FieldDef::new(9, "BodyLength", "Length"));
        repo.add_field(FieldDef::new(35, "MsgType", "String"));
        repo.add_field(FieldDef::new(10, "CheckSum", "String"));
        repo.add_field(FieldDef::new(150, "ExecType", "ExecTypeCodeSet"));
        repo.add_field(FieldDef::new(448, "PartyID", "String"));
        repo.add_field(FieldDef::new(453, "NoPartyIDs", "NumInGroup"));

        let mut set = Codeset::new(150, "ExecTypeCodeSet", "char");
        set.add_code(Code::new("Trade", "F"));
        repo.add_codeset(set);

        let mut parties = StructureModel::group(2070, "Parties", 453);
        parties.push_member(StructureMember::Field(FieldRef::new(448, BASE_SCENARIO)));
        repo.add_structure(parties);

        let mut msg = StructureModel::message(9, "ExecutionReport", "8");
        msg.push_member(StructureMember::Field(FieldRef::new(150, BASE_SCENARIO)));
        msg.push_member(StructureMember::Group(GroupRef::new(2070, BASE_SCENARIO)));
        repo.add_structure(msg);
        repo
    }

    fn instance(pairs: &[(u32, &str)]) -> MessageInstance {
        let mut msg = MessageInstance::new(3);
        msg.push(FieldInstance::new(8, "FIX.4.4"));
        msg.push(FieldInstance::new(9, "100"));
        msg.push(FieldInstance::new(35, "8"));
        for (tag, value) in pairs {
            msg.push(FieldInstance::new(*tag, *value));
        }
        msg.push(FieldInstance::new(10, "123"));
        msg
    }

    #[test]
    fn test_absent_msg_type_warns_and_skips() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        let mut short = MessageInstance::new(5);
        short.push(FieldInstance::new(8, "FIX.4.4"));
        engine.replay(&mut repo, &short, "x.log");

        assert_eq!(engine.stats.bad_messages, 1);
        assert_eq!(engine.stats.replayed_messages, 0);
        assert!(matches!(
            engine.warnings.entries()[0].kind,
            WarningKind::AbsentMsgType
        ));
    }

    #[test]
    fn test_known_field_usage_and_code() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        engine.replay(&mut repo, &instance(&[(150, "F")]), "x.log");

        assert_eq!(repo.field_by_id(150, BASE_SCENARIO).unwrap().uses, 1);
        let set = repo.codeset("ExecTypeCodeSet", BASE_SCENARIO).unwrap();
        assert_eq!(set.code_by_value("F").unwrap().uses, 1);

        let message = repo.message("ExecutionReport", BASE_SCENARIO).unwrap();
        assert_eq!(
            repo.structure(message).member(MemberKind::Field, 150).unwrap().uses(),
            1
        );
    }

    #[test]
    fn test_ad_hoc_code_created() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        engine.replay(&mut repo, &instance(&[(150, "9")]), "x.log");

        let set = repo.codeset("ExecTypeCodeSet", BASE_SCENARIO).unwrap();
        let code = set.code_by_value("9").unwrap();
        assert_eq!(code.name, "9");
        assert_eq!(code.uses, 1);
    }

    #[test]
    fn test_nested_group_attribution() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        // Two instances; field 5001 appears only inside the first.
        engine.replay(
            &mut repo,
            &instance(&[
                (453, "2"),
                (448, "A"),
                (5001, "x"),
                (448, "B"),
            ]),
            "x.log",
        );

        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        let group = repo.structure(parties);
        assert_eq!(group.member(MemberKind::Field, 448).unwrap().uses(), 2);
        let appended = group.member(MemberKind::Field, 5001).unwrap();
        assert_eq!(appended.uses(), 1);
        assert_eq!(appended.parent(), Some(parties));

        // Not on the message root.
        let message = repo.message("ExecutionReport", BASE_SCENARIO).unwrap();
        assert!(repo.structure(message).member(MemberKind::Field, 5001).is_none());
        assert_eq!(engine.stats.user_defined_fields, 1);
    }

    #[test]
    fn test_unknown_after_final_instance_warns_ambiguous() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        engine.replay(
            &mut repo,
            &instance(&[(453, "1"), (448, "A"), (5002, "x")]),
            "x.log",
        );

        assert!(engine.warnings.entries().iter().any(|w| matches!(
            &w.kind,
            WarningKind::AmbiguousUdfPlacement { tag: 5002, group } if group == "Parties"
        )));
        // Placed inside the group, per the documented heuristic.
        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        assert!(repo.structure(parties).member(MemberKind::Field, 5002).is_some());
    }

    #[test]
    fn test_unknown_beyond_group_count_lands_on_root() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        // Group declares one instance but a second delimiter arrives, so
        // the unknown field cannot belong to an open instance.
        engine.replay(
            &mut repo,
            &instance(&[(453, "1"), (448, "A"), (448, "B"), (7011, "x")]),
            "x.log",
        );

        let message = repo.message("ExecutionReport", BASE_SCENARIO).unwrap();
        assert!(repo.structure(message).member(MemberKind::Field, 7011).is_some());
    }

    #[test]
    fn test_scenario_specialization_on_first_use() {
        let mut repo = build();
        let mut keys = KeyFieldConfig::empty();
        keys.insert("8", vec![150]);
        let mut engine = ReplayEngine::new(keys);

        engine.replay(&mut repo, &instance(&[(150, "F")]), "x.log");

        // The field definition and its codeset were cloned into the derived
        // scenario, and usage accumulated on the clones.
        let specialized = repo.field_by_id(150, "ExecType-Trade").unwrap();
        assert_eq!(specialized.uses, 1);
        assert_eq!(repo.field_by_id(150, BASE_SCENARIO).unwrap().uses, 0);
        let set = repo.codeset("ExecTypeCodeSet", "ExecType-Trade").unwrap();
        assert_eq!(set.code_by_value("F").unwrap().uses, 1);

        // Base model stayed unused; the derived scenario took the message.
        let base = repo.message("ExecutionReport", BASE_SCENARIO).unwrap();
        let derived = repo.message("ExecutionReport", "ExecType-Trade").unwrap();
        assert_eq!(repo.structure(base).uses, 0);
        assert!(repo.structure(derived).uses > 0);
    }

    #[test]
    fn test_group_state_resets_between_messages() {
        let mut repo = build();
        let mut engine = ReplayEngine::new(KeyFieldConfig::empty());

        engine.replay(&mut repo, &instance(&[(453, "2"), (448, "A")]), "x.log");
        // The unknown field in the next message must not be attributed to
        // the previous message's open group.
        engine.replay(&mut repo, &instance(&[(5003, "x")]), "x.log");

        let message = repo.message("ExecutionReport", BASE_SCENARIO).unwrap();
        assert!(repo.structure(message).member(MemberKind::Field, 5003).is_some());
        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        assert!(repo.structure(parties).member(MemberKind::Field, 5003).is_none());
    }
}
