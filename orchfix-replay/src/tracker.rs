/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Repeating-group tracking.
//!
//! While a message's flat field sequence is scanned, the tracker keeps a
//! stack of active repeating-group contexts so unknown fields can be
//! attributed to the group instance they most plausibly belong to. The
//! stack is reset for every message.

use crate::resolver::{FieldLoc, Resolution};
use orchfix_model::{Repository, StructKey};

/// One active repeating-group context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupContext {
    /// The group structure.
    pub group: StructKey,
    /// Declared repeat count, from the group's counter field. Zero when
    /// the group was entered without its counter.
    pub count: u64,
    /// 1-based index of the instance currently being filled. Zero between
    /// the counter field and the first delimiter.
    pub instance: u64,
}

/// Stack machine tracking nested repeating groups within one message.
#[derive(Debug, Default)]
pub struct GroupTracker {
    stack: Vec<GroupContext>,
}

impl GroupTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all context. Called before every message.
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Returns the innermost active group context.
    #[must_use]
    pub fn top(&self) -> Option<&GroupContext> {
        self.stack.last()
    }

    /// Returns the stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Updates the stack for a resolved field.
    ///
    /// - A field whose container is the message root (or a component at the
    ///   root) clears the stack.
    /// - A group's counter field pushes a fresh context with the declared
    ///   repeat count taken from the field's value.
    /// - The group's delimiter field (its first member) advances the
    ///   1-based instance index.
    /// - A field belonging to an ancestor group pops back to it.
    ///
    /// # Arguments
    /// * `repo` - The repository
    /// * `resolution` - Where the field resolved
    /// * `tag` - The field's tag
    /// * `value` - The field's value, read as the repeat count for counters
    pub fn update(&mut self, repo: &Repository, resolution: &Resolution, tag: u32, value: &str) {
        let chain = &resolution.groups;
        if chain.is_empty() {
            self.stack.clear();
            return;
        }

        let is_counter = matches!(resolution.loc, FieldLoc::GroupCounter(_));
        // The counter announces its group; the context is (re)created below
        // rather than aligned.
        let align_to = if is_counter {
            &chain[..chain.len() - 1]
        } else {
            &chain[..]
        };

        let mut common = 0;
        while common < self.stack.len()
            && common < align_to.len()
            && self.stack[common].group == align_to[common]
        {
            common += 1;
        }
        self.stack.truncate(common);
        for &group in &align_to[common..] {
            self.stack.push(GroupContext {
                group,
                count: 0,
                instance: 0,
            });
        }

        if is_counter {
            let group = *chain.last().expect("counter resolution has a group");
            self.stack.push(GroupContext {
                group,
                count: value.parse().unwrap_or(0),
                instance: 0,
            });
            return;
        }

        if let Some(top) = self.stack.last_mut() {
            if repo.structure(top.group).first_member_id() == Some(tag) {
                top.instance += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use orchfix_core::field::BASE_SCENARIO;
    use orchfix_model::{
        FieldRef, GroupRef, Repository, StructureMember, StructureModel,
    };

    /// Message { 55, Parties[453]{448, 447, Sub[804]{523}} }
    fn build() -> (Repository, StructKey) {
        let mut repo = Repository::new();

        let mut sub = StructureModel::group(2080, "PtysSubGrp", 804);
        sub.push_member(StructureMember::Field(FieldRef::new(523, BASE_SCENARIO)));
        repo.add_structure(sub);

        let mut parties = StructureModel::group(2070, "Parties", 453);
        parties.push_member(StructureMember::Field(FieldRef::new(448, BASE_SCENARIO)));
        parties.push_member(StructureMember::Field(FieldRef::new(447, BASE_SCENARIO)));
        parties.push_member(StructureMember::Group(GroupRef::new(2080, BASE_SCENARIO)));
        repo.add_structure(parties);

        let mut msg = StructureModel::message(9, "ExecutionReport", "8");
        msg.push_member(StructureMember::Field(FieldRef::new(55, BASE_SCENARIO)));
        msg.push_member(StructureMember::Group(GroupRef::new(2070, BASE_SCENARIO)));
        let key = repo.add_structure(msg);

        (repo, key)
    }

    fn feed(tracker: &mut GroupTracker, repo: &Repository, msg: StructKey, tag: u32, value: &str) {
        let res = resolve(repo, msg, tag).expect("tag resolves");
        tracker.update(repo, &res, tag, value);
    }

    #[test]
    fn test_counter_pushes_with_count() {
        let (repo, msg) = build();
        let mut tracker = GroupTracker::new();

        feed(&mut tracker, &repo, msg, 453, "2");
        let top = tracker.top().unwrap();
        assert_eq!(top.count, 2);
        assert_eq!(top.instance, 0);
    }

    #[test]
    fn test_delimiter_advances_instances() {
        let (repo, msg) = build();
        let mut tracker = GroupTracker::new();

        feed(&mut tracker, &repo, msg, 453, "2");
        feed(&mut tracker, &repo, msg, 448, "A");
        assert_eq!(tracker.top().unwrap().instance, 1);
        feed(&mut tracker, &repo, msg, 447, "D");
        assert_eq!(tracker.top().unwrap().instance, 1);
        feed(&mut tracker, &repo, msg, 448, "B");
        assert_eq!(tracker.top().unwrap().instance, 2);
    }

    #[test]
    fn test_nested_group_then_pop_to_ancestor() {
        let (repo, msg) = build();
        let mut tracker = GroupTracker::new();

        feed(&mut tracker, &repo, msg, 453, "1");
        feed(&mut tracker, &repo, msg, 448, "A");
        feed(&mut tracker, &repo, msg, 804, "1");
        assert_eq!(tracker.depth(), 2);
        feed(&mut tracker, &repo, msg, 523, "X");
        assert_eq!(tracker.depth(), 2);

        // A Parties-level field pops the nested context.
        feed(&mut tracker, &repo, msg, 447, "D");
        assert_eq!(tracker.depth(), 1);
        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        assert_eq!(tracker.top().unwrap().group, parties);
    }

    #[test]
    fn test_root_field_clears_stack() {
        let (repo, msg) = build();
        let mut tracker = GroupTracker::new();

        feed(&mut tracker, &repo, msg, 453, "1");
        feed(&mut tracker, &repo, msg, 448, "A");
        feed(&mut tracker, &repo, msg, 55, "EURUSD");
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_counter_reannouncement_resets_context() {
        let (repo, msg) = build();
        let mut tracker = GroupTracker::new();

        feed(&mut tracker, &repo, msg, 453, "2");
        feed(&mut tracker, &repo, msg, 448, "A");
        feed(&mut tracker, &repo, msg, 448, "B");
        feed(&mut tracker, &repo, msg, 453, "3");

        let top = tracker.top().unwrap();
        assert_eq!(tracker.depth(), 1);
        assert_eq!(top.count, 3);
        assert_eq!(top.instance, 0);
    }
}
