/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Field resolution.
//!
//! A replayed message is a flat field sequence; the schema is a tree.
//! Resolution finds the structure member a field tag belongs to by walking
//! the message's root members, then recursively the components and groups
//! they reference. The repository handle is passed into every call — there
//! is no global lookup state.

use orchfix_model::{Repository, StructKey, StructureMember};

/// Where a resolved field lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLoc {
    /// A regular member of a structure.
    Member {
        /// Structure owning the member.
        owner: StructKey,
        /// Member slot within the owner.
        index: usize,
    },
    /// The repeat-counter field of a group.
    GroupCounter(StructKey),
}

/// A successful field resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Where the matching field reference lives.
    pub loc: FieldLoc,
    /// Structure directly containing the field.
    pub container: StructKey,
    /// Component/group references traversed to reach the container,
    /// outermost first, as (owner, member slot) pairs.
    pub path: Vec<(StructKey, usize)>,
    /// Enclosing groups along the path, outermost first. Includes the
    /// container itself when the container is a group.
    pub groups: Vec<StructKey>,
}

/// Resolves a field tag against a message structure.
///
/// Returns `None` for a tag the structure does not reach.
///
/// # Arguments
/// * `repo` - The repository the references resolve against
/// * `root` - The message structure to search from
/// * `tag` - The field tag
#[must_use]
pub fn resolve(repo: &Repository, root: StructKey, tag: u32) -> Option<Resolution> {
    let mut path = Vec::new();
    let mut groups = Vec::new();
    resolve_in(repo, root, tag, &mut path, &mut groups)
}

fn resolve_in(
    repo: &Repository,
    key: StructKey,
    tag: u32,
    path: &mut Vec<(StructKey, usize)>,
    groups: &mut Vec<StructKey>,
) -> Option<Resolution> {
    let structure = repo.structure(key);
    for (index, member) in structure.members.iter().enumerate() {
        match member {
            StructureMember::Field(field) => {
                if field.id == tag {
                    return Some(Resolution {
                        loc: FieldLoc::Member { owner: key, index },
                        container: key,
                        path: path.clone(),
                        groups: groups.clone(),
                    });
                }
            }
            StructureMember::Component(component) => {
                let Some(target) = repo.resolve_component(component.id, &component.scenario)
                else {
                    continue;
                };
                path.push((key, index));
                if let Some(found) = resolve_in(repo, target, tag, path, groups) {
                    return Some(found);
                }
                path.pop();
            }
            StructureMember::Group(group) => {
                let Some(target) = repo.resolve_group(group.id, &group.scenario) else {
                    continue;
                };
                path.push((key, index));
                groups.push(target);
                if repo.structure(target).counter_id() == Some(tag) {
                    return Some(Resolution {
                        loc: FieldLoc::GroupCounter(target),
                        container: target,
                        path: path.clone(),
                        groups: groups.clone(),
                    });
                }
                if let Some(found) = resolve_in(repo, target, tag, path, groups) {
                    return Some(found);
                }
                groups.pop();
                path.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchfix_core::field::BASE_SCENARIO;
    use orchfix_model::{
        ComponentRef, FieldRef, GroupRef, Repository, StructureModel,
    };

    /// Message { header{8}, 150, Parties[453]{448, Sub[804]{523}} }
    fn build() -> (Repository, StructKey) {
        let mut repo = Repository::new();

        let mut header = StructureModel::component(1024, "StandardHeader");
        header.push_member(StructureMember::Field(FieldRef::new(8, BASE_SCENARIO)));
        repo.add_structure(header);

        let mut sub = StructureModel::group(2080, "PtysSubGrp", 804);
        sub.push_member(StructureMember::Field(FieldRef::new(523, BASE_SCENARIO)));
        repo.add_structure(sub);

        let mut parties = StructureModel::group(2070, "Parties", 453);
        parties.push_member(StructureMember::Field(FieldRef::new(448, BASE_SCENARIO)));
        parties.push_member(StructureMember::Group(GroupRef::new(2080, BASE_SCENARIO)));
        repo.add_structure(parties);

        let mut msg = StructureModel::message(9, "ExecutionReport", "8");
        msg.push_member(StructureMember::Component(ComponentRef::new(
            1024,
            BASE_SCENARIO,
        )));
        msg.push_member(StructureMember::Field(FieldRef::new(150, BASE_SCENARIO)));
        msg.push_member(StructureMember::Group(GroupRef::new(2070, BASE_SCENARIO)));
        let key = repo.add_structure(msg);

        (repo, key)
    }

    #[test]
    fn test_root_field() {
        let (repo, msg) = build();
        let res = resolve(&repo, msg, 150).unwrap();
        assert_eq!(res.container, msg);
        assert!(res.path.is_empty());
        assert!(res.groups.is_empty());
    }

    #[test]
    fn test_field_through_component() {
        let (repo, msg) = build();
        let res = resolve(&repo, msg, 8).unwrap();
        let header = repo.component_by_id(1024, BASE_SCENARIO).unwrap();
        assert_eq!(res.container, header);
        assert_eq!(res.path, vec![(msg, 0)]);
        assert!(res.groups.is_empty());
    }

    #[test]
    fn test_group_counter() {
        let (repo, msg) = build();
        let res = resolve(&repo, msg, 453).unwrap();
        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        assert_eq!(res.loc, FieldLoc::GroupCounter(parties));
        assert_eq!(res.container, parties);
        assert_eq!(res.groups, vec![parties]);
    }

    #[test]
    fn test_nested_group_field() {
        let (repo, msg) = build();
        let res = resolve(&repo, msg, 523).unwrap();
        let parties = repo.group_by_id(2070, BASE_SCENARIO).unwrap();
        let sub = repo.group_by_id(2080, BASE_SCENARIO).unwrap();
        assert_eq!(res.container, sub);
        assert_eq!(res.groups, vec![parties, sub]);
        assert_eq!(res.path.len(), 2);
    }

    #[test]
    fn test_unknown_tag() {
        let (repo, msg) = build();
        assert!(resolve(&repo, msg, 9999).is_none());
    }
}
