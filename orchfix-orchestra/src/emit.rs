/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Element builders for declarations created during replay.
//!
//! New elements adopt the document root's namespace prefix. The scenario
//! attribute is written only when it differs from base, and presence only
//! when it differs from optional, matching how hand-authored Orchestra
//! files read.

use crate::dom::XmlElement;
use orchfix_core::field::BASE_SCENARIO;
use orchfix_model::{
    Code, Codeset, FieldDef, Presence, StructureKind, StructureMember, StructureModel,
};

/// Qualifies a local name with a namespace prefix.
#[must_use]
pub fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

/// Builds a `field` element.
#[must_use]
pub fn field_element(prefix: Option<&str>, field: &FieldDef) -> XmlElement {
    let mut element = XmlElement::new(qualify(prefix, "field"));
    element.set_attr("id", field.id.to_string());
    element.set_attr("name", field.name.clone());
    element.set_attr("type", field.datatype.clone());
    if field.scenario != BASE_SCENARIO {
        element.set_attr("scenario", field.scenario.clone());
    }
    element
}

/// Builds a `code` element.
#[must_use]
pub fn code_element(prefix: Option<&str>, code: &Code) -> XmlElement {
    let mut element = XmlElement::new(qualify(prefix, "code"));
    element.set_attr("name", code.name.clone());
    element.set_attr("value", code.value.clone());
    element
}

/// Builds a `codeSet` element with all its codes.
#[must_use]
pub fn codeset_element(prefix: Option<&str>, set: &Codeset) -> XmlElement {
    let mut element = XmlElement::new(qualify(prefix, "codeSet"));
    element.set_attr("id", set.id.to_string());
    element.set_attr("name", set.name.clone());
    element.set_attr("type", set.datatype.clone());
    if set.scenario != BASE_SCENARIO {
        element.set_attr("scenario", set.scenario.clone());
    }
    for code in &set.codes {
        element.push_element(code_element(prefix, code));
    }
    element
}

/// Builds a member reference element (`fieldRef`, `componentRef` or
/// `groupRef`).
#[must_use]
pub fn member_element(prefix: Option<&str>, member: &StructureMember) -> XmlElement {
    let mut element = XmlElement::new(qualify(prefix, member.kind().element_name()));
    element.set_attr("id", member.id().to_string());
    if member.scenario() != BASE_SCENARIO {
        element.set_attr("scenario", member.scenario().to_string());
    }
    if member.presence() != Presence::Optional {
        element.set_attr("presence", member.presence().as_str());
    }
    element
}

/// Builds a `message`, `component` or `group` element with all its member
/// declarations.
#[must_use]
pub fn structure_element(prefix: Option<&str>, structure: &StructureModel) -> XmlElement {
    let mut element = XmlElement::new(qualify(prefix, structure.kind.element_name()));
    element.set_attr("id", structure.id.to_string());
    element.set_attr("name", structure.name.clone());
    if let StructureKind::Message { msg_type, .. } = &structure.kind {
        element.set_attr("msgType", msg_type.clone());
    }
    if structure.scenario != BASE_SCENARIO {
        element.set_attr("scenario", structure.scenario.clone());
    }

    match &structure.kind {
        StructureKind::Message { .. } => {
            let mut body = XmlElement::new(qualify(prefix, "structure"));
            for member in &structure.members {
                body.push_element(member_element(prefix, member));
            }
            element.push_element(body);
        }
        StructureKind::Component => {
            for member in &structure.members {
                element.push_element(member_element(prefix, member));
            }
        }
        StructureKind::Group { num_in_group } => {
            let mut counter = XmlElement::new(qualify(prefix, "numInGroup"));
            counter.set_attr("id", num_in_group.id.to_string());
            if num_in_group.presence != Presence::Optional {
                counter.set_attr("presence", num_in_group.presence.as_str());
            }
            element.push_element(counter);
            for member in &structure.members {
                element.push_element(member_element(prefix, member));
            }
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchfix_model::{FieldRef, GroupRef, StructureMember};

    const PREFIX: Option<&str> = Some("fixr");

    #[test]
    fn test_field_element_adopts_prefix() {
        let element = field_element(PREFIX, &FieldDef::synthetic(5042));
        assert_eq!(element.name, "fixr:field");
        assert_eq!(element.attr("id"), Some("5042"));
        assert_eq!(element.attr("name"), Some("Field5042"));
        assert_eq!(element.attr("scenario"), None);
    }

    #[test]
    fn test_unprefixed_document() {
        let element = field_element(None, &FieldDef::synthetic(7));
        assert_eq!(element.name, "field");
    }

    #[test]
    fn test_scenario_attribute_only_when_derived() {
        let field = FieldDef::new(150, "ExecType", "ExecTypeCodeSet")
            .with_scenario("ExecType-Trade");
        let element = field_element(PREFIX, &field);
        assert_eq!(element.attr("scenario"), Some("ExecType-Trade"));
    }

    #[test]
    fn test_message_element_wraps_members_in_structure() {
        let mut message = StructureModel::message(9, "ExecutionReport", "8");
        message.push_member(StructureMember::Field(FieldRef::new(150, BASE_SCENARIO)));
        message.push_member(StructureMember::Group(GroupRef::new(2070, BASE_SCENARIO)));

        let element = structure_element(PREFIX, &message);
        assert_eq!(element.attr("msgType"), Some("8"));
        let body = element.child("structure").unwrap();
        assert_eq!(body.elements().count(), 2);
        assert_eq!(body.child("groupRef").unwrap().attr("id"), Some("2070"));
    }

    #[test]
    fn test_group_element_leads_with_counter() {
        let mut group = StructureModel::group(2070, "Parties", 453);
        group.push_member(StructureMember::Field(FieldRef::new(448, BASE_SCENARIO)));

        let element = structure_element(PREFIX, &group);
        let children: Vec<&str> = element.elements().map(XmlElement::local_name).collect();
        assert_eq!(children, vec!["numInGroup", "fieldRef"]);
    }

    #[test]
    fn test_codeset_element_includes_codes() {
        let mut set = Codeset::new(150, "ExecTypeCodeSet", "char");
        set.add_code(Code::new("Trade", "F"));
        let element = codeset_element(PREFIX, &set);
        assert_eq!(element.child("code").unwrap().attr("value"), Some("F"));
    }
}
