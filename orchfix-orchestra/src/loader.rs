/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Repository loading.
//!
//! Walks the fixed structural paths of an Orchestra document — codesets,
//! fields, components, groups, messages — and populates a
//! [`Repository`]. Everything else in the document is left for the
//! reconciler to carry through untouched.

use crate::dom::{Document, XmlElement};
use crate::error::DocumentError;
use orchfix_core::field::BASE_SCENARIO;
use orchfix_model::{
    Code, Codeset, ComponentRef, FieldDef, FieldRef, GroupRef, Presence, Repository,
    StructureMember, StructureModel,
};

/// Component name designating the shared standard header.
pub const STANDARD_HEADER: &str = "StandardHeader";

/// Component name designating the shared standard trailer.
pub const STANDARD_TRAILER: &str = "StandardTrailer";

/// Loads the schema model out of a parsed Orchestra document.
///
/// # Errors
/// Returns [`DocumentError`] when a declaration misses a required
/// attribute or carries a non-numeric id.
pub fn load_repository(doc: &Document) -> Result<Repository, DocumentError> {
    let root = &doc.root;
    if root.local_name() != "repository" {
        return Err(DocumentError::structure(format!(
            "expected repository root element, found '{}'",
            root.name
        )));
    }

    let mut repo = Repository::new();

    if let Some(section) = root.child("codeSets") {
        for element in section.elements().filter(|e| e.local_name() == "codeSet") {
            let set = load_codeset(element)?;
            repo.add_codeset(set);
        }
    }

    if let Some(section) = root.child("fields") {
        for element in section.elements().filter(|e| e.local_name() == "field") {
            let field = load_field(element)?;
            repo.add_field(field);
        }
    }

    if let Some(section) = root.child("components") {
        for element in section.elements().filter(|e| e.local_name() == "component") {
            let component = load_component(element)?;
            if component.name == STANDARD_HEADER {
                repo.set_header_id(component.id);
            } else if component.name == STANDARD_TRAILER {
                repo.set_trailer_id(component.id);
            }
            repo.add_structure(component);
        }
    }

    if let Some(section) = root.child("groups") {
        for element in section.elements().filter(|e| e.local_name() == "group") {
            let group = load_group(element)?;
            repo.add_structure(group);
        }
    }

    if let Some(section) = root.child("messages") {
        for element in section.elements().filter(|e| e.local_name() == "message") {
            let message = load_message(element)?;
            repo.add_structure(message);
        }
    }

    Ok(repo)
}

/// Reads a required attribute.
fn require<'a>(element: &'a XmlElement, attribute: &str) -> Result<&'a str, DocumentError> {
    element
        .attr(attribute)
        .ok_or_else(|| DocumentError::missing_attr(element.local_name(), attribute))
}

/// Reads a required numeric id attribute.
fn require_id(element: &XmlElement, attribute: &str) -> Result<u32, DocumentError> {
    let value = require(element, attribute)?;
    value
        .parse()
        .map_err(|_| DocumentError::invalid_attr(element.local_name(), attribute, value))
}

/// Reads the scenario attribute, defaulting to base.
fn scenario_of(element: &XmlElement) -> String {
    element
        .attr("scenario")
        .unwrap_or(BASE_SCENARIO)
        .to_string()
}

fn load_codeset(element: &XmlElement) -> Result<Codeset, DocumentError> {
    let id = require_id(element, "id")?;
    let name = require(element, "name")?;
    let datatype = element.attr("type").unwrap_or("String");
    let mut set = Codeset::new(id, name, datatype).with_scenario(scenario_of(element));

    for code_element in element.elements().filter(|e| e.local_name() == "code") {
        let code_name = require(code_element, "name")?;
        let value = require(code_element, "value")?;
        let mut code = Code::new(code_name, value);
        code.supported = code_element.attr("supported") != Some("forbidden");
        set.add_code(code);
    }

    Ok(set)
}

fn load_field(element: &XmlElement) -> Result<FieldDef, DocumentError> {
    let id = require_id(element, "id")?;
    let name = require(element, "name")?;
    let datatype = element.attr("type").unwrap_or("String");
    Ok(FieldDef::new(id, name, datatype).with_scenario(scenario_of(element)))
}

fn load_component(element: &XmlElement) -> Result<StructureModel, DocumentError> {
    let id = require_id(element, "id")?;
    let name = require(element, "name")?;
    let scenario = scenario_of(element);
    let mut component = StructureModel::component(id, name).with_scenario(scenario.clone());
    load_members(element, &scenario, &mut component)?;
    Ok(component)
}

fn load_group(element: &XmlElement) -> Result<StructureModel, DocumentError> {
    let id = require_id(element, "id")?;
    let name = require(element, "name")?;
    let scenario = scenario_of(element);
    let counter = element
        .child("numInGroup")
        .ok_or_else(|| DocumentError::structure(format!("group '{name}' has no numInGroup")))?;
    let counter_id = require_id(counter, "id")?;

    let mut group =
        StructureModel::group(id, name, counter_id).with_scenario(scenario.clone());
    load_members(element, &scenario, &mut group)?;
    Ok(group)
}

fn load_message(element: &XmlElement) -> Result<StructureModel, DocumentError> {
    let id = require_id(element, "id")?;
    let name = require(element, "name")?;
    let msg_type = require(element, "msgType")?;
    let scenario = scenario_of(element);
    let mut message =
        StructureModel::message(id, name, msg_type).with_scenario(scenario.clone());

    if let Some(structure) = element.child("structure") {
        load_members(structure, &scenario, &mut message)?;
    }
    Ok(message)
}

/// Parses the member references of a structure element. Unknown children
/// (documentation, annotations, the group counter) are skipped.
fn load_members(
    element: &XmlElement,
    default_scenario: &str,
    target: &mut StructureModel,
) -> Result<(), DocumentError> {
    for child in element.elements() {
        let member = match child.local_name() {
            "fieldRef" => {
                let id = require_id(child, "id")?;
                let mut field = FieldRef::new(id, member_scenario(child, default_scenario));
                field.presence = presence_of(child);
                field.supported = child.attr("supported") != Some("forbidden");
                StructureMember::Field(field)
            }
            "componentRef" => {
                let id = require_id(child, "id")?;
                let mut component =
                    ComponentRef::new(id, member_scenario(child, default_scenario));
                component.presence = presence_of(child);
                component.supported = child.attr("supported") != Some("forbidden");
                StructureMember::Component(component)
            }
            "groupRef" => {
                let id = require_id(child, "id")?;
                let mut group = GroupRef::new(id, member_scenario(child, default_scenario));
                group.presence = presence_of(child);
                group.supported = child.attr("supported") != Some("forbidden");
                StructureMember::Group(group)
            }
            _ => continue,
        };
        target.push_member(member);
    }
    Ok(())
}

fn member_scenario(element: &XmlElement, default_scenario: &str) -> String {
    element
        .attr("scenario")
        .unwrap_or(default_scenario)
        .to_string()
}

fn presence_of(element: &XmlElement) -> Presence {
    element
        .attr("presence")
        .and_then(Presence::parse)
        .unwrap_or_default()
}
