/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! The reconciliation engine.
//!
//! Runs once, after every log has been replayed, against the parsed
//! reference document. Passes run in a fixed order: metadata, codesets,
//! fields, structures (additions and member sync), then — unless
//! append-only — member-level pruning strictly before element-level
//! pruning, so no reference element is left pointing at a removed
//! definition.
//!
//! Flags are rewritten only inside structures and codesets that saw usage
//! during the run: replaying nothing leaves the document unchanged apart
//! from metadata.

use chrono::Utc;
use orchfix_core::field::BASE_SCENARIO;
use orchfix_core::stats::RunStats;
use orchfix_model::{MemberKind, Repository, StructKey, StructureKind, StructureModel};
use orchfix_orchestra::dom::{Document, XmlElement};
use orchfix_orchestra::emit;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Dublin Core namespace used for the metadata contributor entry.
const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// Contributor recorded in the output document's metadata.
const CONTRIBUTOR: &str = "orchfix";

/// The three structure sections and their element names.
const SECTIONS: &[(&str, &str)] = &[
    ("messages", "message"),
    ("components", "component"),
    ("groups", "group"),
];

/// Reconciles the schema model into the reference document.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    append_only: bool,
}

impl Reconciler {
    /// Creates a reconciler.
    ///
    /// # Arguments
    /// * `append_only` - When true, no element is ever removed; only
    ///   additions and flag updates occur
    #[must_use]
    pub const fn new(append_only: bool) -> Self {
        Self { append_only }
    }

    /// Runs all passes over the document, accumulating counters into
    /// `stats`.
    pub fn run(&self, doc: &mut Document, repo: &Repository, stats: &mut RunStats) {
        let prefix_owned = doc.prefix().map(str::to_string);
        let prefix = prefix_owned.as_deref();

        update_metadata(&mut doc.root, prefix);
        self.sync_codesets(&mut doc.root, prefix, repo, stats);
        self.sync_fields(&mut doc.root, prefix, repo, stats);
        self.sync_structures(&mut doc.root, prefix, repo, stats);
        if !self.append_only {
            self.prune_members(&mut doc.root, repo, stats);
            self.prune_structures(&mut doc.root, repo, stats);
        }
        tally_used(repo, stats);
        debug!(append_only = self.append_only, "reconciliation finished");
    }

    // ---- codesets ----------------------------------------------------

    fn sync_codesets(
        &self,
        root: &mut XmlElement,
        prefix: Option<&str>,
        repo: &Repository,
        stats: &mut RunStats,
    ) {
        // Usage summed per set name across scenarios: a base set stays as
        // long as any scenario variant of it was observed.
        let mut total_by_name: HashMap<&str, u64> = HashMap::new();
        for set in repo.codesets() {
            *total_by_name.entry(set.name.as_str()).or_default() += set.total_uses();
        }

        let existing: HashSet<(String, String)> = root.child("codeSets").map_or_else(
            HashSet::new,
            |section| {
                section
                    .elements()
                    .filter(|e| e.local_name() == "codeSet")
                    .filter_map(|e| {
                        Some((e.attr("name")?.to_string(), scenario_attr(e).to_string()))
                    })
                    .collect()
            },
        );

        if let Some(section) = root.child_mut("codeSets") {
            for element in section
                .elements_mut()
                .filter(|e| e.local_name() == "codeSet")
            {
                let Some(name) = element.attr("name").map(str::to_string) else {
                    continue;
                };
                let scenario = scenario_attr(element).to_string();
                let Some(set) = repo.codeset(&name, &scenario) else {
                    continue;
                };
                if set.total_uses() == 0 {
                    continue;
                }

                element.set_attr("supported", "supported");
                for code_element in element
                    .elements_mut()
                    .filter(|e| e.local_name() == "code")
                {
                    let Some(value) = code_element.attr("value").map(str::to_string) else {
                        continue;
                    };
                    if let Some(code) = set.code_by_value(&value) {
                        code_element.set_attr("supported", supported_value(code.uses > 0));
                    }
                }

                // Values seen in the logs but absent from the reference.
                for code in &set.codes {
                    if code.uses > 0
                        && element.child_where("code", "value", &code.value).is_none()
                    {
                        let mut code_element = emit::code_element(prefix, code);
                        code_element.set_attr("supported", "supported");
                        element.push_element(code_element);
                        stats.codes.added += 1;
                    }
                }

                if !self.append_only {
                    let removed = element.retain_elements(|e| {
                        e.local_name() != "code"
                            || e.attr("value").is_none_or(|value| {
                                set.code_by_value(value).is_some_and(|c| c.uses > 0)
                            })
                    });
                    stats.codes.removed += removed as u64;
                }
            }

            if !self.append_only {
                let mut removed_codes = 0u64;
                section.retain_elements(|e| {
                    if e.local_name() != "codeSet" {
                        return true;
                    }
                    let keep = e.attr("name").is_some_and(|name| {
                        total_by_name.get(name).copied().unwrap_or(0) > 0
                    });
                    if !keep {
                        removed_codes +=
                            e.elements().filter(|c| c.local_name() == "code").count() as u64;
                    }
                    keep
                });
                stats.codes.removed += removed_codes;
            }
        }

        // Whole sets created during replay (scenario clones).
        for set in repo.codesets() {
            if set.total_uses() == 0
                || existing.contains(&(set.name.clone(), set.scenario.clone()))
            {
                continue;
            }
            let mut element = emit::codeset_element(prefix, set);
            element.set_attr("supported", "supported");
            for code_element in element.elements_mut().filter(|e| e.local_name() == "code") {
                let used = code_element
                    .attr("value")
                    .and_then(|value| set.code_by_value(value))
                    .is_some_and(|code| code.uses > 0);
                code_element.set_attr("supported", supported_value(used));
            }
            if !self.append_only {
                element.retain_elements(|e| {
                    e.local_name() != "code"
                        || e.attr("value")
                            .and_then(|value| set.code_by_value(value))
                            .is_some_and(|code| code.uses > 0)
                });
            }
            stats.codes.added +=
                element.elements().filter(|e| e.local_name() == "code").count() as u64;
            ensure_child(root, prefix, "codeSets").push_element(element);
        }
    }

    // ---- fields ------------------------------------------------------

    fn sync_fields(
        &self,
        root: &mut XmlElement,
        prefix: Option<&str>,
        repo: &Repository,
        stats: &mut RunStats,
    ) {
        // Usage summed per tag across scenarios: the base declaration stays
        // as long as any scenario of the field was observed.
        let mut total_by_id: HashMap<u32, u64> = HashMap::new();
        for field in repo.fields() {
            *total_by_id.entry(field.id).or_default() += field.uses;
        }

        let existing: HashSet<(u32, String)> = root.child("fields").map_or_else(
            HashSet::new,
            |section| {
                section
                    .elements()
                    .filter(|e| e.local_name() == "field")
                    .filter_map(|e| {
                        Some((e.attr("id")?.parse().ok()?, scenario_attr(e).to_string()))
                    })
                    .collect()
            },
        );

        if let Some(section) = root.child_mut("fields") {
            for element in section.elements_mut().filter(|e| e.local_name() == "field") {
                let Some(id) = element.attr("id").and_then(|v| v.parse().ok()) else {
                    continue;
                };
                let scenario = scenario_attr(element).to_string();
                if repo
                    .field_by_id(id, &scenario)
                    .is_some_and(|field| field.uses > 0)
                {
                    element.set_attr("supported", "supported");
                }
            }

            if !self.append_only {
                let removed = section.retain_elements(|e| {
                    if e.local_name() != "field" {
                        return true;
                    }
                    e.attr("id")
                        .and_then(|v| v.parse::<u32>().ok())
                        .is_none_or(|id| total_by_id.get(&id).copied().unwrap_or(0) > 0)
                });
                stats.fields.removed += removed as u64;
            }
        }

        for field in repo.fields() {
            if total_by_id.get(&field.id).copied().unwrap_or(0) == 0
                || existing.contains(&(field.id, field.scenario.clone()))
            {
                continue;
            }
            let mut element = emit::field_element(prefix, field);
            if field.uses > 0 {
                element.set_attr("supported", "supported");
            }
            ensure_child(root, prefix, "fields").push_element(element);
            stats.fields.added += 1;
        }
    }

    // ---- structures --------------------------------------------------

    fn sync_structures(
        &self,
        root: &mut XmlElement,
        prefix: Option<&str>,
        repo: &Repository,
        stats: &mut RunStats,
    ) {
        for structure in repo.structures() {
            let (section_local, element_local) = section_of(&structure.kind);

            let present = root.child(section_local).is_some_and(|section| {
                find_structure(section, element_local, &structure.name, &structure.scenario)
                    .is_some()
            });

            if structure.uses == 0 {
                // Untouched structures stay as they are. The exception is a
                // structure created during replay (a transitive scenario
                // clone): append-only mode still declares it; prune mode
                // would only remove it again, so it is dropped here.
                if present || !self.append_only {
                    continue;
                }
                let element = emit::structure_element(prefix, structure);
                ensure_child(root, prefix, section_local).push_element(element);
                match section_local {
                    "messages" => stats.messages.added += 1,
                    "components" => stats.components.added += 1,
                    _ => stats.groups.added += 1,
                }
                continue;
            }

            if present {
                let section = root.child_mut(section_local).expect("section present");
                let element = find_structure_mut(
                    section,
                    element_local,
                    &structure.name,
                    &structure.scenario,
                )
                .expect("element present");
                let is_message = structure.is_message();
                if is_message && element.child("structure").is_none() {
                    element.push_element(XmlElement::new(emit::qualify(prefix, "structure")));
                }
                let target = member_target_mut(element, is_message)
                    .expect("member target just ensured");
                sync_members(target, prefix, structure, stats);
            } else {
                let mut element = emit::structure_element(prefix, structure);
                let target = member_target_mut(&mut element, structure.is_message())
                    .expect("fresh element has its member target");
                flag_members(target, structure);
                ensure_child(root, prefix, section_local).push_element(element);
                match section_local {
                    "messages" => stats.messages.added += 1,
                    "components" => stats.components.added += 1,
                    _ => stats.groups.added += 1,
                }
            }
        }
    }

    // ---- pruning -----------------------------------------------------

    /// Removes member reference elements whose backing model member saw no
    /// usage. Must run before [`Self::prune_structures`].
    fn prune_members(&self, root: &mut XmlElement, repo: &Repository, stats: &mut RunStats) {
        for &(section_local, element_local) in SECTIONS {
            let Some(section) = root.child_mut(section_local) else {
                continue;
            };
            let mut removed = MemberRemovals::default();
            for element in section
                .elements_mut()
                .filter(|e| e.local_name() == element_local)
            {
                let Some(name) = element.attr("name").map(str::to_string) else {
                    continue;
                };
                let scenario = scenario_attr(element).to_string();
                let Some(key) = structure_key(repo, element_local, &name, &scenario) else {
                    continue;
                };
                let model = repo.structure(key);
                let Some(target) = member_target_mut(element, element_local == "message")
                else {
                    continue;
                };
                target.retain_elements(|e| {
                    let Some(kind) = MemberKind::from_element_name(e.local_name()) else {
                        return true;
                    };
                    let Some(id) = e.attr("id").and_then(|v| v.parse().ok()) else {
                        return true;
                    };
                    let keep = model.member(kind, id).is_some_and(|m| m.uses() > 0);
                    if !keep {
                        removed.bump(kind);
                    }
                    keep
                });
            }
            stats.fields.removed += removed.fields;
            stats.components.removed += removed.components;
            stats.groups.removed += removed.groups;
        }
    }

    /// Removes whole structure elements whose model usage count is zero.
    fn prune_structures(&self, root: &mut XmlElement, repo: &Repository, stats: &mut RunStats) {
        for &(section_local, element_local) in SECTIONS {
            let Some(section) = root.child_mut(section_local) else {
                continue;
            };
            let mut removed_scenarios = 0u64;
            let removed = section.retain_elements(|e| {
                if e.local_name() != element_local {
                    return true;
                }
                let Some(name) = e.attr("name") else {
                    return true;
                };
                let scenario = scenario_attr(e);
                let used = structure_key(repo, element_local, name, scenario)
                    .is_some_and(|key| repo.structure(key).uses > 0);
                if !used && element_local == "message" && scenario != BASE_SCENARIO {
                    removed_scenarios += 1;
                }
                used
            });
            match section_local {
                "messages" => stats.messages.removed += removed as u64,
                "components" => stats.components.removed += removed as u64,
                _ => stats.groups.removed += removed as u64,
            }
            stats.scenarios.removed += removed_scenarios;
        }
    }
}

/// Per-kind member removal counters.
#[derive(Default)]
struct MemberRemovals {
    fields: u64,
    components: u64,
    groups: u64,
}

impl MemberRemovals {
    fn bump(&mut self, kind: MemberKind) {
        match kind {
            MemberKind::Field => self.fields += 1,
            MemberKind::Component => self.components += 1,
            MemberKind::Group => self.groups += 1,
        }
    }
}

/// Updates contributor and timestamp in the document metadata.
fn update_metadata(root: &mut XmlElement, prefix: Option<&str>) {
    let metadata = ensure_child(root, prefix, "metadata");
    set_dc_entry(metadata, "contributor", CONTRIBUTOR);
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    set_dc_entry(metadata, "date", &timestamp);
}

fn set_dc_entry(metadata: &mut XmlElement, local: &str, text: &str) {
    if let Some(entry) = metadata.child_mut(local) {
        entry.set_text(text);
        return;
    }
    let mut entry = XmlElement::new(format!("dc:{local}"));
    entry.set_attr("xmlns:dc", DC_NAMESPACE);
    entry.set_text(text);
    metadata.push_element(entry);
}

/// Flags existing member elements from model usage and appends member
/// declarations the model grew during replay.
fn sync_members(
    target: &mut XmlElement,
    prefix: Option<&str>,
    model: &StructureModel,
    stats: &mut RunStats,
) {
    for element in target.elements_mut() {
        let Some(kind) = MemberKind::from_element_name(element.local_name()) else {
            continue;
        };
        let Some(id) = element.attr("id").and_then(|v| v.parse().ok()) else {
            continue;
        };
        if let Some(member) = model.member(kind, id) {
            element.set_attr("supported", supported_value(member.uses() > 0));
        }
    }

    for member in &model.members {
        if member.uses() == 0 {
            continue;
        }
        let kind = member.kind();
        let present = target.elements().any(|e| {
            MemberKind::from_element_name(e.local_name()) == Some(kind)
                && e.attr("id").and_then(|v| v.parse().ok()) == Some(member.id())
        });
        if present {
            continue;
        }
        let mut element = emit::member_element(prefix, member);
        element.set_attr("supported", "supported");
        target.push_element(element);
        match kind {
            MemberKind::Field => stats.fields.added += 1,
            MemberKind::Component => stats.components.added += 1,
            MemberKind::Group => stats.groups.added += 1,
        }
    }
}

/// Sets supported flags on the member elements of a freshly emitted
/// structure.
fn flag_members(target: &mut XmlElement, model: &StructureModel) {
    for element in target.elements_mut() {
        let Some(kind) = MemberKind::from_element_name(element.local_name()) else {
            continue;
        };
        let Some(id) = element.attr("id").and_then(|v| v.parse().ok()) else {
            continue;
        };
        if let Some(member) = model.member(kind, id) {
            element.set_attr("supported", supported_value(member.uses() > 0));
        }
    }
}

/// Counts model elements with usage into the `used` counters.
fn tally_used(repo: &Repository, stats: &mut RunStats) {
    for field in repo.fields() {
        if field.uses > 0 {
            stats.fields.used += 1;
        }
    }
    for set in repo.codesets() {
        for code in &set.codes {
            if code.uses > 0 {
                stats.codes.used += 1;
            }
        }
    }
    let mut used_scenarios: HashSet<&str> = HashSet::new();
    for structure in repo.structures() {
        if structure.uses == 0 {
            continue;
        }
        match &structure.kind {
            StructureKind::Message { .. } => {
                stats.messages.used += 1;
                if structure.scenario != BASE_SCENARIO {
                    used_scenarios.insert(structure.scenario.as_str());
                }
            }
            StructureKind::Component => stats.components.used += 1,
            StructureKind::Group { .. } => stats.groups.used += 1,
        }
    }
    stats.scenarios.used += used_scenarios.len() as u64;
}

fn scenario_attr(element: &XmlElement) -> &str {
    element.attr("scenario").unwrap_or(BASE_SCENARIO)
}

const fn supported_value(used: bool) -> &'static str {
    if used { "supported" } else { "forbidden" }
}

fn section_of(kind: &StructureKind) -> (&'static str, &'static str) {
    match kind {
        StructureKind::Message { .. } => ("messages", "message"),
        StructureKind::Component => ("components", "component"),
        StructureKind::Group { .. } => ("groups", "group"),
    }
}

fn structure_key(
    repo: &Repository,
    element_local: &str,
    name: &str,
    scenario: &str,
) -> Option<StructKey> {
    match element_local {
        "message" => repo.message(name, scenario),
        "component" => repo.component(name, scenario),
        _ => repo.group(name, scenario),
    }
}

fn find_structure<'a>(
    section: &'a XmlElement,
    element_local: &str,
    name: &str,
    scenario: &str,
) -> Option<&'a XmlElement> {
    section.elements().find(|e| {
        e.local_name() == element_local
            && e.attr("name") == Some(name)
            && scenario_attr(e) == scenario
    })
}

fn find_structure_mut<'a>(
    section: &'a mut XmlElement,
    element_local: &str,
    name: &str,
    scenario: &str,
) -> Option<&'a mut XmlElement> {
    section.elements_mut().find(|e| {
        e.local_name() == element_local
            && e.attr("name") == Some(name)
            && scenario_attr(e) == scenario
    })
}

/// Returns the element that owns member declarations: the `structure`
/// child for messages, the element itself otherwise.
fn member_target_mut(
    element: &mut XmlElement,
    is_message: bool,
) -> Option<&mut XmlElement> {
    if is_message {
        element.child_mut("structure")
    } else {
        Some(element)
    }
}

/// Creates the section child when missing and returns it.
fn ensure_child<'a>(
    parent: &'a mut XmlElement,
    prefix: Option<&str>,
    local: &str,
) -> &'a mut XmlElement {
    if parent.child(local).is_none() {
        parent.push_element(XmlElement::new(emit::qualify(prefix, local)));
    }
    parent.child_mut(local).expect("child just ensured")
}
