/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Model
//!
//! The scenario-aware schema model accumulated during log replay.
//!
//! This crate provides the structures that represent an Orchestra
//! repository in memory:
//! - [`FieldDef`]: field definitions with tag, name, datatype and scenario
//! - [`Codeset`] / [`Code`]: enumerated value sets with usage counts
//! - [`StructureMember`]: field/component/group references inside a
//!   structure
//! - [`StructureModel`]: messages, components and repeating groups
//! - [`Repository`]: the keyed collections with scenario-qualified
//!   identity, auxiliary indices, and copy-on-specialize cloning
//!
//! ## Scenarios
//!
//! Every element carries a scenario name; `"base"` is canonical and never
//! derived. Non-base objects are produced by cloning a base object with a
//! zeroed usage count. The standard header and trailer components are the
//! one exception: all scenarios share the same object.
//!
//! ## Ownership
//!
//! Structure nodes live in a single arena inside the repository and are
//! addressed by [`StructKey`] handles. A structure owns its members;
//! members carry a non-owning parent handle. Component and group references
//! resolve lazily, by (id, scenario) lookup against the repository passed
//! into the resolution call.

pub mod field;
pub mod repository;
pub mod scenario;
pub mod structure;

pub use field::{Code, Codeset, FieldDef, Presence, DATATYPE_LENGTH, DEFAULT_DATATYPE};
pub use repository::Repository;
pub use structure::{
    ComponentRef, FieldRef, GroupRef, MemberKind, StructKey, StructureKind, StructureMember,
    StructureModel,
};
