/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Orchestra
//!
//! Orchestra repository document layer.
//!
//! The reference schema arrives as an XML document in the Orchestra
//! vocabulary. The queries OrchFix needs form a small fixed set of
//! structural paths — fields, codesets and their codes, components,
//! groups and their counters, messages and their structure — so this
//! crate implements them as direct tree traversal over an owned element
//! tree rather than a general query engine.
//!
//! - [`dom`]: the element tree, parsed and re-serialized with `quick-xml`;
//!   unknown elements and attributes pass through untouched
//! - [`loader`]: the fixed-path traversal that populates a
//!   [`orchfix_model::Repository`]
//! - [`emit`]: element builders for declarations created during replay

pub mod dom;
pub mod emit;
pub mod error;
pub mod loader;

pub use dom::{Document, XmlElement, XmlNode};
pub use error::DocumentError;
pub use loader::load_repository;
