/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Replay
//!
//! Message replay against the schema model.
//!
//! This crate drives the per-message half of the analyzer:
//! - [`KeyFieldConfig`]: which fields distinguish scenarios per msgType,
//!   from a JSON document or the built-in default table
//! - [`ScenarioClassifier`]: matches a message instance to an existing
//!   scenario of its message definition, deriving a new one when no key
//!   tuple matches
//! - [`resolver`]: finds the structure member a flat field belongs to,
//!   descending component and group references with an explicit repository
//!   handle
//! - [`GroupTracker`]: the stack machine that keeps repeating-group
//!   context while scanning a flat field sequence
//! - [`ReplayEngine`]: grows the model for unknown elements and
//!   accumulates usage counts
//!
//! Group-tracking state is local to one message; nothing carries across
//! messages or files.

pub mod classifier;
pub mod engine;
pub mod keys;
pub mod resolver;
pub mod tracker;

pub use classifier::ScenarioClassifier;
pub use engine::ReplayEngine;
pub use keys::{ConfigError, KeyFieldConfig};
pub use resolver::{FieldLoc, Resolution, resolve};
pub use tracker::{GroupContext, GroupTracker};
