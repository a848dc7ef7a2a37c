/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Core
//!
//! Core types shared across all OrchFix crates.
//!
//! This crate provides the fundamental building blocks of the log analyzer:
//! - **Error types**: Recoverable field-level errors with `thiserror`
//! - **Instance types**: `FieldInstance` and `MessageInstance`, the flat
//!   view of a single parsed log message
//! - **Statistics**: `RunStats`, the added/removed/used counters reported
//!   after reconciliation
//! - **Warnings**: `WarningLog`, the per-file line-numbered record of
//!   tolerated input problems
//!
//! ## Tolerance policy
//!
//! Malformed messages and fields never abort a run. They are absorbed into
//! the [`WarningLog`] and the bad-message counters; only document-level and
//! I/O failures surface as errors.

pub mod error;
pub mod field;
pub mod stats;
pub mod warnings;

pub use error::TagError;
pub use field::{FieldInstance, MessageInstance, is_user_defined, BASE_SCENARIO};
pub use stats::{ElementStats, RunStats};
pub use warnings::{Warning, WarningKind, WarningLog};
