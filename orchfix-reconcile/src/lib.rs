/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Reconcile
//!
//! Synchronizes the accumulated schema model back into the reference
//! Orchestra document: adds missing declarations, flags elements
//! supported or forbidden from observed usage, and — unless running
//! append-only — prunes declarations nothing in the logs touched.

pub mod reconciler;

pub use reconciler::Reconciler;
