/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! # OrchFix Engine
//!
//! High-level facade over the OrchFix analyzer.
//!
//! This crate wires the layers together: it parses the reference Orchestra
//! document, replays every log file strictly in order through the
//! tag-value framer and the replay engine, reconciles the accumulated
//! model back into the document, and returns the updated document with
//! statistics and warnings.
//!
//! ```no_run
//! use orchfix_engine::Analyzer;
//!
//! # async fn run() -> orchfix_engine::Result<()> {
//! let report = Analyzer::builder()
//!     .with_reference_file("orchestra.xml")
//!     .add_log("fix-session.log")
//!     .append_only(false)
//!     .build()
//!     .run()
//!     .await?;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```
//!
//! Execution is a single sequential suspension chain: the engine awaits one
//! chunk, replays every complete message in it, then awaits the next. No
//! concurrency primitives are involved, and transient memory stays bounded
//! by one chunk plus one partial message.

pub mod builder;
pub mod error;
pub mod runner;
pub mod source;

pub use builder::AnalyzerBuilder;
pub use error::{EngineError, Result};
pub use runner::{Analyzer, RunReport};
pub use source::{FileSource, LogSource, MemorySource};
