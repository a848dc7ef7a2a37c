/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! The analyzer run loop.
//!
//! One run: parse the reference document, load the schema model, seed the
//! length-type tag set from the field datatypes, replay every log strictly
//! in order — chunk by chunk, awaiting each read — then reconcile and
//! serialize. A document or I/O failure aborts the whole run with no
//! partial output; everything message-level lands in the warning log.

use crate::builder::{AnalyzerBuilder, KeysInput, ReferenceInput};
use crate::error::{EngineError, Result};
use crate::source::LogSource;
use bytes::BytesMut;
use orchfix_core::stats::RunStats;
use orchfix_core::warnings::{WarningKind, WarningLog};
use orchfix_model::Repository;
use orchfix_orchestra::{load_repository, Document, DocumentError};
use orchfix_reconcile::Reconciler;
use orchfix_replay::{KeyFieldConfig, ReplayEngine};
use orchfix_tagvalue::{parse_message, MessageFramer};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Outcome of one analyzer run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The updated Orchestra document, serialized.
    pub document: String,
    /// Summary counters.
    pub stats: RunStats,
    /// Per-file, line-numbered warnings.
    pub warnings: WarningLog,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.stats)?;
        if !self.warnings.is_empty() {
            writeln!(f, "warnings:")?;
            write!(f, "{}", self.warnings)?;
        }
        Ok(())
    }
}

/// The configured analyzer.
pub struct Analyzer {
    reference: ReferenceInput,
    sources: Vec<Box<dyn LogSource>>,
    keys: KeysInput,
    append_only: bool,
    chunk_size: usize,
}

impl Analyzer {
    /// Returns a builder with default settings.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub(crate) fn from_parts(
        reference: ReferenceInput,
        sources: Vec<Box<dyn LogSource>>,
        keys: KeysInput,
        append_only: bool,
        chunk_size: usize,
    ) -> Self {
        Self {
            reference,
            sources,
            keys,
            append_only,
            chunk_size,
        }
    }

    /// Runs the analyzer: replay every log, reconcile, serialize.
    ///
    /// # Errors
    /// Returns [`EngineError`] on reference-document, configuration or
    /// I/O failures. Malformed log content is tolerated and reported in
    /// the returned warning log instead.
    pub async fn run(mut self) -> Result<RunReport> {
        let xml = match &self.reference {
            ReferenceInput::Missing => {
                return Err(DocumentError::structure(
                    "no reference document configured".to_string(),
                )
                .into());
            }
            ReferenceInput::Text(text) => text.clone(),
            ReferenceInput::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| EngineError::io(path.to_string_lossy(), e))?,
        };
        let mut doc = Document::parse(&xml)?;
        let mut repo = load_repository(&doc)?;

        let keys = match &self.keys {
            KeysInput::Default => KeyFieldConfig::default_table(),
            KeysInput::Config(config) => config.clone(),
            KeysInput::Json(json) => KeyFieldConfig::from_json(json)?,
            KeysInput::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| EngineError::io(path.to_string_lossy(), e))?;
                KeyFieldConfig::from_json(&text)?
            }
        };

        let data_length_tags: HashSet<u32> =
            repo.data_length_field_ids().into_iter().collect();
        info!(
            logs = self.sources.len(),
            append_only = self.append_only,
            length_fields = data_length_tags.len(),
            "starting analyzer run"
        );

        let mut replay = ReplayEngine::new(keys);
        let sources = std::mem::take(&mut self.sources);
        for mut source in sources {
            replay_source(
                source.as_mut(),
                &mut repo,
                &mut replay,
                &data_length_tags,
                self.chunk_size,
            )
            .await?;
        }

        let mut stats = replay.stats;
        let warnings = replay.warnings;
        Reconciler::new(self.append_only).run(&mut doc, &repo, &mut stats);
        let document = doc.to_xml()?;

        info!(
            replayed = stats.replayed_messages,
            bad = stats.bad_messages,
            warnings = warnings.len(),
            "analyzer run finished"
        );
        Ok(RunReport {
            document,
            stats,
            warnings,
        })
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("sources", &self.sources.len())
            .field("append_only", &self.append_only)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Replays one source, chunk by chunk. The buffer retains the bytes the
/// framer did not consume and prepends them to the next chunk.
async fn replay_source(
    source: &mut dyn LogSource,
    repo: &mut Repository,
    replay: &mut ReplayEngine,
    data_length_tags: &HashSet<u32>,
    chunk_size: usize,
) -> Result<()> {
    let name = source.name().to_string();
    let mut framer = MessageFramer::new();
    let mut buf = BytesMut::with_capacity(chunk_size * 2);

    loop {
        let read = source
            .read_chunk(&mut buf, chunk_size)
            .await
            .map_err(|e| EngineError::io(name.clone(), e))?;
        let is_final = read == 0;

        let scan = framer.scan(&buf, is_final);
        for frame in &scan.frames {
            let (message, field_errors) =
                parse_message(&buf[frame.range.clone()], data_length_tags, frame.line);
            for err in field_errors {
                replay
                    .warnings
                    .record(&name, frame.line, WarningKind::MalformedField(err));
            }
            replay.replay(repo, &message, &name);
        }
        for &line in &scan.dropped {
            replay.warnings.record(&name, line, WarningKind::Unframed);
        }

        let _ = buf.split_to(scan.consumed);
        if is_final {
            break;
        }
    }

    debug!(
        file = %name,
        bad = framer.bad_messages(),
        "source replay finished"
    );
    replay.stats.bad_messages += framer.bad_messages();
    Ok(())
}
