/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Analyzer builder for fluent configuration.

use crate::runner::Analyzer;
use crate::source::{FileSource, LogSource};
use orchfix_replay::KeyFieldConfig;
use std::path::{Path, PathBuf};

/// Default read-chunk size: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Where the reference document comes from.
#[derive(Debug, Clone)]
pub(crate) enum ReferenceInput {
    /// Not configured yet.
    Missing,
    /// XML text supplied directly.
    Text(String),
    /// A file to read at run time.
    File(PathBuf),
}

/// Where the key-field configuration comes from.
#[derive(Debug, Clone)]
pub(crate) enum KeysInput {
    /// Fall back to the built-in default table.
    Default,
    /// An already-parsed configuration.
    Config(KeyFieldConfig),
    /// JSON text supplied directly.
    Json(String),
    /// A file to read at run time.
    File(PathBuf),
}

/// Builder for configuring an [`Analyzer`].
pub struct AnalyzerBuilder {
    reference: ReferenceInput,
    sources: Vec<Box<dyn LogSource>>,
    keys: KeysInput,
    append_only: bool,
    chunk_size: usize,
}

impl AnalyzerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference: ReferenceInput::Missing,
            sources: Vec::new(),
            keys: KeysInput::Default,
            append_only: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Supplies the reference document as XML text.
    #[must_use]
    pub fn with_reference_xml(mut self, xml: impl Into<String>) -> Self {
        self.reference = ReferenceInput::Text(xml.into());
        self
    }

    /// Supplies the reference document as a file path.
    #[must_use]
    pub fn with_reference_file(mut self, path: impl AsRef<Path>) -> Self {
        self.reference = ReferenceInput::File(path.as_ref().to_path_buf());
        self
    }

    /// Adds a log file. Files are replayed strictly in the order added.
    #[must_use]
    pub fn add_log(mut self, path: impl AsRef<Path>) -> Self {
        self.sources.push(Box::new(FileSource::new(path)));
        self
    }

    /// Adds an arbitrary log source.
    #[must_use]
    pub fn add_source(mut self, source: Box<dyn LogSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Supplies an already-parsed key-field configuration.
    #[must_use]
    pub fn with_keys(mut self, keys: KeyFieldConfig) -> Self {
        self.keys = KeysInput::Config(keys);
        self
    }

    /// Supplies the key-field configuration as JSON text.
    #[must_use]
    pub fn with_keys_json(mut self, json: impl Into<String>) -> Self {
        self.keys = KeysInput::Json(json.into());
        self
    }

    /// Supplies the key-field configuration as a file path.
    #[must_use]
    pub fn with_keys_file(mut self, path: impl AsRef<Path>) -> Self {
        self.keys = KeysInput::File(path.as_ref().to_path_buf());
        self
    }

    /// Sets append-only mode: nothing is ever removed from the document,
    /// only additions and flag updates occur.
    #[must_use]
    pub const fn append_only(mut self, append_only: bool) -> Self {
        self.append_only = append_only;
        self
    }

    /// Sets the read-chunk size in bytes.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builds the analyzer.
    #[must_use]
    pub fn build(self) -> Analyzer {
        Analyzer::from_parts(
            self.reference,
            self.sources,
            self.keys,
            self.append_only,
            self.chunk_size.max(1),
        )
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnalyzerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerBuilder")
            .field("reference", &self.reference)
            .field("sources", &self.sources.len())
            .field("append_only", &self.append_only)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = AnalyzerBuilder::new();
        assert_eq!(builder.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!builder.append_only);
        assert!(builder.sources.is_empty());
    }

    #[test]
    fn test_builder_accumulates_logs() {
        let builder = AnalyzerBuilder::new()
            .add_log("a.log")
            .add_log("b.log")
            .append_only(true)
            .with_chunk_size(1024);
        assert_eq!(builder.sources.len(), 2);
        assert!(builder.append_only);
        assert_eq!(builder.chunk_size, 1024);
    }
}
