/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Terminal errors for an analyzer run.
//!
//! Only unrecoverable failures surface here: an unreadable or malformed
//! reference document, an invalid key configuration, or an I/O failure on
//! an input. Per-message problems never become errors; they land in the
//! warning log instead.

use orchfix_orchestra::DocumentError;
use orchfix_replay::ConfigError;
use thiserror::Error;

/// Result type alias using [`EngineError`] as the error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for an analyzer run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reference document could not be read or parsed.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// The key-field configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An input could not be read. The whole run is aborted; no partial
    /// output is produced.
    #[error("io error reading '{path}': {source}")]
    Io {
        /// The input that failed.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl EngineError {
    /// Wraps an I/O error with the input it came from.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_input() {
        let err = EngineError::io(
            "session.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("session.log"));
    }
}
