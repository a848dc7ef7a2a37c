/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Chunked log input.
//!
//! The engine pulls raw bytes through the [`LogSource`] trait: one chunk
//! per await, appended to the caller's buffer. This is the seam where the
//! surrounding application supplies content — files on disk through
//! [`FileSource`], anything already in memory through [`MemorySource`].

use async_trait::async_trait;
use bytes::BytesMut;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// A sequential, chunked supplier of raw log bytes.
#[async_trait]
pub trait LogSource: Send {
    /// Display name used in warnings and errors.
    fn name(&self) -> &str;

    /// Reads up to `chunk_size` bytes, appending them to `buf`.
    ///
    /// Returns the number of bytes read; zero means end of input.
    ///
    /// # Errors
    /// Returns the underlying I/O error; the engine aborts the run.
    async fn read_chunk(&mut self, buf: &mut BytesMut, chunk_size: usize)
        -> std::io::Result<usize>;
}

/// A log file on disk, opened lazily on the first read.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    file: Option<File>,
}

impl FileSource {
    /// Creates a source for a file path.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.to_string_lossy().into_owned();
        Self {
            path,
            name,
            file: None,
        }
    }
}

#[async_trait]
impl LogSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_chunk(
        &mut self,
        buf: &mut BytesMut,
        chunk_size: usize,
    ) -> std::io::Result<usize> {
        if self.file.is_none() {
            self.file = Some(File::open(&self.path).await?);
        }
        let file = self.file.as_mut().expect("file just opened");

        let mut chunk = vec![0u8; chunk_size];
        let read = file.read(&mut chunk).await?;
        buf.extend_from_slice(&chunk[..read]);
        Ok(read)
    }
}

/// In-memory log content, chunked like a file would be.
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
    position: usize,
}

impl MemorySource {
    /// Creates a source over in-memory bytes.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            position: 0,
        }
    }
}

#[async_trait]
impl LogSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_chunk(
        &mut self,
        buf: &mut BytesMut,
        chunk_size: usize,
    ) -> std::io::Result<usize> {
        let remaining = self.data.len() - self.position;
        let read = remaining.min(chunk_size);
        buf.extend_from_slice(&self.data[self.position..self.position + read]);
        self.position += read;
        Ok(read)
    }
}
