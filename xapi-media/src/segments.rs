//! Splitting a file into temporary segment files.
//!
//! Each segment owns its file. Dropping a [`TempSegment`] deletes the file
//! and then the upload's temp directory once it is empty, so cleanup runs
//! whether the append that used it succeeded or not.

use rand::RngCore;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, instrument, warn};
use xapi_core::segment_count;

use crate::error::MediaError;

/// One byte range of the source file, materialized on disk.
#[derive(Debug)]
pub struct TempSegment {
    index: u64,
    path: PathBuf,
    len: u64,
}

impl TempSegment {
    /// Zero-based position of the segment in the source file.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Location of the segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true for a zero-length segment.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// File name, `x001` for the first segment.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Reads the segment into memory.
    pub async fn read(&self) -> Result<Vec<u8>, MediaError> {
        Ok(fs::read(&self.path).await?)
    }
}

impl Drop for TempSegment {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to delete segment");
        }
        if let Some(dir) = self.path.parent() {
            // Fails while sibling segments remain, which is expected.
            if std::fs::remove_dir(dir).is_ok() {
                debug!(dir = %dir.display(), "Removed upload temp directory");
            }
        }
    }
}

/// Segment file name for a zero-based index.
pub fn segment_file_name(index: u64) -> String {
    format!("x{:03}", index + 1)
}

/// Splits `source` into `chunk_size`-byte segments under a fresh directory
/// in `temp_root`.
///
/// The file is streamed, never loaded whole. An empty file yields no
/// segments and creates no directory. On failure every segment written so
/// far is removed.
#[instrument(skip(source, temp_root), fields(source = %source.display()))]
pub async fn split(source: &Path, chunk_size: u64, temp_root: &Path) -> Result<Vec<TempSegment>, MediaError> {
    let total_bytes = fs::metadata(source).await?.len();
    let count = segment_count(total_bytes, chunk_size);
    if count == 0 {
        return Ok(Vec::new());
    }

    let dir = temp_root.join(format!("xapi-upload-{}", random_suffix()));
    fs::create_dir_all(&dir).await?;

    match write_segments(source, chunk_size, count, &dir).await {
        Ok(segments) => {
            debug!(segments = segments.len(), total_bytes, dir = %dir.display(), "File split");
            Ok(segments)
        }
        Err(e) => {
            // Segments written so far are already gone; the directory may not be.
            let _ = fs::remove_dir(&dir).await;
            Err(e)
        }
    }
}

async fn write_segments(
    source: &Path,
    chunk_size: u64,
    count: u64,
    dir: &Path,
) -> Result<Vec<TempSegment>, MediaError> {
    let mut input = File::open(source).await?;
    let mut segments = Vec::new();

    for index in 0..count {
        let path = dir.join(segment_file_name(index));
        let mut output = File::create(&path).await?;
        // Register before writing so a failed write still cleans up.
        segments.push(TempSegment {
            index,
            path,
            len: 0,
        });

        let mut range = (&mut input).take(chunk_size);
        let len = tokio::io::copy(&mut range, &mut output).await?;
        output.flush().await?;

        if let Some(segment) = segments.last_mut() {
            segment.len = len;
        }
    }

    Ok(segments)
}

fn random_suffix() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
