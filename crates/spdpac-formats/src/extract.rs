//! Streaming extraction of partition payloads
//!
//! Each payload is copied from the container to its own file in bounded
//! chunks. Destination files are opened right before their copy loop and
//! closed right after it.

use crate::error::{PacError, Result};
use crate::partition::PartitionDescriptor;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Default copy buffer size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// What to do when a partition fails to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing partition
    #[default]
    FailFast,
    /// Record the failure and continue with the next partition
    Continue,
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Copy buffer size in bytes; values below 1 are treated as 1
    pub chunk_size: usize,
    /// Failure handling
    pub policy: FailurePolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            policy: FailurePolicy::FailFast,
        }
    }
}

/// Progress of a single partition copy, emitted after every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'a> {
    /// Position of the descriptor in the table
    pub index: usize,
    /// Output file name
    pub file_name: &'a str,
    /// Bytes copied so far
    pub copied: u64,
    /// Payload size
    pub total: u64,
    /// `100 - floor(100 * remaining / total)`
    pub percent: u8,
}

/// A payload written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Position of the descriptor in the table
    pub index: usize,
    /// Partition identifier
    pub partition_name: String,
    /// Path of the written file
    pub path: PathBuf,
    /// Bytes written
    pub size: u64,
}

/// A partition that could not be extracted
#[derive(Debug)]
pub struct ExtractFailure {
    /// Position of the descriptor in the table
    pub index: usize,
    /// Output file name from the descriptor
    pub file_name: String,
    /// Cause
    pub error: PacError,
}

/// Result of extracting a whole table
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Payloads written, in table order
    pub extracted: Vec<ExtractedFile>,
    /// Identifiers of zero-size descriptors that produced no file
    pub skipped: Vec<String>,
    /// Failures recorded under [`FailurePolicy::Continue`]
    pub failures: Vec<ExtractFailure>,
}

impl ExtractReport {
    /// Whether every non-empty partition was extracted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total bytes written
    pub fn bytes_written(&self) -> u64 {
        self.extracted.iter().map(|f| f.size).sum()
    }
}

/// Percentage reported after a chunk, given the bytes still to copy
///
/// `total` must be non-zero.
pub fn progress_percent(remaining: u64, total: u64) -> u8 {
    (100 - (100 * remaining) / total) as u8
}

/// Make sure `path` is a usable output directory, creating it if missing
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(PacError::OutputNotDirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Resolve the destination of a payload inside `out_dir`
///
/// The name must be a single plain path component.
pub fn output_path(out_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(out_dir.join(name)),
        _ => Err(PacError::UnsafeFileName(file_name.to_string())),
    }
}

/// Copy one partition payload into `out_dir`
///
/// Any existing file at the destination is truncated. If the source runs
/// out before the declared size is reached, the partial file is removed and
/// [`PacError::ShortRead`] is returned.
pub fn extract_partition<R, F>(
    reader: &mut R,
    index: usize,
    descriptor: &PartitionDescriptor,
    out_dir: &Path,
    chunk_size: usize,
    progress: &mut F,
) -> Result<PathBuf>
where
    R: Read + Seek,
    F: FnMut(&Progress<'_>),
{
    let file_name = descriptor.file_name.text();
    let path = output_path(out_dir, &file_name)?;

    reader.seek(SeekFrom::Start(u64::from(descriptor.offset)))?;
    let mut out = File::create(&path)?;

    let copied = copy_payload(
        reader,
        &mut out,
        index,
        descriptor,
        &file_name,
        chunk_size,
        progress,
    );
    drop(out);

    if let Err(e) = copied {
        if let Err(rm) = fs::remove_file(&path) {
            warn!("Failed to remove partial file {}: {}", path.display(), rm);
        }
        return Err(e);
    }

    Ok(path)
}

fn copy_payload<R, W, F>(
    reader: &mut R,
    out: &mut W,
    index: usize,
    descriptor: &PartitionDescriptor,
    file_name: &str,
    chunk_size: usize,
    progress: &mut F,
) -> Result<()>
where
    R: Read,
    W: Write,
    F: FnMut(&Progress<'_>),
{
    let total = descriptor.payload_size();
    let buffer_len = usize::try_from(total).map_or(chunk_size, |t| t.min(chunk_size));
    let mut buffer = vec![0u8; buffer_len.max(1)];
    let mut remaining = total;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
        let read = match reader.read(&mut buffer[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if read == 0 {
            return Err(PacError::ShortRead {
                file_name: file_name.to_string(),
                expected: total,
                copied: total - remaining,
            });
        }

        out.write_all(&buffer[..read])?;
        remaining -= read as u64;

        progress(&Progress {
            index,
            file_name,
            copied: total - remaining,
            total,
            percent: progress_percent(remaining, total),
        });
    }

    out.flush()?;
    Ok(())
}

/// Extract every non-empty partition in table order
pub fn extract_all<R, F>(
    reader: &mut R,
    descriptors: &[PartitionDescriptor],
    out_dir: &Path,
    options: &ExtractOptions,
    mut progress: F,
) -> Result<ExtractReport>
where
    R: Read + Seek,
    F: FnMut(&Progress<'_>),
{
    let mut report = ExtractReport::default();

    for (index, descriptor) in descriptors.iter().enumerate() {
        let partition_name = descriptor.partition_name.text();
        if descriptor.is_empty() {
            debug!("Skipping {} (no payload)", partition_name);
            report.skipped.push(partition_name);
            continue;
        }

        match extract_partition(
            reader,
            index,
            descriptor,
            out_dir,
            options.chunk_size,
            &mut progress,
        ) {
            Ok(path) => {
                info!(
                    "Extracted {} to {} ({} bytes)",
                    partition_name,
                    path.display(),
                    descriptor.size
                );
                report.extracted.push(ExtractedFile {
                    index,
                    partition_name,
                    path,
                    size: descriptor.payload_size(),
                });
            }
            Err(error) => match options.policy {
                FailurePolicy::FailFast => return Err(error),
                FailurePolicy::Continue => {
                    warn!("Failed to extract {}: {}", partition_name, error);
                    report.failures.push(ExtractFailure {
                        index,
                        file_name: descriptor.file_name.text(),
                        error,
                    });
                }
            },
        }
    }

    Ok(report)
}
