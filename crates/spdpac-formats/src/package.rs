//! A decoded container bound to its byte source

use crate::error::{PacError, Result};
use crate::extract::{self, ExtractOptions, ExtractReport, Progress};
use crate::header::{HEADER_SIZE, PacHeader};
use crate::partition::{DecodeMode, PartitionDescriptor, PartitionTable};
use crate::summary::PacSummary;
use crate::verify::{self, ChecksumReport};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::info;

/// An open PAC container
///
/// Construction decodes the header, runs the structural check and decodes
/// the partition table. The source is owned for the lifetime of the value
/// and released when it is dropped, whatever the outcome of later steps.
#[derive(Debug)]
pub struct PacFile<R> {
    source: R,
    len: u64,
    header: PacHeader,
    table: PartitionTable,
}

impl PacFile<BufReader<File>> {
    /// Open a container on disk in strict mode
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DecodeMode::Strict)
    }

    /// Open a container on disk
    pub fn open_with<P: AsRef<Path>>(path: P, mode: DecodeMode) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening {}", path.display());
        let file = File::open(path)?;
        Self::from_reader_with(BufReader::new(file), mode)
    }
}

impl<R: Read + Seek> PacFile<R> {
    /// Decode a container from any seekable source in strict mode
    pub fn from_reader(source: R) -> Result<Self> {
        Self::from_reader_with(source, DecodeMode::Strict)
    }

    /// Decode a container from any seekable source
    pub fn from_reader_with(mut source: R, mode: DecodeMode) -> Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        if len < HEADER_SIZE as u64 {
            return Err(PacError::TooShort {
                expected: HEADER_SIZE as u64,
                actual: len,
            });
        }

        let header = PacHeader::decode(&mut source)?;
        verify::check_structure(&header, len)?;
        info!("Firmware name: {}", header.firmware_name.text());

        let table = PartitionTable::decode(
            &mut source,
            u64::from(header.partition_table_offset),
            header.partition_count,
            mode,
        )?;

        Ok(Self {
            source,
            len,
            header,
            table,
        })
    }

    /// Decoded header
    pub fn header(&self) -> &PacHeader {
        &self.header
    }

    /// Trusted partition descriptors in table order
    pub fn partitions(&self) -> &[PartitionDescriptor] {
        &self.table.descriptors
    }

    /// Records rejected in lenient mode
    pub fn rejected(&self) -> &[PacError] {
        &self.table.rejected
    }

    /// Length of the source in bytes
    pub fn source_len(&self) -> u64 {
        self.len
    }

    /// Run the opt-in checksum check
    pub fn verify_checksums(&mut self) -> Result<ChecksumReport> {
        verify::verify_checksums(&mut self.source, &self.header)
    }

    /// Extract every non-empty partition into `out_dir`
    ///
    /// The directory is created if missing.
    pub fn extract_all<F>(
        &mut self,
        out_dir: &Path,
        options: &ExtractOptions,
        progress: F,
    ) -> Result<ExtractReport>
    where
        F: FnMut(&Progress<'_>),
    {
        extract::ensure_output_dir(out_dir)?;
        extract::extract_all(
            &mut self.source,
            &self.table.descriptors,
            out_dir,
            options,
            progress,
        )
    }

    /// Serializable overview of the header and table
    pub fn summary(&self) -> PacSummary {
        PacSummary::new(&self.header, &self.table.descriptors)
    }

    /// Give back the source
    pub fn into_inner(self) -> R {
        self.source
    }
}
