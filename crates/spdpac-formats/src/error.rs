//! Error types for PAC container decoding, validation and extraction

use std::path::PathBuf;
use thiserror::Error;

/// Checksum-covered byte range of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumRegion {
    /// Header bytes excluding the two trailing checksum fields
    Header,
    /// Everything after the header up to end of file
    Body,
}

impl std::fmt::Display for ChecksumRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => f.write_str("CRC1 (header)"),
            Self::Body => f.write_str("CRC2 (body)"),
        }
    }
}

/// Coarse classification of a [`PacError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container layout is malformed or unsupported
    Format,
    /// A stored checksum disagrees with the computed one
    Checksum,
    /// Reading the source or writing a destination failed
    Io,
    /// The output location cannot be used
    Path,
}

/// Errors that can occur while reading or extracting a PAC container
#[derive(Debug, Error)]
pub enum PacError {
    /// File is too short to contain a header
    #[error("Not a PAC container: need at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size required
        expected: u64,
        /// Actual size of the source
        actual: u64,
    },

    /// Declared total size does not match the source length
    #[error("Bin packet's size is not correct: header declares {declared} bytes, file has {actual}")]
    SizeMismatch {
        /// Size stored in the header
        declared: u64,
        /// Real length of the source
        actual: u64,
    },

    /// Version tag is not the supported literal
    #[error("Unsupported PAC version: {0:?}")]
    UnsupportedVersion(String),

    /// A partition descriptor declares a record length other than 2580
    #[error("Unknown partition header format at index {index}: record length {length}, expected 2580")]
    PartitionRecordLength {
        /// Position of the record within the table
        index: usize,
        /// Length the record declares for itself
        length: u32,
    },

    /// Binary decoding failed for a reason other than I/O
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Computed checksum disagrees with the stored value
    #[error("CRC check failed for {region}: stored {stored:#06x}, computed {computed:#06x}")]
    ChecksumMismatch {
        /// Which region failed
        region: ChecksumRegion,
        /// Value stored in the header
        stored: u16,
        /// Value computed over the source bytes
        computed: u16,
    },

    /// Source ended before a payload was fully copied
    #[error("Partition image extraction error for {file_name}: expected {expected} bytes, copied {copied}")]
    ShortRead {
        /// Output file name of the partition
        file_name: String,
        /// Declared payload size
        expected: u64,
        /// Bytes copied before the source ran out
        copied: u64,
    },

    /// Output directory path is occupied by a non-directory
    #[error("File with name {} exists", .0.display())]
    OutputNotDirectory(PathBuf),

    /// Descriptor file name would escape the output directory
    #[error("Refusing to write partition with unsafe file name {0:?}")]
    UnsafeFileName(String),

    /// IO error on the source or a destination
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PacError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooShort { .. }
            | Self::SizeMismatch { .. }
            | Self::UnsupportedVersion(_)
            | Self::PartitionRecordLength { .. }
            | Self::Malformed(_) => ErrorKind::Format,
            Self::ChecksumMismatch { .. } => ErrorKind::Checksum,
            Self::ShortRead { .. } | Self::Io(_) => ErrorKind::Io,
            Self::OutputNotDirectory(_) | Self::UnsafeFileName(_) => ErrorKind::Path,
        }
    }
}

impl From<binrw::Error> for PacError {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(io) => Self::Io(io),
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// Result type alias for PAC operations
pub type Result<T> = std::result::Result<T, PacError>;
