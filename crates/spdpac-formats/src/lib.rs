//! Decoder, integrity checks and streaming extraction for Spreadtrum PAC
//! firmware containers
//!
#![allow(clippy::cast_possible_truncation)] // Fixed-width on-disk fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Log message style
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! A PAC file bundles the flashable partition images of a firmware release
//! together with the metadata needed by the flash tool. The layout is:
//!
//! - a 2124-byte header (version `BP_R1.0.0`, declared size, names, flags,
//!   magic and two CRC-16 checksums)
//! - a table of fixed 2580-byte partition descriptors at a stored offset
//! - partition payloads at absolute offsets elsewhere in the file
//!
//! All integers are little-endian and all text is fixed-width UTF-16LE.
//!
//! # Usage
//!
//! ```rust,no_run
//! use spdpac_formats::{ExtractOptions, PacFile};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pac = PacFile::open("firmware.pac")?;
//! pac.verify_checksums()?;
//!
//! let report = pac.extract_all(Path::new("out"), &ExtractOptions::default(), |p| {
//!     println!("{} {}%", p.file_name, p.percent);
//! })?;
//! println!("{} files written", report.extracted.len());
//! # Ok(())
//! # }
//! ```
//!
//! Writing or repacking containers is not supported; the header and
//! descriptor records can be encoded individually through `binrw`.

#![warn(missing_docs)]

/// CRC-16 checksum engine
pub mod crc16;
pub mod error;
/// Streaming payload extraction
pub mod extract;
pub mod header;
/// Fixed-width text slots
pub mod layout;
pub mod package;
pub mod partition;
pub mod summary;
/// Structural and checksum validation
pub mod verify;

/// Synthetic containers for tests
#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::expect_used, clippy::cast_possible_truncation, missing_docs)]
pub mod test_utils;

pub use crc16::Crc16;
pub use error::{ChecksumRegion, ErrorKind, PacError, Result};
pub use extract::{
    DEFAULT_CHUNK_SIZE, ExtractFailure, ExtractOptions, ExtractReport, ExtractedFile,
    FailurePolicy, Progress,
};
pub use header::{HEADER_SIZE, PAC_MAGIC, PacHeader, SUPPORTED_VERSION};
pub use layout::Utf16Field;
pub use package::PacFile;
pub use partition::{
    DecodeMode, PARTITION_DESCRIPTOR_SIZE, PartitionDescriptor, PartitionTable,
    decode_partition_table,
};
pub use summary::{PacSummary, PartitionSummary};
pub use verify::{ChecksumReport, ChecksumResult, check_structure, verify_checksums};
