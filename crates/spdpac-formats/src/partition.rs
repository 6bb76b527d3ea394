//! Partition descriptor records and table decoding
//!
//! The partition table is a contiguous array of fixed 2580-byte records
//! starting at the header's table offset. Each record declares its own
//! length; any other value than 2580 means the layout is not understood and
//! the record cannot be trusted.

use crate::error::{PacError, Result};
use crate::layout::Utf16Field;
use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use tracing::{debug, warn};

/// On-disk size of [`PartitionDescriptor`]
pub const PARTITION_DESCRIPTOR_SIZE: usize = 2580;

/// Upper bound on descriptors preallocated before any has been read
const MAX_PREALLOC: usize = 256;

/// One entry of the partition table
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PartitionDescriptor {
    /// Size of this record as declared by the container
    pub length: u32,

    /// Partition identifier such as `FDL`, `FDL2` or `NV`
    pub partition_name: Utf16Field<256>,

    /// Output file name of the payload
    pub file_name: Utf16Field<256>,

    /// Reserved file name slot, unused
    pub reserved_file_name: Utf16Field<256>,

    /// Payload size in bytes
    pub size: u32,

    /// `1` when the entry carries a file, `0` for pure operations
    pub file_flag: u32,

    /// `1` when the entry must be downloaded
    pub check_flag: u32,

    /// Absolute offset of the payload within the container
    pub offset: u32,

    /// `1` when the entry may be omitted from "all files" downloads
    pub can_omit_flag: u32,

    /// Number of meaningful entries in `addresses`
    pub addr_count: u32,

    /// Auxiliary load addresses
    pub addresses: [u32; 5],

    /// Reserved words, kept verbatim
    pub reserved: [u32; 249],
}

impl PartitionDescriptor {
    /// Create a descriptor with a valid record length and the given payload location
    pub fn new(partition_name: &str, file_name: &str, offset: u32, size: u32) -> Self {
        Self {
            length: PARTITION_DESCRIPTOR_SIZE as u32,
            partition_name: Utf16Field::from_text(partition_name),
            file_name: Utf16Field::from_text(file_name),
            reserved_file_name: Utf16Field::empty(),
            size,
            file_flag: u32::from(size != 0),
            check_flag: 1,
            offset,
            can_omit_flag: 0,
            addr_count: 0,
            addresses: [0; 5],
            reserved: [0; 249],
        }
    }

    /// Whether the record declares the expected length
    pub fn has_valid_length(&self) -> bool {
        self.length as usize == PARTITION_DESCRIPTOR_SIZE
    }

    /// Payload size, widened
    pub fn payload_size(&self) -> u64 {
        u64::from(self.size)
    }

    /// Byte range of the payload within the container
    pub fn payload_range(&self) -> Range<u64> {
        let start = u64::from(self.offset);
        start..start + self.payload_size()
    }

    /// Whether the descriptor has no payload to extract
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn log_fields(&self, index: usize) {
        debug!(
            index,
            size = self.length,
            file_id = %self.partition_name.text(),
            file_name = %self.file_name.text(),
            file_size = self.size,
            file_flag = self.file_flag,
            check_flag = self.check_flag,
            data_offset = self.offset,
            can_omit_flag = self.can_omit_flag,
            "decoded partition descriptor"
        );
    }
}

/// How to treat descriptors with an unexpected record length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Fail on the first untrusted record
    #[default]
    Strict,
    /// Drop untrusted records, keep going at the fixed stride, and report
    /// every rejection
    Lenient,
}

/// Decoded partition table
#[derive(Debug, Default)]
pub struct PartitionTable {
    /// Trusted descriptors in table order
    pub descriptors: Vec<PartitionDescriptor>,
    /// Records rejected in lenient mode
    pub rejected: Vec<PacError>,
}

impl PartitionTable {
    /// Decode `count` descriptors starting at `offset`
    ///
    /// In strict mode a record whose length field is not 2580 aborts decoding
    /// with [`PacError::PartitionRecordLength`]. I/O failures are fatal in
    /// both modes.
    pub fn decode<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
        count: u32,
        mode: DecodeMode,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(offset))?;

        let count = count as usize;
        let mut table = Self {
            descriptors: Vec::with_capacity(count.min(MAX_PREALLOC)),
            rejected: Vec::new(),
        };

        for index in 0..count {
            let descriptor = PartitionDescriptor::read(reader)?;
            descriptor.log_fields(index);

            if descriptor.has_valid_length() {
                table.descriptors.push(descriptor);
                continue;
            }

            let err = PacError::PartitionRecordLength {
                index,
                length: descriptor.length,
            };
            match mode {
                DecodeMode::Strict => return Err(err),
                DecodeMode::Lenient => {
                    warn!("{err}; skipping record");
                    table.rejected.push(err);
                }
            }
        }

        Ok(table)
    }

    /// Whether any record was rejected
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Strictly decode `count` descriptors starting at `offset`
pub fn decode_partition_table<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    count: u32,
) -> Result<Vec<PartitionDescriptor>> {
    PartitionTable::decode(reader, offset, count, DecodeMode::Strict).map(|t| t.descriptors)
}
