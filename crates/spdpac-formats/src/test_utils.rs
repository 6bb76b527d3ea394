//! Synthetic container construction for tests
//!
//! Lays out a header, the partition table and the payloads back to back,
//! then patches the declared size and both checksums so the result passes
//! every check. Available to other crates through the `test-utils` feature.

use crate::crc16;
use crate::header::{HEADER_CRC_REGION, HEADER_SIZE, PacHeader};
use crate::layout::Utf16Field;
use crate::partition::{PARTITION_DESCRIPTOR_SIZE, PartitionDescriptor};
use binrw::BinWriterExt;
use binrw::io::Cursor;

/// Builder for containers that pass every check unless told otherwise
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    header: PacHeader,
    table_gap: usize,
    payload_gap: usize,
    partitions: Vec<(String, String, Vec<u8>)>,
}

impl ContainerBuilder {
    /// Empty container with placeholder product and firmware names
    pub fn new() -> Self {
        let mut header = PacHeader::new();
        header.product_name = Utf16Field::from_text("synthetic");
        header.firmware_name = Utf16Field::from_text("synthetic_fw");
        Self {
            header,
            table_gap: 0,
            payload_gap: 0,
            partitions: Vec::new(),
        }
    }

    /// Firmware name stored in the header
    #[must_use]
    pub fn firmware_name(mut self, name: &str) -> Self {
        self.header.firmware_name = Utf16Field::from_text(name);
        self
    }

    /// Filler bytes between the header and the table
    #[must_use]
    pub const fn table_gap(mut self, gap: usize) -> Self {
        self.table_gap = gap;
        self
    }

    /// Filler bytes between the table and the first payload
    #[must_use]
    pub const fn payload_gap(mut self, gap: usize) -> Self {
        self.payload_gap = gap;
        self
    }

    /// Append a partition; an empty payload gets offset 0
    #[must_use]
    pub fn partition(mut self, id: &str, file_name: &str, payload: Vec<u8>) -> Self {
        self.partitions
            .push((id.to_string(), file_name.to_string(), payload));
        self
    }

    /// Header and descriptors with the declared size set, before checksums
    pub fn layout(&self) -> (PacHeader, Vec<PartitionDescriptor>) {
        let table_offset = HEADER_SIZE + self.table_gap;
        let mut offset =
            table_offset + self.partitions.len() * PARTITION_DESCRIPTOR_SIZE + self.payload_gap;

        let mut descriptors = Vec::with_capacity(self.partitions.len());
        for (id, name, payload) in &self.partitions {
            let at = if payload.is_empty() { 0 } else { offset };
            descriptors.push(PartitionDescriptor::new(
                id,
                name,
                at as u32,
                payload.len() as u32,
            ));
            offset += payload.len();
        }

        let mut header = self.header.clone();
        header.partition_count = self.partitions.len() as u32;
        header.partition_table_offset = table_offset as u32;
        header.total_size = offset as u32;
        (header, descriptors)
    }

    /// Assemble a valid container
    pub fn build(&self) -> Vec<u8> {
        self.build_with(|_, _| {})
    }

    /// Assemble a container after letting `tweak` edit the laid-out header
    /// and descriptors
    pub fn build_with<F>(&self, tweak: F) -> Vec<u8>
    where
        F: FnOnce(&mut PacHeader, &mut [PartitionDescriptor]),
    {
        let (mut header, mut descriptors) = self.layout();
        tweak(&mut header, &mut descriptors);
        self.build_from(&header, &descriptors)
    }

    /// Assemble bytes from an explicit header and table
    ///
    /// The table always lands after the configured gap, whatever offset the
    /// header declares. Checksums are recomputed over the final bytes.
    pub fn build_from(&self, header: &PacHeader, descriptors: &[PartitionDescriptor]) -> Vec<u8> {
        let table_offset = HEADER_SIZE + self.table_gap;

        let mut cursor = Cursor::new(Vec::new());
        cursor.write_le(header).expect("encode header");
        cursor.get_mut().resize(table_offset, 0xA5);
        cursor.set_position(table_offset as u64);
        for d in descriptors {
            cursor.write_le(d).expect("encode descriptor");
        }

        let mut data = cursor.into_inner();
        data.resize(data.len() + self.payload_gap, 0x3C);
        for (_, _, payload) in &self.partitions {
            data.extend_from_slice(payload);
        }

        patch_checksums(&mut data);
        data
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute CRC2 then CRC1 and store them in the header
pub fn patch_checksums(data: &mut [u8]) {
    let crc2 = crc16::checksum(&data[HEADER_SIZE..]);
    data[HEADER_CRC_REGION + 2..HEADER_SIZE].copy_from_slice(&crc2.to_le_bytes());
    let crc1 = crc16::checksum(&data[..HEADER_CRC_REGION]);
    data[HEADER_CRC_REGION..HEADER_CRC_REGION + 2].copy_from_slice(&crc1.to_le_bytes());
}
