//! Serializable overview of a decoded container

use crate::header::PacHeader;
use crate::partition::PartitionDescriptor;
use serde::Serialize;

/// Header metadata and partition listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacSummary {
    /// Version tag
    pub version: String,
    /// Declared container size
    pub size: u64,
    /// Product name
    pub product_name: String,
    /// Firmware name
    pub firmware_name: String,
    /// Product alias
    pub product_alias: String,
    /// Number of descriptors declared by the header
    pub partition_count: u32,
    /// Offset of the partition table
    pub partition_table_offset: u32,
    /// Download mode
    pub mode: u32,
    /// Flash type
    pub flash_type: u32,
    /// NAND strategy
    pub nand_strategy: u32,
    /// NV backup flag
    pub is_nv_backup: u32,
    /// NAND page type
    pub nand_page_type: u32,
    /// OMA-DM product flag
    pub oma_dm_product_flag: u32,
    /// OMA-DM flag
    pub is_oma_dm: u32,
    /// Preload flag
    pub is_preload: u32,
    /// Magic value
    pub magic: u32,
    /// Stored header checksum
    pub crc1: u16,
    /// Stored body checksum
    pub crc2: u16,
    /// Trusted descriptors in table order
    pub partitions: Vec<PartitionSummary>,
}

/// One row of the partition listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    /// Position in the table
    pub index: usize,
    /// Partition identifier
    pub partition_name: String,
    /// Output file name
    pub file_name: String,
    /// Payload size
    pub size: u64,
    /// Payload offset
    pub offset: u64,
    /// File flag
    pub file_flag: u32,
    /// Check flag
    pub check_flag: u32,
    /// Can-omit flag
    pub can_omit_flag: u32,
    /// Meaningful auxiliary addresses
    pub addresses: Vec<u32>,
}

impl PartitionSummary {
    fn new(index: usize, d: &PartitionDescriptor) -> Self {
        let used = (d.addr_count as usize).min(d.addresses.len());
        Self {
            index,
            partition_name: d.partition_name.text(),
            file_name: d.file_name.text(),
            size: d.payload_size(),
            offset: u64::from(d.offset),
            file_flag: d.file_flag,
            check_flag: d.check_flag,
            can_omit_flag: d.can_omit_flag,
            addresses: d.addresses[..used].to_vec(),
        }
    }
}

impl PacSummary {
    /// Summarize a header and its descriptors
    pub fn new(header: &PacHeader, descriptors: &[PartitionDescriptor]) -> Self {
        Self {
            version: header.version.text(),
            size: header.declared_size(),
            product_name: header.product_name.text(),
            firmware_name: header.firmware_name.text(),
            product_alias: header.product_alias.text(),
            partition_count: header.partition_count,
            partition_table_offset: header.partition_table_offset,
            mode: header.mode,
            flash_type: header.flash_type,
            nand_strategy: header.nand_strategy,
            is_nv_backup: header.is_nv_backup,
            nand_page_type: header.nand_page_type,
            oma_dm_product_flag: header.oma_dm_product_flag,
            is_oma_dm: header.is_oma_dm,
            is_preload: header.is_preload,
            magic: header.magic,
            crc1: header.crc1,
            crc2: header.crc2,
            partitions: descriptors
                .iter()
                .enumerate()
                .map(|(i, d)| PartitionSummary::new(i, d))
                .collect(),
        }
    }

    /// Sum of all payload sizes
    pub fn payload_bytes(&self) -> u64 {
        self.partitions.iter().map(|p| p.size).sum()
    }
}
