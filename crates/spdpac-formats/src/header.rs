//! PAC file header (2124 bytes, little-endian)

use crate::error::Result;
use crate::layout::Utf16Field;
use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

/// On-disk size of [`PacHeader`]
pub const HEADER_SIZE: usize = 2124;

/// Magic value enabling the header checksum (CRC1)
pub const PAC_MAGIC: u32 = 0xFFFA_FFFA;

/// The only supported version tag
pub const SUPPORTED_VERSION: &str = "BP_R1.0.0";

/// Number of bytes covered by CRC1: the header minus its two checksum fields
pub const HEADER_CRC_REGION: usize = HEADER_SIZE - 4;

/// Top-level PAC container header
///
/// Field order matches the on-disk layout exactly; there is no padding
/// between fields.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PacHeader {
    /// Packet structure version, `BP_R1.0.0` for supported files
    pub version: Utf16Field<24>,

    /// Declared size of the whole container in bytes
    pub total_size: u32,

    /// Product name
    pub product_name: Utf16Field<256>,

    /// Firmware (product version) name
    pub firmware_name: Utf16Field<256>,

    /// Number of partition descriptors
    pub partition_count: u32,

    /// Absolute offset of the first partition descriptor
    pub partition_table_offset: u32,

    /// Download mode
    pub mode: u32,

    /// Flash type
    pub flash_type: u32,

    /// NAND strategy
    pub nand_strategy: u32,

    /// Whether NV backup is requested
    pub is_nv_backup: u32,

    /// NAND page type
    pub nand_page_type: u32,

    /// Product alias
    pub product_alias: Utf16Field<100>,

    /// OMA-DM product flag
    pub oma_dm_product_flag: u32,

    /// Whether the package is an OMA-DM package
    pub is_oma_dm: u32,

    /// Whether the package is a preload package
    pub is_preload: u32,

    /// Reserved words, kept verbatim
    pub reserved: [u32; 200],

    /// Magic value; [`PAC_MAGIC`] when CRC1 is present
    pub magic: u32,

    /// CRC-16 over the first [`HEADER_CRC_REGION`] bytes
    pub crc1: u16,

    /// CRC-16 over every byte after the header
    pub crc2: u16,
}

impl PacHeader {
    /// Create a header for the supported version with all other fields zeroed
    pub fn new() -> Self {
        Self {
            version: Utf16Field::from_text(SUPPORTED_VERSION),
            total_size: 0,
            product_name: Utf16Field::empty(),
            firmware_name: Utf16Field::empty(),
            partition_count: 0,
            partition_table_offset: HEADER_SIZE as u32,
            mode: 0,
            flash_type: 0,
            nand_strategy: 0,
            is_nv_backup: 0,
            nand_page_type: 0,
            product_alias: Utf16Field::empty(),
            oma_dm_product_flag: 0,
            is_oma_dm: 0,
            is_preload: 0,
            reserved: [0; 200],
            magic: PAC_MAGIC,
            crc1: 0,
            crc2: 0,
        }
    }

    /// Decode the header from the start of a source
    pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = Self::read(reader)?;
        header.log_fields();
        Ok(header)
    }

    /// Declared container size, widened
    pub fn declared_size(&self) -> u64 {
        u64::from(self.total_size)
    }

    /// Whether the version tag is the supported literal
    pub fn is_supported_version(&self) -> bool {
        self.version.text() == SUPPORTED_VERSION
    }

    /// Whether CRC1 is present
    pub fn has_magic(&self) -> bool {
        self.magic == PAC_MAGIC
    }

    fn log_fields(&self) {
        debug!(
            version = %self.version.text(),
            size = self.total_size,
            product = %self.product_name.text(),
            firmware = %self.firmware_name.text(),
            file_count = self.partition_count,
            file_offset = self.partition_table_offset,
            "decoded PAC header"
        );
        debug!(
            mode = self.mode,
            flash_type = self.flash_type,
            nand_strategy = self.nand_strategy,
            is_nv_backup = self.is_nv_backup,
            nand_page_type = self.nand_page_type,
            alias = %self.product_alias.text(),
            oma_dm_product_flag = self.oma_dm_product_flag,
            is_oma_dm = self.is_oma_dm,
            is_preload = self.is_preload,
            magic = %format!("{:#x}", self.magic),
            crc1 = self.crc1,
            crc2 = self.crc2,
            "header flags"
        );
    }
}

impl Default for PacHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PacError};
    use binrw::io::Cursor;
    use binrw::BinWriterExt;
    use pretty_assertions::assert_eq;

    fn encode(header: &PacHeader) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_le(header).expect("Should encode header");
        cursor.into_inner()
    }

    fn sample_header() -> PacHeader {
        let mut header = PacHeader::new();
        header.total_size = 0x0012_3456;
        header.product_name = Utf16Field::from_text("sp9863a_1h10");
        header.firmware_name = Utf16Field::from_text("SC9863A_V1.0");
        header.partition_count = 3;
        header.partition_table_offset = 2124;
        header.mode = 1;
        header.flash_type = 2;
        header.product_alias = Utf16Field::from_text("demo");
        header.reserved[0] = 0xDEAD_BEEF;
        header.reserved[199] = 7;
        header.crc1 = 0xABCD;
        header.crc2 = 0x1234;
        header
    }

    #[test]
    fn test_encoded_size_is_fixed() {
        assert_eq!(encode(&PacHeader::new()).len(), HEADER_SIZE);
        assert_eq!(encode(&sample_header()).len(), HEADER_SIZE);
    }

    #[test]
    fn test_field_offsets() {
        let data = encode(&sample_header());

        // total_size follows the 24-unit version slot
        assert_eq!(&data[48..52], &0x0012_3456u32.to_le_bytes());
        // partition_count and table offset follow two 256-unit slots
        assert_eq!(&data[1076..1080], &3u32.to_le_bytes());
        assert_eq!(&data[1080..1084], &2124u32.to_le_bytes());
        // magic and checksums close the record
        assert_eq!(&data[2116..2120], &PAC_MAGIC.to_le_bytes());
        assert_eq!(&data[2120..2122], &0xABCDu16.to_le_bytes());
        assert_eq!(&data[2122..2124], &0x1234u16.to_le_bytes());
    }

    #[test]
    fn test_decode_round_trip() {
        let original = sample_header();
        let data = encode(&original);

        let mut cursor = Cursor::new(&data);
        let decoded = PacHeader::decode(&mut cursor).expect("Should decode header");

        assert_eq!(decoded, original);
        assert_eq!(cursor.position(), HEADER_SIZE as u64);
        assert_eq!(encode(&decoded), data);
        assert_eq!(decoded.version.text(), "BP_R1.0.0");
        assert_eq!(decoded.product_name.text(), "sp9863a_1h10");
        assert_eq!(decoded.firmware_name.text(), "SC9863A_V1.0");
    }

    #[test]
    fn test_decode_seeks_to_start() {
        let data = encode(&sample_header());
        let mut cursor = Cursor::new(&data);
        cursor.set_position(100);

        let decoded = PacHeader::decode(&mut cursor).expect("Should decode header");
        assert_eq!(decoded.partition_count, 3);
    }

    #[test]
    fn test_short_source_fails() {
        let data = encode(&sample_header());
        let mut cursor = Cursor::new(&data[..HEADER_SIZE - 1]);

        let err = PacHeader::decode(&mut cursor).expect_err("Short header must fail");
        assert!(matches!(err, PacError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_version_and_magic_helpers() {
        let mut header = PacHeader::new();
        assert!(header.is_supported_version());
        assert!(header.has_magic());

        header.version = Utf16Field::from_text("BP_R2.0.1");
        header.magic = 0;
        assert!(!header.is_supported_version());
        assert!(!header.has_magic());
    }

    #[test]
    fn test_declared_size_is_unsigned() {
        let mut header = PacHeader::new();
        header.total_size = 0xFFFF_FFF0;
        assert_eq!(header.declared_size(), 0xFFFF_FFF0);
    }
}
