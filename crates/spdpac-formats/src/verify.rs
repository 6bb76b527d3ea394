//! Structural and checksum validation of a decoded container
//!
//! The structural check always runs and gates everything else. The checksum
//! check is opt-in: it folds every byte after the header through CRC-16,
//! plus the header itself when the magic value is present.

use crate::crc16::Crc16;
use crate::error::{ChecksumRegion, PacError, Result};
use crate::header::{HEADER_CRC_REGION, HEADER_SIZE, PacHeader};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use tracing::{debug, info};

/// Read buffer size for the body checksum
const BODY_CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of one checksum comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumResult {
    /// Region that was checked
    pub region: ChecksumRegion,
    /// Value stored in the header
    pub stored: u16,
    /// Value computed over the source
    pub computed: u16,
}

impl ChecksumResult {
    fn into_result(self) -> Result<Self> {
        if self.stored == self.computed {
            Ok(self)
        } else {
            Err(PacError::ChecksumMismatch {
                region: self.region,
                stored: self.stored,
                computed: self.computed,
            })
        }
    }
}

/// Checksums verified for a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumReport {
    /// Header checksum, only present when the magic value enables it
    pub header: Option<ChecksumResult>,
    /// Body checksum
    pub body: ChecksumResult,
}

/// Check declared size and version against the real source
///
/// The size is compared first, then the version tag.
pub fn check_structure(header: &PacHeader, actual_len: u64) -> Result<()> {
    if header.declared_size() != actual_len {
        return Err(PacError::SizeMismatch {
            declared: header.declared_size(),
            actual: actual_len,
        });
    }

    if !header.is_supported_version() {
        return Err(PacError::UnsupportedVersion(header.version.text()));
    }

    Ok(())
}

/// Verify both checksums of a container
///
/// The header region is checked only when the magic value is present. The
/// body region is always checked, with a fresh checksum state.
pub fn verify_checksums<R: Read + Seek>(
    reader: &mut R,
    header: &PacHeader,
) -> Result<ChecksumReport> {
    let mut crc = Crc16::new();

    let header_result = if header.has_magic() {
        info!("Checking CRC part 1");
        reader.seek(SeekFrom::Start(0))?;
        let mut region = vec![0u8; HEADER_CRC_REGION];
        reader.read_exact(&mut region)?;
        crc.update_slice(&region);

        let result = ChecksumResult {
            region: ChecksumRegion::Header,
            stored: header.crc1,
            computed: crc.value(),
        };
        debug!(
            computed = result.computed,
            stored = result.stored,
            "CRC1 computed"
        );
        Some(result.into_result()?)
    } else {
        debug!(magic = %format!("{:#x}", header.magic), "no magic, skipping CRC1");
        None
    };

    info!("Checking CRC part 2");
    crc.reset();
    reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
    fold_to_end(reader, &mut crc)?;

    let body = ChecksumResult {
        region: ChecksumRegion::Body,
        stored: header.crc2,
        computed: crc.value(),
    };
    debug!(
        computed = body.computed,
        stored = body.stored,
        "CRC2 computed"
    );

    Ok(ChecksumReport {
        header: header_result,
        body: body.into_result()?,
    })
}

/// Compute the checksum a header should carry for each region
///
/// Returns `(crc1, crc2)` for the bytes currently in the source; CRC1 is
/// computed regardless of the magic value.
pub fn compute_checksums<R: Read + Seek>(reader: &mut R) -> Result<(u16, u16)> {
    let mut crc = Crc16::new();

    reader.seek(SeekFrom::Start(0))?;
    let mut region = vec![0u8; HEADER_CRC_REGION];
    reader.read_exact(&mut region)?;
    crc.update_slice(&region);
    let crc1 = crc.value();

    crc.reset();
    reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
    fold_to_end(reader, &mut crc)?;

    Ok((crc1, crc.value()))
}

fn fold_to_end<R: Read>(reader: &mut R, crc: &mut Crc16) -> Result<()> {
    let mut buffer = vec![0u8; BODY_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        crc.update_slice(&buffer[..read]);
    }
}
