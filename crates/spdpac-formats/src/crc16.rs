//! CRC-16 checksum used by PAC containers
//!
//! PAC files carry two 16-bit checksums computed with the ARC variant of
//! CRC-16 (the one exposed as `crc16()` in the Linux kernel): reflected
//! polynomial `0xA001`, initial value `0`, no final XOR.

/// Reflected form of the CRC-16 polynomial `0x8005`
const POLYNOMIAL: u16 = 0xA001;

/// Initial register value
const SEED: u16 = 0x0000;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Running CRC-16 state
///
/// Bytes must be fed in file order; the value is a pure function of the
/// sequence seen since the last [`Crc16::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    /// Create a checksum state at the seed value
    pub const fn new() -> Self {
        Self { crc: SEED }
    }

    /// Return to the seed value
    pub fn reset(&mut self) {
        self.crc = SEED;
    }

    /// Fold one byte into the state
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.crc = (self.crc >> 8) ^ TABLE[usize::from((self.crc ^ u16::from(byte)) & 0xFF)];
    }

    /// Fold a run of bytes into the state
    pub fn update_slice(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Current checksum
    pub const fn value(&self) -> u16 {
        self.crc
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the checksum of a complete buffer
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update_slice(data);
    crc.value()
}
