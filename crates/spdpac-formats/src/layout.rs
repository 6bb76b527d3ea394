//! Fixed-width little-endian layout primitives
//!
//! Every PAC record is a packed sequence of little-endian integers and
//! UTF-16LE text slots. Integers are handled directly by binrw; this module
//! provides the text slot type, which keeps the on-disk code units verbatim so
//! a record re-encodes to exactly the bytes it was decoded from.

use binrw::{BinRead, BinResult, BinWrite, Endian};
use std::io::{Read, Seek, Write};

/// A fixed-width text slot of `N` UTF-16 code units
///
/// The slot width never depends on its content. Decoding keeps all `N` units,
/// including padding, and [`Utf16Field::text`] produces the trimmed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utf16Field<const N: usize> {
    units: Vec<u16>,
}

impl<const N: usize> Utf16Field<N> {
    /// On-disk size of the slot in bytes
    pub const BYTE_LEN: usize = N * 2;

    /// Create a slot from text, padding with NUL units
    ///
    /// Text longer than the slot is truncated to `N` code units.
    pub fn from_text(text: &str) -> Self {
        let mut units: Vec<u16> = text.encode_utf16().take(N).collect();
        units.resize(N, 0);
        Self { units }
    }

    /// Create a slot from raw code units
    ///
    /// Returns `None` unless exactly `N` units are supplied.
    pub fn from_units(units: Vec<u16>) -> Option<Self> {
        (units.len() == N).then_some(Self { units })
    }

    /// Create an all-NUL slot
    pub fn empty() -> Self {
        Self { units: vec![0; N] }
    }

    /// Raw code units as stored on disk
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Decoded text with trailing NUL padding and whitespace removed
    pub fn text(&self) -> String {
        decode_text(&self.units)
    }
}

impl<const N: usize> Default for Utf16Field<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> BinRead for Utf16Field<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut units = Vec::with_capacity(N);
        for _ in 0..N {
            units.push(u16::read_options(reader, endian, ())?);
        }
        Ok(Self { units })
    }
}

impl<const N: usize> BinWrite for Utf16Field<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<()> {
        for unit in &self.units {
            unit.write_options(writer, endian, ())?;
        }
        Ok(())
    }
}

/// Decode UTF-16 code units into trimmed text
///
/// Only trailing NUL and whitespace units are stripped; a NUL followed by
/// other text stays part of the value. Unpaired surrogates become U+FFFD.
pub fn decode_text(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
