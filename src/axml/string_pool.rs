//! String pool chunk parser.
//!
//! Strings are stored either as UTF-16LE or UTF-8. Each string is prefixed
//! with its length, encoded in one or two units; the high bit of the first
//! unit marks the two-unit form.

use bitflags::bitflags;

use super::{read_bytes, read_u16, read_u32, ChunkHeader};
use crate::error::{InspectError, Result};

/// Size of the string pool header.
pub const STRING_POOL_HEADER_SIZE: usize = 28;

bitflags! {
    /// String pool header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StringPoolFlags: u32 {
        /// Strings are sorted
        const SORTED = 0x0000_0001;
        /// Strings are UTF-8 encoded
        const UTF8 = 0x0000_0100;
    }
}

/// Decoded string pool.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Parse the string pool chunk described by `header`.
    pub fn parse(data: &[u8], header: &ChunkHeader) -> Result<Self> {
        let base = header.offset;
        if (header.header_size as usize) < STRING_POOL_HEADER_SIZE {
            return Err(InspectError::decode(base, "string pool header too small"));
        }

        let string_count = read_u32(data, base + 8)? as usize;
        let flags = StringPoolFlags::from_bits_truncate(read_u32(data, base + 16)?);
        let strings_start = read_u32(data, base + 20)? as usize;

        let chunk_end = base + header.size as usize;
        let offsets_start = base + header.header_size as usize;
        // Each offset takes 4 bytes; reject counts the chunk cannot hold.
        if string_count > (chunk_end.saturating_sub(offsets_start)) / 4 {
            return Err(InspectError::decode(
                base,
                format!("string count {string_count} exceeds chunk"),
            ));
        }

        let data_start = base + strings_start;
        let mut strings = Vec::with_capacity(string_count);
        for i in 0..string_count {
            let offset = read_u32(data, offsets_start + i * 4)? as usize;
            let at = data_start + offset;
            if at >= chunk_end {
                return Err(InspectError::decode(at, format!("string {i} outside pool")));
            }
            let s = if flags.contains(StringPoolFlags::UTF8) {
                read_utf8(data, at)?
            } else {
                read_utf16(data, at)?
            };
            strings.push(s);
        }

        Ok(Self { strings })
    }

    /// String at `index`, or `None` for the "no string" sentinel or a bad index.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Number of strings in the pool.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when the pool holds no strings.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

fn read_utf8(data: &[u8], at: usize) -> Result<String> {
    // Character count, then byte count; only the byte count matters here.
    let (_, skip) = utf8_length(data, at)?;
    let (len, skip2) = utf8_length(data, at + skip)?;
    let bytes = read_bytes(data, at + skip + skip2, len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn utf8_length(data: &[u8], at: usize) -> Result<(usize, usize)> {
    let first = read_bytes(data, at, 1)?[0] as usize;
    if first & 0x80 == 0 {
        return Ok((first, 1));
    }
    let second = read_bytes(data, at + 1, 1)?[0] as usize;
    Ok((((first & 0x7F) << 8) | second, 2))
}

fn read_utf16(data: &[u8], at: usize) -> Result<String> {
    let first = read_u16(data, at)? as usize;
    let (len, skip) = if first & 0x8000 == 0 {
        (first, 2)
    } else {
        let second = read_u16(data, at + 2)? as usize;
        (((first & 0x7FFF) << 16) | second, 4)
    };

    let bytes = read_bytes(data, at + skip, len * 2)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
