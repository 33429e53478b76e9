//! Android binary XML (AXML) decoder.
//!
//! Compiled `AndroidManifest.xml` files are a sequence of little-endian
//! chunks, each starting with a `{type: u16, header_size: u16, size: u32}`
//! header:
//!
//! - `RES_XML_TYPE` wraps the whole document
//! - `RES_STRING_POOL_TYPE` holds every name and string value
//! - `RES_XML_RESOURCE_MAP_TYPE` maps attribute-name strings to resource IDs
//! - namespace, element and CDATA chunks describe the tree
//!
//! [`AxmlDecoder`] is the built-in implementation of the
//! [`ManifestDecoder`] capability.

pub mod string_pool;
pub mod tree;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{InspectError, Result};
use crate::strategies::binary_xml::ManifestDecoder;
pub use string_pool::StringPool;
pub use tree::XmlElement;

/// Chunk type constants.
pub mod chunk_type {
    /// Null chunk
    pub const NULL: u16 = 0x0000;
    /// String pool
    pub const STRING_POOL: u16 = 0x0001;
    /// Binary XML document
    pub const XML: u16 = 0x0003;
    /// Namespace scope start
    pub const XML_START_NAMESPACE: u16 = 0x0100;
    /// Namespace scope end
    pub const XML_END_NAMESPACE: u16 = 0x0101;
    /// Element start
    pub const XML_START_ELEMENT: u16 = 0x0102;
    /// Element end
    pub const XML_END_ELEMENT: u16 = 0x0103;
    /// Character data
    pub const XML_CDATA: u16 = 0x0104;
    /// Attribute resource ID map
    pub const XML_RESOURCE_MAP: u16 = 0x0180;
}

/// Typed value data types.
pub mod value_type {
    /// Reference to another resource
    pub const REFERENCE: u8 = 0x01;
    /// Reference to a theme attribute
    pub const ATTRIBUTE: u8 = 0x02;
    /// String pool index
    pub const STRING: u8 = 0x03;
    /// IEEE 754 float
    pub const FLOAT: u8 = 0x04;
    /// Decimal integer
    pub const INT_DEC: u8 = 0x10;
    /// Hexadecimal integer
    pub const INT_HEX: u8 = 0x11;
    /// Boolean
    pub const INT_BOOLEAN: u8 = 0x12;
}

/// Size of a bare chunk header.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Size of an XML tree node header (chunk header + line number + comment).
pub const XML_NODE_HEADER_SIZE: usize = 16;

/// Minimum size of one attribute record.
pub const ATTRIBUTE_SIZE: usize = 20;

/// Sentinel for "no string".
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

/// Android framework attribute resource IDs for the attributes we read.
///
/// Used when the string pool name is empty or obfuscated.
pub const KNOWN_ATTRIBUTE_IDS: [(u32, &str); 4] = [
    (0x0101_020C, "minSdkVersion"),
    (0x0101_021C, "versionName"),
    (0x0101_0270, "targetSdkVersion"),
    (0x0101_0271, "maxSdkVersion"),
];

/// Chunk header with its position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Byte offset of the chunk
    pub offset: usize,
    /// Chunk type
    pub chunk_type: u16,
    /// Header size in bytes
    pub header_size: u16,
    /// Total chunk size in bytes
    pub size: u32,
}

impl ChunkHeader {
    /// Read a chunk header at `offset`.
    pub fn read(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self {
            offset,
            chunk_type: read_u16(data, offset)?,
            header_size: read_u16(data, offset + 2)?,
            size: read_u32(data, offset + 4)?,
        })
    }

    /// Offset of the first byte after the chunk header.
    pub fn body_offset(&self) -> usize {
        self.offset + self.header_size as usize
    }

    /// Offset of the first byte after the chunk.
    pub fn end(&self) -> usize {
        self.offset + self.size as usize
    }
}

/// Built-in binary XML decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxmlDecoder;

impl ManifestDecoder for AxmlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<XmlElement> {
        decode(bytes)
    }
}

/// Decode a binary XML document into its root element.
pub fn decode(data: &[u8]) -> Result<XmlElement> {
    let header = ChunkHeader::read(data, 0)?;
    if header.chunk_type != chunk_type::XML {
        return Err(InspectError::decode(
            0,
            format!("not a binary XML document (chunk type 0x{:04X})", header.chunk_type),
        ));
    }

    let end = (header.size as usize).min(data.len());
    let mut offset = header.header_size as usize;
    let mut pool = StringPool::default();
    let mut resource_ids: Vec<u32> = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    while offset + CHUNK_HEADER_SIZE <= end {
        let chunk = ChunkHeader::read(data, offset)?;
        if (chunk.size as usize) < CHUNK_HEADER_SIZE || chunk.size < u32::from(chunk.header_size) {
            return Err(InspectError::decode(
                offset,
                format!("invalid chunk size {}", chunk.size),
            ));
        }
        if chunk.end() > data.len() {
            return Err(InspectError::TruncatedData {
                offset,
                expected: chunk.size as usize,
                actual: data.len() - offset,
            });
        }

        match chunk.chunk_type {
            chunk_type::STRING_POOL => pool = StringPool::parse(data, &chunk)?,
            chunk_type::XML_RESOURCE_MAP => resource_ids = parse_resource_map(data, &chunk)?,
            chunk_type::XML_START_ELEMENT => {
                stack.push(parse_start_element(data, &chunk, &pool, &resource_ids)?);
            }
            chunk_type::XML_END_ELEMENT => {
                let element = stack
                    .pop()
                    .ok_or_else(|| InspectError::decode(offset, "end tag without start tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        // Stray trailing roots from packers are ignored.
                        if root.is_none() {
                            root = Some(element);
                        }
                    }
                }
            }
            chunk_type::XML_START_NAMESPACE
            | chunk_type::XML_END_NAMESPACE
            | chunk_type::XML_CDATA
            | chunk_type::NULL => {}
            other => {
                tracing::debug!(offset, chunk_type = other, "skipping unknown chunk");
            }
        }

        offset = chunk.end();
    }

    if let Some(open) = stack.last() {
        return Err(InspectError::decode(
            offset,
            format!("unclosed element <{}>", open.name),
        ));
    }

    root.ok_or_else(|| InspectError::decode(offset, "document has no root element"))
}

fn parse_resource_map(data: &[u8], chunk: &ChunkHeader) -> Result<Vec<u32>> {
    let start = chunk.body_offset();
    let count = chunk.end().saturating_sub(start) / 4;
    (0..count).map(|i| read_u32(data, start + i * 4)).collect()
}

fn parse_start_element(
    data: &[u8],
    chunk: &ChunkHeader,
    pool: &StringPool,
    resource_ids: &[u32],
) -> Result<XmlElement> {
    if (chunk.header_size as usize) < XML_NODE_HEADER_SIZE {
        return Err(InspectError::decode(chunk.offset, "element header too small"));
    }

    let ext = chunk.body_offset();
    let name_index = read_u32(data, ext + 4)?;
    let attribute_start = read_u16(data, ext + 8)? as usize;
    let attribute_size = read_u16(data, ext + 10)? as usize;
    let attribute_count = read_u16(data, ext + 12)? as usize;

    let name = pool
        .get(name_index)
        .ok_or_else(|| InspectError::decode(ext, format!("bad element name index {name_index}")))?;
    let mut element = XmlElement::new(name);

    if attribute_count > 0 && attribute_size < ATTRIBUTE_SIZE {
        return Err(InspectError::decode(
            ext,
            format!("attribute size {attribute_size} too small"),
        ));
    }

    for i in 0..attribute_count {
        let at = ext + attribute_start + i * attribute_size;
        if at + ATTRIBUTE_SIZE > chunk.end() {
            return Err(InspectError::TruncatedData {
                offset: at,
                expected: ATTRIBUTE_SIZE,
                actual: chunk.end().saturating_sub(at),
            });
        }

        let ns = read_u32(data, at)?;
        let name = read_u32(data, at + 4)?;
        let raw_value = read_u32(data, at + 8)?;
        let data_type = read_bytes(data, at + 15, 1)?[0];
        let value = read_u32(data, at + 16)?;

        let Some(local) = attribute_name(pool, resource_ids, name) else {
            tracing::debug!(offset = at, "skipping unnamed attribute");
            continue;
        };
        let key = match (ns != NO_ENTRY).then(|| pool.get(ns)).flatten() {
            Some(uri) if !uri.is_empty() => format!("{{{uri}}}{local}"),
            _ => local.to_string(),
        };
        element
            .attributes
            .push((key, render_value(pool, raw_value, data_type, value)));
    }

    Ok(element)
}

/// Resolve an attribute name, preferring the framework resource ID.
fn attribute_name<'a>(pool: &'a StringPool, resource_ids: &[u32], index: u32) -> Option<&'a str> {
    let by_id = resource_ids.get(index as usize).and_then(|id| {
        KNOWN_ATTRIBUTE_IDS
            .iter()
            .find(|(known, _)| known == id)
            .map(|&(_, name)| name)
    });
    by_id.or_else(|| pool.get(index).filter(|s| !s.is_empty()))
}

fn render_value(pool: &StringPool, raw_value: u32, data_type: u8, data: u32) -> String {
    match data_type {
        value_type::STRING => pool
            .get(raw_value)
            .or_else(|| pool.get(data))
            .unwrap_or_default()
            .to_string(),
        value_type::INT_DEC => (data as i32).to_string(),
        value_type::INT_HEX => format!("0x{data:08x}"),
        value_type::INT_BOOLEAN => (data != 0).to_string(),
        value_type::REFERENCE => format!("@{data:08X}"),
        value_type::ATTRIBUTE => format!("?{data:08X}"),
        value_type::FLOAT => f32::from_bits(data).to_string(),
        _ => pool
            .get(raw_value)
            .map_or_else(|| data.to_string(), str::to_string),
    }
}

/// Read bytes with bounds checking.
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(InspectError::TruncatedData {
            offset,
            expected: len,
            actual: data.len().saturating_sub(offset),
        }),
    }
}

/// Read a little-endian u16.
pub fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    read_bytes(data, offset, 2).map(LittleEndian::read_u16)
}

/// Read a little-endian u32.
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    read_bytes(data, offset, 4).map(LittleEndian::read_u32)
}
