//! The single-file binary container: a 12 byte header followed by a JSON chunk and an optional
//! BIN chunk.

use byteorder::{ByteOrder, LittleEndian};

const MAGIC: u32 = 0x46546C67; // "glTF"
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

pub struct Container<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

pub fn is_container(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(&data[0..4]) == MAGIC
}

fn read_chunk(data: &[u8], offset: usize) -> Result<(u32, &[u8], usize), String> {
    let header = data
        .get(offset..offset + CHUNK_HEADER_LEN)
        .ok_or_else(|| format!("Truncated chunk header at byte {}", offset))?;
    let length = LittleEndian::read_u32(&header[0..4]) as usize;
    let chunk_type = LittleEndian::read_u32(&header[4..8]);

    let start = offset + CHUNK_HEADER_LEN;
    let body = start
        .checked_add(length)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| format!("Chunk at byte {} claims {} bytes past the end", offset, length))?;

    Ok((chunk_type, body, start + length))
}

/// Splits a container into its chunks. Errors are plain messages; the caller attaches the path.
pub fn parse(data: &[u8]) -> Result<Container<'_>, String> {
    if data.len() < HEADER_LEN {
        return Err("File too small for a container header".to_string());
    }
    if !is_container(data) {
        return Err("Invalid container magic".to_string());
    }

    let version = LittleEndian::read_u32(&data[4..8]);
    if version != VERSION {
        return Err(format!("Unsupported container version {}", version));
    }

    let declared = LittleEndian::read_u32(&data[8..12]) as usize;
    let data = data
        .get(..declared)
        .ok_or_else(|| format!("Container declares {} bytes but has {}", declared, data.len()))?;

    let (chunk_type, json, next) = read_chunk(data, HEADER_LEN)?;
    if chunk_type != CHUNK_JSON {
        return Err("First chunk is not JSON".to_string());
    }

    let bin = if next + CHUNK_HEADER_LEN <= data.len() {
        match read_chunk(data, next)? {
            (CHUNK_BIN, bin, _) => Some(bin),
            (other, _, _) => {
                log::warn!("Ignoring container chunk of type {:#010x}", other);
                None
            }
        }
    } else {
        None
    };

    Ok(Container { json, bin })
}
