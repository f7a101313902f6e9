//! Parsers for DXBC signature chunks (`ISGN`, `OSGN`, and variants).
//!
//! Signature chunks map shader model 4+ inputs and outputs to semantic
//! name/index pairs, registers, and component masks.

use crate::error::DxbcError;
use crate::fourcc::FourCC;
use crate::read::{read_cstring, read_u32_le, read_u8};

const HEADER_LEN: usize = 8;
const ENTRY_LEN_V0: usize = 24;
const ENTRY_LEN_V1: usize = 32;

/// `D3D_REGISTER_COMPONENT_TYPE` values stored raw in signature entries.
pub mod component {
    /// 32-bit unsigned integer components.
    pub const UINT32: u32 = 1;
    /// 32-bit signed integer components.
    pub const SINT32: u32 = 2;
    /// 32-bit floating point components.
    pub const FLOAT32: u32 = 3;
}

/// A parsed DXBC signature chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureChunk {
    /// Parsed signature entries, in chunk order.
    pub entries: Vec<SignatureEntry>,
}

/// A single entry in a DXBC signature chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    /// The semantic name (e.g. `"POSITION"` or `"TEXCOORD"`).
    pub semantic_name: String,
    /// The semantic index (e.g. `1` for `TEXCOORD1`).
    pub semantic_index: u32,
    /// Register index assigned by the compiler.
    pub register: u32,
    /// System value type (`D3D_NAME`) stored as a raw `u32`.
    pub system_value_type: u32,
    /// Register component type (`D3D_REGISTER_COMPONENT_TYPE`) stored raw;
    /// see [`component`].
    pub component_type: u32,
    /// Component presence mask; one bit per `xyzw` component.
    pub mask: u8,
    /// Read (inputs) or write (outputs) mask.
    pub read_write_mask: u8,
    /// Stream index (used by geometry shaders).
    pub stream: u32,
}

/// Parses a DXBC signature chunk payload (the bytes following the chunk's
/// fourcc and size fields inside the container).
pub fn parse_signature_chunk(bytes: &[u8]) -> Result<SignatureChunk, DxbcError> {
    parse_impl(None, bytes)
}

pub(crate) fn parse_signature_chunk_for_fourcc(
    fourcc: FourCC,
    bytes: &[u8],
) -> Result<SignatureChunk, DxbcError> {
    parse_impl(Some(fourcc), bytes)
}

fn parse_impl(fourcc: Option<FourCC>, bytes: &[u8]) -> Result<SignatureChunk, DxbcError> {
    if bytes.len() < HEADER_LEN {
        return Err(DxbcError::invalid_chunk(format!(
            "signature chunk is truncated: need {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }

    let param_count = read_u32_le(bytes, 0, "param_count")? as usize;
    let param_offset = read_u32_le(bytes, 4, "param_offset")? as usize;

    if param_count == 0 {
        return Ok(SignatureChunk {
            entries: Vec::new(),
        });
    }
    if param_offset < HEADER_LEN {
        return Err(DxbcError::invalid_chunk(format!(
            "param_offset {param_offset} points into the signature header"
        )));
    }

    // Two entry encodings exist in the wild: the 24-byte original and a
    // 32-byte variant with dedicated stream/min-precision DWORDs. `*SG1`
    // chunk IDs always use the latter; for plain IDs fall back to a layout
    // probe on the first entry.
    let prefer_v1 =
        matches!(fourcc, Some(f) if f.0[3] == b'1') || probe_v1_layout(bytes, param_offset);
    let (first, second) = if prefer_v1 {
        (ENTRY_LEN_V1, ENTRY_LEN_V0)
    } else {
        (ENTRY_LEN_V0, ENTRY_LEN_V1)
    };

    match parse_entries(bytes, param_count, param_offset, first) {
        Ok(entries) => Ok(SignatureChunk { entries }),
        Err(first_err) => match parse_entries(bytes, param_count, param_offset, second) {
            Ok(entries) => Ok(SignatureChunk { entries }),
            Err(second_err) => Err(DxbcError::invalid_chunk(format!(
                "failed to parse signature entries ({first}-byte layout: {}; {second}-byte \
                 layout: {})",
                first_err.detail(),
                second_err.detail()
            ))),
        },
    }
}

fn parse_entries(
    bytes: &[u8],
    param_count: usize,
    param_offset: usize,
    entry_len: usize,
) -> Result<Vec<SignatureEntry>, DxbcError> {
    let table_len = param_count
        .checked_mul(entry_len)
        .ok_or_else(|| DxbcError::invalid_chunk("signature entry count overflows table size"))?;
    let table_end = param_offset
        .checked_add(table_len)
        .ok_or_else(|| DxbcError::invalid_chunk("signature table end overflows"))?;
    if table_end > bytes.len() {
        return Err(DxbcError::invalid_chunk(format!(
            "signature table at {param_offset}..{table_end} is outside chunk length {}",
            bytes.len()
        )));
    }

    let mut entries = Vec::new();
    entries.try_reserve_exact(param_count).map_err(|_| {
        DxbcError::invalid_chunk(format!(
            "signature entry count {param_count} is too large to allocate"
        ))
    })?;

    for index in 0..param_count {
        let start = param_offset + index * entry_len;

        let name_offset = read_u32_le(bytes, start, "semantic_name_offset")? as usize;
        if (param_offset..table_end).contains(&name_offset) || name_offset < HEADER_LEN {
            return Err(DxbcError::invalid_chunk(format!(
                "entry {index} semantic_name_offset {name_offset} points into the header or \
                 entry table"
            )));
        }

        let semantic_index = read_u32_le(bytes, start + 4, "semantic_index")?;
        let system_value_type = read_u32_le(bytes, start + 8, "system_value_type")?;
        let component_type = read_u32_le(bytes, start + 12, "component_type")?;
        let register = read_u32_le(bytes, start + 16, "register")?;

        let (mask, read_write_mask, stream) = match entry_len {
            ENTRY_LEN_V0 => {
                // Final DWORD packs mask / rw_mask / stream / min_precision
                // as single bytes.
                let packed = read_u32_le(bytes, start + 20, "mask/rw_mask/stream")?;
                (
                    (packed & 0xFF) as u8,
                    ((packed >> 8) & 0xFF) as u8,
                    (packed >> 16) & 0xFF,
                )
            }
            _ => {
                let mask = read_u8(bytes, start + 20, "mask")?;
                let read_write_mask = read_u8(bytes, start + 21, "read_write_mask")?;
                let stream = read_u32_le(bytes, start + 24, "stream")?;
                (mask, read_write_mask, stream)
            }
        };

        let semantic_name = read_cstring(bytes, name_offset, "semantic_name")?.to_owned();

        entries.push(SignatureEntry {
            semantic_name,
            semantic_index,
            register,
            system_value_type,
            component_type,
            mask,
            read_write_mask,
            stream,
        });
    }

    Ok(entries)
}

// In the 32-byte layout the first entry's trailing DWORDs hold `stream` and
// `min_precision`, which are small values; in the 24-byte layout the same
// offsets usually land in the ASCII string table and read as large u32s.
fn probe_v1_layout(bytes: &[u8], param_offset: usize) -> bool {
    fn dword(bytes: &[u8], offset: usize) -> Option<u32> {
        let end = offset.checked_add(4)?;
        let slice = bytes.get(offset..end)?;
        Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }
    let (Some(stream), Some(min_precision)) = (
        param_offset.checked_add(24).and_then(|o| dword(bytes, o)),
        param_offset.checked_add(28).and_then(|o| dword(bytes, o)),
    ) else {
        return false;
    };
    stream <= 3 && min_precision <= 8
}
