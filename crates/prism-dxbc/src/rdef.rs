//! Parser for DXBC resource definition chunks (`RDEF`/`RD11`).
//!
//! The resource definition chunk lists the shader's constant buffers and its
//! bound resources (textures, samplers, UAVs) together with their bind
//! points. Only the fields reflection needs are parsed; variable tables and
//! type trees inside constant buffers are skipped.

use crate::error::DxbcError;
use crate::read::{read_cstring, read_u32_le};

// cb count/offset, resource count/offset, target, flags, creator offset.
const HEADER_LEN: usize = 28;
const CBUFFER_ENTRY_LEN: usize = 24;
const RESOURCE_ENTRY_LEN: usize = 32;

/// `D3D_SHADER_INPUT_TYPE` values stored raw in resource bindings.
pub mod input_type {
    /// Constant buffer (`cbuffer`).
    pub const CBUFFER: u32 = 0;
    /// Texture buffer (`tbuffer`).
    pub const TBUFFER: u32 = 1;
    /// Sampled texture.
    pub const TEXTURE: u32 = 2;
    /// Sampler state.
    pub const SAMPLER: u32 = 3;
    /// Typed read/write UAV.
    pub const UAV_RWTYPED: u32 = 4;
    /// Read-only structured buffer.
    pub const STRUCTURED: u32 = 5;
    /// Read/write structured buffer UAV.
    pub const UAV_RWSTRUCTURED: u32 = 6;
    /// Read-only byte-address buffer.
    pub const BYTEADDRESS: u32 = 7;
    /// Read/write byte-address buffer UAV.
    pub const UAV_RWBYTEADDRESS: u32 = 8;
    /// Append structured buffer UAV.
    pub const UAV_APPEND_STRUCTURED: u32 = 9;
    /// Consume structured buffer UAV.
    pub const UAV_CONSUME_STRUCTURED: u32 = 10;
    /// Structured buffer UAV with a hidden counter.
    pub const UAV_RWSTRUCTURED_WITH_COUNTER: u32 = 11;
    /// Raytracing acceleration structure.
    pub const RT_ACCELERATION_STRUCTURE: u32 = 12;
    /// Sampler-feedback texture UAV.
    pub const UAV_FEEDBACKTEXTURE: u32 = 13;
}

/// A parsed resource definition chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdefChunk {
    /// Constant buffers declared by the shader, in chunk order.
    pub constant_buffers: Vec<RdefConstantBuffer>,
    /// Bound resources (including constant buffer bind points), in chunk
    /// order.
    pub bound_resources: Vec<RdefResourceBinding>,
    /// Creator string recorded by the compiler, if present.
    pub creator: Option<String>,
}

/// A constant buffer declaration inside an `RDEF` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdefConstantBuffer {
    /// Buffer name as written in the source.
    pub name: String,
    /// Number of variables declared inside the buffer.
    pub variable_count: u32,
    /// Declared byte size of the buffer.
    pub size: u32,
}

/// A bound resource inside an `RDEF` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdefResourceBinding {
    /// Resource name as written in the source.
    pub name: String,
    /// Resource class (`D3D_SHADER_INPUT_TYPE`) stored raw; see
    /// [`input_type`].
    pub input_type: u32,
    /// Return type code, raw.
    pub return_type: u32,
    /// Resource dimension code, raw.
    pub dimension: u32,
    /// Sample count for multisampled textures.
    pub sample_count: u32,
    /// First bound register index.
    pub bind_point: u32,
    /// Number of consecutive bound registers.
    pub bind_count: u32,
    /// Binding flags, raw.
    pub flags: u32,
}

/// Parses an `RDEF`-style chunk payload.
pub fn parse_rdef_chunk(bytes: &[u8]) -> Result<RdefChunk, DxbcError> {
    if bytes.len() < HEADER_LEN {
        return Err(DxbcError::invalid_chunk(format!(
            "resource definition chunk is truncated: need {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }

    let cbuffer_count = read_u32_le(bytes, 0, "cbuffer_count")? as usize;
    let cbuffer_offset = read_u32_le(bytes, 4, "cbuffer_offset")? as usize;
    let resource_count = read_u32_le(bytes, 8, "resource_count")? as usize;
    let resource_offset = read_u32_le(bytes, 12, "resource_offset")? as usize;
    // Offset 16 packs the shader model and program type; offset 20 holds
    // compile flags. Neither is needed for reflection.
    let creator_offset = read_u32_le(bytes, 24, "creator_offset")? as usize;

    let mut constant_buffers = Vec::new();
    constant_buffers.try_reserve_exact(cbuffer_count).map_err(|_| {
        DxbcError::invalid_chunk(format!(
            "constant buffer count {cbuffer_count} is too large to allocate"
        ))
    })?;
    for index in 0..cbuffer_count {
        let start = entry_start(bytes, cbuffer_offset, index, CBUFFER_ENTRY_LEN, "cbuffer")?;
        let name_offset = read_u32_le(bytes, start, "cbuffer name_offset")? as usize;
        let variable_count = read_u32_le(bytes, start + 4, "cbuffer variable_count")?;
        // start + 8 is the variable table offset; the table itself is not
        // parsed.
        let size = read_u32_le(bytes, start + 12, "cbuffer size")?;
        let name = read_cstring(bytes, name_offset, "cbuffer name")?.to_owned();
        constant_buffers.push(RdefConstantBuffer {
            name,
            variable_count,
            size,
        });
    }

    let mut bound_resources = Vec::new();
    bound_resources.try_reserve_exact(resource_count).map_err(|_| {
        DxbcError::invalid_chunk(format!(
            "bound resource count {resource_count} is too large to allocate"
        ))
    })?;
    for index in 0..resource_count {
        let start = entry_start(bytes, resource_offset, index, RESOURCE_ENTRY_LEN, "resource")?;
        let name_offset = read_u32_le(bytes, start, "resource name_offset")? as usize;
        let name = read_cstring(bytes, name_offset, "resource name")?.to_owned();
        bound_resources.push(RdefResourceBinding {
            name,
            input_type: read_u32_le(bytes, start + 4, "resource input_type")?,
            return_type: read_u32_le(bytes, start + 8, "resource return_type")?,
            dimension: read_u32_le(bytes, start + 12, "resource dimension")?,
            sample_count: read_u32_le(bytes, start + 16, "resource sample_count")?,
            bind_point: read_u32_le(bytes, start + 20, "resource bind_point")?,
            bind_count: read_u32_le(bytes, start + 24, "resource bind_count")?,
            flags: read_u32_le(bytes, start + 28, "resource flags")?,
        });
    }

    let creator = if creator_offset != 0 {
        Some(read_cstring(bytes, creator_offset, "creator")?.to_owned())
    } else {
        None
    };

    Ok(RdefChunk {
        constant_buffers,
        bound_resources,
        creator,
    })
}

fn entry_start(
    bytes: &[u8],
    table_offset: usize,
    index: usize,
    entry_len: usize,
    what: &str,
) -> Result<usize, DxbcError> {
    let start = index
        .checked_mul(entry_len)
        .and_then(|o| table_offset.checked_add(o))
        .ok_or_else(|| DxbcError::invalid_chunk(format!("{what} entry {index} offset overflows")))?;
    let end = start
        .checked_add(entry_len)
        .ok_or_else(|| DxbcError::invalid_chunk(format!("{what} entry {index} end overflows")))?;
    if end > bytes.len() {
        return Err(DxbcError::invalid_chunk(format!(
            "{what} entry {index} at {start}..{end} is outside chunk length {}",
            bytes.len()
        )));
    }
    Ok(start)
}
