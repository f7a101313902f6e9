//! Bounds-checked primitive readers shared by the chunk parsers.

use crate::error::DxbcError;

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize, what: &str) -> Result<u32, DxbcError> {
    let end = offset
        .checked_add(4)
        .ok_or_else(|| DxbcError::invalid_chunk(format!("{what} offset overflows")))?;
    let slice = bytes.get(offset..end).ok_or_else(|| {
        DxbcError::invalid_chunk(format!(
            "need 4 bytes for {what} at {offset}..{end}, but buffer length is {}",
            bytes.len()
        ))
    })?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

pub(crate) fn read_u8(bytes: &[u8], offset: usize, what: &str) -> Result<u8, DxbcError> {
    bytes.get(offset).copied().ok_or_else(|| {
        DxbcError::invalid_chunk(format!(
            "need 1 byte for {what} at {offset}, but buffer length is {}",
            bytes.len()
        ))
    })
}

/// Reads a NUL-terminated UTF-8 string starting at `offset`.
pub(crate) fn read_cstring<'a>(
    bytes: &'a [u8],
    offset: usize,
    what: &str,
) -> Result<&'a str, DxbcError> {
    let tail = bytes.get(offset..).ok_or_else(|| {
        DxbcError::invalid_chunk(format!(
            "{what} offset {offset} is outside buffer length {}",
            bytes.len()
        ))
    })?;
    let nul = tail.iter().position(|&b| b == 0).ok_or_else(|| {
        DxbcError::invalid_chunk(format!("{what} at offset {offset} is missing a NUL terminator"))
    })?;
    core::str::from_utf8(&tail[..nul]).map_err(|_| {
        DxbcError::invalid_chunk(format!("{what} at offset {offset} is not valid UTF-8"))
    })
}
