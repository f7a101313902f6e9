use core::fmt;

use crate::error::DxbcError;
use crate::fourcc::FourCC;
use crate::rdef::{parse_rdef_chunk, RdefChunk};
use crate::signature::{parse_signature_chunk_for_fourcc, SignatureChunk};

// magic + checksum + reserved + total_size + chunk_count
const HEADER_LEN: usize = 4 + 16 + 4 + 4 + 4;

// Real containers hold a handful of chunks; the cap bounds the offset-table
// validation loop on hostile input.
const MAX_CHUNK_COUNT: u32 = 4096;

/// The fixed header of a `DXBC` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxbcHeader {
    /// Must be [`FourCC::DXBC`].
    pub magic: FourCC,
    /// MD5 checksum stored in the header. Not validated during parsing.
    pub checksum: [u8; 16],
    /// Declared total size, in bytes, of the container.
    pub total_size: u32,
    /// Number of chunk offsets following the header.
    pub chunk_count: u32,
}

/// A single chunk within a `DXBC` container.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct DxbcChunk<'a> {
    /// The chunk identifier (e.g. `RDEF`, `ISGN`).
    pub fourcc: FourCC,
    /// Raw chunk payload bytes.
    pub data: &'a [u8],
}

impl fmt::Debug for DxbcChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DxbcChunk")
            .field("fourcc", &self.fourcc)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// A parsed `DXBC` container.
///
/// Parsing is strict about bounds: every chunk offset and size is validated
/// against the declared `total_size` before any chunk is exposed.
#[derive(Debug, Clone)]
pub struct DxbcContainer<'a> {
    bytes: &'a [u8],
    header: DxbcHeader,
    chunk_offsets: &'a [u8],
}

impl<'a> DxbcContainer<'a> {
    /// Parses a `DXBC` container from `bytes`.
    ///
    /// The input is treated as untrusted; malformed data yields a
    /// [`DxbcError`], never a panic or an out-of-bounds read.
    pub fn parse(bytes: &'a [u8]) -> Result<DxbcContainer<'a>, DxbcError> {
        if bytes.len() < HEADER_LEN {
            return Err(DxbcError::malformed_header(format!(
                "need at least {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let magic = FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != FourCC::DXBC {
            return Err(DxbcError::malformed_header(format!(
                "bad magic {magic}, expected {}",
                FourCC::DXBC
            )));
        }

        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&bytes[4..20]);

        // Four reserved bytes sit between the checksum and total_size.
        let total_size = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        let chunk_count = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);

        if chunk_count > MAX_CHUNK_COUNT {
            return Err(DxbcError::malformed_offsets(format!(
                "chunk_count {chunk_count} exceeds maximum {MAX_CHUNK_COUNT}"
            )));
        }
        if (total_size as usize) < HEADER_LEN {
            return Err(DxbcError::malformed_header(format!(
                "total_size {total_size} is smaller than header size {HEADER_LEN}"
            )));
        }
        if total_size as usize > bytes.len() {
            return Err(DxbcError::out_of_bounds(format!(
                "total_size {total_size} exceeds buffer length {}",
                bytes.len()
            )));
        }

        let bytes = &bytes[..total_size as usize];

        let offset_table_len = (chunk_count as usize)
            .checked_mul(4)
            .ok_or_else(|| DxbcError::malformed_offsets("chunk_count overflows offset table"))?;
        let offset_table_end = HEADER_LEN
            .checked_add(offset_table_len)
            .ok_or_else(|| DxbcError::malformed_offsets("offset table end overflows"))?;
        if offset_table_end > bytes.len() {
            return Err(DxbcError::malformed_offsets(format!(
                "chunk offset table ends at {offset_table_end}, but total_size is {}",
                bytes.len()
            )));
        }
        let chunk_offsets = &bytes[HEADER_LEN..offset_table_end];

        // Validate every chunk record up front so iteration never fails.
        for index in 0..chunk_count as usize {
            let table_pos = index * 4;
            let chunk_offset = u32::from_le_bytes([
                chunk_offsets[table_pos],
                chunk_offsets[table_pos + 1],
                chunk_offsets[table_pos + 2],
                chunk_offsets[table_pos + 3],
            ]) as usize;

            if chunk_offset < offset_table_end {
                return Err(DxbcError::malformed_offsets(format!(
                    "chunk {index} offset {chunk_offset} points into the header or offset table \
                     (need >= {offset_table_end})"
                )));
            }

            let header_end = chunk_offset.checked_add(8).ok_or_else(|| {
                DxbcError::malformed_offsets(format!(
                    "chunk {index} offset {chunk_offset} overflows when reading chunk header"
                ))
            })?;
            if header_end > bytes.len() {
                return Err(DxbcError::out_of_bounds(format!(
                    "chunk {index} header at {chunk_offset}..{header_end} is outside total_size {}",
                    bytes.len()
                )));
            }

            let chunk_size = u32::from_le_bytes([
                bytes[chunk_offset + 4],
                bytes[chunk_offset + 5],
                bytes[chunk_offset + 6],
                bytes[chunk_offset + 7],
            ]) as usize;
            let data_end = header_end.checked_add(chunk_size).ok_or_else(|| {
                DxbcError::malformed_offsets(format!(
                    "chunk {index} size {chunk_size} overflows when computing data range"
                ))
            })?;
            if data_end > bytes.len() {
                return Err(DxbcError::out_of_bounds(format!(
                    "chunk {index} data at {header_end}..{data_end} is outside total_size {}",
                    bytes.len()
                )));
            }
        }

        Ok(DxbcContainer {
            bytes,
            header: DxbcHeader {
                magic,
                checksum,
                total_size,
                chunk_count,
            },
            chunk_offsets,
        })
    }

    /// Returns the parsed container header.
    pub fn header(&self) -> &DxbcHeader {
        &self.header
    }

    /// Iterates over all chunks in file order.
    pub fn chunks(&self) -> impl Iterator<Item = DxbcChunk<'a>> + '_ {
        let bytes = self.bytes;
        self.chunk_offsets.chunks_exact(4).map(move |raw| {
            let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
            // Ranges were validated in `parse`.
            let fourcc = FourCC([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]);
            let size = u32::from_le_bytes([
                bytes[offset + 4],
                bytes[offset + 5],
                bytes[offset + 6],
                bytes[offset + 7],
            ]) as usize;
            DxbcChunk {
                fourcc,
                data: &bytes[offset + 8..offset + 8 + size],
            }
        })
    }

    /// Returns the first chunk matching `fourcc`, if any.
    pub fn get_chunk(&self, fourcc: FourCC) -> Option<DxbcChunk<'a>> {
        self.chunks().find(|chunk| chunk.fourcc == fourcc)
    }

    /// Iterates over all chunks matching `fourcc`, in file order.
    pub fn get_chunks(&self, fourcc: FourCC) -> impl Iterator<Item = DxbcChunk<'a>> + '_ {
        self.chunks().filter(move |chunk| chunk.fourcc == fourcc)
    }

    /// Returns and parses the first signature chunk matching `kind`, if any.
    ///
    /// Some toolchains emit signature chunk IDs with a trailing `1` (`ISG1`
    /// instead of `ISGN`); this method accepts either spelling. Chunks with
    /// the requested ID are tried in file order and the first that parses is
    /// returned; if none parse, the alternate spelling is tried the same way.
    /// `None` means neither spelling is present.
    pub fn get_signature(&self, kind: FourCC) -> Option<Result<SignatureChunk, DxbcError>> {
        let alternate = match kind {
            FourCC::ISGN => Some(FourCC::ISG1),
            FourCC::OSGN => Some(FourCC::OSG1),
            FourCC::ISG1 => Some(FourCC::ISGN),
            FourCC::OSG1 => Some(FourCC::OSGN),
            _ => None,
        };

        let primary = self.parse_first_signature(kind);
        if matches!(primary, Some(Ok(_))) {
            return primary;
        }
        let Some(alternate) = alternate else {
            return primary;
        };
        match self.parse_first_signature(alternate) {
            ok @ Some(Ok(_)) => ok,
            Some(Err(err)) if primary.is_none() => Some(Err(err)),
            _ => primary,
        }
    }

    fn parse_first_signature(&self, kind: FourCC) -> Option<Result<SignatureChunk, DxbcError>> {
        let mut first_err = None;
        for chunk in self.get_chunks(kind) {
            match parse_signature_chunk_for_fourcc(chunk.fourcc, chunk.data) {
                Ok(sig) => return Some(Ok(sig)),
                Err(err) => {
                    let err = DxbcError::invalid_chunk(format!(
                        "{} signature chunk: {}",
                        chunk.fourcc,
                        err.detail()
                    ));
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map(Err)
    }

    /// Returns and parses the first resource definition chunk, if any.
    ///
    /// Tries `RDEF` chunks in file order first, then the alternate `RD11`
    /// spelling. `None` means the container carries no resource definition
    /// chunk at all (e.g. reflection-stripped blobs).
    pub fn get_rdef(&self) -> Option<Result<RdefChunk, DxbcError>> {
        let primary = self.parse_first_rdef(FourCC::RDEF);
        if matches!(primary, Some(Ok(_))) {
            return primary;
        }
        match self.parse_first_rdef(FourCC::RD11) {
            ok @ Some(Ok(_)) => ok,
            Some(Err(err)) if primary.is_none() => Some(Err(err)),
            _ => primary,
        }
    }

    fn parse_first_rdef(&self, kind: FourCC) -> Option<Result<RdefChunk, DxbcError>> {
        let mut first_err = None;
        for chunk in self.get_chunks(kind) {
            match parse_rdef_chunk(chunk.data) {
                Ok(rdef) => return Some(Ok(rdef)),
                Err(err) => {
                    let err = DxbcError::invalid_chunk(format!(
                        "{} chunk: {}",
                        chunk.fourcc,
                        err.detail()
                    ));
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map(Err)
    }
}
