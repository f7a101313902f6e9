use thiserror::Error;

/// Errors produced while parsing a `DXBC` container or one of its chunks.
///
/// Every variant carries a human-readable detail string naming the offending
/// offset or field; the input is untrusted, so errors are ordinary values and
/// never panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DxbcError {
    /// The fixed container header is truncated or holds invalid fields.
    #[error("malformed DXBC header: {0}")]
    MalformedHeader(String),
    /// The chunk offset table is inconsistent with the container bounds.
    #[error("malformed DXBC chunk offset table: {0}")]
    MalformedOffsets(String),
    /// A chunk payload failed to parse.
    #[error("invalid DXBC chunk: {0}")]
    InvalidChunk(String),
    /// A declared offset or size points outside the container.
    #[error("DXBC range out of bounds: {0}")]
    OutOfBounds(String),
}

impl DxbcError {
    pub(crate) fn malformed_header(detail: impl Into<String>) -> Self {
        DxbcError::MalformedHeader(detail.into())
    }

    pub(crate) fn malformed_offsets(detail: impl Into<String>) -> Self {
        DxbcError::MalformedOffsets(detail.into())
    }

    pub(crate) fn invalid_chunk(detail: impl Into<String>) -> Self {
        DxbcError::InvalidChunk(detail.into())
    }

    pub(crate) fn out_of_bounds(detail: impl Into<String>) -> Self {
        DxbcError::OutOfBounds(detail.into())
    }

    /// Returns the detail string attached to this error.
    pub fn detail(&self) -> &str {
        match self {
            DxbcError::MalformedHeader(s)
            | DxbcError::MalformedOffsets(s)
            | DxbcError::InvalidChunk(s)
            | DxbcError::OutOfBounds(s) => s,
        }
    }
}
