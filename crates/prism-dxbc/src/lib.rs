//! A safe, zero-copy parser for DirectX shader bytecode containers (`DXBC`).
//!
//! This crate parses **untrusted** shader blobs without panicking or reading
//! out of bounds: every declared offset and size is validated against the
//! container bounds before it is dereferenced.
//!
//! Beyond the container itself, this crate parses the two chunk families that
//! shader reflection needs:
//!
//! - signature chunks (`ISGN`/`OSGN` and their `*SG1` spellings), which map
//!   shader inputs/outputs to semantics and registers, and
//! - resource definition chunks (`RDEF`/`RD11`), which list constant buffers
//!   and bound resources with their bind points.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod container;
mod error;
mod fourcc;
mod read;
pub mod rdef;
pub mod signature;

/// Helpers for building synthetic DXBC blobs in tests.
///
/// Only available when compiling this crate's own tests or when the
/// `test-utils` feature is enabled; it is not part of the stable parsing API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests_container;

pub use crate::container::{DxbcChunk, DxbcContainer, DxbcHeader};
pub use crate::error::DxbcError;
pub use crate::fourcc::FourCC;
pub use crate::rdef::{parse_rdef_chunk, RdefChunk, RdefConstantBuffer, RdefResourceBinding};
pub use crate::signature::{parse_signature_chunk, SignatureChunk, SignatureEntry};
