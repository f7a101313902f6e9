//! Unified shader reflection for compiled GPU bytecode.
//!
//! One call turns a raw SPIR-V module or DXBC container into a single
//! canonical [`ShaderReflectionInfo`]: bound resources by category, stage
//! inputs/outputs sorted by location, push-constant blocks, and (for vertex
//! shaders) a reconstructed packed vertex input layout. Downstream pipeline
//! code works from that one model and never branches on the source format.
//!
//! ```no_run
//! use prism_reflect::{reflect_spirv, ShaderStage};
//!
//! # fn load() -> Vec<u8> { Vec::new() }
//! let spirv: Vec<u8> = load();
//! let info = reflect_spirv(ShaderStage::Vertex, &spirv)?;
//! for attribute in &info.vertex_attributes {
//!     println!("{} @ offset {}", attribute.name, attribute.offset);
//! }
//! # Ok::<(), prism_reflect::ReflectError>(())
//! ```

#![forbid(unsafe_code)]

mod diag;
mod dxbc;
mod error;
mod format;
mod layout;
mod model;
mod spirv;

#[cfg(test)]
mod tests_spirv;

pub use crate::diag::{clear_diagnostic_sink, set_diagnostic_sink, DiagnosticSink, Severity};
pub use crate::error::ReflectError;
pub use crate::format::VertexFormat;
pub use crate::model::{
    BytecodeKind, PushConstantInfo, ResourceInfo, ShaderReflectionInfo, ShaderStage, StageIoInfo,
    VertexAttribute,
};

/// Reflects a SPIR-V module.
///
/// `bytes` must be a non-empty multiple of four bytes; anything the SPIR-V
/// parser rejects yields [`ReflectError::MalformedContainer`].
pub fn reflect_spirv(
    stage: ShaderStage,
    bytes: &[u8],
) -> Result<ShaderReflectionInfo, ReflectError> {
    spirv::reflect(stage, bytes)
}

/// Reflects a DXBC container.
///
/// Containers without reflection chunks (stripped blobs) succeed with empty
/// sequences; structurally malformed containers yield
/// [`ReflectError::MalformedContainer`].
pub fn reflect_dxbc(stage: ShaderStage, bytes: &[u8]) -> Result<ShaderReflectionInfo, ReflectError> {
    dxbc::reflect(stage, bytes)
}

/// Reflects a shader blob of the given bytecode kind.
pub fn reflect(
    kind: BytecodeKind,
    stage: ShaderStage,
    bytes: &[u8],
) -> Result<ShaderReflectionInfo, ReflectError> {
    match kind {
        BytecodeKind::SpirV => reflect_spirv(stage, bytes),
        BytecodeKind::Dxbc => reflect_dxbc(stage, bytes),
    }
}
