//! The canonical, bytecode-agnostic reflection model.
//!
//! Every adapter produces the same [`ShaderReflectionInfo`] value regardless
//! of the source bytecode format, so downstream pipeline code never branches
//! on where a shader came from.

use core::fmt;

use crate::format::VertexFormat;

/// The pipeline stage a shader was compiled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader. The default stage.
    #[default]
    Vertex,
    /// Pixel (fragment) shader.
    Pixel,
    /// Geometry shader.
    Geometry,
    /// Compute shader.
    Compute,
    /// Tessellation shader.
    Tessellation,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
            ShaderStage::Tessellation => "tessellation",
        })
    }
}

/// The bytecode container format a shader blob is encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BytecodeKind {
    /// A SPIR-V module (Vulkan and friends).
    SpirV,
    /// A DXBC container (Direct3D), carrying DXIL or DXBC shader code plus
    /// reflection chunks.
    Dxbc,
}

impl fmt::Display for BytecodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BytecodeKind::SpirV => "SPIR-V",
            BytecodeKind::Dxbc => "DXBC",
        })
    }
}

/// A single bound shader resource (buffer, image, or sampler).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Resource name as declared in the source, empty when the compiler
    /// stripped names.
    pub name: String,
    /// Format-native identifier: the SPIR-V variable result id, or the
    /// entry's index within its DXBC reflection table.
    pub id: u32,
    /// Descriptor set index. Always 0 for DXBC, which has no set concept in
    /// its reflection chunks.
    pub set: u32,
    /// Binding index within the set (SPIR-V) or bind register (DXBC).
    pub binding: u32,
    /// Number of array elements bound, 1 for non-arrayed resources.
    pub count: u32,
}

/// A push-constant block. Only produced by the SPIR-V path; DXBC has no
/// equivalent concept and always yields an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushConstantInfo {
    /// Block name, empty when stripped.
    pub name: String,
    /// Declared byte size of the block.
    pub size: u32,
}

/// One stage input or output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageIoInfo {
    /// Variable or semantic name. DXBC semantic indices greater than zero
    /// are appended as a decimal suffix (`TEXCOORD1`).
    pub name: String,
    /// Location (SPIR-V) or register (DXBC).
    pub location: u32,
    /// The vertex format this element maps to; [`VertexFormat::Invalid`]
    /// when the element's type has no vertex-format equivalent.
    pub format: VertexFormat,
    /// Vector width, 1 for scalars.
    pub vec_size: u32,
    /// Matrix column count, 1 for scalars and vectors.
    pub columns: u32,
}

/// One element of the reconstructed vertex input layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute name, taken from the matching stage input.
    pub name: String,
    /// The attribute's vertex format. Never [`VertexFormat::Invalid`];
    /// unmappable inputs are skipped instead of emitted.
    pub format: VertexFormat,
    /// Source vertex buffer slot. The reconstruction assumes a single
    /// interleaved buffer, so this is always 0.
    pub buffer_index: u32,
    /// Byte offset of the attribute within one vertex.
    pub offset: u32,
    /// Byte stride of one vertex. Identical across all attributes of a
    /// layout.
    pub stride: u32,
}

/// The unified reflection result for one shader blob.
///
/// All sequences are independent; an empty sequence means the shader binds
/// nothing of that category. Stage inputs and outputs are sorted ascending
/// by location, preserving declaration order between equal locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderReflectionInfo {
    /// The stage the blob was compiled for, as supplied by the caller; it is
    /// never derived from the bytecode.
    pub stage: ShaderStage,
    /// Uniform (constant) buffers.
    pub uniform_buffers: Vec<ResourceInfo>,
    /// Storage buffers, including DXBC structured/byte-address buffers and
    /// UAVs.
    pub storage_buffers: Vec<ResourceInfo>,
    /// Combined image/samplers (SPIR-V) and DXBC textures.
    pub sampled_images: Vec<ResourceInfo>,
    /// Separately-bound images.
    pub separate_images: Vec<ResourceInfo>,
    /// Storage (read/write) images.
    pub storage_images: Vec<ResourceInfo>,
    /// Separately-bound samplers.
    pub separate_samplers: Vec<ResourceInfo>,
    /// Push-constant blocks. Always empty for DXBC.
    pub push_constants: Vec<PushConstantInfo>,
    /// Stage inputs, sorted by location.
    pub inputs: Vec<StageIoInfo>,
    /// Stage outputs, sorted by location.
    pub outputs: Vec<StageIoInfo>,
    /// Reconstructed vertex input layout. Populated only for vertex-stage
    /// shaders.
    pub vertex_attributes: Vec<VertexAttribute>,
}

impl ShaderReflectionInfo {
    /// Number of uniform buffers.
    pub fn num_uniform_buffers(&self) -> usize {
        self.uniform_buffers.len()
    }

    /// Number of storage buffers.
    pub fn num_storage_buffers(&self) -> usize {
        self.storage_buffers.len()
    }

    /// Number of combined sampled images.
    pub fn num_sampled_images(&self) -> usize {
        self.sampled_images.len()
    }

    /// Number of separate images.
    pub fn num_separate_images(&self) -> usize {
        self.separate_images.len()
    }

    /// Number of storage images.
    pub fn num_storage_images(&self) -> usize {
        self.storage_images.len()
    }

    /// Number of separate samplers.
    pub fn num_separate_samplers(&self) -> usize {
        self.separate_samplers.len()
    }

    /// Number of push-constant blocks.
    pub fn num_push_constants(&self) -> usize {
        self.push_constants.len()
    }

    /// Number of stage inputs.
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of stage outputs.
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of reconstructed vertex attributes.
    pub fn num_vertex_attributes(&self) -> usize {
        self.vertex_attributes.len()
    }
}
