//! The canonical vertex-format enumeration and the per-bytecode mapping
//! tables into it.

use prism_dxbc::signature::component;

/// A GPU vertex element format.
///
/// Reflection only ever produces the 32-bit-component formats (`Float*`,
/// `Int*`, `Uint*`); the packed 8/16-bit formats exist so the enumeration
/// covers everything a vertex buffer can hold when callers describe layouts
/// by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// No vertex-format equivalent (matrices, doubles, structs, ...).
    #[default]
    Invalid,
    /// One 32-bit signed integer.
    Int,
    /// Two 32-bit signed integers.
    Int2,
    /// Three 32-bit signed integers.
    Int3,
    /// Four 32-bit signed integers.
    Int4,
    /// One 32-bit unsigned integer.
    Uint,
    /// Two 32-bit unsigned integers.
    Uint2,
    /// Three 32-bit unsigned integers.
    Uint3,
    /// Four 32-bit unsigned integers.
    Uint4,
    /// One 32-bit float.
    Float,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Two 8-bit signed integers.
    Byte2,
    /// Four 8-bit signed integers.
    Byte4,
    /// Two 8-bit unsigned integers.
    UByte2,
    /// Four 8-bit unsigned integers.
    UByte4,
    /// Two 8-bit signed normalized values.
    Byte2Norm,
    /// Four 8-bit signed normalized values.
    Byte4Norm,
    /// Two 8-bit unsigned normalized values.
    UByte2Norm,
    /// Four 8-bit unsigned normalized values.
    UByte4Norm,
    /// Two 16-bit signed integers.
    Short2,
    /// Four 16-bit signed integers.
    Short4,
    /// Two 16-bit signed normalized values.
    Short2Norm,
    /// Four 16-bit signed normalized values.
    Short4Norm,
    /// Two 16-bit floats.
    Half2,
    /// Four 16-bit floats.
    Half4,
}

impl VertexFormat {
    /// Whether this format can occupy a vertex-attribute slot.
    pub fn is_valid(self) -> bool {
        self != VertexFormat::Invalid
    }
}

/// Scalar base types that can map to a vertex format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseType {
    Float32,
    Sint32,
    Uint32,
}

/// Maps a numeric shape (base type, vector width, matrix columns) to its
/// vertex format. Matrices, and widths outside `1..=4`, have none.
pub(crate) fn map_numeric(base: BaseType, vec_size: u32, columns: u32) -> VertexFormat {
    if columns != 1 {
        return VertexFormat::Invalid;
    }
    match (base, vec_size) {
        (BaseType::Float32, 1) => VertexFormat::Float,
        (BaseType::Float32, 2) => VertexFormat::Float2,
        (BaseType::Float32, 3) => VertexFormat::Float3,
        (BaseType::Float32, 4) => VertexFormat::Float4,
        (BaseType::Sint32, 1) => VertexFormat::Int,
        (BaseType::Sint32, 2) => VertexFormat::Int2,
        (BaseType::Sint32, 3) => VertexFormat::Int3,
        (BaseType::Sint32, 4) => VertexFormat::Int4,
        (BaseType::Uint32, 1) => VertexFormat::Uint,
        (BaseType::Uint32, 2) => VertexFormat::Uint2,
        (BaseType::Uint32, 3) => VertexFormat::Uint3,
        (BaseType::Uint32, 4) => VertexFormat::Uint4,
        _ => VertexFormat::Invalid,
    }
}

/// Maps a DXBC signature register component type and component count to a
/// vertex format. Unknown component types (including the 16-bit
/// min-precision codes) have none.
pub(crate) fn map_register_component(component_type: u32, count: u32) -> VertexFormat {
    let base = match component_type {
        component::FLOAT32 => BaseType::Float32,
        component::SINT32 => BaseType::Sint32,
        component::UINT32 => BaseType::Uint32,
        _ => return VertexFormat::Invalid,
    };
    map_numeric(base, count, 1)
}
