//! Vertex input layout reconstruction, shared by both bytecode adapters.

use crate::diag::diag_warn;
use crate::model::{StageIoInfo, VertexAttribute};

/// Packs the (already location-sorted) vertex-stage inputs into a single
/// interleaved buffer layout.
///
/// Inputs with no vertex-format equivalent are skipped without consuming a
/// slot or advancing the byte cursor; everything else lands at the current
/// cursor at `4 * vec_size` bytes. The final cursor becomes the uniform
/// stride of every emitted attribute.
pub(crate) fn build_vertex_layout(inputs: &[StageIoInfo]) -> Vec<VertexAttribute> {
    let mut attributes = Vec::with_capacity(inputs.len());
    let mut cursor = 0u32;

    for input in inputs {
        if !input.format.is_valid() {
            diag_warn!(
                "vertex input '{}' at location {} has no vertex format equivalent; \
                 skipping it in the reconstructed layout",
                input.name,
                input.location
            );
            continue;
        }
        let size = 4 * input.vec_size.max(1);
        attributes.push(VertexAttribute {
            name: input.name.clone(),
            format: input.format,
            buffer_index: 0,
            offset: cursor,
            stride: 0,
        });
        cursor += size;
    }

    for attribute in &mut attributes {
        attribute.stride = cursor;
    }

    attributes
}
