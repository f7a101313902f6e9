//! DXBC reflection over the `prism-dxbc` chunk parsers.
//!
//! Resources come from the `RDEF` chunk, stage I/O from the `ISGN`/`OSGN`
//! signatures. Constant buffers are correlated with the bound-resource table
//! by name to recover their bind registers. DXBC has no push-constant
//! concept, so that list is always empty.

use prism_dxbc::rdef::{input_type, RdefChunk};
use prism_dxbc::signature::SignatureEntry;
use prism_dxbc::{DxbcContainer, FourCC};

use crate::diag::{diag_error, diag_info, diag_warn};
use crate::error::ReflectError;
use crate::format::map_register_component;
use crate::layout::build_vertex_layout;
use crate::model::{BytecodeKind, ResourceInfo, ShaderReflectionInfo, ShaderStage, StageIoInfo};

pub(crate) fn reflect(stage: ShaderStage, bytes: &[u8]) -> Result<ShaderReflectionInfo, ReflectError> {
    match reflect_inner(stage, bytes) {
        Ok(info) => Ok(info),
        Err(err) => {
            diag_error!("{err}");
            Err(err)
        }
    }
}

fn reflect_inner(stage: ShaderStage, bytes: &[u8]) -> Result<ShaderReflectionInfo, ReflectError> {
    if bytes.len() < 4 {
        return Err(ReflectError::MalformedContainer {
            kind: BytecodeKind::Dxbc,
            detail: format!("byte length {} is shorter than a container magic", bytes.len()),
        });
    }

    let container =
        DxbcContainer::parse(bytes).map_err(|err| ReflectError::MalformedContainer {
            kind: BytecodeKind::Dxbc,
            detail: err.to_string(),
        })?;

    let mut info = ShaderReflectionInfo {
        stage,
        ..ShaderReflectionInfo::default()
    };

    // A missing RDEF chunk (reflection-stripped blob) simply binds nothing;
    // a malformed one is degraded to a warning so I/O reflection still runs.
    match container.get_rdef() {
        Some(Ok(rdef)) => collect_resources(&rdef, &mut info),
        Some(Err(err)) => {
            diag_warn!("resource definition chunk is unusable, resources unavailable: {err}")
        }
        None => {}
    }

    info.inputs = collect_stage_io(&container, FourCC::ISGN, "input");
    info.outputs = collect_stage_io(&container, FourCC::OSGN, "output");
    info.inputs.sort_by_key(|io| io.location);
    info.outputs.sort_by_key(|io| io.location);

    if stage == ShaderStage::Vertex {
        info.vertex_attributes = build_vertex_layout(&info.inputs);
    }

    diag_info!(
        "reflected {stage} DXBC container: {} uniform buffers, {} storage buffers, {} sampled \
         images, {} separate samplers, {} inputs, {} outputs",
        info.num_uniform_buffers(),
        info.num_storage_buffers(),
        info.num_sampled_images(),
        info.num_separate_samplers(),
        info.num_inputs(),
        info.num_outputs(),
    );

    Ok(info)
}

fn collect_resources(rdef: &RdefChunk, info: &mut ShaderReflectionInfo) {
    // Constant buffers carry no bind point of their own; the bound-resource
    // table holds it under the same name.
    for (index, cbuffer) in rdef.constant_buffers.iter().enumerate() {
        let bound = rdef.bound_resources.iter().find(|res| {
            res.input_type == input_type::CBUFFER && res.name == cbuffer.name
        });
        let (binding, count) = match bound {
            Some(res) => (res.bind_point, res.bind_count.max(1)),
            None => {
                diag_warn!(
                    "constant buffer '{}' has no entry in the bound-resource table; \
                     assuming register b0",
                    cbuffer.name
                );
                (0, 1)
            }
        };
        info.uniform_buffers.push(ResourceInfo {
            name: cbuffer.name.clone(),
            id: index as u32,
            set: 0,
            binding,
            count,
        });
    }

    for (index, res) in rdef.bound_resources.iter().enumerate() {
        let record = ResourceInfo {
            name: res.name.clone(),
            id: index as u32,
            set: 0,
            binding: res.bind_point,
            count: res.bind_count.max(1),
        };
        match res.input_type {
            // Constant buffers were already emitted via the join above.
            input_type::CBUFFER => {}
            input_type::TBUFFER => info.uniform_buffers.push(record),
            input_type::TEXTURE => info.sampled_images.push(record),
            input_type::SAMPLER => info.separate_samplers.push(record),
            input_type::STRUCTURED
            | input_type::BYTEADDRESS
            | input_type::UAV_RWTYPED
            | input_type::UAV_RWSTRUCTURED
            | input_type::UAV_RWBYTEADDRESS
            | input_type::UAV_APPEND_STRUCTURED
            | input_type::UAV_CONSUME_STRUCTURED
            | input_type::UAV_RWSTRUCTURED_WITH_COUNTER
            | input_type::UAV_FEEDBACKTEXTURE => info.storage_buffers.push(record),
            other => {
                diag_warn!(
                    "bound resource '{}' has unsupported input type {other}; skipping",
                    res.name
                );
            }
        }
    }
}

fn collect_stage_io(container: &DxbcContainer<'_>, kind: FourCC, direction: &str) -> Vec<StageIoInfo> {
    let signature = match container.get_signature(kind) {
        Some(Ok(signature)) => signature,
        Some(Err(err)) => {
            diag_warn!("{direction} signature chunk is unusable, {direction}s unavailable: {err}");
            return Vec::new();
        }
        None => return Vec::new(),
    };

    signature
        .entries
        .iter()
        .map(|entry| {
            let vec_size = u32::from(entry.mask).count_ones().max(1);
            StageIoInfo {
                name: semantic_display_name(entry),
                location: entry.register,
                format: map_register_component(entry.component_type, vec_size),
                vec_size,
                columns: 1,
            }
        })
        .collect()
}

// `TEXCOORD0` is spelled `TEXCOORD`; only indices above zero are suffixed.
fn semantic_display_name(entry: &SignatureEntry) -> String {
    if entry.semantic_index > 0 {
        format!("{}{}", entry.semantic_name, entry.semantic_index)
    } else {
        entry.semantic_name.clone()
    }
}
