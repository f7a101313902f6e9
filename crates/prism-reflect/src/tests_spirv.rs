use rspirv::binary::Assemble;
use rspirv::dr::{Builder, Operand};
use rspirv::spirv;

use crate::format::VertexFormat;
use crate::model::{BytecodeKind, ShaderStage};
use crate::{reflect, reflect_spirv, ReflectError};

fn new_builder() -> Builder {
    let mut b = Builder::new();
    b.set_version(1, 0);
    b.capability(spirv::Capability::Shader);
    b.memory_model(
        spirv::AddressingModel::Logical,
        spirv::MemoryModel::GLSL450,
    );
    b
}

/// Appends an empty `main`, declares the entry point, and assembles to
/// little-endian bytes.
fn finish(mut b: Builder, model: spirv::ExecutionModel, interface: Vec<spirv::Word>) -> Vec<u8> {
    let void = b.type_void();
    let voidf = b.type_function(void, vec![]);
    let main = b
        .begin_function(void, None, spirv::FunctionControl::NONE, voidf)
        .unwrap();
    b.begin_block(None).unwrap();
    b.ret().unwrap();
    b.end_function().unwrap();
    b.entry_point(model, main, "main".to_string(), interface);

    b.module()
        .assemble()
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect()
}

fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

fn input_var(
    b: &mut Builder,
    pointee: spirv::Word,
    name: &str,
    location: u32,
) -> spirv::Word {
    let ptr = b.type_pointer(None, spirv::StorageClass::Input, pointee);
    let var = b.variable(ptr, None, spirv::StorageClass::Input, None);
    b.name(var, name.to_string());
    b.decorate(
        var,
        spirv::Decoration::Location,
        [Operand::LiteralInt32(location)],
    );
    var
}

#[test]
fn vertex_inputs_pack_into_a_layout() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let vec2 = b.type_vector(float, 2);
    let position = input_var(&mut b, vec3, "position", 0);
    let uv = input_var(&mut b, vec2, "uv", 1);
    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![position, uv]);

    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    assert_eq!(info.stage, ShaderStage::Vertex);
    assert_eq!(info.num_inputs(), 2);
    assert_eq!(info.inputs[0].name, "position");
    assert_eq!(info.inputs[0].format, VertexFormat::Float3);
    assert_eq!(info.inputs[1].name, "uv");
    assert_eq!(info.inputs[1].format, VertexFormat::Float2);

    assert_eq!(info.num_vertex_attributes(), 2);
    assert_eq!(info.vertex_attributes[0].offset, 0);
    assert_eq!(info.vertex_attributes[1].offset, 12);
    assert!(info.vertex_attributes.iter().all(|a| a.stride == 20));
    assert!(info.vertex_attributes.iter().all(|a| a.buffer_index == 0));
}

#[test]
fn duplicate_locations_keep_declaration_order() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let a = input_var(&mut b, vec4, "a", 2);
    let b_var = input_var(&mut b, vec4, "b", 0);
    let c = input_var(&mut b, vec4, "c", 1);
    let d = input_var(&mut b, vec4, "d", 0);
    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![a, b_var, c, d]);

    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    let order: Vec<&str> = info.inputs.iter().map(|io| io.name.as_str()).collect();
    assert_eq!(order, ["b", "d", "c", "a"]);
    assert_eq!(
        info.inputs.iter().map(|io| io.location).collect::<Vec<_>>(),
        [0, 0, 1, 2]
    );
}

#[test]
fn matrix_input_is_skipped_without_consuming_layout_bytes() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let vec2 = b.type_vector(float, 2);
    let mat4 = b.type_matrix(vec4, 4);
    let position = input_var(&mut b, vec4, "position", 0);
    let model = input_var(&mut b, mat4, "model", 1);
    let uv = input_var(&mut b, vec2, "uv", 5);
    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![position, model, uv]);

    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    // The matrix still reflects as an input, just with no vertex format.
    assert_eq!(info.num_inputs(), 3);
    assert_eq!(info.inputs[1].format, VertexFormat::Invalid);
    assert_eq!(info.inputs[1].columns, 4);

    assert_eq!(info.num_vertex_attributes(), 2);
    assert_eq!(info.vertex_attributes[0].name, "position");
    assert_eq!(info.vertex_attributes[1].name, "uv");
    assert_eq!(info.vertex_attributes[1].offset, 16);
    assert!(info.vertex_attributes.iter().all(|a| a.stride == 24));
}

#[test]
fn builtin_outputs_are_excluded() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);

    // gl_Position-style built-in output.
    let out_ptr = b.type_pointer(None, spirv::StorageClass::Output, vec4);
    let builtin = b.variable(out_ptr, None, spirv::StorageClass::Output, None);
    b.name(builtin, "gl_Position".to_string());
    b.decorate(
        builtin,
        spirv::Decoration::BuiltIn,
        [Operand::BuiltIn(spirv::BuiltIn::Position)],
    );

    // A user varying next to it.
    let color = {
        let ptr = b.type_pointer(None, spirv::StorageClass::Output, vec4);
        let var = b.variable(ptr, None, spirv::StorageClass::Output, None);
        b.name(var, "frag_color".to_string());
        b.decorate(var, spirv::Decoration::Location, [Operand::LiteralInt32(0)]);
        var
    };

    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![builtin, color]);
    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    assert_eq!(info.num_outputs(), 1);
    assert_eq!(info.outputs[0].name, "frag_color");
}

#[test]
fn per_vertex_block_outputs_are_excluded() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let per_vertex = b.type_struct(vec![vec4]);
    b.decorate(per_vertex, spirv::Decoration::Block, vec![]);
    b.member_decorate(
        per_vertex,
        0,
        spirv::Decoration::BuiltIn,
        [Operand::BuiltIn(spirv::BuiltIn::Position)],
    );
    let ptr = b.type_pointer(None, spirv::StorageClass::Output, per_vertex);
    let var = b.variable(ptr, None, spirv::StorageClass::Output, None);
    b.name(var, "gl_PerVertex".to_string());

    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![var]);
    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    assert_eq!(info.num_outputs(), 0);
}

#[test]
fn resources_land_in_their_categories() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let uint = b.type_int(32, 0);

    // Uniform buffer: Block-decorated struct in Uniform storage.
    let ubo_ty = b.type_struct(vec![vec4]);
    b.decorate(ubo_ty, spirv::Decoration::Block, vec![]);
    b.member_decorate(ubo_ty, 0, spirv::Decoration::Offset, [Operand::LiteralInt32(0)]);
    let ubo_ptr = b.type_pointer(None, spirv::StorageClass::Uniform, ubo_ty);
    let ubo = b.variable(ubo_ptr, None, spirv::StorageClass::Uniform, None);
    b.name(ubo, "per_frame".to_string());
    b.decorate(ubo, spirv::Decoration::DescriptorSet, [Operand::LiteralInt32(0)]);
    b.decorate(ubo, spirv::Decoration::Binding, [Operand::LiteralInt32(1)]);

    // Storage buffer: BufferBlock struct in Uniform storage (pre-1.3 style),
    // holding an unsized array.
    let vec4_run = b.type_runtime_array(vec4);
    let ssbo_ty = b.type_struct(vec![vec4_run]);
    b.decorate(ssbo_ty, spirv::Decoration::BufferBlock, vec![]);
    b.member_decorate(ssbo_ty, 0, spirv::Decoration::Offset, [Operand::LiteralInt32(0)]);
    let ssbo_ptr = b.type_pointer(None, spirv::StorageClass::Uniform, ssbo_ty);
    let ssbo = b.variable(ssbo_ptr, None, spirv::StorageClass::Uniform, None);
    b.name(ssbo, "particles".to_string());
    b.decorate(ssbo, spirv::Decoration::DescriptorSet, [Operand::LiteralInt32(1)]);
    b.decorate(ssbo, spirv::Decoration::Binding, [Operand::LiteralInt32(0)]);

    // Combined image sampler, arrayed [4].
    let image_ty = b.type_image(
        float,
        spirv::Dim::Dim2D,
        0,
        0,
        0,
        1,
        spirv::ImageFormat::Unknown,
        None,
    );
    let sampled_ty = b.type_sampled_image(image_ty);
    let four = b.constant_u32(uint, 4);
    let sampled_array = b.type_array(sampled_ty, four);
    let sampled_ptr = b.type_pointer(None, spirv::StorageClass::UniformConstant, sampled_array);
    let textures = b.variable(sampled_ptr, None, spirv::StorageClass::UniformConstant, None);
    b.name(textures, "textures".to_string());
    b.decorate(textures, spirv::Decoration::DescriptorSet, [Operand::LiteralInt32(0)]);
    b.decorate(textures, spirv::Decoration::Binding, [Operand::LiteralInt32(2)]);

    // Separate image (sampled == 1, no sampler attached).
    let sep_image_ptr = b.type_pointer(None, spirv::StorageClass::UniformConstant, image_ty);
    let sep_image = b.variable(sep_image_ptr, None, spirv::StorageClass::UniformConstant, None);
    b.name(sep_image, "depth_tex".to_string());
    b.decorate(sep_image, spirv::Decoration::Binding, [Operand::LiteralInt32(3)]);

    // Storage image (sampled == 2).
    let storage_image_ty = b.type_image(
        float,
        spirv::Dim::Dim2D,
        0,
        0,
        0,
        2,
        spirv::ImageFormat::Rgba32f,
        None,
    );
    let storage_image_ptr =
        b.type_pointer(None, spirv::StorageClass::UniformConstant, storage_image_ty);
    let storage_image =
        b.variable(storage_image_ptr, None, spirv::StorageClass::UniformConstant, None);
    b.name(storage_image, "output_image".to_string());
    b.decorate(storage_image, spirv::Decoration::Binding, [Operand::LiteralInt32(4)]);

    // Separate sampler.
    let sampler_ty = b.type_sampler();
    let sampler_ptr = b.type_pointer(None, spirv::StorageClass::UniformConstant, sampler_ty);
    let sampler = b.variable(sampler_ptr, None, spirv::StorageClass::UniformConstant, None);
    b.name(sampler, "linear_sampler".to_string());
    b.decorate(sampler, spirv::Decoration::Binding, [Operand::LiteralInt32(5)]);

    let bytes = finish(b, spirv::ExecutionModel::Fragment, vec![]);
    let info = reflect_spirv(ShaderStage::Pixel, &bytes).unwrap();

    assert_eq!(info.num_uniform_buffers(), 1);
    assert_eq!(info.uniform_buffers[0].name, "per_frame");
    assert_eq!(info.uniform_buffers[0].set, 0);
    assert_eq!(info.uniform_buffers[0].binding, 1);
    assert_eq!(info.uniform_buffers[0].count, 1);

    assert_eq!(info.num_storage_buffers(), 1);
    assert_eq!(info.storage_buffers[0].name, "particles");
    assert_eq!(info.storage_buffers[0].set, 1);

    assert_eq!(info.num_sampled_images(), 1);
    assert_eq!(info.sampled_images[0].name, "textures");
    assert_eq!(info.sampled_images[0].count, 4);

    assert_eq!(info.num_separate_images(), 1);
    assert_eq!(info.separate_images[0].name, "depth_tex");

    assert_eq!(info.num_storage_images(), 1);
    assert_eq!(info.storage_images[0].name, "output_image");

    assert_eq!(info.num_separate_samplers(), 1);
    assert_eq!(info.separate_samplers[0].name, "linear_sampler");
    assert_eq!(info.separate_samplers[0].binding, 5);
}

#[test]
fn push_constant_size_comes_from_member_offsets() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let mat4 = b.type_matrix(vec4, 4);
    let block = b.type_struct(vec![mat4, vec4]);
    b.decorate(block, spirv::Decoration::Block, vec![]);
    b.member_decorate(block, 0, spirv::Decoration::Offset, [Operand::LiteralInt32(0)]);
    b.member_decorate(block, 1, spirv::Decoration::Offset, [Operand::LiteralInt32(64)]);
    let ptr = b.type_pointer(None, spirv::StorageClass::PushConstant, block);
    let var = b.variable(ptr, None, spirv::StorageClass::PushConstant, None);
    b.name(var, "push_data".to_string());

    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![]);
    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    assert_eq!(info.num_push_constants(), 1);
    assert_eq!(info.push_constants[0].name, "push_data");
    assert_eq!(info.push_constants[0].size, 80);
}

#[test]
fn misaligned_byte_length_is_rejected() {
    let err = reflect_spirv(ShaderStage::Vertex, &[0x03, 0x02, 0x23]).unwrap_err();
    assert!(
        matches!(
            err,
            ReflectError::MalformedContainer {
                kind: BytecodeKind::SpirV,
                ..
            }
        ),
        "{err:?}"
    );
}

#[test]
fn empty_input_is_rejected() {
    let err = reflect_spirv(ShaderStage::Vertex, &[]).unwrap_err();
    assert!(matches!(err, ReflectError::MalformedContainer { .. }), "{err:?}");
}

#[test]
fn garbage_words_are_rejected() {
    // Aligned but not a SPIR-V module.
    let err = reflect_spirv(ShaderStage::Vertex, &[0xAA; 32]).unwrap_err();
    assert!(matches!(err, ReflectError::MalformedContainer { .. }), "{err:?}");
}

#[test]
fn reflection_is_idempotent() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let position = input_var(&mut b, vec3, "position", 0);
    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![position]);

    let first = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();
    let second = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dispatcher_routes_spirv() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let position = input_var(&mut b, vec3, "position", 0);
    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![position]);

    let via_dispatch = reflect(BytecodeKind::SpirV, ShaderStage::Vertex, &bytes).unwrap();
    let direct = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();
    assert_eq!(via_dispatch, direct);
}

#[test]
fn non_vertex_stage_builds_no_layout() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let vec2 = b.type_vector(float, 2);
    let uv = input_var(&mut b, vec2, "uv", 0);
    let bytes = finish(b, spirv::ExecutionModel::Fragment, vec![uv]);

    let info = reflect_spirv(ShaderStage::Pixel, &bytes).unwrap();
    assert_eq!(info.stage, ShaderStage::Pixel);
    assert_eq!(info.num_inputs(), 1);
    assert_eq!(info.num_vertex_attributes(), 0);
}

#[test]
fn self_referential_input_type_carries_no_vertex_format() {
    // A vector whose component type is itself. No assembler will emit this,
    // so the module words are laid out by hand.
    let words = [
        0x0723_0203, // magic
        0x0001_0000, // version 1.0
        0,           // generator
        4,           // bound
        0,           // schema
        (2 << 16) | 17, // OpCapability
        1,              // Shader
        (3 << 16) | 14, // OpMemoryModel
        0,              // Logical
        1,              // GLSL450
        (4 << 16) | 23, // OpTypeVector
        1,              // result %1
        1,              // component %1
        4,              // width 4
        (4 << 16) | 32, // OpTypePointer
        2,              // result %2
        1,              // Input
        1,              // pointee %1
        (4 << 16) | 59, // OpVariable
        2,              // type %2
        3,              // result %3
        1,              // Input
    ];
    let bytes = words_to_bytes(&words);

    let info = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap();

    assert_eq!(info.num_inputs(), 1);
    assert_eq!(info.inputs[0].format, VertexFormat::Invalid);
    assert_eq!(info.num_vertex_attributes(), 0);
}

#[test]
fn self_referential_push_constant_type_is_an_error() {
    // A struct whose sole member is itself, bound as a push-constant block.
    let words = [
        0x0723_0203,
        0x0001_0000,
        0,
        4,
        0,
        (2 << 16) | 17, // OpCapability Shader
        1,
        (3 << 16) | 14, // OpMemoryModel Logical GLSL450
        0,
        1,
        (3 << 16) | 30, // OpTypeStruct %1 { %1 }
        1,
        1,
        (4 << 16) | 32, // OpTypePointer %2 PushConstant %1
        2,
        9,
        1,
        (4 << 16) | 59, // OpVariable %3 : %2 PushConstant
        2,
        3,
        9,
    ];
    let bytes = words_to_bytes(&words);

    let err = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap_err();
    assert!(
        matches!(
            err,
            ReflectError::MissingTypeInfo {
                kind: BytecodeKind::SpirV,
                ..
            }
        ),
        "{err:?}"
    );
}

#[test]
fn push_constant_size_overflowing_u32_is_an_error() {
    let mut b = new_builder();
    let float = b.type_float(32);
    let uint = b.type_int(32, 0);
    let huge = b.constant_u32(uint, 0x4000_0000);
    let array = b.type_array(float, huge);
    let block = b.type_struct(vec![array]);
    b.member_decorate(block, 0, spirv::Decoration::Offset, [Operand::LiteralInt32(0)]);
    let ptr = b.type_pointer(None, spirv::StorageClass::PushConstant, block);
    let var = b.variable(ptr, None, spirv::StorageClass::PushConstant, None);
    b.name(var, "push_data".to_string());

    let bytes = finish(b, spirv::ExecutionModel::Vertex, vec![]);
    let err = reflect_spirv(ShaderStage::Vertex, &bytes).unwrap_err();
    assert!(
        matches!(
            err,
            ReflectError::MalformedContainer {
                kind: BytecodeKind::SpirV,
                ..
            }
        ),
        "{err:?}"
    );
}
