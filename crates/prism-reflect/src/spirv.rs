//! SPIR-V reflection over the `rspirv` data representation.
//!
//! The module is walked, never executed: global `OpVariable`s are classified
//! by storage class and pointee type, stage I/O comes from `Input`/`Output`
//! variables with their `Location` decorations, and push-constant block sizes
//! are computed from member `Offset` decorations.

use std::collections::HashMap;

use rspirv::binary::Parser;
use rspirv::dr::{Instruction, Loader, Module, Operand};
use rspirv::spirv::{Decoration, Op, StorageClass};

use crate::diag::{diag_error, diag_info, diag_warn};
use crate::error::ReflectError;
use crate::format::{self, BaseType, VertexFormat};
use crate::layout::build_vertex_layout;
use crate::model::{
    BytecodeKind, PushConstantInfo, ResourceInfo, ShaderReflectionInfo, ShaderStage, StageIoInfo,
};

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
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(ReflectError::MalformedContainer {
            kind: BytecodeKind::SpirV,
            detail: format!("byte length {} is not a non-zero multiple of 4", bytes.len()),
        });
    }

    let mut loader = Loader::new();
    Parser::new(bytes, &mut loader)
        .parse()
        .map_err(|err| ReflectError::MalformedContainer {
            kind: BytecodeKind::SpirV,
            detail: format!("{err:?}"),
        })?;
    let walker = ModuleWalker::new(loader.module());

    let mut info = ShaderReflectionInfo {
        stage,
        ..ShaderReflectionInfo::default()
    };

    for var in walker
        .module
        .types_global_values
        .iter()
        .filter(|inst| inst.class.opcode == Op::Variable)
    {
        let storage = match var.operands.first() {
            Some(Operand::StorageClass(sc)) => *sc,
            _ => continue,
        };
        match storage {
            StorageClass::Input | StorageClass::Output => {
                walker.collect_stage_io(var, storage, &mut info)?;
            }
            StorageClass::Uniform | StorageClass::UniformConstant | StorageClass::StorageBuffer => {
                walker.collect_resource(var, storage, &mut info)?;
            }
            StorageClass::PushConstant => {
                walker.collect_push_constant(var, &mut info)?;
            }
            _ => {}
        }
    }

    info.inputs.sort_by_key(|io| io.location);
    info.outputs.sort_by_key(|io| io.location);

    if stage == ShaderStage::Vertex {
        info.vertex_attributes = build_vertex_layout(&info.inputs);
    }

    diag_info!(
        "reflected {stage} SPIR-V module: {} uniform buffers, {} storage buffers, {} sampled \
         images, {} separate images, {} storage images, {} separate samplers, {} push constant \
         blocks, {} inputs, {} outputs",
        info.num_uniform_buffers(),
        info.num_storage_buffers(),
        info.num_sampled_images(),
        info.num_separate_images(),
        info.num_storage_images(),
        info.num_separate_samplers(),
        info.num_push_constants(),
        info.num_inputs(),
        info.num_outputs(),
    );

    Ok(info)
}

enum ResourceClass {
    UniformBuffer,
    StorageBuffer,
    SampledImage,
    SeparateImage,
    StorageImage,
    SeparateSampler,
}

// Nothing legitimate nests types this deep; the cap keeps cyclic type
// references in hostile modules from recursing unboundedly.
const MAX_TYPE_DEPTH: usize = 32;

struct ModuleWalker {
    module: Module,
    names: HashMap<u32, String>,
}

impl ModuleWalker {
    fn new(module: Module) -> Self {
        let names = module
            .debug_names
            .iter()
            .filter(|inst| inst.class.opcode == Op::Name)
            .filter_map(|inst| match (inst.operands.first(), inst.operands.get(1)) {
                (Some(Operand::IdRef(id)), Some(Operand::LiteralString(name))) => {
                    Some((*id, name.clone()))
                }
                _ => None,
            })
            .collect();
        ModuleWalker { module, names }
    }

    fn name_of(&self, id: u32) -> String {
        self.names.get(&id).cloned().unwrap_or_default()
    }

    /// Returns the literal parameter of `decoration` on `id`, or 0 for
    /// parameterless decorations. `None` when the decoration is absent.
    fn decoration(&self, id: u32, decoration: Decoration) -> Option<u32> {
        self.module.annotations.iter().find_map(|inst| {
            if inst.class.opcode != Op::Decorate {
                return None;
            }
            let target = match inst.operands.first() {
                Some(Operand::IdRef(target)) => *target,
                _ => return None,
            };
            let found = match inst.operands.get(1) {
                Some(Operand::Decoration(d)) => *d,
                _ => return None,
            };
            (target == id && found == decoration).then(|| operand_u32(inst, 2).unwrap_or(0))
        })
    }

    fn has_decoration(&self, id: u32, decoration: Decoration) -> bool {
        self.decoration(id, decoration).is_some()
    }

    fn any_member_builtin(&self, struct_id: u32) -> bool {
        self.module.annotations.iter().any(|inst| {
            inst.class.opcode == Op::MemberDecorate
                && matches!(inst.operands.first(), Some(Operand::IdRef(id)) if *id == struct_id)
                && matches!(
                    inst.operands.get(2),
                    Some(Operand::Decoration(Decoration::BuiltIn))
                )
        })
    }

    fn type_instruction(&self, id: u32) -> Result<&Instruction, ReflectError> {
        self.module
            .types_global_values
            .iter()
            .find(|inst| inst.result_id == Some(id))
            .ok_or(ReflectError::MissingTypeInfo {
                kind: BytecodeKind::SpirV,
                id,
            })
    }

    /// Resolves a variable's type through its `OpTypePointer`.
    fn pointee(&self, var: &Instruction) -> Result<&Instruction, ReflectError> {
        let type_id = var.result_type.ok_or(ReflectError::MissingTypeInfo {
            kind: BytecodeKind::SpirV,
            id: var.result_id.unwrap_or(0),
        })?;
        let pointer = self.type_instruction(type_id)?;
        if pointer.class.opcode != Op::TypePointer {
            return Ok(pointer);
        }
        let pointee_id = operand_id(pointer, 1).ok_or(ReflectError::MissingTypeInfo {
            kind: BytecodeKind::SpirV,
            id: type_id,
        })?;
        self.type_instruction(pointee_id)
    }

    /// Peels one level of (runtime) array off a binding's type, returning
    /// the element type and the static array length (1 when not an array or
    /// when the length is unsized).
    fn unwrap_binding_array<'a>(
        &'a self,
        inst: &'a Instruction,
    ) -> Result<(&'a Instruction, u32), ReflectError> {
        match inst.class.opcode {
            Op::TypeArray => {
                let element_id = operand_id(inst, 0).ok_or(ReflectError::MissingTypeInfo {
                    kind: BytecodeKind::SpirV,
                    id: inst.result_id.unwrap_or(0),
                })?;
                let count = operand_id(inst, 1)
                    .and_then(|id| self.constant_u32(id))
                    .unwrap_or(1);
                Ok((self.type_instruction(element_id)?, count))
            }
            Op::TypeRuntimeArray => {
                let element_id = operand_id(inst, 0).ok_or(ReflectError::MissingTypeInfo {
                    kind: BytecodeKind::SpirV,
                    id: inst.result_id.unwrap_or(0),
                })?;
                Ok((self.type_instruction(element_id)?, 1))
            }
            _ => Ok((inst, 1)),
        }
    }

    fn constant_u32(&self, id: u32) -> Option<u32> {
        let inst = self
            .module
            .types_global_values
            .iter()
            .find(|inst| inst.result_id == Some(id))?;
        if inst.class.opcode != Op::Constant {
            return None;
        }
        operand_u32(inst, 0)
    }

    /// Numeric shape of a type: scalar base, vector width, matrix columns.
    /// `None` for non-numeric types (structs, images, ...), non-32-bit
    /// scalars, and cyclic type references.
    fn numeric_shape(&self, inst: &Instruction) -> Option<(BaseType, u32, u32)> {
        self.numeric_shape_at(inst, 0)
    }

    fn numeric_shape_at(&self, inst: &Instruction, depth: usize) -> Option<(BaseType, u32, u32)> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }
        match inst.class.opcode {
            Op::TypeFloat => (operand_u32(inst, 0)? == 32).then_some((BaseType::Float32, 1, 1)),
            Op::TypeInt => {
                let width = operand_u32(inst, 0)?;
                let signed = operand_u32(inst, 1)? == 1;
                (width == 32).then(|| {
                    let base = if signed {
                        BaseType::Sint32
                    } else {
                        BaseType::Uint32
                    };
                    (base, 1, 1)
                })
            }
            Op::TypeVector => {
                let component = self.type_instruction(operand_id(inst, 0)?).ok()?;
                let (base, _, _) = self.numeric_shape_at(component, depth + 1)?;
                Some((base, operand_u32(inst, 1)?, 1))
            }
            Op::TypeMatrix => {
                let column = self.type_instruction(operand_id(inst, 0)?).ok()?;
                let (base, vec_size, _) = self.numeric_shape_at(column, depth + 1)?;
                Some((base, vec_size, operand_u32(inst, 1)?))
            }
            _ => None,
        }
    }

    fn classify(&self, storage: StorageClass, ty: &Instruction) -> Option<ResourceClass> {
        match ty.class.opcode {
            Op::TypeStruct => {
                let struct_id = ty.result_id?;
                if storage == StorageClass::StorageBuffer
                    || self.has_decoration(struct_id, Decoration::BufferBlock)
                {
                    Some(ResourceClass::StorageBuffer)
                } else if self.has_decoration(struct_id, Decoration::Block) {
                    Some(ResourceClass::UniformBuffer)
                } else {
                    None
                }
            }
            Op::TypeSampledImage => Some(ResourceClass::SampledImage),
            // Operand 5 is the "sampled" literal: 2 marks storage usage,
            // everything else is a sampled/fetched image.
            Op::TypeImage => match operand_u32(ty, 5) {
                Some(2) => Some(ResourceClass::StorageImage),
                _ => Some(ResourceClass::SeparateImage),
            },
            Op::TypeSampler => Some(ResourceClass::SeparateSampler),
            _ => None,
        }
    }

    fn collect_stage_io(
        &self,
        var: &Instruction,
        storage: StorageClass,
        info: &mut ShaderReflectionInfo,
    ) -> Result<(), ReflectError> {
        let var_id = var.result_id.unwrap_or(0);
        if self.has_decoration(var_id, Decoration::BuiltIn) {
            return Ok(());
        }
        let ty = self.pointee(var)?;
        if ty.class.opcode == Op::TypeStruct {
            // gl_PerVertex and friends: block-decorated or carrying built-in
            // members.
            let struct_id = ty.result_id.unwrap_or(0);
            if self.has_decoration(struct_id, Decoration::Block)
                || self.any_member_builtin(struct_id)
            {
                return Ok(());
            }
        }

        let name = self.name_of(var_id);
        let location = self.decoration(var_id, Decoration::Location).unwrap_or(0);
        let direction = if storage == StorageClass::Input {
            "input"
        } else {
            "output"
        };
        let (fmt, vec_size, columns) = match self.numeric_shape(ty) {
            Some((base, vec_size, columns)) => {
                (format::map_numeric(base, vec_size, columns), vec_size, columns)
            }
            None => {
                diag_warn!(
                    "stage {direction} '{name}' at location {location} has a non-numeric type; \
                     it carries no vertex format"
                );
                (VertexFormat::Invalid, 1, 1)
            }
        };

        let io = StageIoInfo {
            name,
            location,
            format: fmt,
            vec_size,
            columns,
        };
        if storage == StorageClass::Input {
            info.inputs.push(io);
        } else {
            info.outputs.push(io);
        }
        Ok(())
    }

    fn collect_resource(
        &self,
        var: &Instruction,
        storage: StorageClass,
        info: &mut ShaderReflectionInfo,
    ) -> Result<(), ReflectError> {
        let var_id = var.result_id.unwrap_or(0);
        let ty = self.pointee(var)?;
        let (ty, count) = self.unwrap_binding_array(ty)?;

        let name = self.name_of(var_id);
        let Some(class) = self.classify(storage, ty) else {
            diag_warn!(
                "binding '{name}' (id {var_id}) has a type reflection cannot classify; skipping"
            );
            return Ok(());
        };

        let record = ResourceInfo {
            name,
            id: var_id,
            set: self
                .decoration(var_id, Decoration::DescriptorSet)
                .unwrap_or(0),
            binding: self.decoration(var_id, Decoration::Binding).unwrap_or(0),
            count,
        };
        match class {
            ResourceClass::UniformBuffer => info.uniform_buffers.push(record),
            ResourceClass::StorageBuffer => info.storage_buffers.push(record),
            ResourceClass::SampledImage => info.sampled_images.push(record),
            ResourceClass::SeparateImage => info.separate_images.push(record),
            ResourceClass::StorageImage => info.storage_images.push(record),
            ResourceClass::SeparateSampler => info.separate_samplers.push(record),
        }
        Ok(())
    }

    fn collect_push_constant(
        &self,
        var: &Instruction,
        info: &mut ShaderReflectionInfo,
    ) -> Result<(), ReflectError> {
        let var_id = var.result_id.unwrap_or(0);
        let ty = self.pointee(var)?;

        let mut name = self.name_of(var_id);
        if name.is_empty() {
            name = self.name_of(ty.result_id.unwrap_or(0));
        }
        let size = self.declared_size_bytes(ty)?;
        info.push_constants.push(PushConstantInfo { name, size });
        Ok(())
    }

    /// Declared byte size of a type. For structs this is the largest member
    /// `Offset` plus the size of the last member, matching the std140/std430
    /// layout the decorations describe. Cyclic type references and sizes
    /// that do not fit in a `u32` are errors.
    fn declared_size_bytes(&self, ty: &Instruction) -> Result<u32, ReflectError> {
        self.declared_size_bytes_at(ty, 0)
    }

    fn declared_size_bytes_at(&self, ty: &Instruction, depth: usize) -> Result<u32, ReflectError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(ReflectError::MissingTypeInfo {
                kind: BytecodeKind::SpirV,
                id: ty.result_id.unwrap_or(0),
            });
        }
        match ty.class.opcode {
            Op::TypeInt | Op::TypeFloat => Ok(operand_u32(ty, 0).unwrap_or(32) / 8),
            Op::TypeVector | Op::TypeMatrix => {
                let element_id = operand_id(ty, 0).ok_or(ReflectError::MissingTypeInfo {
                    kind: BytecodeKind::SpirV,
                    id: ty.result_id.unwrap_or(0),
                })?;
                let element = self.type_instruction(element_id)?;
                self.declared_size_bytes_at(element, depth + 1)?
                    .checked_mul(operand_u32(ty, 1).unwrap_or(1))
                    .ok_or_else(|| size_overflow(ty))
            }
            Op::TypeArray => {
                let element_id = operand_id(ty, 0).ok_or(ReflectError::MissingTypeInfo {
                    kind: BytecodeKind::SpirV,
                    id: ty.result_id.unwrap_or(0),
                })?;
                let element = self.type_instruction(element_id)?;
                let count = operand_id(ty, 1)
                    .and_then(|id| self.constant_u32(id))
                    .unwrap_or(1);
                self.declared_size_bytes_at(element, depth + 1)?
                    .checked_mul(count)
                    .ok_or_else(|| size_overflow(ty))
            }
            Op::TypeStruct => {
                if ty.operands.is_empty() {
                    return Ok(0);
                }
                let struct_id = ty.result_id.unwrap_or(0);
                let last_member_id = operand_id(ty, ty.operands.len() - 1).ok_or(
                    ReflectError::MissingTypeInfo {
                        kind: BytecodeKind::SpirV,
                        id: struct_id,
                    },
                )?;
                let last_member = self.type_instruction(last_member_id)?;
                self.max_member_offset(struct_id)
                    .checked_add(self.declared_size_bytes_at(last_member, depth + 1)?)
                    .ok_or_else(|| size_overflow(ty))
            }
            _ => Ok(0),
        }
    }

    fn max_member_offset(&self, struct_id: u32) -> u32 {
        self.module
            .annotations
            .iter()
            .filter(|inst| inst.class.opcode == Op::MemberDecorate)
            .filter(|inst| {
                matches!(inst.operands.first(), Some(Operand::IdRef(id)) if *id == struct_id)
            })
            .filter(|inst| {
                matches!(
                    inst.operands.get(2),
                    Some(Operand::Decoration(Decoration::Offset))
                )
            })
            .filter_map(|inst| match inst.operands.get(3) {
                Some(Operand::LiteralInt32(value)) => Some(*value),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

fn size_overflow(ty: &Instruction) -> ReflectError {
    ReflectError::MalformedContainer {
        kind: BytecodeKind::SpirV,
        detail: format!(
            "declared byte size of type id {} does not fit in u32",
            ty.result_id.unwrap_or(0)
        ),
    }
}

fn operand_id(inst: &Instruction, index: usize) -> Option<u32> {
    match inst.operands.get(index) {
        Some(Operand::IdRef(id)) => Some(*id),
        _ => None,
    }
}

fn operand_u32(inst: &Instruction, index: usize) -> Option<u32> {
    match inst.operands.get(index) {
        Some(Operand::LiteralInt32(value)) => Some(*value),
        _ => None,
    }
}
