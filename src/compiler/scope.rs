//! Identifier resolution and instruction emission for one method body.

use std::collections::HashMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    target::{
        instructions::{Instruction, Label},
        metadata::{FieldHandle, MethodBody, Module},
        types::{TypeRef, TypeSystem},
    },
    Position,
};

use super::assembly::{AssemblyContext, FunctionInfo};

/// Locals and parameters are addressed by `u16` slot indices.
pub const MAX_SLOTS: usize = u16::MAX as usize + 1;

/// A formal parameter as seen from the function body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: Option<String>,
    pub parameter_type: TypeRef,
}

/// Where an identifier's value lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Local(u16, TypeRef),
    Parameter(u16, TypeRef),
    Global(FieldHandle, TypeRef),
}

impl Storage {
    pub fn get_type(&self) -> &TypeRef {
        match self {
            Storage::Local(_, storage_type)
            | Storage::Parameter(_, storage_type)
            | Storage::Global(_, storage_type) => storage_type,
        }
    }

    pub fn load(&self) -> Instruction {
        match self {
            Storage::Local(index, _) => Instruction::Ldloc(*index),
            Storage::Parameter(index, _) => Instruction::Ldarg(*index),
            Storage::Global(field, _) => Instruction::Ldsfld(*field),
        }
    }

    pub fn store(&self) -> Instruction {
        match self {
            Storage::Local(index, _) => Instruction::Stloc(*index),
            Storage::Parameter(index, _) => Instruction::Starg(*index),
            Storage::Global(field, _) => Instruction::Stsfld(*field),
        }
    }
}

/// Locals, parameters and emission target of the method body being built.
///
/// Locals are kept in a stack of blocks: a name may appear once per block and
/// inner blocks shadow outer ones. Resolution falls back from locals to
/// parameters to globals; reporting a failed lookup is up to the caller.
pub struct DeclarationScope<'a> {
    context: &'a mut AssemblyContext,
    parameters: Vec<ParameterInfo>,
    return_type: TypeRef,
    blocks: Vec<HashMap<String, (u16, TypeRef)>>,
    body: MethodBody,
}

impl<'a> DeclarationScope<'a> {
    pub fn new(
        context: &'a mut AssemblyContext,
        parameters: Vec<ParameterInfo>,
        return_type: TypeRef,
        body: MethodBody,
    ) -> Self {
        DeclarationScope {
            context,
            parameters,
            return_type,
            blocks: vec![HashMap::new()],
            body,
        }
    }

    /// Declares a local in the innermost block.
    ///
    /// Function-level locals share a scope with the parameters, so they may
    /// not reuse a parameter's name.
    pub fn add_variable(
        &mut self,
        identifier: &str,
        variable_type: TypeRef,
        position: Position,
    ) -> Result<u16, Error> {
        let already_declared = self
            .blocks
            .last()
            .is_some_and(|block| block.contains_key(identifier))
            || (self.blocks.len() == 1 && self.get_parameter(identifier).is_some());
        if already_declared {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: String::from(identifier),
                },
                position,
            ));
        }

        let index = self.body.define_local(variable_type.clone()).ok_or_else(|| {
            Error::new(
                ErrorImpl::TooManySlots {
                    kind: String::from("locals"),
                    limit: MAX_SLOTS,
                },
                position.clone(),
            )
        })?;
        if let Some(block) = self.blocks.last_mut() {
            block.insert(String::from(identifier), (index, variable_type));
        }

        log::trace!("Local {} declared as slot {}", identifier, index);
        Ok(index)
    }

    pub fn get_variable(&self, identifier: &str) -> Option<Storage> {
        self.blocks
            .iter()
            .rev()
            .find_map(|block| block.get(identifier))
            .map(|(index, variable_type)| Storage::Local(*index, variable_type.clone()))
    }

    pub fn get_parameter(&self, identifier: &str) -> Option<Storage> {
        self.parameters
            .iter()
            .position(|parameter| parameter.name.as_deref() == Some(identifier))
            .and_then(|index| {
                let slot = u16::try_from(index).ok()?;
                Some(Storage::Parameter(slot, self.parameters[index].parameter_type.clone()))
            })
    }

    pub fn get_global(&self, identifier: &str) -> Option<Storage> {
        self.context.get_global(identifier).map(|field| {
            Storage::Global(field, self.context.module().get_field(field).field_type.clone())
        })
    }

    /// Local, then parameter, then global.
    pub fn resolve(&self, identifier: &str) -> Option<Storage> {
        self.get_variable(identifier)
            .or_else(|| self.get_parameter(identifier))
            .or_else(|| self.get_global(identifier))
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.context.get_function(name)
    }

    pub fn get_constant_pool_reference(&mut self, value: &str) -> FieldHandle {
        self.context.get_constant_pool_reference(value)
    }

    pub fn type_system(&self) -> TypeSystem {
        self.context.type_system()
    }

    pub fn module(&self) -> &Module {
        self.context.module()
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn push_block(&mut self) {
        self.blocks.push(HashMap::new());
    }

    pub fn pop_block(&mut self) {
        // The function-level block is never popped
        if self.blocks.len() > 1 {
            self.blocks.pop();
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.body.emit(instruction);
    }

    /// Emits whatever conversion `from` to `to` needs, possibly nothing.
    pub fn emit_conversion(&mut self, from: &TypeRef, to: &TypeRef, explicit: bool) {
        for conversion in self.type_system().conversion(from, to, explicit) {
            self.emit(conversion);
        }
    }

    pub fn define_label(&mut self) -> Label {
        self.body.define_label()
    }

    pub fn mark_label(&mut self, label: Label) {
        self.body.emit(Instruction::MarkLabel(label));
    }

    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.body.last_instruction()
    }

    pub fn into_body(self) -> MethodBody {
        self.body
    }
}
