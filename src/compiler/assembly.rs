//! The per-artifact compilation context.
//!
//! One [`AssemblyContext`] exists per output artifact. It owns the artifact
//! under construction and every piece of state shared between translation
//! units: global fields, the function registry, the constant pool and the
//! global initializer.

use std::collections::HashMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    ir::ir::TopLevelWrapper,
    target::{
        instructions::Instruction,
        metadata::{
            Assembly, AssemblyKind, FieldDefinition, FieldHandle, MethodBody, MethodDefinition,
            MethodHandle, MethodSignature, Module, TypeDefinition, TypeHandle, Visibility,
        },
        types::{TypeRef, TypeSystem},
    },
    Position,
};

use super::{options::AssemblyOptions, translation_unit::TranslationUnitContext};

/// Name of the method that initializes globals before any user code runs.
pub const GLOBAL_INITIALIZER_NAME: &str = ".cctor";

const CONSTANT_POOL_TYPE_NAME: &str = "<ConstantPool>";

/// Registry entry for a function: its signature and whether a body was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: MethodSignature,
    pub method: MethodHandle,
    pub is_defined: bool,
}

pub struct AssemblyContext {
    assembly: Assembly,
    global_type: TypeHandle,
    type_system: TypeSystem,
    functions: Vec<FunctionInfo>,
    function_lookup: HashMap<String, usize>,
    globals: HashMap<String, FieldHandle>,
    constant_pool_type: Option<TypeHandle>,
    /// Stub value types keyed by their size in bytes
    stub_types: HashMap<usize, TypeHandle>,
    constants: HashMap<String, FieldHandle>,
    global_initializer: Option<MethodHandle>,
}

impl AssemblyContext {
    /// Allocates the artifact and its global anchor type.
    pub fn create(options: &AssemblyOptions) -> Self {
        let mut assembly = Assembly::new(&options.name, options.kind);
        assembly.target_framework = options.target_framework.clone();
        assembly.references = options.references.clone();

        let global_type = match &options.global_type_name {
            Some(name) => {
                let mut definition = TypeDefinition::new(name, options.namespace.clone());
                definition.is_sealed = true;
                definition.is_abstract = true;
                assembly.module.add_type(definition)
            }
            None => assembly.module.module_type(),
        };

        log::info!(
            "Created assembly {} ({:?}) with global type {}",
            options.name,
            options.kind,
            assembly.module.qualified_type_name(global_type)
        );

        AssemblyContext {
            assembly,
            global_type,
            type_system: TypeSystem,
            functions: vec![],
            function_lookup: HashMap::new(),
            globals: HashMap::new(),
            constant_pool_type: None,
            stub_types: HashMap::new(),
            constants: HashMap::new(),
            global_initializer: None,
        }
    }

    /// Emits every top-level node of one translation unit, in order.
    pub fn emit_translation_unit(&mut self, nodes: &[TopLevelWrapper]) -> Result<(), Error> {
        let mut unit = TranslationUnitContext::new(self);

        for node in nodes {
            log::trace!("Emitting top-level {}", node.get_name());
            node.emit_to(&mut unit)?;
        }

        log::info!(
            "Emitted translation unit: {} functions defined, {} globals",
            unit.functions_defined(),
            unit.globals_added()
        );
        Ok(())
    }

    pub fn type_system(&self) -> TypeSystem {
        self.type_system
    }

    pub fn module(&self) -> &Module {
        &self.assembly.module
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn global_type(&self) -> TypeHandle {
        self.global_type
    }

    /// Allocates a public static field on the global type.
    pub fn add_global_field(
        &mut self,
        name: &str,
        field_type: TypeRef,
        position: Position,
    ) -> Result<FieldHandle, Error> {
        if self.globals.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::GlobalAlreadyDeclared {
                    global: String::from(name),
                },
                position,
            ));
        }

        let field = self.assembly.module.add_field(FieldDefinition {
            name: String::from(name),
            field_type,
            owner: self.global_type,
            visibility: Visibility::Public,
            is_static: true,
            is_init_only: false,
            initial_value: None,
        });
        self.globals.insert(String::from(name), field);

        log::debug!("Global field added: {}", name);
        Ok(field)
    }

    pub fn get_global(&self, name: &str) -> Option<FieldHandle> {
        self.globals.get(name).copied()
    }

    /// Returns the global initializer, creating it on first use.
    pub fn get_global_initializer(&mut self) -> MethodHandle {
        if let Some(initializer) = self.global_initializer {
            return initializer;
        }

        let initializer = self.assembly.module.add_method(MethodDefinition {
            name: String::from(GLOBAL_INITIALIZER_NAME),
            owner: self.global_type,
            visibility: Visibility::Private,
            is_static: true,
            is_special_name: true,
            signature: MethodSignature {
                return_type: self.type_system.void(),
                parameters: vec![],
            },
            parameter_names: vec![],
            body: Some(MethodBody::new()),
        });
        self.global_initializer = Some(initializer);

        log::debug!("Global initializer created");
        initializer
    }

    /// Moves a method's body out so it can be appended to.
    pub fn take_method_body(&mut self, method: MethodHandle) -> MethodBody {
        self.assembly
            .module
            .get_method_mut(method)
            .body
            .take()
            .unwrap_or_default()
    }

    pub fn restore_method_body(&mut self, method: MethodHandle, body: MethodBody) {
        self.assembly.module.get_method_mut(method).body = Some(body);
    }

    fn get_constant_pool_type(&mut self) -> TypeHandle {
        if let Some(pool) = self.constant_pool_type {
            return pool;
        }

        let mut definition = TypeDefinition::new(CONSTANT_POOL_TYPE_NAME, None);
        definition.visibility = Visibility::Private;
        definition.is_sealed = true;
        definition.is_abstract = true;
        definition.declaring_type = Some(self.global_type);
        let pool = self.assembly.module.add_type(definition);
        self.constant_pool_type = Some(pool);

        log::debug!("Constant pool type created");
        pool
    }

    /// Value type of exactly `size` bytes, shared by all constants of that size.
    fn get_stub_type(&mut self, size: usize) -> TypeHandle {
        if let Some(stub) = self.stub_types.get(&size) {
            return *stub;
        }

        let pool = self.get_constant_pool_type();
        let mut definition = TypeDefinition::new(&format!("__Blob{}", size), None);
        definition.visibility = Visibility::Private;
        definition.is_sealed = true;
        definition.is_value_type = true;
        definition.packing_size = Some(1);
        definition.class_size = Some(size as u32);
        definition.declaring_type = Some(pool);
        let stub = self.assembly.module.add_type(definition);
        self.stub_types.insert(size, stub);

        log::debug!("Stub type created for {} bytes", size);
        stub
    }

    /// Field holding `value` as a zero-terminated UTF-8 string.
    ///
    /// Equal contents share one field.
    pub fn get_constant_pool_reference(&mut self, value: &str) -> FieldHandle {
        if let Some(field) = self.constants.get(value) {
            return *field;
        }

        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);

        let pool = self.get_constant_pool_type();
        let stub = self.get_stub_type(bytes.len());
        let field = self.assembly.module.add_field(FieldDefinition {
            name: format!("__constant{}", self.constants.len()),
            field_type: TypeRef::Defined(stub),
            owner: pool,
            visibility: Visibility::Private,
            is_static: true,
            is_init_only: true,
            initial_value: Some(bytes),
        });
        self.constants.insert(String::from(value), field);

        log::debug!("Constant pooled: {:?}", value);
        field
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.function_lookup
            .get(name)
            .map(|index| &self.functions[*index])
    }

    /// Registers a function, or checks a repeated declaration against the
    /// existing signature.
    pub fn declare_function(
        &mut self,
        name: &str,
        signature: MethodSignature,
        parameter_names: Vec<Option<String>>,
        position: Position,
    ) -> Result<MethodHandle, Error> {
        if let Some(existing) = self.get_function(name) {
            if existing.signature != signature {
                return Err(Error::new(
                    ErrorImpl::FunctionSignatureMismatch {
                        function: String::from(name),
                    },
                    position,
                ));
            }
            return Ok(existing.method);
        }

        let method = self.assembly.module.add_method(MethodDefinition {
            name: String::from(name),
            owner: self.global_type,
            visibility: Visibility::Public,
            is_static: true,
            is_special_name: false,
            signature: signature.clone(),
            parameter_names,
            body: None,
        });

        self.function_lookup
            .insert(String::from(name), self.functions.len());
        self.functions.push(FunctionInfo {
            name: String::from(name),
            signature,
            method,
            is_defined: false,
        });

        log::debug!("Function declared: {}", name);
        Ok(method)
    }

    /// Attaches a body to a declared function and marks it defined.
    pub fn define_function(
        &mut self,
        name: &str,
        parameter_names: Vec<Option<String>>,
        body: MethodBody,
        position: Position,
    ) -> Result<(), Error> {
        let index = match self.function_lookup.get(name) {
            Some(index) => *index,
            None => {
                return Err(Error::new(
                    ErrorImpl::FunctionNotDeclared {
                        function: String::from(name),
                    },
                    position,
                ))
            }
        };

        let function = &mut self.functions[index];
        if function.is_defined {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDefined {
                    function: String::from(name),
                },
                position,
            ));
        }
        function.is_defined = true;
        let method = function.method;

        let definition = self.assembly.module.get_method_mut(method);
        definition.parameter_names = parameter_names;
        definition.body = Some(body);

        if name == "main" && self.assembly.kind == AssemblyKind::Executable {
            self.assembly.entry_point = Some(method);
            log::debug!("Entry point set to main");
        }

        log::debug!("Function defined: {}", name);
        Ok(())
    }

    /// Checks that every function was defined, seals the global initializer
    /// and hands out the finished artifact.
    pub fn verify_and_get_assembly(mut self) -> Result<Assembly, Error> {
        if let Some(function) = self.functions.iter().find(|function| !function.is_defined) {
            return Err(Error::new(
                ErrorImpl::FunctionNotDefined {
                    function: function.name.clone(),
                },
                Position::null(),
            ));
        }

        if let Some(initializer) = self.global_initializer {
            let mut body = self.take_method_body(initializer);
            body.emit(Instruction::Ret);
            self.restore_method_body(initializer, body);
        }

        log::info!(
            "Verified assembly {}: {} functions, {} globals, {} pooled constants",
            self.assembly.name,
            self.functions.len(),
            self.globals.len(),
            self.constants.len()
        );
        Ok(self.assembly)
    }
}
