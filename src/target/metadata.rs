//! In-memory metadata tables of the artifact being built.
//!
//! Types, fields and methods live in flat tables inside the [`Module`] and are
//! addressed by handles, so IR nodes can hold on to them without borrowing the
//! module.

use serde::{Deserialize, Serialize};

use super::{
    instructions::{Instruction, Label},
    types::TypeRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyKind {
    Executable,
    Library,
}

/// Framework the artifact runs on, e.g. `Microsoft.NETCore.App` `8.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFramework {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub namespace: Option<String>,
    pub visibility: Visibility,
    pub is_sealed: bool,
    pub is_abstract: bool,
    pub is_value_type: bool,
    /// Explicit layout: field packing in bytes
    pub packing_size: Option<u16>,
    /// Explicit layout: total size in bytes
    pub class_size: Option<u32>,
    /// Enclosing type for nested types
    pub declaring_type: Option<TypeHandle>,
    pub fields: Vec<FieldHandle>,
    pub methods: Vec<MethodHandle>,
}

impl TypeDefinition {
    pub fn new(name: &str, namespace: Option<String>) -> Self {
        TypeDefinition {
            name: String::from(name),
            namespace,
            visibility: Visibility::Public,
            is_sealed: false,
            is_abstract: false,
            is_value_type: false,
            packing_size: None,
            class_size: None,
            declaring_type: None,
            fields: vec![],
            methods: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: TypeRef,
    pub owner: TypeHandle,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_init_only: bool,
    /// Bytes the field holds when the artifact is loaded
    pub initial_value: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub return_type: TypeRef,
    pub parameters: Vec<TypeRef>,
}

/// Locals and instructions of a method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodBody {
    pub locals: Vec<TypeRef>,
    pub instructions: Vec<Instruction>,
    label_count: usize,
}

impl MethodBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Allocates the next local slot, or `None` once every `u16` slot is taken.
    pub fn define_local(&mut self, local_type: TypeRef) -> Option<u16> {
        let index = u16::try_from(self.locals.len()).ok()?;
        self.locals.push(local_type);
        Some(index)
    }

    pub fn define_label(&mut self) -> Label {
        self.label_count += 1;
        Label(self.label_count - 1)
    }

    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefinition {
    pub name: String,
    pub owner: TypeHandle,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Runtime-recognised names such as `.cctor`
    pub is_special_name: bool,
    pub signature: MethodSignature,
    pub parameter_names: Vec<Option<String>>,
    pub body: Option<MethodBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub types: Vec<TypeDefinition>,
    pub fields: Vec<FieldDefinition>,
    pub methods: Vec<MethodDefinition>,
}

impl Module {
    /// Name of the implicit anchor type every module starts with.
    pub const MODULE_TYPE_NAME: &'static str = "<Module>";

    pub fn new(name: &str) -> Self {
        Module {
            name: String::from(name),
            types: vec![TypeDefinition::new(Self::MODULE_TYPE_NAME, None)],
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn module_type(&self) -> TypeHandle {
        TypeHandle(0)
    }

    pub fn add_type(&mut self, definition: TypeDefinition) -> TypeHandle {
        self.types.push(definition);
        TypeHandle(self.types.len() - 1)
    }

    pub fn add_field(&mut self, definition: FieldDefinition) -> FieldHandle {
        let owner = definition.owner;
        self.fields.push(definition);
        let handle = FieldHandle(self.fields.len() - 1);
        self.types[owner.0].fields.push(handle);
        handle
    }

    pub fn add_method(&mut self, definition: MethodDefinition) -> MethodHandle {
        let owner = definition.owner;
        self.methods.push(definition);
        let handle = MethodHandle(self.methods.len() - 1);
        self.types[owner.0].methods.push(handle);
        handle
    }

    pub fn get_type(&self, handle: TypeHandle) -> &TypeDefinition {
        &self.types[handle.0]
    }

    pub fn get_field(&self, handle: FieldHandle) -> &FieldDefinition {
        &self.fields[handle.0]
    }

    pub fn get_method(&self, handle: MethodHandle) -> &MethodDefinition {
        &self.methods[handle.0]
    }

    pub fn get_method_mut(&mut self, handle: MethodHandle) -> &mut MethodDefinition {
        &mut self.methods[handle.0]
    }

    /// Name of a type including its namespace or enclosing types.
    pub fn qualified_type_name(&self, handle: TypeHandle) -> String {
        let definition = self.get_type(handle);
        match (definition.declaring_type, &definition.namespace) {
            (Some(parent), _) => format!("{}/{}", self.qualified_type_name(parent), definition.name),
            (None, Some(namespace)) => format!("{}.{}", namespace, definition.name),
            (None, None) => definition.name.clone(),
        }
    }
}

/// The finished (or in-progress) compiled artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub name: String,
    pub kind: AssemblyKind,
    pub target_framework: Option<TargetFramework>,
    pub references: Vec<String>,
    pub module: Module,
    pub entry_point: Option<MethodHandle>,
}

impl Assembly {
    pub fn new(name: &str, kind: AssemblyKind) -> Self {
        let module_name = match kind {
            AssemblyKind::Executable => format!("{}.exe", name),
            AssemblyKind::Library => format!("{}.dll", name),
        };

        Assembly {
            name: String::from(name),
            kind,
            target_framework: None,
            references: vec![],
            module: Module::new(&module_name),
            entry_point: None,
        }
    }

    /// Finds a method by the name it was defined with.
    pub fn find_method(&self, name: &str) -> Option<MethodHandle> {
        self.module
            .methods
            .iter()
            .position(|method| method.name == name)
            .map(MethodHandle)
    }
}
