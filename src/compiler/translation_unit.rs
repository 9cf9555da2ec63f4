use crate::{
    errors::errors::Error,
    target::{metadata::FieldHandle, types::TypeRef},
    Position,
};

use super::{
    assembly::AssemblyContext,
    scope::{DeclarationScope, ParameterInfo},
};

/// Emission context for one translation unit.
///
/// Top-level nodes go through this rather than the assembly context so the
/// unit can keep its own bookkeeping.
pub struct TranslationUnitContext<'a> {
    context: &'a mut AssemblyContext,
    functions_defined: usize,
    globals_added: usize,
}

impl<'a> TranslationUnitContext<'a> {
    pub fn new(context: &'a mut AssemblyContext) -> Self {
        TranslationUnitContext {
            context,
            functions_defined: 0,
            globals_added: 0,
        }
    }

    pub fn assembly_context(&mut self) -> &mut AssemblyContext {
        self.context
    }

    pub fn functions_defined(&self) -> usize {
        self.functions_defined
    }

    pub fn globals_added(&self) -> usize {
        self.globals_added
    }

    pub fn record_function_defined(&mut self) {
        self.functions_defined += 1;
    }

    pub fn add_global_field(
        &mut self,
        name: &str,
        field_type: TypeRef,
        position: Position,
    ) -> Result<FieldHandle, Error> {
        let field = self.context.add_global_field(name, field_type, position)?;
        self.globals_added += 1;
        Ok(field)
    }

    /// Runs `emit` with a scope appending to the global initializer.
    pub fn emit_to_global_initializer<F>(&mut self, emit: F) -> Result<(), Error>
    where
        F: FnOnce(&mut DeclarationScope<'_>) -> Result<(), Error>,
    {
        let initializer = self.context.get_global_initializer();
        let body = self.context.take_method_body(initializer);
        let void = self.context.type_system().void();

        let mut scope = DeclarationScope::new(self.context, Vec::<ParameterInfo>::new(), void, body);
        let result = emit(&mut scope);
        let body = scope.into_body();

        self.context.restore_method_body(initializer, body);
        result
    }
}
