use std::any::Any;

use crate::{
    compiler::{
        assembly::AssemblyContext,
        scope::{DeclarationScope, ParameterInfo, MAX_SLOTS},
        translation_unit::TranslationUnitContext,
    },
    errors::errors::{Error, ErrorImpl},
    target::{
        instructions::Instruction,
        metadata::{MethodBody, MethodHandle, MethodSignature},
        types::TypeRef,
    },
    Span,
};

use super::{
    expressions::ConstantExpr,
    ir::{ExprWrapper, Expression, Statement, StmtWrapper, TopLevelNode},
    statements::emit_lowered,
};

fn void_not_allowed(what: &str, span: &Span) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: String::from(what),
            received: String::from("void"),
        },
        span.start.clone(),
    )
}

/// A prototype: `int f(int, char*);`
#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: TypeRef,
    pub parameters: Vec<ParameterInfo>,
    pub span: Span,
}

impl FunctionDeclaration {
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            return_type: self.return_type.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|parameter| parameter.parameter_type.clone())
                .collect(),
        }
    }

    pub fn parameter_names(&self) -> Vec<Option<String>> {
        self.parameters
            .iter()
            .map(|parameter| parameter.name.clone())
            .collect()
    }

    fn declare(&self, context: &mut AssemblyContext) -> Result<MethodHandle, Error> {
        if self
            .parameters
            .iter()
            .any(|parameter| parameter.parameter_type.is_void())
        {
            return Err(void_not_allowed("parameter type", &self.span));
        }
        if self.parameters.len() > MAX_SLOTS {
            return Err(Error::new(
                ErrorImpl::TooManySlots {
                    kind: String::from("parameters"),
                    limit: MAX_SLOTS,
                },
                self.span.start.clone(),
            ));
        }

        context.declare_function(
            &self.name,
            self.signature(),
            self.parameter_names(),
            self.span.start.clone(),
        )
    }
}

impl TopLevelNode for FunctionDeclaration {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, unit: &mut TranslationUnitContext) -> Result<(), Error> {
        self.declare(unit.assembly_context())?;
        Ok(())
    }
}

/// A function with a body.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub prototype: FunctionDeclaration,
    pub body: Vec<StmtWrapper>,
    pub span: Span,
}

impl FunctionDefinition {
    /// Appends `return 0` (converted to the return type) or a bare `ret`
    /// when control can fall off the end of the body.
    fn emit_default_return(&self, scope: &mut DeclarationScope) {
        if scope.last_instruction().is_some_and(Instruction::is_terminator) {
            return;
        }

        let return_type = self.prototype.return_type.clone();
        if !return_type.is_void() {
            let int32 = scope.type_system().int32();
            scope.emit(Instruction::LdcI4(0));
            scope.emit_conversion(&int32, &return_type, false);
        }
        scope.emit(Instruction::Ret);
    }
}

impl TopLevelNode for FunctionDefinition {
    fn get_name(&self) -> &str {
        &self.prototype.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, unit: &mut TranslationUnitContext) -> Result<(), Error> {
        let name = &self.prototype.name;
        let context = unit.assembly_context();
        self.prototype.declare(context)?;

        // Fail before emitting a second body
        if context.get_function(name).is_some_and(|function| function.is_defined) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDefined {
                    function: name.clone(),
                },
                self.span.start.clone(),
            ));
        }

        log::trace!("Emitting body of {}", name);
        let mut scope = DeclarationScope::new(
            context,
            self.prototype.parameters.clone(),
            self.prototype.return_type.clone(),
            MethodBody::new(),
        );
        for statement in &self.body {
            statement.emit_to(&mut scope)?;
        }
        self.emit_default_return(&mut scope);
        let body = scope.into_body();

        context.define_function(
            name,
            self.prototype.parameter_names(),
            body,
            self.span.start.clone(),
        )?;
        unit.record_function_defined();
        Ok(())
    }
}

/// A global variable, optionally with an initializer run by the global
/// initializer.
#[derive(Debug, Clone)]
pub struct GlobalVariable {
    pub name: String,
    pub variable_type: TypeRef,
    pub initializer: Option<ExprWrapper>,
    pub span: Span,
}

impl GlobalVariable {
    /// Statics start zeroed, so a zero literal needs no code.
    fn needs_initializer_code(&self) -> bool {
        match &self.initializer {
            Some(initializer) => !initializer
                .downcast_ref::<ConstantExpr>()
                .is_some_and(ConstantExpr::is_zero),
            None => false,
        }
    }
}

impl TopLevelNode for GlobalVariable {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, unit: &mut TranslationUnitContext) -> Result<(), Error> {
        if self.variable_type.is_void() {
            return Err(void_not_allowed("object type", &self.span));
        }

        let field = unit.add_global_field(&self.name, self.variable_type.clone(), self.span.start.clone())?;

        let initializer = match &self.initializer {
            Some(initializer) if self.needs_initializer_code() => initializer,
            _ => return Ok(()),
        };

        log::trace!("Scheduling initializer of global {}", self.name);
        unit.emit_to_global_initializer(|scope| {
            let value_type = emit_lowered(initializer, scope)?;
            if value_type.is_void() {
                return Err(void_not_allowed("value", initializer.get_span()));
            }
            scope.emit_conversion(&value_type, &self.variable_type, false);
            scope.emit(Instruction::Stsfld(field));
            Ok(())
        })
    }
}
