use std::any::Any;

use crate::{
    compiler::scope::DeclarationScope,
    errors::errors::{Error, ErrorImpl},
    target::{
        instructions::{Instruction, Label},
        types::{StackKind, TypeRef},
    },
    Span,
};

use super::ir::{ExprWrapper, Expression, Statement, StmtType, StmtWrapper};

/// Lowers and emits `expression`, returning the type it left on the stack.
pub fn emit_lowered(expression: &ExprWrapper, scope: &mut DeclarationScope) -> Result<TypeRef, Error> {
    let lowered = expression.lower();
    lowered.emit_to(scope)?;
    lowered.get_type(scope)
}

/// Evaluates `condition` and jumps to `target` when it is zero.
fn emit_branch_if_false(
    condition: &ExprWrapper,
    target: Label,
    scope: &mut DeclarationScope,
) -> Result<(), Error> {
    let condition_type = emit_lowered(condition, scope)?;

    match condition_type.stack_kind() {
        StackKind::Void | StackKind::Value => Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: String::from("scalar condition"),
                received: condition_type.to_string(),
            },
            condition.get_span().start.clone(),
        )),
        // Branch instructions cannot test floating values directly
        StackKind::Float => {
            scope.emit(Instruction::LdcR8(0.0));
            scope.emit(Instruction::Ceq);
            scope.emit(Instruction::Brtrue(target));
            Ok(())
        }
        _ => {
            scope.emit(Instruction::Brfalse(target));
            Ok(())
        }
    }
}

/// Evaluates an expression for its side effects, discarding any value.
#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: ExprWrapper,
    pub span: Span,
}

impl Statement for ExpressionStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::Expression
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        log::trace!("Emitting expression statement");
        let value_type = emit_lowered(&self.expression, scope)?;
        if !value_type.is_void() {
            scope.emit(Instruction::Pop);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DeclarationStatement {
    pub identifier: String,
    pub variable_type: TypeRef,
    pub initializer: Option<ExprWrapper>,
    pub span: Span,
}

impl Statement for DeclarationStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::Declaration
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        if self.variable_type.is_void() {
            return Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: String::from("object type"),
                    received: self.variable_type.to_string(),
                },
                self.span.start.clone(),
            ));
        }

        // The new name is visible inside its own initializer
        let index = scope.add_variable(&self.identifier, self.variable_type.clone(), self.span.start.clone())?;

        if let Some(initializer) = &self.initializer {
            let value_type = emit_lowered(initializer, scope)?;
            if value_type.is_void() {
                return Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: self.variable_type.to_string(),
                        received: value_type.to_string(),
                    },
                    initializer.get_span().start.clone(),
                ));
            }
            scope.emit_conversion(&value_type, &self.variable_type, false);
            scope.emit(Instruction::Stloc(index));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<ExprWrapper>,
    pub span: Span,
}

impl Statement for ReturnStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::Return
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let return_type = scope.return_type().clone();

        match &self.value {
            Some(value) => {
                let value_type = emit_lowered(value, scope)?;
                if return_type.is_void() || value_type.is_void() {
                    return Err(Error::new(
                        ErrorImpl::TypeMatchError {
                            expected: return_type.to_string(),
                            received: value_type.to_string(),
                        },
                        value.get_span().start.clone(),
                    ));
                }
                scope.emit_conversion(&value_type, &return_type, false);
            }
            None if !return_type.is_void() => {
                return Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: return_type.to_string(),
                        received: String::from("void"),
                    },
                    self.span.start.clone(),
                ))
            }
            None => {}
        }

        scope.emit(Instruction::Ret);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: ExprWrapper,
    pub then_body: StmtWrapper,
    pub else_body: Option<StmtWrapper>,
    pub span: Span,
}

impl Statement for IfStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::If
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let else_label = scope.define_label();
        emit_branch_if_false(&self.condition, else_label, scope)?;

        self.then_body.emit_to(scope)?;

        match &self.else_body {
            Some(else_body) => {
                let end_label = scope.define_label();
                scope.emit(Instruction::Br(end_label));
                scope.mark_label(else_label);
                else_body.emit_to(scope)?;
                scope.mark_label(end_label);
            }
            None => scope.mark_label(else_label),
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: ExprWrapper,
    pub body: StmtWrapper,
    pub span: Span,
}

impl Statement for WhileStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::While
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let start_label = scope.define_label();
        let end_label = scope.define_label();

        scope.mark_label(start_label);
        emit_branch_if_false(&self.condition, end_label, scope)?;
        self.body.emit_to(scope)?;
        scope.emit(Instruction::Br(start_label));
        scope.mark_label(end_label);
        Ok(())
    }
}

/// `for (init; condition; step) body`. The init clause gets its own block.
#[derive(Debug, Clone)]
pub struct ForStatement {
    pub init: Option<StmtWrapper>,
    pub condition: Option<ExprWrapper>,
    pub step: Option<ExprWrapper>,
    pub body: StmtWrapper,
    pub span: Span,
}

impl Statement for ForStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::For
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        scope.push_block();
        let result = self.emit_loop(scope);
        scope.pop_block();
        result
    }
}

impl ForStatement {
    fn emit_loop(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        if let Some(init) = &self.init {
            init.emit_to(scope)?;
        }

        let start_label = scope.define_label();
        let end_label = scope.define_label();

        scope.mark_label(start_label);
        if let Some(condition) = &self.condition {
            emit_branch_if_false(condition, end_label, scope)?;
        }
        self.body.emit_to(scope)?;
        if let Some(step) = &self.step {
            if !emit_lowered(step, scope)?.is_void() {
                scope.emit(Instruction::Pop);
            }
        }
        scope.emit(Instruction::Br(start_label));
        scope.mark_label(end_label);
        Ok(())
    }
}

/// `{ ... }`; names declared inside shadow outer ones until the block ends.
#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: Vec<StmtWrapper>,
    pub span: Span,
}

impl Statement for BlockStatement {
    fn get_stmt_type(&self) -> StmtType {
        StmtType::Block
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        StmtWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        scope.push_block();
        let result = self.body.iter().try_for_each(|statement| statement.emit_to(scope));
        scope.pop_block();
        result
    }
}
