use std::{any::Any, fmt::Debug, ops::Deref};

use crate::{
    compiler::{scope::DeclarationScope, translation_unit::TranslationUnitContext},
    errors::errors::Error,
    target::types::TypeRef,
    Span,
};

/// Expression Types
///
/// Every expression variant the code generator knows about.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ExprType {
    Constant,
    StringConstant,
    Identifier,
    Unary,
    Arithmetic,
    Comparison,
    Call,
    Cast,
    Assignment,
}

/// Expression Trait
///
/// IR nodes are immutable. Lowering builds a new tree instead of rewriting
/// the existing one.
pub trait Expression: Debug {
    /// Returns the expression type of the expression.
    fn get_expr_type(&self) -> ExprType;
    /// Type conversion purposes - used with `.downcast_ref<T>()`
    fn as_any(&self) -> &dyn Any;
    /// Clones the expression into an ExprWrapper.
    /// Clone cannot be derived for certain trait objects, so this method is necessary.
    fn clone_wrapper(&self) -> ExprWrapper;
    /// Returns the span of the expression.
    fn get_span(&self) -> &Span;
    /// Returns the machine type of the value the expression leaves on the stack.
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error>;
    /// Returns an equivalent tree built only from directly emittable forms.
    ///
    /// Lowering an already lowered tree yields an equivalent tree, and the
    /// result always has the same type as `self`.
    fn lower(&self) -> ExprWrapper;
    /// Appends the instructions computing this expression.
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error>;
    /// Direct children, in evaluation order.
    fn sub_expressions(&self) -> Vec<&ExprWrapper>;
}

/// Expression Wrapper
///
/// A wrapper that allows for any expression kind to be stored with helper methods
#[derive(Debug)]
pub struct ExprWrapper(Box<dyn Expression>);

impl ExprWrapper {
    pub fn new<T: Expression + 'static>(expression: T) -> Self {
        ExprWrapper(Box::new(expression))
    }

    /// Downcasts to a concrete expression variant.
    pub fn downcast_ref<T: Expression + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl Deref for ExprWrapper {
    type Target = Box<dyn Expression>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Expression for ExprWrapper {
    fn get_expr_type(&self) -> ExprType {
        self.0.get_expr_type()
    }
    fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        self.0.clone_wrapper()
    }
    fn get_span(&self) -> &Span {
        self.0.get_span()
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        self.0.get_type(scope)
    }
    fn lower(&self) -> ExprWrapper {
        self.0.lower()
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        self.0.emit_to(scope)
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        self.0.sub_expressions()
    }
}

impl Clone for ExprWrapper {
    fn clone(&self) -> Self {
        self.clone_wrapper()
    }
}

/// Statement Types
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum StmtType {
    Expression,
    Declaration,
    Return,
    If,
    While,
    For,
    Block,
}

/// Statement Trait
///
/// Statements lower their expressions right before emitting them.
pub trait Statement: Debug {
    /// Returns the type of the statement.
    fn get_stmt_type(&self) -> StmtType;
    /// Type conversion purposes - used with `.downcast_ref<T>()`
    fn as_any(&self) -> &dyn Any;
    /// Clones the statement into a StmtWrapper.
    fn clone_wrapper(&self) -> StmtWrapper;
    /// Returns the span of the statement.
    fn get_span(&self) -> &Span;
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error>;
}

/// Statement Wrapper
///
/// A wrapper that allows for any statement kind to be stored with helper methods
#[derive(Debug)]
pub struct StmtWrapper(Box<dyn Statement>);

impl StmtWrapper {
    pub fn new<T: Statement + 'static>(statement: T) -> Self {
        StmtWrapper(Box::new(statement))
    }

    pub fn downcast_ref<T: Statement + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl Statement for StmtWrapper {
    fn get_stmt_type(&self) -> StmtType {
        self.0.get_stmt_type()
    }
    fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }
    fn clone_wrapper(&self) -> StmtWrapper {
        self.0.clone_wrapper()
    }
    fn get_span(&self) -> &Span {
        self.0.get_span()
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        self.0.emit_to(scope)
    }
}

impl Clone for StmtWrapper {
    fn clone(&self) -> Self {
        self.clone_wrapper()
    }
}

/// A function, prototype or global variable ready to be emitted.
pub trait TopLevelNode: Debug {
    /// Name of the declared entity.
    fn get_name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn get_span(&self) -> &Span;
    fn emit_to(&self, unit: &mut TranslationUnitContext) -> Result<(), Error>;
}

#[derive(Debug)]
pub struct TopLevelWrapper(Box<dyn TopLevelNode>);

impl TopLevelWrapper {
    pub fn new<T: TopLevelNode + 'static>(node: T) -> Self {
        TopLevelWrapper(Box::new(node))
    }

    pub fn downcast_ref<T: TopLevelNode + 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl Deref for TopLevelWrapper {
    type Target = Box<dyn TopLevelNode>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
