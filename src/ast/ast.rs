use std::rc::Rc;

use crate::Span;

use super::{
    statements::{Declaration, Stmt},
    types::TypeSpec,
};

/// A formal parameter. Prototypes may omit the name.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub type_spec: TypeSpec,
}

/// A function prototype (`body == None`) or definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub return_type: TypeSpec,
    pub identifier: String,
    pub parameters: Vec<Parameter>,
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Function(FunctionDecl),
    GlobalVariable(Declaration),
}

/// Everything parsed from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub file: Rc<String>,
    pub declarations: Vec<TopLevel>,
}
