use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    /// Shorthand for an internal-consistency fault.
    ///
    /// These indicate a bug in an earlier pass rather than a problem with the
    /// user's program, e.g. a compound comparison reaching emission.
    pub fn internal(message: impl Into<String>, position: Position) -> Self {
        Error::new(
            ErrorImpl::InternalCompilerError {
                message: message.into(),
            },
            position,
        )
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.internal_error, ErrorImpl::InternalCompilerError { .. })
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::GlobalAlreadyDeclared { .. } => "GlobalAlreadyDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::FunctionSignatureMismatch { .. } => "FunctionSignatureMismatch",
            ErrorImpl::FunctionNotDefined { .. } => "FunctionNotDefined",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::TooManySlots { .. } => "TooManySlots",
            ErrorImpl::InternalCompilerError { .. } => "InternalCompilerError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` already declared in this scope",
                variable
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::GlobalAlreadyDeclared { global } => {
                ErrorTip::Suggestion(format!("Global `{}` already declared", global))
            }
            ErrorImpl::FunctionNotDeclared { function } => ErrorTip::Suggestion(format!(
                "Function `{}` must be declared before it is called",
                function
            )),
            ErrorImpl::FunctionAlreadyDefined { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", function))
            }
            ErrorImpl::FunctionSignatureMismatch { function } => ErrorTip::Suggestion(format!(
                "Function `{}` was previously declared with a different signature",
                function
            )),
            ErrorImpl::FunctionNotDefined { function } => ErrorTip::Suggestion(format!(
                "Function `{}` is declared but never defined",
                function
            )),
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidAssignmentTarget => ErrorTip::Suggestion(String::from(
                "Only variables can be assigned to",
            )),
            ErrorImpl::TooManySlots { kind, limit } => ErrorTip::Suggestion(format!(
                "A function may have at most {} {}",
                limit, kind
            )),
            ErrorImpl::InternalCompilerError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.get_error_name(), self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("global {global:?} already declared")]
    GlobalAlreadyDeclared { global: String },
    #[error("function {function:?} not declared")]
    FunctionNotDeclared { function: String },
    #[error("function {function:?} already defined")]
    FunctionAlreadyDefined { function: String },
    #[error("function {function:?} redeclared with a different signature")]
    FunctionSignatureMismatch { function: String },
    #[error("function {function:?} not defined")]
    FunctionNotDefined { function: String },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("too many {kind}: the limit is {limit}")]
    TooManySlots { kind: String, limit: usize },
    #[error("internal compiler error: {message}")]
    InternalCompilerError { message: String },
}
