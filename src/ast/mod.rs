/// AST (Abstract Syntax Tree) module
/// Contains the syntax tree produced by the parser and consumed by IR construction
///
/// Submodules:
/// - ast: Top-level declarations and the translation unit
/// - expressions: Expression nodes and operator kinds
/// - statements: Statement nodes and local declarations
/// - types: C type specifiers as written in the source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
