//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a [`crate::ast::ast::TranslationUnit`]. It uses a Pratt parser for
//! expressions (and for type specifiers) with operator precedence and handles:
//!
//! - Top-level function definitions, prototypes and global variables
//! - Statement parsing (declarations, control flow, blocks)
//! - Expression parsing (binary ops, casts, calls, assignments, literals)
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
