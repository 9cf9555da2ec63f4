//! Intermediate representation between the syntax tree and the target.
//!
//! Expressions, statements and top-level declarations are trait objects
//! that know how to lower themselves into directly emittable forms and how
//! to emit instructions into a [`crate::compiler::scope::DeclarationScope`].
//!
//! - [`construct`] builds IR from the syntax tree
//! - [`expressions`] holds every expression variant and its lowering rules
//! - [`statements`] holds statement emission and control flow
//! - [`top_level`] holds functions, prototypes and globals

pub mod construct;
pub mod expressions;
pub mod ir;
pub mod statements;
pub mod top_level;
