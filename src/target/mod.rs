//! Model of the stack-based virtual machine's artifact.
//!
//! This is what the code generator writes into:
//!
//! - Primitive types, stack kinds and the type-system facade
//! - Metadata tables (types, fields, methods) addressed by handles
//! - The instruction set
//! - A textual listing of a finished assembly

pub mod instructions;
pub mod listing;
pub mod metadata;
pub mod types;
