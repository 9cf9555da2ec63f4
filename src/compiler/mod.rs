//! Code generation module for the compiler.
//!
//! This module drives IR emission into the target model. It contains:
//!
//! - The per-artifact [`assembly::AssemblyContext`] owning globals, the
//!   function registry, the constant pool and the global initializer
//! - The per-function [`scope::DeclarationScope`] resolving identifiers
//! - The per-file [`translation_unit::TranslationUnitContext`]
//! - Assembly options supplied by the driver

pub mod assembly;
pub mod options;
pub mod scope;
pub mod translation_unit;

#[cfg(test)]
mod tests;
