//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for each compilation phase, including the
//!   fatal internal-consistency, linkage and duplicate-declaration faults
//! - Error naming and suggestion tips

pub mod errors;
