//! Type specifiers as written in C source.
//!
//! These are purely syntactic; [`crate::target::types::TypeSystem`] maps them
//! onto the target machine's primitive types.

use std::fmt::Display;

/// The arithmetic or `void` part of a type specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Void,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
}

impl Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BaseType::Void => "void",
            BaseType::Char => "char",
            BaseType::UnsignedChar => "unsigned char",
            BaseType::Short => "short",
            BaseType::UnsignedShort => "unsigned short",
            BaseType::Int => "int",
            BaseType::UnsignedInt => "unsigned int",
            BaseType::Long => "long",
            BaseType::UnsignedLong => "unsigned long",
            BaseType::Float => "float",
            BaseType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

/// A base type followed by zero or more `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    pub base: BaseType,
    pub pointer_depth: u8,
}

impl TypeSpec {
    pub fn new(base: BaseType) -> Self {
        TypeSpec {
            base,
            pointer_depth: 0,
        }
    }

    pub fn pointer_to(self) -> Self {
        TypeSpec {
            base: self.base,
            pointer_depth: self.pointer_depth + 1,
        }
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseType::Void && self.pointer_depth == 0
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.base, "*".repeat(self.pointer_depth as usize))
    }
}
