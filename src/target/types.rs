//! Primitive types of the target machine and the type-system facade.
//!
//! The facade is the only place that knows how C type specifiers map onto
//! machine types and how the evaluation stack widens values.

use std::fmt::Display;

use crate::ast::types::{BaseType, TypeSpec};

use super::{instructions::Instruction, metadata::TypeHandle};

/// Built-in types of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    IntPtr,
}

/// How a value is represented once it is on the evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Void,
    Int32,
    Int64,
    Float,
    Pointer,
    Value,
}

impl PrimitiveType {
    /// Storage size in bytes. `IntPtr` is assumed to be 64-bit.
    pub fn size(&self) -> u32 {
        match self {
            PrimitiveType::Void => 0,
            PrimitiveType::Boolean | PrimitiveType::SByte | PrimitiveType::Byte => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Single => 4,
            PrimitiveType::Int64
            | PrimitiveType::UInt64
            | PrimitiveType::Double
            | PrimitiveType::IntPtr => 8,
        }
    }

    pub fn stack_kind(&self) -> StackKind {
        match self {
            PrimitiveType::Void => StackKind::Void,
            PrimitiveType::Boolean
            | PrimitiveType::SByte
            | PrimitiveType::Byte
            | PrimitiveType::Int16
            | PrimitiveType::UInt16
            | PrimitiveType::Int32
            | PrimitiveType::UInt32 => StackKind::Int32,
            PrimitiveType::Int64 | PrimitiveType::UInt64 => StackKind::Int64,
            PrimitiveType::Single | PrimitiveType::Double => StackKind::Float,
            PrimitiveType::IntPtr => StackKind::Pointer,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.stack_kind(), StackKind::Int32 | StackKind::Int64)
    }

    pub fn is_floating(&self) -> bool {
        self.stack_kind() == StackKind::Float
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte | PrimitiveType::UInt16 | PrimitiveType::UInt32 | PrimitiveType::UInt64
        )
    }

    /// The `conv` instruction producing this type.
    pub fn conv_mnemonic(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "conv",
            PrimitiveType::Boolean | PrimitiveType::Byte => "conv.u1",
            PrimitiveType::SByte => "conv.i1",
            PrimitiveType::Int16 => "conv.i2",
            PrimitiveType::UInt16 => "conv.u2",
            PrimitiveType::Int32 => "conv.i4",
            PrimitiveType::UInt32 => "conv.u4",
            PrimitiveType::Int64 => "conv.i8",
            PrimitiveType::UInt64 => "conv.u8",
            PrimitiveType::Single => "conv.r4",
            PrimitiveType::Double => "conv.r8",
            PrimitiveType::IntPtr => "conv.i",
        }
    }

    /// Assembler spelling of the type.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Boolean => "bool",
            PrimitiveType::SByte => "int8",
            PrimitiveType::Byte => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Single => "float32",
            PrimitiveType::Double => "float64",
            PrimitiveType::IntPtr => "native int",
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A reference to any type the target can describe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Pointer(Box<TypeRef>),
    /// A type defined in the module being built
    Defined(TypeHandle),
}

impl TypeRef {
    pub fn pointer_to(self) -> TypeRef {
        TypeRef::Pointer(Box::new(self))
    }

    pub fn is_void(&self) -> bool {
        *self == TypeRef::Primitive(PrimitiveType::Void)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    /// Unsigned integers and pointers compare and divide without a sign.
    pub fn is_unsigned(&self) -> bool {
        match self {
            TypeRef::Primitive(primitive) => primitive.is_unsigned(),
            TypeRef::Pointer(_) => true,
            TypeRef::Defined(_) => false,
        }
    }

    pub fn stack_kind(&self) -> StackKind {
        match self {
            TypeRef::Primitive(primitive) => primitive.stack_kind(),
            TypeRef::Pointer(_) => StackKind::Pointer,
            TypeRef::Defined(_) => StackKind::Value,
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Primitive(primitive) => write!(f, "{}", primitive),
            TypeRef::Pointer(pointee) => write!(f, "{}*", pointee),
            TypeRef::Defined(handle) => write!(f, "type#{}", handle.0),
        }
    }
}

/// Read-only view of the machine's built-in types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeSystem;

impl TypeSystem {
    pub fn void(&self) -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Void)
    }

    pub fn boolean(&self) -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Boolean)
    }

    pub fn int32(&self) -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Int32)
    }

    pub fn int64(&self) -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Int64)
    }

    pub fn double(&self) -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Double)
    }

    /// Maps a C type specifier onto a machine type.
    pub fn resolve(&self, type_spec: &TypeSpec) -> TypeRef {
        let primitive = match type_spec.base {
            BaseType::Void => PrimitiveType::Void,
            BaseType::Char => PrimitiveType::SByte,
            BaseType::UnsignedChar => PrimitiveType::Byte,
            BaseType::Short => PrimitiveType::Int16,
            BaseType::UnsignedShort => PrimitiveType::UInt16,
            BaseType::Int => PrimitiveType::Int32,
            BaseType::UnsignedInt => PrimitiveType::UInt32,
            BaseType::Long => PrimitiveType::Int64,
            BaseType::UnsignedLong => PrimitiveType::UInt64,
            BaseType::Float => PrimitiveType::Single,
            BaseType::Double => PrimitiveType::Double,
        };

        (0..type_spec.pointer_depth).fold(TypeRef::Primitive(primitive), |inner, _| {
            inner.pointer_to()
        })
    }

    /// Result type of a binary arithmetic operator after the usual promotions.
    ///
    /// Returns `None` when either operand is not numeric.
    pub fn arithmetic_result(&self, left: &TypeRef, right: &TypeRef) -> Option<TypeRef> {
        let left = left.as_primitive().filter(PrimitiveType::is_numeric)?;
        let right = right.as_primitive().filter(PrimitiveType::is_numeric)?;

        let result = if left == PrimitiveType::Double || right == PrimitiveType::Double {
            PrimitiveType::Double
        } else if left == PrimitiveType::Single || right == PrimitiveType::Single {
            PrimitiveType::Single
        } else if left.stack_kind() == StackKind::Int64 || right.stack_kind() == StackKind::Int64 {
            if left == PrimitiveType::UInt64 || right == PrimitiveType::UInt64 {
                PrimitiveType::UInt64
            } else {
                PrimitiveType::Int64
            }
        } else if left == PrimitiveType::UInt32 || right == PrimitiveType::UInt32 {
            PrimitiveType::UInt32
        } else {
            PrimitiveType::Int32
        };

        Some(TypeRef::Primitive(result))
    }

    /// The instructions needed to turn a `from` value on the stack into `to`.
    ///
    /// Implicit conversions only convert when the stack representation changes
    /// or the destination is narrower than 32 bits. Explicit casts convert
    /// between any two distinct numeric types.
    pub fn conversion(&self, from: &TypeRef, to: &TypeRef, explicit: bool) -> Vec<Instruction> {
        if from == to || to.is_void() {
            return vec![];
        }

        let target = match to {
            TypeRef::Primitive(primitive) => *primitive,
            TypeRef::Pointer(_) => PrimitiveType::IntPtr,
            TypeRef::Defined(_) => return vec![],
        };
        let source = from.as_primitive();

        let numeric_change = source.is_some_and(|p| p.is_numeric()) && target.is_numeric();
        let narrow = target != PrimitiveType::Boolean && target.size() < 4;

        if from.stack_kind() != to.stack_kind() || (explicit && numeric_change) || narrow {
            return self.convert_to(source, target);
        }

        vec![]
    }

    /// Picks the `conv` family by the signedness of the source.
    fn convert_to(&self, source: Option<PrimitiveType>, target: PrimitiveType) -> Vec<Instruction> {
        let unsigned_source = source.is_some_and(|p| p.is_unsigned());

        if unsigned_source && target.is_floating() {
            return vec![Instruction::ConvRUn, Instruction::Conv(target)];
        }

        // Widening a 32-bit integer: the source decides zero or sign extension
        let widening = source.is_some_and(|p| p.stack_kind() == StackKind::Int32);
        if widening && target.stack_kind() == StackKind::Int64 {
            let extended = if unsigned_source {
                PrimitiveType::UInt64
            } else {
                PrimitiveType::Int64
            };
            return vec![Instruction::Conv(extended)];
        }

        vec![Instruction::Conv(target)]
    }
}
