use std::fmt::Display;

use super::{
    metadata::{FieldHandle, MethodHandle},
    types::PrimitiveType,
};

/// A branch target inside one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub usize);

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IL_{:04}", self.0)
    }
}

/// Instructions of the stack machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    LdcI4(i32),
    LdcI8(i64),
    LdcR8(f64),
    Ldarg(u16),
    Starg(u16),
    Ldloc(u16),
    Stloc(u16),
    Ldsfld(FieldHandle),
    Stsfld(FieldHandle),
    /// Pushes the address of a static field
    Ldsflda(FieldHandle),
    Add,
    Sub,
    Mul,
    Div,
    DivUn,
    Rem,
    RemUn,
    Neg,
    Not,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    ShrUn,
    Cgt,
    CgtUn,
    Clt,
    CltUn,
    Ceq,
    /// Converts the top of the stack; integer sources are sign-extended
    /// unless the target is `UInt64`
    Conv(PrimitiveType),
    /// Reinterprets an unsigned integer before a conversion to floating point
    ConvRUn,
    Call(MethodHandle),
    Ret,
    Pop,
    Dup,
    Br(Label),
    Brtrue(Label),
    Brfalse(Label),
    /// Pseudo-instruction marking where a label points
    MarkLabel(Label),
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::LdcI4(_) => "ldc.i4",
            Instruction::LdcI8(_) => "ldc.i8",
            Instruction::LdcR8(_) => "ldc.r8",
            Instruction::Ldarg(_) => "ldarg",
            Instruction::Starg(_) => "starg",
            Instruction::Ldloc(_) => "ldloc",
            Instruction::Stloc(_) => "stloc",
            Instruction::Ldsfld(_) => "ldsfld",
            Instruction::Stsfld(_) => "stsfld",
            Instruction::Ldsflda(_) => "ldsflda",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mul => "mul",
            Instruction::Div => "div",
            Instruction::DivUn => "div.un",
            Instruction::Rem => "rem",
            Instruction::RemUn => "rem.un",
            Instruction::Neg => "neg",
            Instruction::Not => "not",
            Instruction::And => "and",
            Instruction::Or => "or",
            Instruction::Xor => "xor",
            Instruction::Shl => "shl",
            Instruction::Shr => "shr",
            Instruction::ShrUn => "shr.un",
            Instruction::Cgt => "cgt",
            Instruction::CgtUn => "cgt.un",
            Instruction::Clt => "clt",
            Instruction::CltUn => "clt.un",
            Instruction::Ceq => "ceq",
            Instruction::Conv(primitive) => primitive.conv_mnemonic(),
            Instruction::ConvRUn => "conv.r.un",
            Instruction::Call(_) => "call",
            Instruction::Ret => "ret",
            Instruction::Pop => "pop",
            Instruction::Dup => "dup",
            Instruction::Br(_) => "br",
            Instruction::Brtrue(_) => "brtrue",
            Instruction::Brfalse(_) => "brfalse",
            Instruction::MarkLabel(_) => "",
        }
    }

    /// True for instructions after which control never falls through.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Ret | Instruction::Br(_))
    }
}
