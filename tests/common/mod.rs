//! A small interpreter for emitted instruction sequences.
//!
//! Stack slots carry their stack kind: 32-bit integers wrap at 32 bits,
//! 64-bit integers and native ints share `I64`, and both float types share
//! `F64`. Addresses from `ldsflda` are the field index.

#![allow(dead_code)]

use std::collections::HashMap;

use ccil::{
    compile_sources,
    compiler::{assembly::GLOBAL_INITIALIZER_NAME, options::AssemblyOptions},
    errors::errors::Error,
    target::{
        instructions::{Instruction, Label},
        metadata::{Assembly, AssemblyKind, FieldHandle, MethodHandle},
        types::{PrimitiveType, StackKind, TypeRef},
    },
};

pub fn compile_library(sources: &[(&str, &str)]) -> Result<Assembly, Error> {
    compile_sources(&AssemblyOptions::new("test", AssemblyKind::Library), sources)
}

pub fn compile_one(source: &str) -> Assembly {
    compile_library(&[("test.c", source)]).unwrap()
}

/// A value on the evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Value {
    fn zero(value_type: &TypeRef) -> Value {
        match value_type.stack_kind() {
            StackKind::Int32 => Value::I32(0),
            StackKind::Float => Value::F64(0.0),
            _ => Value::I64(0),
        }
    }

    /// Places a host integer into a slot of `value_type`, keeping its bit pattern.
    fn from_i64(value: i64, value_type: &TypeRef) -> Value {
        match value_type.stack_kind() {
            StackKind::Int32 => Value::I32(value as i32),
            StackKind::Float => Value::F64(value as f64),
            _ => Value::I64(value),
        }
    }

    /// Reads a slot of `value_type` back as a host integer.
    fn to_i64(self, value_type: &TypeRef) -> i64 {
        match self {
            Value::I32(value) if value_type.is_unsigned() => value as u32 as i64,
            Value::I32(value) => value as i64,
            Value::I64(value) => value,
            Value::F64(value) => value as i64,
        }
    }

    fn is_true(self) -> bool {
        match self {
            Value::I32(value) => value != 0,
            Value::I64(value) => value != 0,
            Value::F64(value) => value != 0.0,
        }
    }
}

/// Runs a straight-line sequence with no calls or statics and returns the
/// value left on top of the stack.
pub fn evaluate(instructions: &[Instruction], arguments: &[Value]) -> Value {
    let mut machine = Machine {
        assembly: None,
        statics: HashMap::new(),
    };
    machine
        .execute(instructions, arguments.to_vec(), vec![])
        .expect("sequence left no value")
}

pub struct Machine<'a> {
    assembly: Option<&'a Assembly>,
    statics: HashMap<FieldHandle, Value>,
}

impl<'a> Machine<'a> {
    /// Loads `assembly`, running its global initializer if it has one.
    pub fn new(assembly: &'a Assembly) -> Self {
        let mut machine = Machine {
            assembly: Some(assembly),
            statics: HashMap::new(),
        };
        if let Some(initializer) = assembly.find_method(GLOBAL_INITIALIZER_NAME) {
            machine.invoke(initializer, vec![]);
        }
        machine
    }

    /// Calls `name` with arguments placed into its parameter types and reads
    /// the result back according to the return type.
    pub fn call(&mut self, name: &str, arguments: &[i64]) -> Option<i64> {
        let assembly = self.assembly.expect("no assembly loaded");
        let method = assembly
            .find_method(name)
            .unwrap_or_else(|| panic!("no method {}", name));
        let signature = &assembly.module.get_method(method).signature;
        assert_eq!(signature.parameters.len(), arguments.len(), "arity of {}", name);

        let arguments = arguments
            .iter()
            .zip(&signature.parameters)
            .map(|(value, parameter_type)| Value::from_i64(*value, parameter_type))
            .collect();
        self.invoke(method, arguments)
            .map(|result| result.to_i64(&signature.return_type))
    }

    pub fn global(&self, name: &str) -> i64 {
        let assembly = self.assembly.expect("no assembly loaded");
        let index = assembly
            .module
            .fields
            .iter()
            .position(|field| field.name == name)
            .unwrap_or_else(|| panic!("no field {}", name));
        let field_type = &assembly.module.fields[index].field_type;
        self.load_static(FieldHandle(index)).to_i64(field_type)
    }

    fn load_static(&self, field: FieldHandle) -> Value {
        match (self.statics.get(&field), self.assembly) {
            (Some(value), _) => *value,
            (None, Some(assembly)) => Value::zero(&assembly.module.get_field(field).field_type),
            (None, None) => panic!("static access without an assembly"),
        }
    }

    fn invoke(&mut self, method: MethodHandle, arguments: Vec<Value>) -> Option<Value> {
        let assembly = self.assembly.expect("no assembly loaded");
        let definition = assembly.module.get_method(method);
        let body = definition
            .body
            .as_ref()
            .unwrap_or_else(|| panic!("{} has no body", definition.name));

        let locals = body.locals.iter().map(Value::zero).collect();
        let result = self.execute(&body.instructions, arguments, locals);
        if definition.signature.return_type.is_void() {
            None
        } else {
            result
        }
    }

    fn execute(&mut self, instructions: &[Instruction], mut arguments: Vec<Value>, mut locals: Vec<Value>) -> Option<Value> {
        let labels: HashMap<Label, usize> = instructions
            .iter()
            .enumerate()
            .filter_map(|(index, instruction)| match instruction {
                Instruction::MarkLabel(label) => Some((*label, index)),
                _ => None,
            })
            .collect();

        let mut stack: Vec<Value> = vec![];
        let mut pc = 0;

        macro_rules! pop {
            () => {
                stack.pop().expect("stack underflow")
            };
        }
        macro_rules! integer {
            ($int32:expr, $int64:expr) => {{
                let right = pop!();
                let left = pop!();
                stack.push(integer_op(left, right, $int32, $int64));
            }};
        }
        macro_rules! numeric {
            ($int32:expr, $int64:expr, $float:expr) => {{
                let right = pop!();
                let left = pop!();
                let result = match (left, right) {
                    (Value::F64(l), Value::F64(r)) => Value::F64($float(l, r)),
                    (left, right) => integer_op(left, right, $int32, $int64),
                };
                stack.push(result);
            }};
        }
        macro_rules! compare {
            ($int32:expr, $int64:expr, $float:expr) => {{
                let right = pop!();
                let left = pop!();
                let result = match (left, right) {
                    (Value::I32(l), Value::I32(r)) => $int32(l, r),
                    (Value::F64(l), Value::F64(r)) => $float(l, r),
                    (left, right) => $int64(widen(left), widen(right)),
                };
                stack.push(Value::I32(result as i32));
            }};
        }

        while pc < instructions.len() {
            let instruction = &instructions[pc];
            pc += 1;

            match instruction {
                Instruction::MarkLabel(_) => {}
                Instruction::LdcI4(value) => stack.push(Value::I32(*value)),
                Instruction::LdcI8(value) => stack.push(Value::I64(*value)),
                Instruction::LdcR8(value) => stack.push(Value::F64(*value)),
                Instruction::Ldarg(index) => stack.push(arguments[*index as usize]),
                Instruction::Starg(index) => arguments[*index as usize] = pop!(),
                Instruction::Ldloc(index) => stack.push(locals[*index as usize]),
                Instruction::Stloc(index) => locals[*index as usize] = pop!(),
                Instruction::Ldsfld(field) => stack.push(self.load_static(*field)),
                Instruction::Stsfld(field) => {
                    let value = pop!();
                    self.statics.insert(*field, value);
                }
                Instruction::Ldsflda(field) => stack.push(Value::I64(field.0 as i64)),
                Instruction::Add => numeric!(i32::wrapping_add, i64::wrapping_add, |l: f64, r: f64| l + r),
                Instruction::Sub => numeric!(i32::wrapping_sub, i64::wrapping_sub, |l: f64, r: f64| l - r),
                Instruction::Mul => numeric!(i32::wrapping_mul, i64::wrapping_mul, |l: f64, r: f64| l * r),
                Instruction::Div => numeric!(i32::wrapping_div, i64::wrapping_div, |l: f64, r: f64| l / r),
                Instruction::Rem => numeric!(i32::wrapping_rem, i64::wrapping_rem, |l: f64, r: f64| l % r),
                Instruction::DivUn => integer!(
                    |l: i32, r: i32| ((l as u32) / (r as u32)) as i32,
                    |l: i64, r: i64| ((l as u64) / (r as u64)) as i64
                ),
                Instruction::RemUn => integer!(
                    |l: i32, r: i32| ((l as u32) % (r as u32)) as i32,
                    |l: i64, r: i64| ((l as u64) % (r as u64)) as i64
                ),
                Instruction::And => integer!(|l: i32, r: i32| l & r, |l: i64, r: i64| l & r),
                Instruction::Or => integer!(|l: i32, r: i32| l | r, |l: i64, r: i64| l | r),
                Instruction::Xor => integer!(|l: i32, r: i32| l ^ r, |l: i64, r: i64| l ^ r),
                Instruction::Shl | Instruction::Shr | Instruction::ShrUn => {
                    let amount = match pop!() {
                        Value::I32(amount) => amount as u32,
                        other => panic!("shift amount {:?} is not int32", other),
                    };
                    let result = match (instruction, pop!()) {
                        (Instruction::Shl, Value::I32(value)) => Value::I32(value.wrapping_shl(amount)),
                        (Instruction::Shl, Value::I64(value)) => Value::I64(value.wrapping_shl(amount)),
                        (Instruction::Shr, Value::I32(value)) => Value::I32(value.wrapping_shr(amount)),
                        (Instruction::Shr, Value::I64(value)) => Value::I64(value.wrapping_shr(amount)),
                        (_, Value::I32(value)) => Value::I32((value as u32).wrapping_shr(amount) as i32),
                        (_, Value::I64(value)) => Value::I64((value as u64).wrapping_shr(amount) as i64),
                        (_, value) => panic!("cannot shift {:?}", value),
                    };
                    stack.push(result);
                }
                Instruction::Cgt => compare!(|l: i32, r: i32| l > r, |l: i64, r: i64| l > r, |l: f64, r: f64| l > r),
                Instruction::Clt => compare!(|l: i32, r: i32| l < r, |l: i64, r: i64| l < r, |l: f64, r: f64| l < r),
                Instruction::Ceq => compare!(|l: i32, r: i32| l == r, |l: i64, r: i64| l == r, |l: f64, r: f64| l == r),
                Instruction::CgtUn => compare!(
                    |l: i32, r: i32| (l as u32) > (r as u32),
                    |l: i64, r: i64| (l as u64) > (r as u64),
                    |l: f64, r: f64| !(l <= r)
                ),
                Instruction::CltUn => compare!(
                    |l: i32, r: i32| (l as u32) < (r as u32),
                    |l: i64, r: i64| (l as u64) < (r as u64),
                    |l: f64, r: f64| !(l >= r)
                ),
                Instruction::Neg => {
                    let result = match pop!() {
                        Value::I32(value) => Value::I32(value.wrapping_neg()),
                        Value::I64(value) => Value::I64(value.wrapping_neg()),
                        Value::F64(value) => Value::F64(-value),
                    };
                    stack.push(result);
                }
                Instruction::Not => {
                    let result = match pop!() {
                        Value::I32(value) => Value::I32(!value),
                        Value::I64(value) => Value::I64(!value),
                        Value::F64(value) => panic!("cannot complement {}", value),
                    };
                    stack.push(result);
                }
                Instruction::Conv(target) => {
                    let value = pop!();
                    stack.push(convert(value, *target));
                }
                Instruction::ConvRUn => {
                    let result = match pop!() {
                        Value::I32(value) => Value::F64(value as u32 as f64),
                        Value::I64(value) => Value::F64(value as u64 as f64),
                        value => value,
                    };
                    stack.push(result);
                }
                Instruction::Call(method) => {
                    let assembly = self.assembly.expect("call without an assembly");
                    let count = assembly.module.get_method(*method).signature.parameters.len();
                    let call_arguments = stack.split_off(stack.len() - count);
                    if let Some(result) = self.invoke(*method, call_arguments) {
                        stack.push(result);
                    }
                }
                Instruction::Ret => return stack.pop(),
                Instruction::Pop => {
                    pop!();
                }
                Instruction::Dup => {
                    let value = pop!();
                    stack.push(value);
                    stack.push(value);
                }
                Instruction::Br(label) => pc = labels[label],
                Instruction::Brtrue(label) => {
                    if pop!().is_true() {
                        pc = labels[label];
                    }
                }
                Instruction::Brfalse(label) => {
                    if !pop!().is_true() {
                        pc = labels[label];
                    }
                }
            }
        }

        stack.pop()
    }
}

/// Sign-extends an int32 operand the way native-int arithmetic sees it.
fn widen(value: Value) -> i64 {
    match value {
        Value::I32(value) => value as i64,
        Value::I64(value) => value,
        Value::F64(value) => panic!("float {} mixed with an integer", value),
    }
}

fn integer_op(left: Value, right: Value, int32: impl Fn(i32, i32) -> i32, int64: impl Fn(i64, i64) -> i64) -> Value {
    match (left, right) {
        (Value::I32(l), Value::I32(r)) => Value::I32(int32(l, r)),
        (left, right) => Value::I64(int64(widen(left), widen(right))),
    }
}

/// `conv.*`: integer sources are sign-extended except into `UInt64`, which
/// zero-extends, and narrow targets truncate back into an int32 slot.
fn convert(value: Value, target: PrimitiveType) -> Value {
    let narrow = |value: i32| match target {
        PrimitiveType::SByte => value as i8 as i32,
        PrimitiveType::Boolean | PrimitiveType::Byte => value as u8 as i32,
        PrimitiveType::Int16 => value as i16 as i32,
        PrimitiveType::UInt16 => value as u16 as i32,
        _ => value,
    };

    match (value, target.stack_kind()) {
        (Value::I32(value), StackKind::Int32) => Value::I32(narrow(value)),
        (Value::I64(value), StackKind::Int32) => Value::I32(narrow(value as i32)),
        (Value::F64(value), StackKind::Int32) if target.is_unsigned() => Value::I32(narrow(value as u32 as i32)),
        (Value::F64(value), StackKind::Int32) => Value::I32(narrow(value as i32)),

        (Value::I32(value), _) if target == PrimitiveType::UInt64 => Value::I64(value as u32 as i64),
        (Value::F64(value), _) if target == PrimitiveType::UInt64 => Value::I64(value as u64 as i64),
        (Value::F64(value), StackKind::Int64 | StackKind::Pointer) => Value::I64(value as i64),
        (value, StackKind::Int64 | StackKind::Pointer) => Value::I64(widen(value)),

        (Value::F64(value), _) if target == PrimitiveType::Single => Value::F64(value as f32 as f64),
        (Value::F64(value), _) => Value::F64(value),
        (value, _) if target == PrimitiveType::Single => Value::F64(widen(value) as f32 as f64),
        (value, _) => Value::F64(widen(value) as f64),
    }
}
