//! Integration tests for end-to-end compilation.
//!
//! These tests run the complete pipeline from source text through the lexer,
//! parser, IR construction and emission, then inspect the finished artifact or
//! execute it with the interpreter in `common`.

mod common;

use ccil::{
    compiler::options::AssemblyOptions,
    target::{
        instructions::Instruction,
        metadata::{Assembly, AssemblyKind, TargetFramework},
        types::PrimitiveType,
    },
    compile_sources,
};
use common::{compile_library, compile_one, Machine};

fn instructions_of(assembly: &Assembly, name: &str) -> Vec<Instruction> {
    let method = assembly.find_method(name).unwrap();
    assembly.module.get_method(method).body.as_ref().unwrap().instructions.clone()
}

#[test]
fn test_greater_or_equal_emits_lowered_sequence() {
    let assembly = compile_one("int f(int a){ return a>=3; }");

    assert_eq!(
        instructions_of(&assembly, "f"),
        vec![
            Instruction::Ldarg(0),
            Instruction::LdcI4(3),
            Instruction::Clt,
            Instruction::LdcI4(0),
            Instruction::Ceq,
            Instruction::Ret,
        ]
    );
}

#[test]
fn test_not_equal_and_less_or_equal_sequences() {
    let assembly = compile_one("int ne(int a, int b) { return a != b; } int le(int a, int b) { return a <= b; }");

    assert_eq!(
        instructions_of(&assembly, "ne"),
        vec![
            Instruction::Ldarg(0),
            Instruction::Ldarg(1),
            Instruction::Ceq,
            Instruction::LdcI4(0),
            Instruction::Ceq,
            Instruction::Ret,
        ]
    );
    assert_eq!(
        instructions_of(&assembly, "le"),
        vec![
            Instruction::Ldarg(0),
            Instruction::Ldarg(1),
            Instruction::Cgt,
            Instruction::LdcI4(0),
            Instruction::Ceq,
            Instruction::Ret,
        ]
    );
}

#[test]
fn test_return_conversions() {
    let assembly = compile_one("long widen(int a) { return a; } char narrow(int a) { return a; }");

    assert_eq!(
        instructions_of(&assembly, "widen"),
        vec![
            Instruction::Ldarg(0),
            Instruction::Conv(PrimitiveType::Int64),
            Instruction::Ret,
        ]
    );
    assert_eq!(
        instructions_of(&assembly, "narrow"),
        vec![
            Instruction::Ldarg(0),
            Instruction::Conv(PrimitiveType::SByte),
            Instruction::Ret,
        ]
    );
    assert_eq!(Machine::new(&assembly).call("narrow", &[300]), Some(44));
}

#[test]
fn test_unsigned_operands_select_unsigned_instructions() {
    let assembly = compile_one(
        "int gt(unsigned a, unsigned b) { return a > b; }
        long widen(unsigned a) { return a; }
        unsigned div(unsigned a, unsigned b) { return a / b; }",
    );

    assert_eq!(
        instructions_of(&assembly, "gt"),
        vec![Instruction::Ldarg(0), Instruction::Ldarg(1), Instruction::CgtUn, Instruction::Ret]
    );
    assert_eq!(
        instructions_of(&assembly, "widen"),
        vec![
            Instruction::Ldarg(0),
            Instruction::Conv(PrimitiveType::UInt64),
            Instruction::Ret,
        ]
    );
    assert_eq!(
        instructions_of(&assembly, "div"),
        vec![Instruction::Ldarg(0), Instruction::Ldarg(1), Instruction::DivUn, Instruction::Ret]
    );

    let mut machine = Machine::new(&assembly);
    assert_eq!(machine.call("gt", &[4_000_000_000, 1]), Some(1));
    assert_eq!(machine.call("widen", &[0xFFFF_FFFF]), Some(4_294_967_295));
    assert_eq!(machine.call("div", &[4_000_000_000, 2]), Some(2_000_000_000));

    let listing = assembly.to_string();
    assert!(listing.contains("cgt.un"));
    assert!(listing.contains("conv.u8"));
    assert!(listing.contains("div.un"));
}

#[test]
fn test_int_arithmetic_wraps_at_32_bits() {
    let assembly = compile_one(
        "int inc(int a) { return a + 1; }
        int twice(int a) { return a * 2; }
        long widen_sum(int a) { long b = a + 1; return b; }",
    );
    let mut machine = Machine::new(&assembly);

    assert_eq!(machine.call("inc", &[i32::MAX as i64]), Some(i32::MIN as i64));
    assert_eq!(machine.call("twice", &[0x4000_0000]), Some(i32::MIN as i64));
    // The sum wraps as an int before it is widened
    assert_eq!(machine.call("widen_sum", &[i32::MAX as i64]), Some(i32::MIN as i64));
}

#[test]
fn test_signed_values_widen_with_sign() {
    let assembly = compile_one(
        "long widen(int a) { return a; }
        int less(int a, long b) { return a < b; }",
    );
    let mut machine = Machine::new(&assembly);

    assert_eq!(machine.call("widen", &[-1]), Some(-1));
    assert_eq!(machine.call("less", &[-1, 0]), Some(1));
}

#[test]
fn test_default_return_appended() {
    let assembly = compile_one("int nothing(void) { } void empty(void) { }");

    assert_eq!(
        instructions_of(&assembly, "nothing"),
        vec![Instruction::LdcI4(0), Instruction::Ret]
    );
    assert_eq!(instructions_of(&assembly, "empty"), vec![Instruction::Ret]);
}

#[test]
fn test_loops_execute() {
    let assembly = compile_one(
        "int fact(int n) {
            int r = 1;
            while (n > 1) {
                r *= n;
                n -= 1;
            }
            return r;
        }

        int sum(int n) {
            int s = 0;
            for (int i = 0; i <= n; i += 1)
                s += i;
            return s;
        }",
    );
    let mut machine = Machine::new(&assembly);

    assert_eq!(machine.call("fact", &[5]), Some(120));
    assert_eq!(machine.call("fact", &[0]), Some(1));
    assert_eq!(machine.call("sum", &[10]), Some(55));
}

#[test]
fn test_branches_execute() {
    let assembly = compile_one(
        "int sign(int x) {
            if (x < 0)
                return -1;
            else if (x == 0)
                return 0;
            return 1;
        }

        int not(int x) { return !x; }",
    );
    let mut machine = Machine::new(&assembly);

    assert_eq!(machine.call("sign", &[-7]), Some(-1));
    assert_eq!(machine.call("sign", &[0]), Some(0));
    assert_eq!(machine.call("sign", &[9]), Some(1));
    assert_eq!(machine.call("not", &[0]), Some(1));
    assert_eq!(machine.call("not", &[5]), Some(0));
}

#[test]
fn test_recursion() {
    let assembly = compile_one("int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }");

    assert_eq!(Machine::new(&assembly).call("fib", &[10]), Some(55));
}

#[test]
fn test_globals_initialized_in_order() {
    let assembly = compile_one(
        "int base = 40;
        int offset = 2;
        int total = base + offset;
        int untouched;
        int get(void) { return total; }",
    );
    let mut machine = Machine::new(&assembly);

    assert_eq!(machine.global("total"), 42);
    assert_eq!(machine.global("untouched"), 0);
    assert_eq!(machine.call("get", &[]), Some(42));
}

#[test]
fn test_void_function_updates_global() {
    let assembly = compile_one(
        "int counter;
        void bump(void) { counter += 1; }
        int run(void) { bump(); bump(); return counter; }",
    );

    assert_eq!(Machine::new(&assembly).call("run", &[]), Some(2));
}

#[test]
fn test_calls_link_across_translation_units() {
    let assembly = compile_library(&[
        ("quad.c", "int twice(int x); int quad(int x) { return twice(twice(x)); }"),
        ("twice.c", "int twice(int x) { return x * 2; }"),
    ])
    .unwrap();

    assert_eq!(Machine::new(&assembly).call("quad", &[3]), Some(12));
}

#[test]
fn test_undefined_function_fails_linkage() {
    let error = compile_library(&[(
        "main.c",
        "int helper(int x); int f(int a) { return helper(a); }",
    )])
    .unwrap_err();

    assert_eq!(error.get_error_name(), "FunctionNotDefined");
    assert!(error.to_string().contains("helper"));
}

#[test]
fn test_duplicate_global_across_units() {
    let error = compile_library(&[("a.c", "int shared = 1;"), ("b.c", "int shared = 2;")]).unwrap_err();

    assert_eq!(error.get_error_name(), "GlobalAlreadyDeclared");
}

#[test]
fn test_string_constants_pooled_across_units() {
    let assembly = compile_library(&[
        ("a.c", "int a(void) { char* s = \"hi\"; return 0; }"),
        ("b.c", "int b(void) { char* s = \"hi\"; char* t = \"other\"; return 0; }"),
    ])
    .unwrap();

    let pooled = |name: &str| {
        instructions_of(&assembly, name)
            .into_iter()
            .filter_map(|instruction| match instruction {
                Instruction::Ldsflda(field) => Some(field),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    let from_a = pooled("a");
    let from_b = pooled("b");
    assert_eq!(from_a.len(), 1);
    assert_eq!(from_b.len(), 2);
    assert_eq!(from_a[0], from_b[0]);
    assert_ne!(from_b[0], from_b[1]);

    let field = assembly.module.get_field(from_a[0]);
    assert_eq!(field.initial_value, Some(b"hi\0".to_vec()));
}

#[test]
fn test_initializer_sealed_once() {
    let assembly = compile_library(&[("a.c", "int x = 1;"), ("b.c", "int y = 2;")]).unwrap();

    let initializer = instructions_of(&assembly, ".cctor");
    assert_eq!(
        initializer
            .iter()
            .filter(|instruction| **instruction == Instruction::Ret)
            .count(),
        1
    );
    assert_eq!(initializer.last(), Some(&Instruction::Ret));
}

#[test]
fn test_front_end_errors_propagate() {
    let error = compile_library(&[("bad.c", "int f(void) { return 1 }")]).unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");

    let error = compile_library(&[("bad.c", "int f(void) { return missing; }")]).unwrap_err();
    assert_eq!(error.get_error_name(), "VariableNotDeclared");

    let error = compile_library(&[("bad.c", "int f(void) { return g(); }")]).unwrap_err();
    assert_eq!(error.get_error_name(), "FunctionNotDeclared");
}

#[test]
fn test_executable_listing() {
    let mut options = AssemblyOptions::new("hello", AssemblyKind::Executable);
    options.namespace = Some(String::from("Demo"));
    options.global_type_name = Some(String::from("Program"));
    options.target_framework = Some(TargetFramework {
        name: String::from("Microsoft.NETCore.App"),
        version: String::from("8.0.0"),
    });

    let assembly = compile_sources(&options, &[("main.c", "int main(void) { return 0; }")]).unwrap();
    let listing = assembly.to_string();

    assert!(assembly.entry_point.is_some());
    assert!(listing.contains(".assembly hello"));
    assert!(listing.contains(".module hello.exe"));
    assert!(listing.contains("Demo.Program"));
    assert!(listing.contains(".entrypoint"));
}
