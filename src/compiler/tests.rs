use crate::{
    compile_translation_unit,
    errors::errors::Error,
    target::{
        instructions::Instruction,
        metadata::{AssemblyKind, MethodBody, MethodSignature, Module},
        types::{PrimitiveType, TypeRef},
    },
    Position,
};

use super::{
    assembly::{AssemblyContext, GLOBAL_INITIALIZER_NAME},
    options::AssemblyOptions,
    scope::{DeclarationScope, ParameterInfo, Storage, MAX_SLOTS},
};

fn int32() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Int32)
}

fn library() -> AssemblyContext {
    AssemblyContext::create(&AssemblyOptions::new("test", AssemblyKind::Library))
}

fn int_function() -> MethodSignature {
    MethodSignature {
        return_type: int32(),
        parameters: vec![int32()],
    }
}

fn emit_source(context: &mut AssemblyContext, source: &str) -> Result<(), Error> {
    compile_translation_unit(context, source, "test.c")
}

#[test]
fn test_create_without_global_type_uses_module_type() {
    let context = library();

    assert_eq!(context.global_type(), context.module().module_type());
    assert_eq!(
        context.module().get_type(context.global_type()).name,
        Module::MODULE_TYPE_NAME
    );
    assert_eq!(context.module().name, "test.dll");
}

#[test]
fn test_create_with_named_global_type() {
    let mut options = AssemblyOptions::new("app", AssemblyKind::Executable);
    options.namespace = Some(String::from("Demo"));
    options.global_type_name = Some(String::from("Globals"));
    let context = AssemblyContext::create(&options);

    let global_type = context.module().get_type(context.global_type());
    assert!(global_type.is_sealed);
    assert!(global_type.is_abstract);
    assert_eq!(context.module().qualified_type_name(context.global_type()), "Demo.Globals");
    assert_eq!(context.module().name, "app.exe");
}

#[test]
fn test_constant_pool_deduplicates_by_content() {
    let mut context = library();

    let first = context.get_constant_pool_reference("hello");
    let second = context.get_constant_pool_reference("hello");
    let other = context.get_constant_pool_reference("world");

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_constant_pool_field_layout() {
    let mut context = library();

    let field = context.get_constant_pool_reference("hi");
    let module = context.module();
    let definition = module.get_field(field);

    assert!(definition.is_static);
    assert!(definition.is_init_only);
    assert_eq!(definition.initial_value, Some(vec![b'h', b'i', 0]));

    // The stub type is a value type exactly as large as the bytes
    let stub = match definition.field_type {
        TypeRef::Defined(stub) => stub,
        ref other => panic!("Expected a stub type, found {:?}", other),
    };
    let stub_definition = module.get_type(stub);
    assert!(stub_definition.is_value_type);
    assert_eq!(stub_definition.packing_size, Some(1));
    assert_eq!(stub_definition.class_size, Some(3));

    // Both live inside the pool type, which is nested in the global type
    let pool = definition.owner;
    assert_eq!(stub_definition.declaring_type, Some(pool));
    assert_eq!(module.get_type(pool).declaring_type, Some(context.global_type()));
}

#[test]
fn test_constant_pool_encodes_utf8() {
    let mut context = library();

    let field = context.get_constant_pool_reference("é");

    assert_eq!(
        context.module().get_field(field).initial_value,
        Some(vec![0xC3, 0xA9, 0])
    );
}

#[test]
fn test_stub_types_shared_per_size() {
    let mut context = library();

    let ab = context.get_constant_pool_reference("ab");
    let cd = context.get_constant_pool_reference("cd");
    let longer = context.get_constant_pool_reference("abc");

    let module = context.module();
    assert_ne!(ab, cd);
    assert_eq!(module.get_field(ab).field_type, module.get_field(cd).field_type);
    assert_ne!(module.get_field(ab).field_type, module.get_field(longer).field_type);
}

#[test]
fn test_constant_pool_type_created_lazily() {
    let mut context = library();
    let types_before = context.module().types.len();

    context.get_constant_pool_reference("a");
    let types_after_first = context.module().types.len();
    context.get_constant_pool_reference("b");

    // Pool type and one stub type, then nothing new for a same-sized string
    assert_eq!(types_after_first, types_before + 2);
    assert_eq!(context.module().types.len(), types_after_first);
}

#[test]
fn test_duplicate_global_rejected() {
    let mut context = library();

    let first = context
        .add_global_field("counter", int32(), Position::null())
        .unwrap();
    let error = context
        .add_global_field("counter", TypeRef::Primitive(PrimitiveType::Int64), Position::null())
        .unwrap_err();

    assert_eq!(error.get_error_name(), "GlobalAlreadyDeclared");
    assert_eq!(context.get_global("counter"), Some(first));
    assert_eq!(context.module().get_field(first).field_type, int32());
}

#[test]
fn test_global_initializer_is_idempotent() {
    let mut context = library();

    let first = context.get_global_initializer();
    let second = context.get_global_initializer();

    assert_eq!(first, second);
    let initializer = context.module().get_method(first);
    assert_eq!(initializer.name, GLOBAL_INITIALIZER_NAME);
    assert!(initializer.is_static);
    assert!(initializer.is_special_name);
    assert_eq!(initializer.body, Some(MethodBody::new()));
}

#[test]
fn test_verify_seals_initializer_with_single_ret() {
    let mut context = library();
    emit_source(&mut context, "int a = 1; int b = 2;").unwrap();

    let assembly = context.verify_and_get_assembly().unwrap();
    let initializer = assembly.find_method(GLOBAL_INITIALIZER_NAME).unwrap();
    let instructions = &assembly.module.get_method(initializer).body.as_ref().unwrap().instructions;

    let rets = instructions
        .iter()
        .filter(|instruction| **instruction == Instruction::Ret)
        .count();
    assert_eq!(rets, 1);
    assert_eq!(instructions.last(), Some(&Instruction::Ret));
}

#[test]
fn test_verify_without_initializer_creates_none() {
    let mut context = library();
    emit_source(&mut context, "int zero = 0; int f(void) { return zero; }").unwrap();

    let assembly = context.verify_and_get_assembly().unwrap();

    assert_eq!(assembly.find_method(GLOBAL_INITIALIZER_NAME), None);
}

#[test]
fn test_verify_reports_undefined_function() {
    let mut context = library();
    emit_source(&mut context, "int helper(int x); int f(int a) { return helper(a); }").unwrap();

    let error = context.verify_and_get_assembly().unwrap_err();

    assert_eq!(error.get_error_name(), "FunctionNotDefined");
    assert!(error.to_string().contains("helper"));
}

#[test]
fn test_declaration_then_definition_links() {
    let mut context = library();
    emit_source(&mut context, "int helper(int x);").unwrap();
    emit_source(&mut context, "int helper(int y) { return y; }").unwrap();

    assert!(context.get_function("helper").unwrap().is_defined);
    assert!(context.verify_and_get_assembly().is_ok());
}

#[test]
fn test_signature_mismatch() {
    let mut context = library();
    context
        .declare_function("f", int_function(), vec![None], Position::null())
        .unwrap();

    let error = context
        .declare_function(
            "f",
            MethodSignature {
                return_type: int32(),
                parameters: vec![],
            },
            vec![],
            Position::null(),
        )
        .unwrap_err();

    assert_eq!(error.get_error_name(), "FunctionSignatureMismatch");
}

#[test]
fn test_repeated_declaration_returns_same_method() {
    let mut context = library();

    let first = context
        .declare_function("f", int_function(), vec![None], Position::null())
        .unwrap();
    let second = context
        .declare_function("f", int_function(), vec![Some(String::from("x"))], Position::null())
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_function_defined_twice() {
    let mut context = library();

    let error = emit_source(&mut context, "int f(void) { return 1; } int f(void) { return 2; }").unwrap_err();

    assert_eq!(error.get_error_name(), "FunctionAlreadyDefined");
}

#[test]
fn test_define_undeclared_function() {
    let mut context = library();

    let error = context
        .define_function("g", vec![], MethodBody::new(), Position::null())
        .unwrap_err();

    assert_eq!(error.get_error_name(), "FunctionNotDeclared");
}

#[test]
fn test_main_is_entry_point_of_executable() {
    let mut context = AssemblyContext::create(&AssemblyOptions::new("app", AssemblyKind::Executable));
    emit_source(&mut context, "int main(void) { return 0; }").unwrap();

    let assembly = context.verify_and_get_assembly().unwrap();

    assert_eq!(assembly.entry_point, assembly.find_method("main"));
    assert!(assembly.entry_point.is_some());
}

#[test]
fn test_library_has_no_entry_point() {
    let mut context = library();
    emit_source(&mut context, "int main(void) { return 0; }").unwrap();

    assert_eq!(context.verify_and_get_assembly().unwrap().entry_point, None);
}

#[test]
fn test_scope_resolution_falls_back_to_globals() {
    let mut context = library();
    let global = context
        .add_global_field("shared", int32(), Position::null())
        .unwrap();

    let parameters = vec![ParameterInfo {
        name: Some(String::from("x")),
        parameter_type: int32(),
    }];
    let mut scope = DeclarationScope::new(&mut context, parameters, int32(), MethodBody::new());
    let local = scope.add_variable("y", int32(), Position::null()).unwrap();

    assert_eq!(scope.resolve("y"), Some(Storage::Local(local, int32())));
    assert_eq!(scope.resolve("x"), Some(Storage::Parameter(0, int32())));
    assert_eq!(scope.resolve("shared"), Some(Storage::Global(global, int32())));
    assert_eq!(scope.resolve("missing"), None);
}

#[test]
fn test_scope_rejects_duplicate_local_in_same_block() {
    let mut context = library();
    let mut scope = DeclarationScope::new(&mut context, vec![], int32(), MethodBody::new());

    scope.add_variable("x", int32(), Position::null()).unwrap();
    let error = scope.add_variable("x", int32(), Position::null()).unwrap_err();

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
}

#[test]
fn test_scope_rejects_local_named_like_parameter() {
    let mut context = library();
    let parameters = vec![ParameterInfo {
        name: Some(String::from("a")),
        parameter_type: int32(),
    }];
    let mut scope = DeclarationScope::new(&mut context, parameters, int32(), MethodBody::new());

    let error = scope.add_variable("a", int32(), Position::null()).unwrap_err();
    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");

    // A nested block may still shadow the parameter
    scope.push_block();
    let inner = scope.add_variable("a", int32(), Position::null()).unwrap();
    assert_eq!(scope.resolve("a"), Some(Storage::Local(inner, int32())));
}

#[test]
fn test_function_local_shadowing_parameter_fails_to_compile() {
    let mut context = library();
    let error = emit_source(&mut context, "int dup(int a) { int a = 1; return a; }").unwrap_err();

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");

    let mut context = library();
    emit_source(&mut context, "int nested(int a) { { int a = 1; return a; } }").unwrap();
}

#[test]
fn test_local_slot_limit_is_an_error() {
    let mut context = library();
    let mut body = MethodBody::new();
    body.locals = vec![int32(); MAX_SLOTS];
    let mut scope = DeclarationScope::new(&mut context, vec![], int32(), body);

    let error = scope.add_variable("x", int32(), Position::null()).unwrap_err();
    assert_eq!(error.get_error_name(), "TooManySlots");
    assert!(error.get_tip().to_string().contains("65536 locals"));
}

#[test]
fn test_scope_inner_block_shadows() {
    let mut context = library();
    let mut scope = DeclarationScope::new(&mut context, vec![], int32(), MethodBody::new());

    let outer = scope.add_variable("x", int32(), Position::null()).unwrap();
    scope.push_block();
    let inner = scope
        .add_variable("x", TypeRef::Primitive(PrimitiveType::Int64), Position::null())
        .unwrap();

    assert_ne!(outer, inner);
    assert_eq!(
        scope.resolve("x"),
        Some(Storage::Local(inner, TypeRef::Primitive(PrimitiveType::Int64)))
    );

    scope.pop_block();
    assert_eq!(scope.resolve("x"), Some(Storage::Local(outer, int32())));

    // The function-level block stays
    scope.pop_block();
    assert_eq!(scope.resolve("x"), Some(Storage::Local(outer, int32())));
}

#[test]
fn test_unnamed_parameters_are_not_resolvable() {
    let mut context = library();
    let parameters = vec![ParameterInfo {
        name: None,
        parameter_type: int32(),
    }];
    let scope = DeclarationScope::new(&mut context, parameters, int32(), MethodBody::new());

    assert_eq!(scope.get_parameter(""), None);
}

#[test]
fn test_global_initializer_runs_in_declaration_order() {
    let mut context = library();
    emit_source(&mut context, "int a = 1; int b = a + 1;").unwrap();

    let a = context.get_global("a").unwrap();
    let b = context.get_global("b").unwrap();
    let assembly = context.verify_and_get_assembly().unwrap();
    let initializer = assembly.find_method(GLOBAL_INITIALIZER_NAME).unwrap();

    assert_eq!(
        assembly.module.get_method(initializer).body.as_ref().unwrap().instructions,
        vec![
            Instruction::LdcI4(1),
            Instruction::Stsfld(a),
            Instruction::Ldsfld(a),
            Instruction::LdcI4(1),
            Instruction::Add,
            Instruction::Stsfld(b),
            Instruction::Ret,
        ]
    );
}
