//! Assembler-style text listing of an [`Assembly`].

use std::fmt::{Display, Formatter, Result};

use super::{
    instructions::Instruction,
    metadata::{Assembly, AssemblyKind, MethodDefinition, Module, TypeDefinition, TypeHandle, Visibility},
    types::TypeRef,
};

fn visibility(visibility: Visibility, nested: bool) -> &'static str {
    match (visibility, nested) {
        (Visibility::Public, false) => "public",
        (Visibility::Private, false) => "private",
        (Visibility::Public, true) => "nested public",
        (Visibility::Private, true) => "nested private",
    }
}

fn type_name(module: &Module, type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::Primitive(primitive) => primitive.name().to_string(),
        TypeRef::Pointer(pointee) => format!("{}*", type_name(module, pointee)),
        TypeRef::Defined(handle) => format!("valuetype {}", module.qualified_type_name(*handle)),
    }
}

fn write_bytes(f: &mut Formatter<'_>, bytes: &[u8]) -> Result {
    write!(f, "bytearray (")?;
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            write!(f, " ")?;
        }
        write!(f, "{:02X}", byte)?;
    }
    write!(f, ")")
}

fn write_instruction(f: &mut Formatter<'_>, module: &Module, instruction: &Instruction) -> Result {
    let mnemonic = instruction.mnemonic();
    match instruction {
        Instruction::MarkLabel(label) => writeln!(f, "    {}:", label),
        Instruction::LdcI4(value) => writeln!(f, "        {} {}", mnemonic, value),
        Instruction::LdcI8(value) => writeln!(f, "        {} {}", mnemonic, value),
        Instruction::LdcR8(value) => writeln!(f, "        {} {:?}", mnemonic, value),
        Instruction::Ldarg(index)
        | Instruction::Starg(index)
        | Instruction::Ldloc(index)
        | Instruction::Stloc(index) => writeln!(f, "        {} {}", mnemonic, index),
        Instruction::Ldsfld(field) | Instruction::Stsfld(field) | Instruction::Ldsflda(field) => {
            let definition = module.get_field(*field);
            writeln!(
                f,
                "        {} {} {}::{}",
                mnemonic,
                type_name(module, &definition.field_type),
                module.qualified_type_name(definition.owner),
                definition.name
            )
        }
        Instruction::Call(method) => {
            let definition = module.get_method(*method);
            writeln!(
                f,
                "        {} {} {}::{}",
                mnemonic,
                type_name(module, &definition.signature.return_type),
                module.qualified_type_name(definition.owner),
                definition.name
            )
        }
        Instruction::Br(label) | Instruction::Brtrue(label) | Instruction::Brfalse(label) => {
            writeln!(f, "        {} {}", mnemonic, label)
        }
        _ => writeln!(f, "        {}", mnemonic),
    }
}

fn write_method(
    f: &mut Formatter<'_>,
    module: &Module,
    method: &MethodDefinition,
    is_entry_point: bool,
) -> Result {
    let parameters: Vec<String> = method
        .signature
        .parameters
        .iter()
        .zip(&method.parameter_names)
        .map(|(parameter, name)| match name {
            Some(name) => format!("{} {}", type_name(module, parameter), name),
            None => type_name(module, parameter),
        })
        .collect();

    writeln!(
        f,
        "  .method {}{}{} {} {}({})",
        visibility(method.visibility, false),
        if method.is_static { " static" } else { "" },
        if method.is_special_name { " specialname rtspecialname" } else { "" },
        type_name(module, &method.signature.return_type),
        method.name,
        parameters.join(", ")
    )?;

    let body = match &method.body {
        Some(body) => body,
        None => return writeln!(f, "  {{ }}"),
    };

    writeln!(f, "  {{")?;
    if is_entry_point {
        writeln!(f, "    .entrypoint")?;
    }
    if !body.locals.is_empty() {
        let locals: Vec<String> = body
            .locals
            .iter()
            .enumerate()
            .map(|(index, local)| format!("[{}] {}", index, type_name(module, local)))
            .collect();
        writeln!(f, "    .locals init ({})", locals.join(", "))?;
    }
    for instruction in &body.instructions {
        write_instruction(f, module, instruction)?;
    }
    writeln!(f, "  }}")
}

fn write_type(f: &mut Formatter<'_>, assembly: &Assembly, handle: TypeHandle, definition: &TypeDefinition) -> Result {
    let module = &assembly.module;
    let mut flags = vec![visibility(definition.visibility, definition.declaring_type.is_some())];
    if definition.is_abstract {
        flags.push("abstract");
    }
    if definition.is_sealed {
        flags.push("sealed");
    }
    if definition.packing_size.is_some() {
        flags.push("explicit");
    }

    writeln!(
        f,
        ".class {} {}{}",
        flags.join(" "),
        module.qualified_type_name(handle),
        if definition.is_value_type { " extends [System.Runtime]System.ValueType" } else { "" }
    )?;
    writeln!(f, "{{")?;
    if let Some(packing) = definition.packing_size {
        writeln!(f, "  .pack {}", packing)?;
    }
    if let Some(size) = definition.class_size {
        writeln!(f, "  .size {}", size)?;
    }

    for field in &definition.fields {
        let field = module.get_field(*field);
        write!(
            f,
            "  .field {}{}{} {} {}",
            visibility(field.visibility, false),
            if field.is_static { " static" } else { "" },
            if field.is_init_only { " initonly" } else { "" },
            type_name(module, &field.field_type),
            field.name
        )?;
        if let Some(bytes) = &field.initial_value {
            write!(f, " = ")?;
            write_bytes(f, bytes)?;
        }
        writeln!(f)?;
    }

    for method in &definition.methods {
        write_method(f, module, module.get_method(*method), assembly.entry_point == Some(*method))?;
    }

    writeln!(f, "}}")
}

impl Display for Assembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for reference in &self.references {
            writeln!(f, ".assembly extern {} {{ }}", reference)?;
        }
        writeln!(f, ".assembly {} {{ }}", self.name)?;
        if let Some(framework) = &self.target_framework {
            writeln!(f, "// target framework: {} {}", framework.name, framework.version)?;
        }
        writeln!(
            f,
            ".module {} // {}",
            self.module.name,
            match self.kind {
                AssemblyKind::Executable => "exe",
                AssemblyKind::Library => "dll",
            }
        )?;

        for (index, definition) in self.module.types.iter().enumerate() {
            // The implicit module type is only listed when it holds members
            if index == 0 && definition.fields.is_empty() && definition.methods.is_empty() {
                continue;
            }
            writeln!(f)?;
            write_type(f, self, TypeHandle(index), definition)?;
        }

        Ok(())
    }
}
