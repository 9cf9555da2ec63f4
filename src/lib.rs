#![allow(clippy::module_inception)]

//! `ccil` compiles a subset of C into an artifact for a stack-based managed
//! virtual machine.
//!
//! The pipeline is: [`lexer`] → [`parser`] → [`ast`] → [`ir`] (construction,
//! lowering) → emission through [`compiler::assembly::AssemblyContext`] into the
//! [`target`] model.

use std::rc::Rc;

use crate::{
    compiler::{assembly::AssemblyContext, options::AssemblyOptions},
    errors::errors::Error,
    ir::construct::build_translation_unit,
    lexer::lexer::tokenize,
    parser::parser::parse,
    target::metadata::Assembly,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod ir;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod target;

extern crate regex;

#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }
}

/// Runs the front end and IR emission for one source file against `context`.
pub fn compile_translation_unit(
    context: &mut AssemblyContext,
    source: &str,
    file_name: &str,
) -> Result<(), Error> {
    let tokens = tokenize(source.to_string(), Some(file_name.to_string()))?;
    let unit = parse(tokens, Rc::new(file_name.to_string()))?;
    let nodes = build_translation_unit(&unit)?;

    context.emit_translation_unit(&nodes)
}

/// Compiles a set of `(file name, source)` pairs into one finished artifact.
pub fn compile_sources(options: &AssemblyOptions, sources: &[(&str, &str)]) -> Result<Assembly, Error> {
    let mut context = AssemblyContext::create(options);

    for (file_name, source) in sources {
        compile_translation_unit(&mut context, source, file_name)?;
    }

    context.verify_and_get_assembly()
}

/// Line number (1-based), text and column of a byte offset in `source`.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;
    let mut start = 0;

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((index + 1, line.to_string(), pos - start));
        }

        start = end;
    }

    None
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line_at_position() {
        let source = "int a;\nint f(void) {\n    return a;\n}\n";

        let (line_number, line, line_pos) = super::get_line_at_position(source, 4).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "int a;\n");
        assert_eq!(line_pos, 4);

        let (line_number, line, line_pos) = super::get_line_at_position(source, 32).unwrap();
        assert_eq!(line_number, 3);
        assert_eq!(line, "    return a;\n");
        assert_eq!(line_pos, 11);

        assert_eq!(super::get_line_at_position(source, 500), None);
    }
}
