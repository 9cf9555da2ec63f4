//! Type specifier parsing.
//!
//! Similar to expression parsing, it uses NUD/LED handlers with binding
//! powers: every type keyword starts a base type and `*` extends it into a
//! pointer.

use std::collections::HashMap;

use crate::{
    ast::types::{BaseType, TypeSpec},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeSpec, Error>;
pub type TypeLEDHandler = fn(&mut Parser, TypeSpec, BindingPower) -> Result<TypeSpec, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    for kind in [
        TokenKind::Void,
        TokenKind::Char,
        TokenKind::Short,
        TokenKind::Int,
        TokenKind::Long,
        TokenKind::Float,
        TokenKind::Double,
        TokenKind::Signed,
        TokenKind::Unsigned,
    ] {
        parser.type_nud(kind, parse_base_type);
    }

    parser.type_led(TokenKind::Star, BindingPower::Unary, parse_pointer_type);
}

#[derive(Default)]
struct Specifiers {
    void: bool,
    char: bool,
    short: bool,
    int: bool,
    long: bool,
    float: bool,
    double: bool,
    signed: bool,
    unsigned: bool,
}

/// Consumes a run of type keywords such as `unsigned long int`.
pub fn parse_base_type(parser: &mut Parser) -> Result<TypeSpec, Error> {
    let start = parser.get_position();
    let mut specifiers = Specifiers::default();

    while parser.current_token_kind().is_type_keyword() {
        let token = parser.advance();
        match token.kind {
            TokenKind::Void => specifiers.void = true,
            TokenKind::Char => specifiers.char = true,
            TokenKind::Short => specifiers.short = true,
            TokenKind::Int => specifiers.int = true,
            // `long long` is the same width as `long` here
            TokenKind::Long => specifiers.long = true,
            TokenKind::Float => specifiers.float = true,
            TokenKind::Double => specifiers.double = true,
            TokenKind::Signed => specifiers.signed = true,
            _ => specifiers.unsigned = true,
        }
    }

    let invalid = |message: &str| {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from(message),
                message: String::from("invalid combination of type specifiers"),
            },
            start.clone(),
        )
    };

    if specifiers.signed && specifiers.unsigned {
        return Err(invalid("signed unsigned"));
    }

    let base = if specifiers.void {
        if specifiers.signed || specifiers.unsigned || specifiers.int {
            return Err(invalid("void"));
        }
        BaseType::Void
    } else if specifiers.float || specifiers.double {
        if specifiers.signed || specifiers.unsigned || specifiers.int {
            return Err(invalid("float"));
        }
        if specifiers.double {
            BaseType::Double
        } else {
            BaseType::Float
        }
    } else if specifiers.char {
        if specifiers.unsigned {
            BaseType::UnsignedChar
        } else {
            BaseType::Char
        }
    } else if specifiers.short {
        if specifiers.unsigned {
            BaseType::UnsignedShort
        } else {
            BaseType::Short
        }
    } else if specifiers.long {
        if specifiers.unsigned {
            BaseType::UnsignedLong
        } else {
            BaseType::Long
        }
    } else if specifiers.unsigned {
        BaseType::UnsignedInt
    } else {
        BaseType::Int
    };

    Ok(TypeSpec::new(base))
}

pub fn parse_pointer_type(
    parser: &mut Parser,
    left: TypeSpec,
    _bp: BindingPower,
) -> Result<TypeSpec, Error> {
    parser.expect(TokenKind::Star)?;

    Ok(left.pointer_to())
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeSpec, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected("expected a type")),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected("expected a type")),
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}
