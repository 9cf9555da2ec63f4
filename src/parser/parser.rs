//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the top-level parsing
//! functions. The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//! - Type specifier handlers

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{
        ast::{FunctionDecl, Parameter, TopLevel, TranslationUnit},
        statements::Declaration,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    expr::parse_expr,
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_block_body,
    types::{
        create_token_type_lookups, parse_type, TypeBPLookup, TypeLEDHandler, TypeLEDLookup,
        TypeNUDHandler, TypeNUDLookup,
    },
};

/// The main parser structure that maintains parsing state.
pub struct Parser {
    /// The list of tokens to parse, always terminated by EOF
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    type_led_lookup: TypeLEDLookup,
    type_binding_power_lookup: TypeBPLookup,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            type_binding_power_lookup: HashMap::new(),
        }
    }

    /// Returns the current token without advancing.
    ///
    /// Reading past the end keeps returning the trailing EOF token.
    pub fn current_token(&self) -> &Token {
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Kind of the token `n` positions ahead of the current one.
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance())
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Error for the current token, explaining what was expected instead.
    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: String::from(message),
            },
            self.get_position(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_bp_lookup(&self) -> &TypeBPLookup {
        &self.type_binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// Prefix handlers leave the token's infix binding power untouched, so `-`
    /// can be both negation and subtraction.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, led_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Returns the source position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// Span from `start` to the end of the previously consumed token.
    pub fn span_from(&self, start: Position) -> Span {
        let end = match self.pos.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.span.end.clone(),
            None => Position(0, Rc::clone(&self.file)),
        };

        Span { start, end }
    }
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();

    // `f(void)` declares no parameters
    if parser.current_token_kind() == TokenKind::Void && parser.peek_kind(1) == TokenKind::CloseParen {
        parser.advance();
    }

    while parser.current_token_kind() != TokenKind::CloseParen {
        let type_spec = parse_type(parser, BindingPower::Default)?;

        let name = if parser.current_token_kind() == TokenKind::Identifier {
            Some(parser.advance().value)
        } else {
            None
        };
        parameters.push(Parameter { name, type_spec });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in parameter list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(parameters)
}

/// Parses one function definition, prototype or global variable.
pub fn parse_top_level(parser: &mut Parser) -> Result<TopLevel, Error> {
    let start = parser.get_position();
    let type_spec = parse_type(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected identifier after type");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    if parser.current_token_kind() == TokenKind::OpenParen {
        let parameters = parse_parameters(parser)?;

        let body = if parser.current_token_kind() == TokenKind::Semicolon {
            parser.advance();
            None
        } else {
            parser.expect(TokenKind::OpenCurly)?;
            Some(parse_block_body(parser)?)
        };

        return Ok(TopLevel::Function(FunctionDecl {
            return_type: type_spec,
            identifier,
            parameters,
            body,
            span: parser.span_from(start),
        }));
    }

    let initializer = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(TopLevel::GlobalVariable(Declaration {
        type_spec,
        identifier,
        initializer,
        span: parser.span_from(start),
    }))
}

/// Parses a stream of tokens into a translation unit.
///
/// This is the main entry point for parsing. It creates a parser instance,
/// initializes all lookup tables, and parses top-level declarations until EOF.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> Result<TranslationUnit, Error> {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let mut declarations = vec![];

    while parser.has_tokens() {
        declarations.push(parse_top_level(&mut parser)?);
    }

    Ok(TranslationUnit { file, declarations })
}
