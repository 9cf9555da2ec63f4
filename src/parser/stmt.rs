use crate::{
    ast::{
        expressions::Expr,
        statements::{Declaration, Stmt, StmtKind},
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token_kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&token_kind).copied() {
        return handler(parser);
    }

    let start = parser.get_position();
    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::new(StmtKind::Expression(expr), parser.span_from(start)))
}

pub fn parse_declaration_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let type_spec = parse_type(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected identifier during variable declaration");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let initializer = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(Stmt::new(
        StmtKind::Declaration(Declaration {
            type_spec,
            identifier,
            initializer,
            span: span.clone(),
        }),
        span,
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let value = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::new(StmtKind::Return(value), parser.span_from(start)))
}

fn parse_condition(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;
    Ok(condition)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let condition = parse_condition(parser)?;
    let then_body = parse_stmt(parser)?;

    // A dangling else binds to the nearest if
    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::new(
        StmtKind::If {
            condition,
            then_body: Box::new(then_body),
            else_body,
        },
        parser.span_from(start),
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let condition = parse_condition(parser)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::While {
            condition,
            body: Box::new(body),
        },
        parser.span_from(start),
    ))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    parser.expect(TokenKind::OpenParen)?;

    // The init clause is a full statement, so it consumes its own `;`
    let init = if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        None
    } else if parser.current_token_kind().is_type_keyword() {
        Some(Box::new(parse_declaration_stmt(parser)?))
    } else {
        let init_start = parser.get_position();
        let expr = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::Semicolon)?;
        Some(Box::new(Stmt::new(
            StmtKind::Expression(expr),
            parser.span_from(init_start),
        )))
    };

    let condition = if parser.current_token_kind() == TokenKind::Semicolon {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };
    parser.expect(TokenKind::Semicolon)?;

    let step = if parser.current_token_kind() == TokenKind::CloseParen {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::For {
            init,
            condition,
            step,
            body: Box::new(body),
        },
        parser.span_from(start),
    ))
}

/// Parses statements up to and including the closing `}`.
///
/// The opening `{` must already have been consumed.
pub fn parse_block_body(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    let mut statements = Vec::new();

    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` before end of file"));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(statements)
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let body = parse_block_body(parser)?;

    Ok(Stmt::new(StmtKind::Block(body), parser.span_from(start)))
}

pub fn parse_empty_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    Ok(Stmt::new(StmtKind::Empty, parser.span_from(start)))
}
