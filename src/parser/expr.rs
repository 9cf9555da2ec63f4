use crate::{
    ast::expressions::{AssignmentOperator, BinaryOperator, Expr, ExprKind, PrefixOperator},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser, types::parse_type};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected("expected an expression")),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected("expected an operator")),
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

fn parse_number(value: &str) -> Option<ExprKind> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok().map(ExprKind::IntegerLiteral)
    } else if value.contains('.') {
        value.parse().ok().map(ExprKind::FloatLiteral)
    } else {
        value.parse().ok().map(ExprKind::IntegerLiteral)
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();

    let kind = match token.kind {
        TokenKind::Number => match parse_number(&token.value) {
            Some(kind) => kind,
            None => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        },
        TokenKind::Identifier => ExprKind::Identifier(token.value),
        TokenKind::String => ExprKind::StringLiteral(token.value),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span.start,
            ))
        }
    };

    Ok(Expr::new(kind, token.span))
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let operator = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Remainder,
        TokenKind::Ampersand => BinaryOperator::BitwiseAnd,
        TokenKind::Pipe => BinaryOperator::BitwiseOr,
        TokenKind::Caret => BinaryOperator::BitwiseXor,
        TokenKind::ShiftLeft => BinaryOperator::LeftShift,
        TokenKind::ShiftRight => BinaryOperator::RightShift,
        TokenKind::Greater => BinaryOperator::GreaterThan,
        TokenKind::Less => BinaryOperator::LessThan,
        TokenKind::Equals => BinaryOperator::EqualTo,
        TokenKind::GreaterEquals => BinaryOperator::GreaterThanOrEqualTo,
        TokenKind::LessEquals => BinaryOperator::LessThanOrEqualTo,
        TokenKind::NotEquals => BinaryOperator::NotEqualTo,
        _ => return None,
    };
    Some(operator)
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match binary_operator(operator_token.kind) {
        Some(operator) => operator,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;

    Ok(Expr::new(
        ExprKind::Binary {
            operator,
            left: Box::new(left.clone()),
            right: Box::new(right.clone()),
        },
        Span {
            start: left.span.start,
            end: right.span.end,
        },
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::Dash => PrefixOperator::Negate,
        TokenKind::Tilde => PrefixOperator::BitwiseNot,
        _ => PrefixOperator::LogicalNot,
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::new(
        ExprKind::Prefix {
            operator,
            operand: Box::new(operand.clone()),
        },
        Span {
            start: operator_token.span.start,
            end: operand.span.end,
        },
    ))
}

pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::PlusEquals => AssignmentOperator::Compound(BinaryOperator::Add),
        TokenKind::MinusEquals => AssignmentOperator::Compound(BinaryOperator::Subtract),
        TokenKind::StarEquals => AssignmentOperator::Compound(BinaryOperator::Multiply),
        TokenKind::SlashEquals => AssignmentOperator::Compound(BinaryOperator::Divide),
        TokenKind::PercentEquals => AssignmentOperator::Compound(BinaryOperator::Remainder),
        _ => AssignmentOperator::Assign,
    };

    // Assignment is right associative
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Expr::new(
        ExprKind::Assignment {
            operator,
            target: Box::new(left.clone()),
            value: Box::new(value.clone()),
        },
        Span {
            start: left.span.start,
            end: value.span.end,
        },
    ))
}

/// Parses `( expr )` or a cast `( type ) expr`.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start;

    if parser.current_token_kind().is_type_keyword() {
        let target = parse_type(parser, BindingPower::Default)?;
        parser.expect(TokenKind::CloseParen)?;
        let operand = parse_expr(parser, BindingPower::Unary)?;

        return Ok(Expr::new(
            ExprKind::Cast {
                target,
                operand: Box::new(operand.clone()),
            },
            Span {
                start,
                end: operand.span.end,
            },
        ));
    }

    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in argument list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Call {
            callee: Box::new(left.clone()),
            arguments,
        },
        parser.span_from(left.span.start),
    ))
}
