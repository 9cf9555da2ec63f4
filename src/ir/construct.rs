//! Builds IR nodes from the syntax tree.
//!
//! Construction only checks the shape of each node. Names are resolved
//! later, against the declaration scope the node is emitted into.

use crate::{
    ast::{
        ast::{FunctionDecl, TopLevel, TranslationUnit},
        expressions::{AssignmentOperator, Expr, ExprKind},
        statements::{Declaration, Stmt, StmtKind},
    },
    compiler::scope::ParameterInfo,
    errors::errors::{Error, ErrorImpl},
    target::types::TypeSystem,
};

use super::{
    expressions::{
        ArithmeticExpr, AssignmentExpr, CallExpr, CastExpr, ComparisonExpr, ConstantExpr, ConstantValue,
        IdentifierExpr, StringConstantExpr, UnaryExpr,
    },
    ir::{ExprWrapper, StmtWrapper, TopLevelWrapper},
    statements::{
        BlockStatement, DeclarationStatement, ExpressionStatement, ForStatement, IfStatement, ReturnStatement,
        WhileStatement,
    },
    top_level::{FunctionDeclaration, FunctionDefinition, GlobalVariable},
};

pub fn build_expression(expr: &Expr) -> Result<ExprWrapper, Error> {
    let span = expr.span.clone();

    let expression = match &expr.kind {
        ExprKind::IntegerLiteral(value) => ExprWrapper::new(ConstantExpr {
            value: ConstantValue::Integer(*value),
            span,
        }),
        ExprKind::FloatLiteral(value) => ExprWrapper::new(ConstantExpr {
            value: ConstantValue::Floating(*value),
            span,
        }),
        ExprKind::StringLiteral(value) => ExprWrapper::new(StringConstantExpr {
            value: value.clone(),
            span,
        }),
        ExprKind::Identifier(name) => ExprWrapper::new(IdentifierExpr {
            name: name.clone(),
            span,
        }),
        ExprKind::Prefix { operator, operand } => ExprWrapper::new(UnaryExpr {
            operator: *operator,
            operand: build_expression(operand)?,
            span,
        }),
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            let left = build_expression(left)?;
            let right = build_expression(right)?;
            if operator.is_comparison() {
                ExprWrapper::new(ComparisonExpr::new(*operator, left, right, span)?)
            } else {
                ExprWrapper::new(ArithmeticExpr::new(*operator, left, right, span)?)
            }
        }
        ExprKind::Assignment {
            operator,
            target,
            value,
        } => {
            let operator = match operator {
                AssignmentOperator::Assign => None,
                AssignmentOperator::Compound(operator) => Some(*operator),
            };
            ExprWrapper::new(AssignmentExpr::new(
                build_expression(target)?,
                operator,
                build_expression(value)?,
                span,
            )?)
        }
        ExprKind::Call { callee, arguments } => {
            let function = match &callee.kind {
                ExprKind::Identifier(name) => name.clone(),
                _ => {
                    return Err(Error::new(
                        ErrorImpl::TypeMatchError {
                            expected: String::from("function name"),
                            received: String::from("expression"),
                        },
                        callee.span.start.clone(),
                    ))
                }
            };
            ExprWrapper::new(CallExpr {
                function,
                arguments: arguments
                    .iter()
                    .map(build_expression)
                    .collect::<Result<Vec<_>, Error>>()?,
                span,
            })
        }
        ExprKind::Cast { target, operand } => ExprWrapper::new(CastExpr {
            target: TypeSystem.resolve(target),
            operand: build_expression(operand)?,
            span,
        }),
    };

    Ok(expression)
}

fn build_optional_expression(expr: &Option<Expr>) -> Result<Option<ExprWrapper>, Error> {
    expr.as_ref().map(build_expression).transpose()
}

fn build_declaration(declaration: &Declaration) -> Result<DeclarationStatement, Error> {
    Ok(DeclarationStatement {
        identifier: declaration.identifier.clone(),
        variable_type: TypeSystem.resolve(&declaration.type_spec),
        initializer: build_optional_expression(&declaration.initializer)?,
        span: declaration.span.clone(),
    })
}

pub fn build_statement(stmt: &Stmt) -> Result<StmtWrapper, Error> {
    let span = stmt.span.clone();

    let statement = match &stmt.kind {
        StmtKind::Expression(expr) => StmtWrapper::new(ExpressionStatement {
            expression: build_expression(expr)?,
            span,
        }),
        StmtKind::Declaration(declaration) => StmtWrapper::new(build_declaration(declaration)?),
        StmtKind::Return(value) => StmtWrapper::new(ReturnStatement {
            value: build_optional_expression(value)?,
            span,
        }),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => StmtWrapper::new(IfStatement {
            condition: build_expression(condition)?,
            then_body: build_statement(then_body)?,
            else_body: else_body.as_deref().map(build_statement).transpose()?,
            span,
        }),
        StmtKind::While { condition, body } => StmtWrapper::new(WhileStatement {
            condition: build_expression(condition)?,
            body: build_statement(body)?,
            span,
        }),
        StmtKind::For {
            init,
            condition,
            step,
            body,
        } => StmtWrapper::new(ForStatement {
            init: init.as_deref().map(build_statement).transpose()?,
            condition: build_optional_expression(condition)?,
            step: build_optional_expression(step)?,
            body: build_statement(body)?,
            span,
        }),
        StmtKind::Block(body) => StmtWrapper::new(BlockStatement {
            body: build_statements(body)?,
            span,
        }),
        StmtKind::Empty => StmtWrapper::new(BlockStatement { body: vec![], span }),
    };

    Ok(statement)
}

fn build_statements(body: &[Stmt]) -> Result<Vec<StmtWrapper>, Error> {
    body.iter().map(build_statement).collect()
}

fn build_prototype(function: &FunctionDecl) -> FunctionDeclaration {
    FunctionDeclaration {
        name: function.identifier.clone(),
        return_type: TypeSystem.resolve(&function.return_type),
        parameters: function
            .parameters
            .iter()
            .map(|parameter| ParameterInfo {
                name: parameter.name.clone(),
                parameter_type: TypeSystem.resolve(&parameter.type_spec),
            })
            .collect(),
        span: function.span.clone(),
    }
}

pub fn build_top_level(node: &TopLevel) -> Result<TopLevelWrapper, Error> {
    let node = match node {
        TopLevel::Function(function) => match &function.body {
            Some(body) => TopLevelWrapper::new(FunctionDefinition {
                prototype: build_prototype(function),
                body: build_statements(body)?,
                span: function.span.clone(),
            }),
            None => TopLevelWrapper::new(build_prototype(function)),
        },
        TopLevel::GlobalVariable(declaration) => TopLevelWrapper::new(GlobalVariable {
            name: declaration.identifier.clone(),
            variable_type: TypeSystem.resolve(&declaration.type_spec),
            initializer: build_optional_expression(&declaration.initializer)?,
            span: declaration.span.clone(),
        }),
    };

    Ok(node)
}

/// Builds the IR for every top-level declaration of a translation unit.
pub fn build_translation_unit(unit: &TranslationUnit) -> Result<Vec<TopLevelWrapper>, Error> {
    log::debug!("Building IR for {} ({} declarations)", unit.file, unit.declarations.len());
    unit.declarations.iter().map(build_top_level).collect()
}
