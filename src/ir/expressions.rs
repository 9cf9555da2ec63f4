use std::any::Any;

use crate::{
    ast::expressions::{BinaryOperator, PrefixOperator},
    compiler::scope::{DeclarationScope, Storage},
    errors::errors::{Error, ErrorImpl},
    target::{
        instructions::Instruction,
        types::{PrimitiveType, TypeRef},
    },
    Span,
};

use super::ir::{ExprType, ExprWrapper, Expression};

fn type_mismatch(expected: &str, received: &TypeRef, span: &Span) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: String::from(expected),
            received: received.to_string(),
        },
        span.start.clone(),
    )
}

/// Type of `expression`, rejecting `void`.
fn value_type(expression: &ExprWrapper, scope: &DeclarationScope) -> Result<TypeRef, Error> {
    let value_type = expression.get_type(scope)?;
    if value_type.is_void() {
        return Err(type_mismatch("value", &value_type, expression.get_span()));
    }
    Ok(value_type)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Integer(i64),
    Floating(f64),
}

/// Integer or floating literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: ConstantValue,
    pub span: Span,
}

impl ConstantExpr {
    pub fn integer(value: i64, span: Span) -> Self {
        ConstantExpr {
            value: ConstantValue::Integer(value),
            span,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self.value {
            ConstantValue::Integer(value) => value == 0,
            ConstantValue::Floating(value) => value == 0.0,
        }
    }
}

impl Expression for ConstantExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Constant
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        let types = scope.type_system();
        Ok(match self.value {
            ConstantValue::Integer(value) if i32::try_from(value).is_ok() => types.int32(),
            ConstantValue::Integer(_) => types.int64(),
            ConstantValue::Floating(_) => types.double(),
        })
    }
    fn lower(&self) -> ExprWrapper {
        self.clone_wrapper()
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let instruction = match self.value {
            ConstantValue::Integer(value) => match i32::try_from(value) {
                Ok(value) => Instruction::LdcI4(value),
                Err(_) => Instruction::LdcI8(value),
            },
            ConstantValue::Floating(value) => Instruction::LdcR8(value),
        };
        scope.emit(instruction);
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![]
    }
}

/// A string literal; evaluates to the address of its pooled bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct StringConstantExpr {
    pub value: String,
    pub span: Span,
}

impl Expression for StringConstantExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::StringConstant
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, _scope: &DeclarationScope) -> Result<TypeRef, Error> {
        Ok(TypeRef::Primitive(PrimitiveType::SByte).pointer_to())
    }
    fn lower(&self) -> ExprWrapper {
        self.clone_wrapper()
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let field = scope.get_constant_pool_reference(&self.value);
        scope.emit(Instruction::Ldsflda(field));
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpr {
    pub name: String,
    pub span: Span,
}

impl IdentifierExpr {
    fn storage(&self, scope: &DeclarationScope) -> Result<Storage, Error> {
        scope.resolve(&self.name).ok_or_else(|| {
            Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: self.name.clone(),
                },
                self.span.start.clone(),
            )
        })
    }

    /// Stores the value on top of the stack into this identifier.
    pub fn emit_store(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let storage = self.storage(scope)?;
        scope.emit(storage.store());
        Ok(())
    }
}

impl Expression for IdentifierExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Identifier
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        Ok(self.storage(scope)?.get_type().clone())
    }
    fn lower(&self) -> ExprWrapper {
        self.clone_wrapper()
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let storage = self.storage(scope)?;
        scope.emit(storage.load());
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![]
    }
}

/// `-x`, `~x` or `!x`. Logical not only exists before lowering.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub operator: PrefixOperator,
    pub operand: ExprWrapper,
    pub span: Span,
}

impl Expression for UnaryExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Unary
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        if self.operator == PrefixOperator::LogicalNot {
            return Ok(scope.type_system().boolean());
        }

        let operand_type = self.operand.get_type(scope)?;
        let promoted = scope
            .type_system()
            .arithmetic_result(&operand_type, &operand_type)
            .ok_or_else(|| type_mismatch("arithmetic type", &operand_type, &self.span))?;

        if self.operator == PrefixOperator::BitwiseNot
            && promoted.as_primitive().is_some_and(|p| p.is_floating())
        {
            return Err(type_mismatch("integer type", &operand_type, &self.span));
        }

        Ok(promoted)
    }
    fn lower(&self) -> ExprWrapper {
        let operand = self.operand.lower();

        match self.operator {
            // !x => x == 0
            PrefixOperator::LogicalNot => ExprWrapper::new(ComparisonExpr {
                operator: BinaryOperator::EqualTo,
                left: operand,
                right: ExprWrapper::new(ConstantExpr::integer(0, self.span.clone())),
                span: self.span.clone(),
            }),
            operator => ExprWrapper::new(UnaryExpr {
                operator,
                operand,
                span: self.span.clone(),
            }),
        }
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let instruction = match self.operator {
            PrefixOperator::Negate => Instruction::Neg,
            PrefixOperator::BitwiseNot => Instruction::Not,
            PrefixOperator::LogicalNot => {
                return Err(Error::internal(
                    "logical not reached emission without being lowered",
                    self.span.start.clone(),
                ))
            }
        };

        let result_type = self.get_type(scope)?;
        let operand_type = self.operand.get_type(scope)?;

        self.operand.emit_to(scope)?;
        scope.emit_conversion(&operand_type, &result_type, false);
        scope.emit(instruction);
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![&self.operand]
    }
}

/// A binary operator that is not a comparison.
#[derive(Debug, Clone)]
pub struct ArithmeticExpr {
    pub operator: BinaryOperator,
    pub left: ExprWrapper,
    pub right: ExprWrapper,
    pub span: Span,
}

impl ArithmeticExpr {
    pub fn new(
        operator: BinaryOperator,
        left: ExprWrapper,
        right: ExprWrapper,
        span: Span,
    ) -> Result<Self, Error> {
        if operator.is_comparison() {
            return Err(Error::internal(
                format!("`{}` is not an arithmetic operator", operator),
                span.start.clone(),
            ));
        }

        Ok(ArithmeticExpr {
            operator,
            left,
            right,
            span,
        })
    }

    fn is_shift(&self) -> bool {
        matches!(
            self.operator,
            BinaryOperator::LeftShift | BinaryOperator::RightShift
        )
    }

    fn requires_integers(&self) -> bool {
        self.is_shift()
            || matches!(
                self.operator,
                BinaryOperator::BitwiseAnd | BinaryOperator::BitwiseOr | BinaryOperator::BitwiseXor
            )
    }
}

impl Expression for ArithmeticExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Arithmetic
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        let types = scope.type_system();
        let left_type = self.left.get_type(scope)?;
        let right_type = self.right.get_type(scope)?;

        // A shift has the type of its promoted left operand
        let result = if self.is_shift() {
            types.arithmetic_result(&left_type, &left_type)
        } else {
            types.arithmetic_result(&left_type, &right_type)
        };

        let result = match result {
            Some(result) => result,
            None if types.arithmetic_result(&left_type, &left_type).is_none() => {
                return Err(type_mismatch("arithmetic type", &left_type, &self.span))
            }
            None => return Err(type_mismatch("arithmetic type", &right_type, &self.span)),
        };

        if self.requires_integers() {
            for operand_type in [&left_type, &right_type] {
                if !operand_type.as_primitive().is_some_and(|p| p.is_integer()) {
                    return Err(type_mismatch("integer type", operand_type, &self.span));
                }
            }
        }

        Ok(result)
    }
    fn lower(&self) -> ExprWrapper {
        ExprWrapper::new(ArithmeticExpr {
            operator: self.operator,
            left: self.left.lower(),
            right: self.right.lower(),
            span: self.span.clone(),
        })
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let result_type = self.get_type(scope)?;
        let unsigned = result_type.is_unsigned();

        let instruction = match self.operator {
            BinaryOperator::Add => Instruction::Add,
            BinaryOperator::Subtract => Instruction::Sub,
            BinaryOperator::Multiply => Instruction::Mul,
            BinaryOperator::Divide if unsigned => Instruction::DivUn,
            BinaryOperator::Divide => Instruction::Div,
            BinaryOperator::Remainder if unsigned => Instruction::RemUn,
            BinaryOperator::Remainder => Instruction::Rem,
            BinaryOperator::BitwiseAnd => Instruction::And,
            BinaryOperator::BitwiseOr => Instruction::Or,
            BinaryOperator::BitwiseXor => Instruction::Xor,
            BinaryOperator::LeftShift => Instruction::Shl,
            BinaryOperator::RightShift if unsigned => Instruction::ShrUn,
            BinaryOperator::RightShift => Instruction::Shr,
            operator => {
                return Err(Error::internal(
                    format!("`{}` reached arithmetic emission", operator),
                    self.span.start.clone(),
                ))
            }
        };

        let left_type = self.left.get_type(scope)?;
        let right_type = self.right.get_type(scope)?;
        let right_target = if self.is_shift() {
            scope.type_system().int32()
        } else {
            result_type.clone()
        };

        self.left.emit_to(scope)?;
        scope.emit_conversion(&left_type, &result_type, false);
        self.right.emit_to(scope)?;
        scope.emit_conversion(&right_type, &right_target, false);
        scope.emit(instruction);
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![&self.left, &self.right]
    }
}

/// A comparison. After lowering only `>`, `<` and `==` remain.
#[derive(Debug, Clone)]
pub struct ComparisonExpr {
    pub operator: BinaryOperator,
    pub left: ExprWrapper,
    pub right: ExprWrapper,
    pub span: Span,
}

impl ComparisonExpr {
    pub fn new(
        operator: BinaryOperator,
        left: ExprWrapper,
        right: ExprWrapper,
        span: Span,
    ) -> Result<Self, Error> {
        if !operator.is_comparison() {
            return Err(Error::internal(
                format!("`{}` is not a comparison operator", operator),
                span.start.clone(),
            ));
        }

        Ok(ComparisonExpr {
            operator,
            left,
            right,
            span,
        })
    }

    fn compare(&self, operator: BinaryOperator, left: ExprWrapper, right: ExprWrapper) -> ExprWrapper {
        ExprWrapper::new(ComparisonExpr {
            operator,
            left,
            right,
            span: self.span.clone(),
        })
    }

    /// `expression == 0`
    fn negate(&self, expression: ExprWrapper) -> ExprWrapper {
        let zero = ExprWrapper::new(ConstantExpr::integer(0, self.span.clone()));
        self.compare(BinaryOperator::EqualTo, expression, zero)
    }
}

impl Expression for ComparisonExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Comparison
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        // TODO: reject comparisons between incompatible operand types
        Ok(scope.type_system().boolean())
    }
    fn lower(&self) -> ExprWrapper {
        let left = self.left.lower();
        let right = self.right.lower();

        match self.operator {
            // a >= b => (a < b) == 0
            BinaryOperator::GreaterThanOrEqualTo => {
                self.negate(self.compare(BinaryOperator::LessThan, left, right))
            }
            // a <= b => (a > b) == 0
            BinaryOperator::LessThanOrEqualTo => {
                self.negate(self.compare(BinaryOperator::GreaterThan, left, right))
            }
            // a != b => (a == b) == 0
            BinaryOperator::NotEqualTo => {
                self.negate(self.compare(BinaryOperator::EqualTo, left, right))
            }
            operator => self.compare(operator, left, right),
        }
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let left_type = value_type(&self.left, scope)?;
        let right_type = value_type(&self.right, scope)?;
        // Numeric operands are brought to a common type, anything else is compared as is
        let common = scope.type_system().arithmetic_result(&left_type, &right_type);
        let unsigned = common.as_ref().unwrap_or(&left_type).is_unsigned();

        let instruction = match self.operator {
            BinaryOperator::GreaterThan if unsigned => Instruction::CgtUn,
            BinaryOperator::GreaterThan => Instruction::Cgt,
            BinaryOperator::LessThan if unsigned => Instruction::CltUn,
            BinaryOperator::LessThan => Instruction::Clt,
            BinaryOperator::EqualTo => Instruction::Ceq,
            operator => {
                return Err(Error::internal(
                    format!("comparison `{}` reached emission without being lowered", operator),
                    self.span.start.clone(),
                ))
            }
        };

        self.left.emit_to(scope)?;
        if let Some(common) = &common {
            scope.emit_conversion(&left_type, common, false);
        }
        self.right.emit_to(scope)?;
        if let Some(common) = &common {
            scope.emit_conversion(&right_type, common, false);
        }
        scope.emit(instruction);
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![&self.left, &self.right]
    }
}

/// A direct call to a named function.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub function: String,
    pub arguments: Vec<ExprWrapper>,
    pub span: Span,
}

impl Expression for CallExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Call
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        match scope.get_function(&self.function) {
            Some(function) => Ok(function.signature.return_type.clone()),
            None => Err(Error::new(
                ErrorImpl::FunctionNotDeclared {
                    function: self.function.clone(),
                },
                self.span.start.clone(),
            )),
        }
    }
    fn lower(&self) -> ExprWrapper {
        ExprWrapper::new(CallExpr {
            function: self.function.clone(),
            arguments: self.arguments.iter().map(|argument| argument.lower()).collect(),
            span: self.span.clone(),
        })
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let (parameters, method) = match scope.get_function(&self.function) {
            Some(function) => (function.signature.parameters.clone(), function.method),
            None => {
                return Err(Error::new(
                    ErrorImpl::FunctionNotDeclared {
                        function: self.function.clone(),
                    },
                    self.span.start.clone(),
                ))
            }
        };

        if self.arguments.len() > parameters.len() {
            return Err(Error::new(
                ErrorImpl::UnexpectedArguments {
                    expected: parameters.len(),
                    received: self.arguments.len(),
                },
                self.span.start.clone(),
            ));
        }
        if self.arguments.len() < parameters.len() {
            return Err(Error::new(
                ErrorImpl::MissingArguments {
                    expected: parameters.len(),
                    received: self.arguments.len(),
                },
                self.span.start.clone(),
            ));
        }

        for (argument, parameter_type) in self.arguments.iter().zip(&parameters) {
            let argument_type = value_type(argument, scope)?;
            argument.emit_to(scope)?;
            scope.emit_conversion(&argument_type, parameter_type, false);
        }

        log::trace!("Call to {} with {} arguments", self.function, self.arguments.len());
        scope.emit(Instruction::Call(method));
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        self.arguments.iter().collect()
    }
}

/// `(type) operand`
#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target: TypeRef,
    pub operand: ExprWrapper,
    pub span: Span,
}

impl Expression for CastExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Cast
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, _scope: &DeclarationScope) -> Result<TypeRef, Error> {
        Ok(self.target.clone())
    }
    fn lower(&self) -> ExprWrapper {
        ExprWrapper::new(CastExpr {
            target: self.target.clone(),
            operand: self.operand.lower(),
            span: self.span.clone(),
        })
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        let operand_type = self.operand.get_type(scope)?;
        self.operand.emit_to(scope)?;

        // `(void) x` evaluates x for its side effects only
        if self.target.is_void() {
            if !operand_type.is_void() {
                scope.emit(Instruction::Pop);
            }
            return Ok(());
        }
        if operand_type.is_void() {
            return Err(type_mismatch(&self.target.to_string(), &operand_type, &self.span));
        }

        scope.emit_conversion(&operand_type, &self.target, true);
        Ok(())
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![&self.operand]
    }
}

/// `target = value`, or `target op= value` before lowering.
///
/// The assigned value stays on the stack.
#[derive(Debug, Clone)]
pub struct AssignmentExpr {
    pub target: ExprWrapper,
    /// The arithmetic operator of a compound assignment
    pub operator: Option<BinaryOperator>,
    pub value: ExprWrapper,
    pub span: Span,
}

impl AssignmentExpr {
    pub fn new(
        target: ExprWrapper,
        operator: Option<BinaryOperator>,
        value: ExprWrapper,
        span: Span,
    ) -> Result<Self, Error> {
        if target.get_expr_type() != ExprType::Identifier {
            return Err(Error::new(
                ErrorImpl::InvalidAssignmentTarget,
                target.get_span().start.clone(),
            ));
        }
        if operator.is_some_and(|operator| operator.is_comparison()) {
            return Err(Error::internal(
                "comparison used as a compound assignment operator",
                span.start.clone(),
            ));
        }

        Ok(AssignmentExpr {
            target,
            operator,
            value,
            span,
        })
    }
}

impl Expression for AssignmentExpr {
    fn get_expr_type(&self) -> ExprType {
        ExprType::Assignment
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> ExprWrapper {
        ExprWrapper::new(self.clone())
    }
    fn get_span(&self) -> &Span {
        &self.span
    }
    fn get_type(&self, scope: &DeclarationScope) -> Result<TypeRef, Error> {
        self.target.get_type(scope)
    }
    fn lower(&self) -> ExprWrapper {
        let value = self.value.lower();

        // a op= b => a = a op b
        let value = match self.operator {
            Some(operator) => ExprWrapper::new(ArithmeticExpr {
                operator,
                left: self.target.lower(),
                right: value,
                span: self.span.clone(),
            }),
            None => value,
        };

        ExprWrapper::new(AssignmentExpr {
            target: self.target.lower(),
            operator: None,
            value,
            span: self.span.clone(),
        })
    }
    fn emit_to(&self, scope: &mut DeclarationScope) -> Result<(), Error> {
        if self.operator.is_some() {
            return Err(Error::internal(
                "compound assignment reached emission without being lowered",
                self.span.start.clone(),
            ));
        }
        let target = match self.target.downcast_ref::<IdentifierExpr>() {
            Some(target) => target,
            None => {
                return Err(Error::internal(
                    "assignment target is not an identifier",
                    self.span.start.clone(),
                ))
            }
        };

        let target_type = target.get_type(scope)?;
        let value_type = value_type(&self.value, scope)?;

        self.value.emit_to(scope)?;
        scope.emit_conversion(&value_type, &target_type, false);
        scope.emit(Instruction::Dup);
        target.emit_store(scope)
    }
    fn sub_expressions(&self) -> Vec<&ExprWrapper> {
        vec![&self.target, &self.value]
    }
}
