use crate::ast::{Constants, Value};
use crate::error::{CfgError, EvalError};
use crate::lexer::{Token, CLOSE_PAREN, OPEN_PAREN};
use crate::utils::{float_value, integer_value, is_float_literal, is_integer_literal};
use miette::NamedSource;

/// A postfix operator. Every operator pops two operands and pushes one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mod,
    Concat,
}

impl Operator {
    /// Recognizes an operator token. Named operators are called like `mod()`, which
    /// the lexer splits into `mod`, `(`, `)`; so a name counts as an operator only
    /// when a `(` follows it.
    fn from_tokens(token: &Token, next: Option<&Token>) -> Option<Operator> {
        let called = next.is_some_and(|next| next.is(OPEN_PAREN));
        match token.text.as_str() {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "mod()" => Some(Operator::Mod),
            "concat()" => Some(Operator::Concat),
            "mod" if called => Some(Operator::Mod),
            "concat" if called => Some(Operator::Concat),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mod => "mod()",
            Operator::Concat => "concat()",
        }
    }
}

/// Evaluates `| ... |` expressions against a constant table.
pub struct Evaluator<'a> {
    constants: &'a Constants,
    source: &'a NamedSource<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(constants: &'a Constants, source: &'a NamedSource<String>) -> Self {
        Self { constants, source }
    }

    /// Evaluates the tokens between a pair of `|` markers.
    ///
    /// Returns the bottom-most value left on the stack, or `None` for an empty
    /// expression.
    pub fn evaluate(&self, tokens: &[Token]) -> Result<Option<Value>, CfgError> {
        let mut stack: Vec<Value> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if token.is(OPEN_PAREN) || token.is(CLOSE_PAREN) {
                continue;
            }

            if let Some(operator) = Operator::from_tokens(token, tokens.get(i + 1)) {
                let right = self.pop(&mut stack, operator, token)?;
                let left = self.pop(&mut stack, operator, token)?;
                stack.push(self.apply(operator, left, right, token)?);
                continue;
            }

            stack.push(self.operand(token)?);
        }

        if stack.len() > 1 {
            log::warn!(
                "expression left {} values on the stack, keeping the first",
                stack.len()
            );
        }
        Ok(stack.into_iter().next())
    }

    fn operand(&self, token: &Token) -> Result<Value, CfgError> {
        if let Some(value) = self.constants.get(&token.text) {
            return Ok(value.clone());
        }
        if is_integer_literal(&token.text) {
            return Ok(integer_value(&token.text, token.span(), self.source)?);
        }
        if is_float_literal(&token.text) {
            if let Some(value) = float_value(&token.text) {
                return Ok(value);
            }
        }
        Ok(Value::String(token.text.clone()))
    }

    fn pop(
        &self,
        stack: &mut Vec<Value>,
        operator: Operator,
        token: &Token,
    ) -> Result<Value, EvalError> {
        stack.pop().ok_or_else(|| EvalError::StackUnderflow {
            src: self.source.clone(),
            span: token.span(),
            operator: operator.symbol().to_string(),
        })
    }

    fn apply(
        &self,
        operator: Operator,
        left: Value,
        right: Value,
        token: &Token,
    ) -> Result<Value, EvalError> {
        match operator {
            Operator::Add => {
                self.arithmetic(operator, left, right, token, i64::checked_add, |a, b| a + b)
            }
            Operator::Sub => {
                self.arithmetic(operator, left, right, token, i64::checked_sub, |a, b| a - b)
            }
            Operator::Mod => self.modulo(left, right, token),
            Operator::Concat => match (&left, &right) {
                (Value::Array(_) | Value::Dict(_), _) | (_, Value::Array(_) | Value::Dict(_)) => {
                    Err(self.mismatch(operator, &left, &right, token))
                }
                _ => Ok(Value::String(format!("{left}{right}"))),
            },
        }
    }

    fn arithmetic(
        &self,
        operator: Operator,
        left: Value,
        right: Value,
        token: &Token,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, EvalError> {
        if let (Value::Integer(a), Value::Integer(b)) = (&left, &right) {
            return int_op(*a, *b)
                .map(Value::Integer)
                .ok_or_else(|| self.overflow(operator, token));
        }
        match (as_f64(&left), as_f64(&right)) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(self.mismatch(operator, &left, &right, token)),
        }
    }

    /// Truncating remainder: the result takes the sign of the dividend.
    fn modulo(&self, left: Value, right: Value, token: &Token) -> Result<Value, EvalError> {
        if let (Value::Integer(a), Value::Integer(b)) = (&left, &right) {
            if *b == 0 {
                return Err(self.division_by_zero(token));
            }
            return a
                .checked_rem(*b)
                .map(Value::Integer)
                .ok_or_else(|| self.overflow(Operator::Mod, token));
        }
        match (as_f64(&left), as_f64(&right)) {
            (Some(_), Some(b)) if b == 0.0 => Err(self.division_by_zero(token)),
            (Some(a), Some(b)) => Ok(Value::Float(a % b)),
            _ => Err(self.mismatch(Operator::Mod, &left, &right, token)),
        }
    }

    fn mismatch(&self, operator: Operator, left: &Value, right: &Value, token: &Token) -> EvalError {
        EvalError::TypeMismatch {
            src: self.source.clone(),
            span: token.span(),
            operator: operator.symbol().to_string(),
            left: left.kind_name().to_string(),
            right: right.kind_name().to_string(),
        }
    }

    fn overflow(&self, operator: Operator, token: &Token) -> EvalError {
        EvalError::ArithmeticOverflow {
            src: self.source.clone(),
            span: token.span(),
            operator: operator.symbol().to_string(),
        }
    }

    fn division_by_zero(&self, token: &Token) -> EvalError {
        EvalError::DivisionByZero {
            src: self.source.clone(),
            span: token.span(),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}
