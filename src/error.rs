use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CfgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParseError {
    #[error("Unclosed expression")]
    #[diagnostic(
        code(parser::unclosed_expression),
        help("An expression opened with '|' must be closed by a matching '|'.")
    )]
    UnclosedExpression {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expression opened here is never closed")]
        span: SourceSpan,
    },

    #[error("Expected ':' after key {key}")]
    #[diagnostic(
        code(parser::missing_colon),
        help("Every dictionary key must be followed by ':' and a value.")
    )]
    MissingColon {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected ':' after this key")]
        span: SourceSpan,
        key: String,
    },

    #[error("Expected value after ':' for key {key}")]
    #[diagnostic(
        code(parser::missing_value),
        help("Write a number, a name, a constant, an array, a dictionary or a '|...|' expression after ':'.")
    )]
    MissingValue {
        #[source_code]
        src: NamedSource<String>,
        #[label("Value for {key} expected here")]
        span: SourceSpan,
        key: String,
    },

    #[error("Unclosed dictionary")]
    #[diagnostic(
        code(parser::unclosed_dict),
        help("A dictionary opened with '([' must be closed by '])'.")
    )]
    UnclosedDict {
        #[source_code]
        src: NamedSource<String>,
        #[label("Dictionary opened here is never closed")]
        span: SourceSpan,
    },

    #[error("Invalid key {key}")]
    #[diagnostic(
        code(parser::invalid_key),
        help("Keys start with an uppercase letter or '_' and continue with letters, digits or '_'.")
    )]
    InvalidKey {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a valid key")]
        span: SourceSpan,
        key: String,
    },

    #[error("Integer literal {literal} is out of range")]
    #[diagnostic(
        code(parser::integer_out_of_range),
        help("Integers must fit in a signed 64-bit value.")
    )]
    IntegerOutOfRange {
        #[source_code]
        src: NamedSource<String>,
        #[label("Too large")]
        span: SourceSpan,
        literal: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum EvalError {
    #[error("Type mismatch: '{operator}' cannot be applied to {left} and {right}")]
    #[diagnostic(
        code(evaluator::type_mismatch),
        help("'+', '-' and 'mod()' need numbers; 'concat()' needs numbers or names.")
    )]
    TypeMismatch {
        #[source_code]
        src: NamedSource<String>,
        #[label("Applied here")]
        span: SourceSpan,
        operator: String,
        left: String,
        right: String,
    },

    #[error("Not enough operands for '{operator}'")]
    #[diagnostic(
        code(evaluator::stack_underflow),
        help("Postfix operators take two operands that must be written before them.")
    )]
    StackUnderflow {
        #[source_code]
        src: NamedSource<String>,
        #[label("Needs two operands")]
        span: SourceSpan,
        operator: String,
    },

    #[error("Division by zero in 'mod()'")]
    #[diagnostic(code(evaluator::division_by_zero))]
    DivisionByZero {
        #[source_code]
        src: NamedSource<String>,
        #[label("Divisor is zero")]
        span: SourceSpan,
    },

    #[error("Arithmetic overflow in '{operator}'")]
    #[diagnostic(
        code(evaluator::arithmetic_overflow),
        help("Integer results must fit in a signed 64-bit value.")
    )]
    ArithmeticOverflow {
        #[source_code]
        src: NamedSource<String>,
        #[label("Overflows here")]
        span: SourceSpan,
        operator: String,
    },
}
