use crate::ast::Value;
use crate::error::ParseError;
use miette::{NamedSource, SourceSpan};

/// Calculates the 1-based line and column number for a given byte position in the source text.
/// Only meant for diagnostics and log messages, as it walks the source up to `position`.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

fn split_sign(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

/// `[+-]?(0|[1-9][0-9]*)`
pub fn is_integer_literal(text: &str) -> bool {
    let digits = split_sign(text);
    match digits.as_bytes() {
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

/// `[+-]?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?`
pub fn is_float_literal(text: &str) -> bool {
    let body = split_sign(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let Some((whole, fraction)) = mantissa.split_once('.') else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole)
        && all_digits(fraction)
        && exponent.map_or(true, |e| all_digits(split_sign(e)))
}

/// `[_A-Z][_a-zA-Z0-9]*`
pub fn is_key(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_uppercase() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Parses text already known to match the integer grammar.
pub(crate) fn integer_value(
    text: &str,
    span: SourceSpan,
    src: &NamedSource<String>,
) -> Result<Value, ParseError> {
    text.parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| ParseError::IntegerOutOfRange {
            src: src.clone(),
            span,
            literal: text.to_string(),
        })
}

/// Parses a token already known to match the float grammar.
pub(crate) fn float_value(text: &str) -> Option<Value> {
    text.parse::<f64>().ok().map(Value::Float)
}
