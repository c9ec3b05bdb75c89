use crate::ast::{Constants, Value};
use crate::error::{CfgError, ParseError};
use crate::evaluator::Evaluator;
use crate::lexer::{Token, EQUALS, PIPE, SEMICOLON};
use crate::utils::{integer_value, is_integer_literal};
use miette::NamedSource;

const SET: &str = "set";

/// Strips `set NAME = VALUE [;]` directives out of a token stream and records
/// their values in a constant table.
pub struct Resolver<'a> {
    source: &'a NamedSource<String>,
    pub constants: Constants,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a NamedSource<String>) -> Self {
        Resolver {
            source,
            constants: Constants::new(),
        }
    }

    /// Resolves every directive in stream order and returns the remaining tokens.
    ///
    /// A directive can use constants defined by earlier directives.
    pub fn resolve(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>, CfgError> {
        let mut remaining = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            if !is_directive(&tokens[i..]) {
                remaining.push(tokens[i].clone());
                i += 1;
                continue;
            }

            let name = &tokens[i + 1].text;
            let value_token = &tokens[i + 3];

            let (value, next) = if value_token.is(PIPE) {
                let close = find_closing_pipe(&tokens, i + 4).ok_or_else(|| {
                    ParseError::UnclosedExpression {
                        src: self.source.clone(),
                        span: value_token.span(),
                    }
                })?;
                let evaluator = Evaluator::new(&self.constants, self.source);
                (evaluator.evaluate(&tokens[i + 4..close])?, close + 1)
            } else if is_integer_literal(&value_token.text) {
                (Some(integer_value(&value_token.text, value_token.span(), self.source)?), i + 4)
            } else {
                (Some(Value::String(value_token.text.clone())), i + 4)
            };

            match value {
                Some(value) => {
                    log::debug!("constant {name} = {value}");
                    self.constants.define(name.clone(), value);
                }
                None => log::debug!("constant {name} has an empty expression, left undefined"),
            }

            i = next;
            if tokens.get(i).is_some_and(|t| t.is(SEMICOLON)) {
                i += 1;
            }
        }

        Ok(remaining)
    }
}

/// `set NAME = VALUE` with at least one token after `=`.
fn is_directive(tokens: &[Token]) -> bool {
    tokens.len() >= 4 && tokens[0].is(SET) && tokens[2].is(EQUALS)
}

/// Index of the first `|` at or after `from`.
pub(crate) fn find_closing_pipe(tokens: &[Token], from: usize) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| t.is(PIPE))
        .map(|offset| from + offset)
}
