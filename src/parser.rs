use crate::ast::{Constants, Dict, Value};
use crate::error::{CfgError, ParseError};
use crate::evaluator::Evaluator;
use crate::lexer::{
    Lexer, Token, ARRAY_OPEN, CLOSE_PAREN, COLON, COMMA, DICT_CLOSE, DICT_OPEN, OPEN_PAREN, PIPE,
};
use crate::resolver::{find_closing_pipe, Resolver};
use crate::utils::{
    float_value, get_line_and_column, integer_value, is_float_literal, is_integer_literal, is_key,
};
use miette::{NamedSource, SourceSpan};
use std::sync::Arc;

/// Parser settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject key candidates that do not match the key grammar instead of
    /// skipping them.
    pub strict_keys: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }
}

/// Parser for the bracket grammar.
///
/// Construction lexes the source and resolves `set` directives; the parse
/// methods are then pure functions over token slices that return the parsed
/// value together with the number of tokens they consumed.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    source_text: &'a str,
    tokens: Vec<Token>,
    constants: Constants,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Result<Self, CfgError> {
        Self::new_with_name(source_text, "source.conf".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Result<Self, CfgError> {
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));
        let tokens = Lexer::new(source_text).lex();

        let mut resolver = Resolver::new(&source);
        let tokens = resolver.resolve(tokens)?;
        let constants = resolver.constants;
        log::debug!(
            "resolved {} constants, {} tokens left",
            constants.len(),
            tokens.len()
        );

        Ok(Self {
            source,
            source_text,
            tokens,
            constants,
            options: ParseOptions::default(),
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn into_constants(self) -> Constants {
        self.constants
    }

    /// Tokens left after directive removal.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    // === Main Parsing Methods ===

    /// Parses every top-level dictionary and merges them into one, later keys
    /// overwriting earlier ones. Tokens outside a dictionary are ignored.
    pub fn parse_document(&self) -> Result<Dict, CfgError> {
        let mut root = Dict::new();
        let mut i = 0;

        while i < self.tokens.len() {
            if self.tokens[i].is(DICT_OPEN) {
                let (dict, consumed) = self.parse_dict(&self.tokens[i..])?;
                log::debug!("merging top-level dictionary with {} keys", dict.len());
                root.merge(dict);
                i += consumed;
            } else {
                i += 1;
            }
        }

        Ok(root)
    }

    /// Parses array elements up to and including the closing `)`.
    ///
    /// `tokens` starts right after the `'(` opener. An array that runs out of
    /// tokens ends there.
    pub fn parse_array(&self, tokens: &[Token]) -> Result<(Vec<Value>, usize), CfgError> {
        let mut items = Vec::new();
        let mut i = 0;

        while let Some(token) = tokens.get(i) {
            if token.is(CLOSE_PAREN) {
                return Ok((items, i + 1));
            }

            if token.is(ARRAY_OPEN) {
                let (nested, consumed) = self.parse_array(&tokens[i + 1..])?;
                items.push(Value::Array(nested));
                i += 1 + consumed;
            } else if token.is(DICT_OPEN) {
                let (nested, consumed) = self.parse_dict(&tokens[i..])?;
                items.push(Value::Dict(nested));
                i += consumed;
            } else {
                items.push(self.element_value(token)?);
                i += 1;
            }
        }

        Ok((items, i))
    }

    /// Parses a dictionary up to and including its `])`.
    ///
    /// `tokens` starts at the `([` opener.
    pub fn parse_dict(&self, tokens: &[Token]) -> Result<(Dict, usize), CfgError> {
        let open = &tokens[0];
        let mut dict = Dict::new();
        let mut i = 1;

        loop {
            let Some(token) = tokens.get(i) else {
                return Err(ParseError::UnclosedDict {
                    src: self.src(),
                    span: open.span(),
                }
                .into());
            };

            if token.is(DICT_CLOSE) {
                return Ok((dict, i + 1));
            }

            // Leftovers of array delimiters.
            if token.is(OPEN_PAREN) || token.is(CLOSE_PAREN) {
                i += 1;
                continue;
            }

            let key = token.text.trim_end_matches(']');
            if !is_key(key) {
                self.skip_key(token)?;
                i += 1;
                continue;
            }
            i += 1;

            let colon = match tokens.get(i) {
                Some(colon) if colon.is(COLON) => colon,
                _ => {
                    return Err(ParseError::MissingColon {
                        src: self.src(),
                        span: token.span(),
                        key: key.to_string(),
                    }
                    .into())
                }
            };
            i += 1;

            let value_token = match tokens.get(i) {
                Some(t) if !t.is(DICT_CLOSE) && !t.is(COMMA) => t,
                other => {
                    let span = other.map_or(SourceSpan::from((colon.pos_end, 0)), Token::span);
                    return Err(ParseError::MissingValue {
                        src: self.src(),
                        span,
                        key: key.to_string(),
                    }
                    .into());
                }
            };

            let (value, consumed) = self.pair_value(&tokens[i..])?;
            i += consumed;
            match value {
                Some(_) if dict.contains_key(key) => {
                    log::warn!(
                        "duplicate key {key} at {}, keeping the first value",
                        self.location(token)
                    );
                }
                Some(value) => {
                    dict.insert(key, value);
                }
                None => log::debug!("{key} has an empty expression, left out"),
            }

            // `A: 1])` lexes as `1]` `)`: the brackets glued to the value close the dict.
            if consumed == 1
                && value_token.text.ends_with(']')
                && tokens.get(i).is_some_and(|t| t.is(CLOSE_PAREN))
            {
                return Ok((dict, i + 1));
            }

            if tokens.get(i).is_some_and(|t| t.is(COMMA)) {
                i += 1;
            }
        }
    }

    /// Parses the value of a dictionary pair. `tokens` starts at the value.
    fn pair_value(&self, tokens: &[Token]) -> Result<(Option<Value>, usize), CfgError> {
        let token = &tokens[0];
        let text = token.text.trim_end_matches(']');

        if text == ARRAY_OPEN {
            let (items, consumed) = self.parse_array(&tokens[1..])?;
            return Ok((Some(Value::Array(items)), 1 + consumed));
        }

        if text == DICT_OPEN {
            let (dict, consumed) = self.parse_dict(tokens)?;
            return Ok((Some(Value::Dict(dict)), consumed));
        }

        if text == PIPE {
            let close = find_closing_pipe(tokens, 1).ok_or_else(|| ParseError::UnclosedExpression {
                src: self.src(),
                span: token.span(),
            })?;
            let value = Evaluator::new(&self.constants, &self.source).evaluate(&tokens[1..close])?;
            return Ok((value, close + 1));
        }

        // `'X 1 2 )`: a quote that is not followed by `(` still opens an array
        // when a bare `)` closes it; whatever is glued to the quote is dropped.
        if let Some(tag) = text.strip_prefix('\'').filter(|_| opens_quoted_array(tokens)) {
            log::warn!(
                "array opened with '{text}' at {}, ignoring '{tag}'",
                self.location(token)
            );
            let (items, consumed) = self.parse_array(&tokens[1..])?;
            return Ok((Some(Value::Array(items)), 1 + consumed));
        }

        if let Some(value) = self.constants.get(text) {
            return Ok((Some(value.clone()), 1));
        }

        self.literal(text, token.span()).map(|value| (Some(value), 1))
    }

    /// Parses an array element that is not a nested array or dictionary.
    ///
    /// Only integers and constants are recognized; anything else, floats
    /// included, is kept verbatim.
    fn element_value(&self, token: &Token) -> Result<Value, CfgError> {
        if is_integer_literal(&token.text) {
            return Ok(integer_value(&token.text, token.span(), &self.source)?);
        }
        if let Some(value) = self.constants.get(&token.text) {
            return Ok(value.clone());
        }
        Ok(Value::String(token.text.clone()))
    }

    /// Integer, float or raw string.
    fn literal(&self, text: &str, span: SourceSpan) -> Result<Value, CfgError> {
        if is_integer_literal(text) {
            return Ok(integer_value(text, span, &self.source)?);
        }
        if is_float_literal(text) {
            if let Some(value) = float_value(text) {
                return Ok(value);
            }
        }
        Ok(Value::String(text.to_string()))
    }

    fn skip_key(&self, token: &Token) -> Result<(), CfgError> {
        if self.options.strict_keys && !token.is(COMMA) {
            return Err(ParseError::InvalidKey {
                src: self.src(),
                span: token.span(),
                key: token.text.clone(),
            }
            .into());
        }
        log::debug!(
            "skipping '{}' at {}: not a key",
            token.text,
            self.location(token)
        );
        Ok(())
    }

    // === Helpers ===

    fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    fn location(&self, token: &Token) -> String {
        let (line, column) = get_line_and_column(self.source_text, token.pos_start);
        format!("{line}:{column}")
    }
}

/// Whether a quote-led value starts an array: it has elements, and a bare `)`
/// comes before the next `:` or `])`.
fn opens_quoted_array(tokens: &[Token]) -> bool {
    match tokens.get(1) {
        Some(next) if !next.is(COMMA) && !next.is(DICT_CLOSE) => {}
        _ => return false,
    }
    tokens[1..]
        .iter()
        .find(|t| t.is(CLOSE_PAREN) || t.is(DICT_CLOSE) || t.is(COLON))
        .is_some_and(|t| t.is(CLOSE_PAREN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> Dict {
        let parser = Parser::new_with_name(source, "test.conf".to_string()).unwrap();
        match parser.parse_document() {
            Ok(doc) => doc,
            Err(err) => {
                let report = Report::from(err);
                panic!("{:?}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ParseError {
        let result = Parser::new(source).and_then(|parser| parser.parse_document());
        match result {
            Err(CfgError::Parse(err)) => err,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("([ ])").is_empty());
    }

    #[test]
    fn test_simple_pairs() {
        let doc = parse_ok("([ Port: 8080, Host: localhost, Ratio: 0.75 ])");
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["Port", "Host", "Ratio"]);
        assert_eq!(doc.get("Port"), Some(&Value::Integer(8080)));
        assert_eq!(doc.get("Host"), Some(&Value::String("localhost".into())));
        assert_eq!(doc.get("Ratio"), Some(&Value::Float(0.75)));
    }

    #[test]
    fn test_inline_expression() {
        let doc = parse_ok("(['A: 10, B: |2 3 mod()|])");
        assert_eq!(doc.get("A"), Some(&Value::Integer(10)));
        assert_eq!(doc.get("B"), Some(&Value::Integer(2)));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_array_value() {
        let doc = parse_ok("([ A: '( 1 2 3 ) ])");
        assert_eq!(doc.get("A"), Some(&ints(&[1, 2, 3])));
    }

    #[test]
    fn test_quoted_array_opener() {
        let doc = parse_ok("(['A: 'X 1 2 )])");
        assert_eq!(doc.get("A"), Some(&ints(&[1, 2])));
    }

    #[test]
    fn test_quoted_string_value() {
        let doc = parse_ok("([ Name: 'bob', Port: 80 ])");
        assert_eq!(doc.get("Name"), Some(&Value::String("'bob'".into())));
        assert_eq!(doc.get("Port"), Some(&Value::Integer(80)));

        let doc = parse_ok("([ Name: 'bob' Port: 80 ])");
        assert_eq!(doc.get("Name"), Some(&Value::String("'bob'".into())));
        assert_eq!(doc.get("Port"), Some(&Value::Integer(80)));

        let doc = parse_ok("([ Name: 'bob' ])");
        assert_eq!(doc.get("Name"), Some(&Value::String("'bob'".into())));
    }

    #[test]
    fn test_array_elements_keep_float_text() {
        let doc = parse_ok("([ A: '( 1.50 6.0e3 2 ) ])");
        assert_eq!(
            doc.get("A"),
            Some(&Value::Array(vec![
                Value::String("1.50".into()),
                Value::String("6.0e3".into()),
                Value::Integer(2),
            ]))
        );
    }

    #[test]
    fn test_nested_arrays_and_dicts() {
        let doc = parse_ok("([ A: '( '( 1 2 ) 3 ([ B: 4 ]) ), C: ([ D: x ]), E: 5 ])");
        assert_eq!(
            doc.get("A"),
            Some(&Value::Array(vec![
                ints(&[1, 2]),
                Value::Integer(3),
                Value::Dict([("B".to_string(), Value::Integer(4))].into_iter().collect()),
            ]))
        );
        let inner = doc.get("C").and_then(Value::as_dict).unwrap();
        assert_eq!(inner.get("D"), Some(&Value::String("x".into())));
        assert_eq!(doc.get("E"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_constants_in_values_and_elements() {
        let doc = parse_ok("set N = 3; set NAME = srv; ([ A: N, B: '( N NAME ), C: |N 1 +| ])");
        assert_eq!(doc.get("A"), Some(&Value::Integer(3)));
        assert_eq!(
            doc.get("B"),
            Some(&Value::Array(vec![Value::Integer(3), Value::String("srv".into())]))
        );
        assert_eq!(doc.get("C"), Some(&Value::Integer(4)));
    }

    #[test]
    fn test_top_level_merge_later_wins() {
        let doc = parse_ok("([ A: 1, B: 2 ]) ignored ([ A: 3 ])");
        assert_eq!(doc.get("A"), Some(&Value::Integer(3)));
        assert_eq!(doc.get("B"), Some(&Value::Integer(2)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_key_in_one_dict_keeps_first() {
        let doc = parse_ok("([ A: 1, A: 2 ])");
        assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_invalid_key_is_skipped() {
        let doc = parse_ok("([ lowercase A: 1 ])");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_strict_keys() {
        let parser = Parser::new("([ lowercase A: 1 ])")
            .unwrap()
            .with_options(ParseOptions::new().strict_keys(true));
        let result = parser.parse_document();
        assert!(matches!(
            result,
            Err(CfgError::Parse(ParseError::InvalidKey { ref key, .. })) if key == "lowercase"
        ));
    }

    #[test]
    fn test_glued_close_bracket() {
        let doc = parse_ok("([ A: 1, B: two])");
        assert_eq!(doc.get("B"), Some(&Value::String("two".into())));
        let doc = parse_ok("([ A: 1]) ([ C: 2 ])");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_missing_colon() {
        match parse_err("([ A 1 ])") {
            ParseError::MissingColon { key, .. } => assert_eq!(key, "A"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_missing_value() {
        match parse_err("([ A: ])") {
            ParseError::MissingValue { key, .. } => assert_eq!(key, "A"),
            other => panic!("{other:?}"),
        }
        assert!(matches!(parse_err("([ A:"), ParseError::MissingValue { .. }));
    }

    #[test]
    fn test_unclosed_expression() {
        assert!(matches!(
            parse_err("([ A: | 1 2 + ])"),
            ParseError::UnclosedExpression { .. }
        ));
    }

    #[test]
    fn test_unclosed_dict() {
        assert!(matches!(parse_err("([ A: 1"), ParseError::UnclosedDict { .. }));
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(matches!(
            parse_err("([ A: 99999999999999999999 ])"),
            ParseError::IntegerOutOfRange { .. }
        ));
    }

    #[test]
    fn test_integer_literals_agree_across_contexts() {
        let doc = parse_ok("([ A: -42, B: '( -42 ), C: | -42 | ])");
        assert_eq!(doc.get("A"), Some(&Value::Integer(-42)));
        assert_eq!(doc.get("B"), Some(&ints(&[-42])));
        assert_eq!(doc.get("C"), Some(&Value::Integer(-42)));
    }
}
