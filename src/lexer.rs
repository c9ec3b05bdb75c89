use miette::SourceSpan;

/// Opens an array: `'(`
pub const ARRAY_OPEN: &str = "'(";
/// Opens a dictionary: `([`
pub const DICT_OPEN: &str = "([";
/// Closes a dictionary: `])`
pub const DICT_CLOSE: &str = "])";
/// Closes an array. Also appears as transparent noise inside dictionaries and expressions.
pub const CLOSE_PAREN: &str = ")";
/// Bare `(`, transparent inside dictionaries and expressions.
pub const OPEN_PAREN: &str = "(";
/// Delimits an inline postfix expression: `| ... |`
pub const PIPE: &str = "|";
pub const COLON: &str = ":";
pub const COMMA: &str = ",";
pub const SEMICOLON: &str = ";";
pub const EQUALS: &str = "=";

/// Dictionary opener with a stray quote after it. Lexed as a plain [`DICT_OPEN`].
const QUOTED_DICT_OPEN: &str = "(['";

/// Characters that always form a token on their own.
pub const PUNCTUATION: [char; 7] = ['(', ')', '|', ',', ':', ';', '='];

/// Marks a line comment when it starts a line.
const LINE_COMMENT: &str = "\\";
/// Opens a multi-line comment block when it starts a line.
const BLOCK_COMMENT_BEGIN: &str = "=begin";
/// Closes a multi-line comment block when it starts a line.
const BLOCK_COMMENT_END: &str = "=cut";

/// A token with its text and its byte position in the source text.
///
/// Tokens carry no kind tag: bracket literals, punctuation and runs are told
/// apart by their text alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, pos_start: usize, pos_end: usize) -> Token {
        Token {
            text: text.into(),
            pos_start,
            pos_end,
        }
    }

    /// Returns `true` if the token's text is exactly `text`.
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn span(&self) -> SourceSpan {
        (self.pos_start, self.pos_end - self.pos_start).into()
    }
}

/// Splits configuration source into tokens.
///
/// Comment removal happens line by line before scanning. The lexer never
/// fails; malformed input surfaces later as a parse error.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (offset, line) in self.logical_lines() {
            lex_line(line, offset, &mut tokens);
        }
        log::debug!("lexed {} tokens", tokens.len());
        tokens
    }

    /// Returns the trimmed lines that survive comment removal, each paired with
    /// the byte offset of its first character in the input.
    ///
    /// Scanning these lines one after another is the same as scanning them
    /// joined by single spaces, as no token can span whitespace.
    pub fn logical_lines(&self) -> Vec<(usize, &'a str)> {
        let mut lines = Vec::new();
        let mut in_block_comment = false;
        let mut offset = 0;

        for raw in self.input.split('\n') {
            let line_start = offset;
            offset += raw.len() + 1;

            let line = raw.trim();
            if line.is_empty() || line.starts_with(LINE_COMMENT) {
                continue;
            }
            if line.starts_with(BLOCK_COMMENT_BEGIN) {
                in_block_comment = true;
                continue;
            }
            if line.starts_with(BLOCK_COMMENT_END) {
                in_block_comment = false;
                continue;
            }
            if in_block_comment {
                continue;
            }

            let leading = raw.len() - raw.trim_start().len();
            lines.push((line_start + leading, line));
        }
        lines
    }
}

fn is_run_char(c: char) -> bool {
    !c.is_whitespace() && !PUNCTUATION.contains(&c)
}

fn lex_line(line: &str, offset: usize, tokens: &mut Vec<Token>) {
    let mut position = 0;

    while let Some(c) = line[position..].chars().next() {
        let rest = &line[position..];
        let start = offset + position;

        if c.is_whitespace() {
            position += c.len_utf8();
            continue;
        }

        if rest.starts_with(QUOTED_DICT_OPEN) {
            tokens.push(Token::new(DICT_OPEN, start, start + QUOTED_DICT_OPEN.len()));
            position += QUOTED_DICT_OPEN.len();
            continue;
        }

        // Two-character literals win over single punctuation.
        if let Some(literal) = [ARRAY_OPEN, DICT_OPEN, DICT_CLOSE]
            .into_iter()
            .find(|literal| rest.starts_with(literal))
        {
            tokens.push(Token::new(literal, start, start + literal.len()));
            position += literal.len();
            continue;
        }

        if PUNCTUATION.contains(&c) {
            tokens.push(Token::new(c.to_string(), start, start + 1));
            position += 1;
            continue;
        }

        let len = rest.find(|c: char| !is_run_char(c)).unwrap_or(rest.len());
        tokens.push(Token::new(&rest[..len], start, start + len));
        position += len;
    }
}
