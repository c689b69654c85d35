//! Tokenizer for Gradle build scripts (Groovy and Kotlin DSL)
//!
//! The token stream is lossless: spans are contiguous and cover the whole
//! input, so `tokens.iter().map(|t| &input[t.span.clone()])` concatenates back
//! to the original text. Tokenizing never fails; characters that start no
//! known token are collected into `Unknown` tokens.
//!
//! Double-quoted strings containing `$name`, `$a.b`, `${name}` or `${a.b}`
//! become `StringInterpolation` tokens whose children are the literal
//! fragments and variable references, each with its own source offset.

use std::ops::Range;

/// Token classes produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Space,
    Newline,
    LineComment,
    MultiComment,
    Semicolon,
    Colon,
    Dot,
    Comma,
    Operator,
    Assignment,
    Word,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    /// Quoted string without substitutions
    String,
    /// Double-quoted string with at least one substitution
    StringInterpolation,
    /// Variable reference, only found among interpolation children
    Variable,
    /// Fallback for anything unrecognized
    Unknown,
}

impl TokenKind {
    /// Whitespace and comments, dropped before pattern matching
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Space | TokenKind::Newline | TokenKind::LineComment | TokenKind::MultiComment
        )
    }
}

/// A token with its semantic value and exact source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Unescaped content for strings, name for variables, raw text otherwise
    pub value: String,
    /// Byte offset where `value` starts in the source
    pub offset: usize,
    /// Raw byte range in the source, quotes included
    pub span: Range<usize>,
    /// Children and flags, set on `StringInterpolation` tokens only
    pub interpolation: Option<Interpolation>,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, offset: usize, span: Range<usize>) -> Self {
        Self {
            kind,
            value: value.into(),
            offset,
            span,
            interpolation: None,
        }
    }

    /// Interpolation children, empty for every other token kind
    pub fn children(&self) -> &[Token] {
        self.interpolation
            .as_ref()
            .map(|i| i.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a string's `value` is byte-for-byte its source text.
    ///
    /// Every escape sequence decodes to fewer bytes than it spans, so a length
    /// check between the delimiters is enough.
    pub fn is_verbatim(&self) -> bool {
        let delim = self.offset - self.span.start;
        self.span.len() == self.value.len() + 2 * delim
    }
}

/// Parts of an interpolated string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpolation {
    /// `String` fragments and `Variable` references in source order
    pub children: Vec<Token>,
    /// False when a `${...}` block holds anything but a (dotted) variable name
    pub is_valid: bool,
    /// False when a `${` block is not closed before the string ends
    pub is_complete: bool,
}

const OPERATORS: &[&str] = &["==", "!=", "+=", "-=", "/=", "*=", "**", "+", "-", "/", "*"];

/// Tokenize the whole input, trivia included
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).run()
}

/// Tokenize and drop whitespace, newlines and comments
pub fn significant_tokens(input: &str) -> Vec<Token> {
    tokenize(input)
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    unknown_start: Option<usize>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::with_capacity(src.len() / 4),
            unknown_start: None,
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            match self.next_token() {
                Some(token) => {
                    self.flush_unknown();
                    self.pos = token.span.end;
                    self.tokens.push(token);
                }
                None => {
                    self.unknown_start.get_or_insert(self.pos);
                    self.pos += self.char_len_at(self.pos);
                }
            }
        }
        self.flush_unknown();
        self.tokens
    }

    fn flush_unknown(&mut self) {
        if let Some(start) = self.unknown_start.take() {
            let text = &self.src[start..self.pos];
            self.tokens
                .push(Token::new(TokenKind::Unknown, text, start, start..self.pos));
        }
    }

    fn char_len_at(&self, pos: usize) -> usize {
        self.src[pos..].chars().next().map_or(1, char::len_utf8)
    }

    fn raw(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, &self.src[start..end], start, start..end)
    }

    fn next_token(&self) -> Option<Token> {
        let start = self.pos;
        let rest = &self.src[start..];
        let len = self.bytes.len();
        let b = self.bytes[start];

        if rest.starts_with("//") {
            return Some(self.raw(TokenKind::LineComment, start, self.line_end(start)));
        }
        if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map_or(len, |i| start + 2 + i + 2);
            return Some(self.raw(TokenKind::MultiComment, start, end));
        }
        if rest.starts_with("\r\n") {
            return Some(self.raw(TokenKind::Newline, start, start + 2));
        }
        if b == b'\n' {
            return Some(self.raw(TokenKind::Newline, start, start + 1));
        }
        if matches!(b, b' ' | b'\t' | b'\r' | 0x0c) {
            let mut end = start;
            while end < len
                && matches!(self.bytes[end], b' ' | b'\t' | b'\r' | 0x0c)
                && !self.bytes[end..].starts_with(b"\r\n")
            {
                end += 1;
            }
            return Some(self.raw(TokenKind::Space, start, end));
        }

        let single = match b {
            b';' => Some(TokenKind::Semicolon),
            b':' => Some(TokenKind::Colon),
            b'.' => Some(TokenKind::Dot),
            b',' => Some(TokenKind::Comma),
            b'(' => Some(TokenKind::LeftParen),
            b')' => Some(TokenKind::RightParen),
            b'[' => Some(TokenKind::LeftBracket),
            b']' => Some(TokenKind::RightBracket),
            b'{' => Some(TokenKind::LeftBrace),
            b'}' => Some(TokenKind::RightBrace),
            _ => None,
        };
        if let Some(kind) = single {
            return Some(self.raw(kind, start, start + 1));
        }

        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            return Some(self.raw(TokenKind::Operator, start, start + op.len()));
        }
        if b == b'=' {
            return Some(self.raw(TokenKind::Assignment, start, start + 1));
        }
        if is_word_start(b) {
            let mut end = start + 1;
            while end < len && is_word_char(self.bytes[end]) {
                end += 1;
            }
            return Some(self.raw(TokenKind::Word, start, end));
        }

        if rest.starts_with("'''")
            && let Some(token) = self.lex_plain_string(start, "'''")
        {
            return Some(token);
        }
        if rest.starts_with("\"\"\"")
            && let Some(token) = self.lex_gstring(start, "\"\"\"")
        {
            return Some(token);
        }
        match b {
            b'\'' => self.lex_plain_string(start, "'"),
            b'"' => self.lex_gstring(start, "\""),
            _ => None,
        }
    }

    /// End of the current line, excluding the line terminator
    fn line_end(&self, start: usize) -> usize {
        match self.bytes[start..].iter().position(|&b| b == b'\n') {
            Some(i) => {
                let newline = start + i;
                if newline > start && self.bytes[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                }
            }
            None => self.bytes.len(),
        }
    }

    /// Single-quoted strings never interpolate
    fn lex_plain_string(&self, start: usize, delim: &str) -> Option<Token> {
        let content_start = start + delim.len();
        let mut value = String::new();
        let mut i = content_start;
        loop {
            if i >= self.bytes.len() {
                return None;
            }
            if self.src[i..].starts_with(delim) {
                break;
            }
            let b = self.bytes[i];
            if delim.len() == 1 && b == b'\n' {
                return None;
            }
            if b == b'\\' {
                let (c, consumed) = self.escape_at(i)?;
                value.push(c);
                i += consumed;
                continue;
            }
            let c = self.src[i..].chars().next()?;
            value.push(c);
            i += c.len_utf8();
        }
        Some(Token::new(
            TokenKind::String,
            value,
            content_start,
            start..i + delim.len(),
        ))
    }

    fn lex_gstring(&self, start: usize, delim: &str) -> Option<Token> {
        let content_start = start + delim.len();
        let mut children = Vec::new();
        let mut literal = String::new();
        let mut literal_start = content_start;
        let mut has_substitution = false;
        let mut is_valid = true;
        let mut is_complete = true;
        let mut i = content_start;

        let content_end = loop {
            if i >= self.bytes.len() {
                return None;
            }
            if self.src[i..].starts_with(delim) {
                break i;
            }
            let b = self.bytes[i];
            if delim.len() == 1 && b == b'\n' {
                return None;
            }
            match b {
                b'\\' => {
                    let (c, consumed) = self.escape_at(i)?;
                    literal.push(c);
                    i += consumed;
                }
                b'$' if self.bytes.get(i + 1) == Some(&b'{') => {
                    has_substitution = true;
                    push_literal(&mut children, &mut literal, literal_start, i);
                    let inner_start = i + 2;
                    match self.scan_expression(inner_start, delim) {
                        Ok(close) => {
                            let inner = &self.src[inner_start..close];
                            match variable_reference(inner, inner_start) {
                                Some((name, offset)) => children.push(Token::new(
                                    TokenKind::Variable,
                                    name,
                                    offset,
                                    i..close + 1,
                                )),
                                None => is_valid = false,
                            }
                            i = close + 1;
                        }
                        Err(stop) => {
                            is_valid = false;
                            is_complete = false;
                            i = stop;
                        }
                    }
                    literal_start = i;
                }
                b'$' if self.bytes.get(i + 1).is_some_and(|&n| is_identifier_start(n)) => {
                    has_substitution = true;
                    push_literal(&mut children, &mut literal, literal_start, i);
                    let name_start = i + 1;
                    let name_end = self.dotted_identifier_end(name_start);
                    children.push(Token::new(
                        TokenKind::Variable,
                        &self.src[name_start..name_end],
                        name_start,
                        i..name_end,
                    ));
                    i = name_end;
                    literal_start = i;
                }
                _ => {
                    let c = self.src[i..].chars().next()?;
                    literal.push(c);
                    i += c.len_utf8();
                }
            }
        };
        push_literal(&mut children, &mut literal, literal_start, content_end);

        let span = start..content_end + delim.len();
        if !has_substitution {
            let value = children.pop().map(|t| t.value).unwrap_or_default();
            return Some(Token::new(TokenKind::String, value, content_start, span));
        }

        Some(Token {
            kind: TokenKind::StringInterpolation,
            value: self.src[content_start..content_end].to_string(),
            offset: content_start,
            span,
            interpolation: Some(Interpolation {
                children,
                is_valid,
                is_complete,
            }),
        })
    }

    /// Find the `}` closing a `${` block.
    ///
    /// `Err` carries the position where scanning had to stop: the end of the
    /// enclosing string, the end of the line for single-line strings, or EOF.
    fn scan_expression(&self, from: usize, delim: &str) -> Result<usize, usize> {
        let len = self.bytes.len();
        let mut depth = 0usize;
        let mut i = from;
        while i < len {
            if self.bytes[i..].starts_with(delim.as_bytes()) {
                return Err(i);
            }
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    if depth == 0 {
                        return Ok(i);
                    }
                    depth -= 1;
                }
                b'\n' if delim.len() == 1 => return Err(i),
                quote @ (b'\'' | b'"') => {
                    let mut j = i + 1;
                    while j < len && self.bytes[j] != quote && self.bytes[j] != b'\n' {
                        if self.bytes[j] == b'\\' {
                            j += 1;
                        }
                        j += 1;
                    }
                    if j >= len || self.bytes[j] != quote {
                        return Err(i);
                    }
                    i = j;
                }
                _ => {}
            }
            i += 1;
        }
        Err(len)
    }

    fn dotted_identifier_end(&self, start: usize) -> usize {
        let len = self.bytes.len();
        let mut end = start;
        loop {
            while end < len && is_identifier_char(self.bytes[end]) {
                end += 1;
            }
            let continues = end + 1 < len
                && self.bytes[end] == b'.'
                && is_identifier_start(self.bytes[end + 1]);
            if !continues {
                return end;
            }
            end += 1;
        }
    }

    /// Decode the escape sequence starting at the backslash at `i`
    fn escape_at(&self, i: usize) -> Option<(char, usize)> {
        let escaped = self.src[i + 1..].chars().next()?;
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            'u' => {
                let hex = self.src.get(i + 2..i + 6)?;
                if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                    return Some((c, 6));
                }
                'u'
            }
            other => other,
        };
        Some((decoded, 1 + escaped.len_utf8()))
    }
}

fn push_literal(children: &mut Vec<Token>, literal: &mut String, start: usize, end: usize) {
    if literal.is_empty() {
        return;
    }
    children.push(Token::new(
        TokenKind::String,
        std::mem::take(literal),
        start,
        start..end,
    ));
}

/// Accept `name` or `a.b.c` (surrounding whitespace allowed) as the body of `${...}`
fn variable_reference(inner: &str, base: usize) -> Option<(String, usize)> {
    let leading = inner.len() - inner.trim_start().len();
    let name = inner.trim();
    if name.is_empty() {
        return None;
    }
    let valid = name.split('.').all(|part| {
        let mut bytes = part.bytes();
        bytes.next().is_some_and(is_identifier_start) && bytes.all(is_identifier_char)
    });
    valid.then(|| (name.to_string(), base + leading))
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'$' || b == b'_'
}

fn is_word_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'$' || b == b'_'
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
