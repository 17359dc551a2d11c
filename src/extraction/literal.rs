//! Strict literal reader for collaborator output
//!
//! Accepts a small, closed grammar of data literals:
//! dicts, lists/tuples, quoted strings, numbers, booleans and `None`/`null`.
//! Identifiers, calls, operators and anything after the top-level value are
//! rejected, so malformed or hostile text fails instead of being evaluated.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Maximum nesting of dicts and lists
const MAX_DEPTH: usize = 16;

/// A parsed literal value
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<LiteralValue>),
    Dict(BTreeMap<String, LiteralValue>),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Dict(map) => {
                let rendered: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

/// Collaborator output that could not be read
#[derive(Debug, Error, PartialEq)]
#[error("Parse error at offset {offset}: {message}")]
pub struct ParseError {
    /// Byte offset into the (fence-stripped) input
    pub offset: usize,

    /// What went wrong
    pub message: String,

    /// The text as received, kept for diagnostics
    pub raw: String,
}

/// Parses a single literal value, rejecting trailing input
///
/// # Example
///
/// ```
/// use vc_harvester::extraction::{parse_literal, LiteralValue};
///
/// let value = parse_literal("['a', None, True, 3]").unwrap();
/// assert_eq!(
///     value,
///     LiteralValue::List(vec![
///         LiteralValue::Str("a".to_string()),
///         LiteralValue::None,
///         LiteralValue::Bool(true),
///         LiteralValue::Int(3),
///     ])
/// );
/// assert!(parse_literal("__import__('os')").is_err());
/// ```
pub fn parse_literal(text: &str) -> Result<LiteralValue, ParseError> {
    let body = strip_code_fence(text);
    let mut reader = Reader::new(body);

    let result = reader.read_document();
    result.map_err(|(offset, message)| ParseError {
        offset,
        message,
        raw: text.to_string(),
    })
}

/// Parses collaborator output into a field mapping
///
/// The top-level value must be a dict.
pub fn parse_payload(text: &str) -> Result<BTreeMap<String, LiteralValue>, ParseError> {
    match parse_literal(text)? {
        LiteralValue::Dict(map) => Ok(map),
        other => Err(ParseError {
            offset: 0,
            message: format!("expected a mapping at top level, found {}", kind_name(&other)),
            raw: text.to_string(),
        }),
    }
}

fn kind_name(value: &LiteralValue) -> &'static str {
    match value {
        LiteralValue::None => "None",
        LiteralValue::Bool(_) => "a boolean",
        LiteralValue::Int(_) | LiteralValue::Float(_) => "a number",
        LiteralValue::Str(_) => "a string",
        LiteralValue::List(_) => "a list",
        LiteralValue::Dict(_) => "a mapping",
    }
}

/// Removes one surrounding Markdown code fence, with or without a language tag
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "python") on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

type ReadResult<T> = Result<T, (usize, String)>;

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn read_document(&mut self) -> ReadResult<LiteralValue> {
        self.skip_whitespace();
        let value = self.read_value()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(value)
    }

    fn error(&self, message: impl Into<String>) -> (usize, String) {
        (self.pos, message.into())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> ReadResult<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn read_value(&mut self) -> ReadResult<LiteralValue> {
        match self.peek() {
            Some('{') => self.nested(|r| r.read_dict()),
            Some('[') => self.nested(|r| r.read_sequence('[', ']')),
            Some('(') => self.nested(|r| r.read_sequence('(', ')')),
            Some('\'') | Some('"') => self.read_string().map(LiteralValue::Str),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.read_number(),
            Some(c) if c.is_ascii_alphabetic() => self.read_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(
        &mut self,
        read: impl FnOnce(&mut Self) -> ReadResult<LiteralValue>,
    ) -> ReadResult<LiteralValue> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = read(self);
        self.depth -= 1;
        value
    }

    fn read_dict(&mut self) -> ReadResult<LiteralValue> {
        self.expect('{')?;
        let mut map = BTreeMap::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(LiteralValue::Dict(map));
            }

            let key = match self.peek() {
                Some('\'') | Some('"') => self.read_string()?,
                _ => return Err(self.error("mapping keys must be quoted strings")),
            };
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.read_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(LiteralValue::Dict(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{}'", c))),
                None => return Err(self.error("unterminated mapping")),
            }
        }
    }

    fn read_sequence(&mut self, open: char, close: char) -> ReadResult<LiteralValue> {
        self.expect(open)?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(LiteralValue::List(items));
            }

            items.push(self.read_value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(LiteralValue::List(items)),
                Some(c) => {
                    return Err(self.error(format!("expected ',' or '{}', found '{}'", close, c)))
                }
                None => return Err(self.error("unterminated sequence")),
            }
        }
    }

    fn read_string(&mut self) -> ReadResult<String> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.read_escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn read_escape(&mut self) -> ReadResult<char> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            Some('/') => Ok('/'),
            Some('x') => {
                let code = self.read_hex(2)?;
                char::from_u32(code).ok_or_else(|| self.error("invalid \\x escape"))
            }
            Some('U') => {
                let code = self.read_hex(8)?;
                char::from_u32(code).ok_or_else(|| self.error("invalid unicode code point"))
            }
            Some('u') => {
                let code = self.read_hex(4)?;
                if (0xD800..0xDC00).contains(&code) && self.input[self.pos..].starts_with("\\u") {
                    // High surrogate followed by another escape: combine into one code point
                    let resume = self.pos;
                    self.pos += 2;
                    let low = self.read_hex(4)?;
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        return char::from_u32(combined)
                            .ok_or_else(|| self.error("invalid surrogate pair"));
                    }
                    self.pos = resume;
                }
                char::from_u32(code).ok_or_else(|| self.error("invalid unicode code point"))
            }
            Some(c) => Err(self.error(format!("unsupported escape '\\{}'", c))),
            None => Err(self.error("unterminated escape")),
        }
    }

    fn read_hex(&mut self, digits: usize) -> ReadResult<u32> {
        let input = self.input;
        let end = self.pos + digits;
        let hex = input
            .get(self.pos..end)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error(format!("expected {} hex digits in escape", digits)))?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| self.error(format!("invalid hex escape '{}'", hex)))?;
        self.pos = end;
        Ok(code)
    }

    fn read_number(&mut self) -> ReadResult<LiteralValue> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') {
                self.bump();
            } else if matches!(c, '-' | '+')
                && matches!(self.input[..self.pos].chars().last(), Some('e') | Some('E'))
            {
                self.bump();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if let Ok(i) = text.parse::<i64>() {
            return Ok(LiteralValue::Int(i));
        }
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(LiteralValue::Float(x)),
            _ => Err((start, format!("invalid number '{}'", text))),
        }
    }

    fn read_keyword(&mut self) -> ReadResult<LiteralValue> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }

        match &self.input[start..self.pos] {
            "None" | "null" => Ok(LiteralValue::None),
            "True" | "true" => Ok(LiteralValue::Bool(true)),
            "False" | "false" => Ok(LiteralValue::Bool(false)),
            other => Err((start, format!("unsupported identifier '{}'", other))),
        }
    }
}
