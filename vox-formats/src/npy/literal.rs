//! Strict parser for the NPY header dict literal
//!
//! The header is a Python literal such as
//! `{'descr': '<f4', 'fortran_order': False, 'shape': (400, 400, 32), }`
//! padded with spaces and a trailing newline. Values are decoded into a small
//! tagged [`Literal`] tree and then checked against the fixed schema: exactly
//! the three keys, each with its own value type, no duplicates, no extras.

use crate::error::FormatError;

/// Decoded header dict
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderDict {
    pub descr: String,
    pub fortran_order: bool,
    pub shape: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    Bool(bool),
    Int(u64),
    Tuple(Vec<Literal>),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "integer",
            Literal::Tuple(_) => "tuple",
        }
    }
}

/// Parse and validate header text; `base` is the container offset of `text[0]`
pub(crate) fn parse_header_dict(text: &str, base: u64) -> Result<HeaderDict, FormatError> {
    let mut parser = Parser {
        text,
        pos: 0,
        base,
    };
    let entries = parser.dict()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("trailing characters after header dict"));
    }

    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;

    for (key, value, at) in entries {
        let bad_type = |expected: &str, got: &Literal| {
            FormatError::header(
                base + at as u64,
                format!("'{key}' must be a {expected}, found {}", got.kind()),
            )
        };
        let slot_taken = match key.as_str() {
            "descr" => match value {
                Literal::Str(s) => descr.replace(s).is_some(),
                other => return Err(bad_type("string", &other)),
            },
            "fortran_order" => match value {
                Literal::Bool(b) => fortran_order.replace(b).is_some(),
                other => return Err(bad_type("bool", &other)),
            },
            "shape" => match value {
                Literal::Tuple(items) => {
                    let mut dims = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Literal::Int(d) => dims.push(d),
                            other => return Err(bad_type("tuple of integers", &other)),
                        }
                    }
                    shape.replace(dims).is_some()
                }
                other => return Err(bad_type("tuple", &other)),
            },
            _ => {
                return Err(FormatError::header(
                    base + at as u64,
                    format!("unexpected header key '{key}'"),
                ));
            }
        };
        if slot_taken {
            return Err(FormatError::header(
                base + at as u64,
                format!("duplicate header key '{key}'"),
            ));
        }
    }

    let missing = |key: &str| FormatError::header(base, format!("header missing '{key}'"));
    Ok(HeaderDict {
        descr: descr.ok_or_else(|| missing("descr"))?,
        fortran_order: fortran_order.ok_or_else(|| missing("fortran_order"))?,
        shape: shape.ok_or_else(|| missing("shape"))?,
    })
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    base: u64,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::header(self.base + self.pos as u64, message)
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), FormatError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    /// Consume `byte` if it is next, skipping whitespace first
    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn dict(&mut self) -> Result<Vec<(String, Literal, usize)>, FormatError> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            if self.eat(b'}') {
                return Ok(entries);
            }
            self.skip_ws();
            let at = self.pos;
            let key = match self.value()? {
                Literal::Str(s) => s,
                other => {
                    return Err(FormatError::header(
                        self.base + at as u64,
                        format!("dict keys must be strings, found {}", other.kind()),
                    ));
                }
            };
            self.expect(b':')?;
            let value = self.value()?;
            entries.push((key, value, at));
            if !self.eat(b',') {
                self.expect(b'}')?;
                return Ok(entries);
            }
        }
    }

    fn value(&mut self) -> Result<Literal, FormatError> {
        self.skip_ws();
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => self.string(q),
            Some(b'(') => self.tuple(),
            Some(b'0'..=b'9') => self.int(),
            Some(b'T' | b'F') => self.boolean(),
            Some(_) => Err(self.error("unsupported literal")),
            None => Err(self.error("unexpected end of header text")),
        }
    }

    fn string(&mut self, quote: u8) -> Result<Literal, FormatError> {
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b) if b == quote => break,
                Some(b'\\') => return Err(self.error("escape sequences are not supported")),
                Some(b'\n') | None => return Err(self.error("unterminated string")),
                Some(_) => self.pos += 1,
            }
        }
        // Quote bytes are ASCII, so both ends sit on char boundaries
        let s = self.text[start..self.pos].to_string();
        self.pos += 1;
        Ok(Literal::Str(s))
    }

    fn int(&mut self) -> Result<Literal, FormatError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let digits = &self.text[start..self.pos];
        // Python 2 era files write long integers as `3L`
        if self.peek() == Some(b'L') {
            self.pos += 1;
        }
        digits
            .parse::<u64>()
            .map(Literal::Int)
            .map_err(|_| FormatError::header(self.base + start as u64, "integer out of range"))
    }

    fn boolean(&mut self) -> Result<Literal, FormatError> {
        let rest = &self.text[self.pos..];
        for (word, value) in [("True", true), ("False", false)] {
            if rest.starts_with(word) {
                self.pos += word.len();
                return Ok(Literal::Bool(value));
            }
        }
        Err(self.error("unsupported literal"))
    }

    fn tuple(&mut self) -> Result<Literal, FormatError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            if self.eat(b')') {
                return Ok(Literal::Tuple(items));
            }
            items.push(self.value()?);
            if !self.eat(b',') {
                self.expect(b')')?;
                return Ok(Literal::Tuple(items));
            }
        }
    }
}
