//! Directive discovery in raw Solidity source text
//!
//! The scanner walks the text once, tracking whether it is inside code, a
//! comment, or a string literal, and reports every `@Name` / `@Name(0x…)`
//! token found in code together with its exact byte span.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Directive, LineIndex, Position, Span};

/// What was wrong with a directive occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ParseErrorKind {
    MalformedAddress { literal: String, reason: String },
    UnterminatedAddress { literal: String },
}

/// A malformed directive, located in the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub name: String,
    pub kind: ParseErrorKind,
    pub span: Span,
    pub position: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::MalformedAddress { literal, reason } => write!(
                f,
                "{}: malformed address `{}` for @{}: {}",
                self.position, literal, self.name, reason
            ),
            ParseErrorKind::UnterminatedAddress { literal } => write!(
                f,
                "{}: address `{}` for @{} is not followed by `)`",
                self.position, literal, self.name
            ),
        }
    }
}

/// Directives in source order plus every malformed occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    pub directives: Vec<Directive>,
    pub errors: Vec<ParseError>,
}

impl ScanOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
}

/// Scan `text` for interface directives.
pub fn scan(text: &str) -> ScanOutput {
    DirectiveScanner::new(text).run()
}

struct DirectiveScanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    lines: LineIndex,
    output: ScanOutput,
}

impl<'a> DirectiveScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            lines: LineIndex::new(text),
            output: ScanOutput::default(),
        }
    }

    fn run(mut self) -> ScanOutput {
        let mut state = State::Code;
        let mut i = 0;

        while i < self.bytes.len() {
            let b = self.bytes[i];
            let next = self.bytes.get(i + 1).copied();

            match state {
                State::Code => match (b, next) {
                    (b'/', Some(b'/')) => {
                        state = State::LineComment;
                        i += 2;
                    }
                    (b'/', Some(b'*')) => {
                        state = State::BlockComment;
                        i += 2;
                    }
                    (b'"' | b'\'', _) => {
                        state = State::Str(b);
                        i += 1;
                    }
                    (b'@', Some(c)) if c.is_ascii_uppercase() => {
                        i = self.read_directive(i);
                    }
                    _ => i += 1,
                },
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Code;
                    }
                    i += 1;
                }
                State::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        state = State::Code;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                State::Str(quote) => {
                    if b == b'\\' {
                        i += 2;
                    } else {
                        // Solidity string literals cannot span lines
                        if b == quote || b == b'\n' {
                            state = State::Code;
                        }
                        i += 1;
                    }
                }
            }
        }

        tracing::debug!(
            "Scanned {} directive(s), {} error(s)",
            self.output.directives.len(),
            self.output.errors.len()
        );
        self.output
    }

    /// Reads the token starting at the `@` at `start` and returns the offset to
    /// continue scanning from.
    fn read_directive(&mut self, start: usize) -> usize {
        let name_end = self.skip_while(start + 1, is_ident_byte);
        let name = &self.text[start + 1..name_end];
        let span = Span::new(start, name_end);
        let position = self.lines.position(self.text, start);

        if self.bytes.get(name_end) != Some(&b'(') {
            self.output
                .directives
                .push(Directive::preset_only(name, span, position));
            return name_end;
        }

        let literal_start = self.skip_while(name_end + 1, |b| b.is_ascii_whitespace());
        let rest = &self.bytes[literal_start..];
        if !(rest.starts_with(b"0x") || rest.starts_with(b"0X")) {
            // An ordinary parenthesized expression such as a cast: `@IERC20(token)`
            self.output
                .directives
                .push(Directive::preset_only(name, span, position));
            return name_end;
        }

        let literal_end = self.skip_while(literal_start + 2, |b| b.is_ascii_alphanumeric());
        let literal = &self.text[literal_start..literal_end];
        let argument_span = Span::new(literal_start, literal_end);
        let close = self.skip_while(literal_end, |b| b.is_ascii_whitespace());
        let closed = self.bytes.get(close) == Some(&b')');

        match Address::parse(literal) {
            Ok(address) if closed => {
                self.output.directives.push(Directive::address_bound(
                    name,
                    address,
                    span,
                    argument_span,
                    position,
                ));
            }
            Ok(_) => self.push_error(
                name,
                ParseErrorKind::UnterminatedAddress {
                    literal: literal.to_string(),
                },
                argument_span,
            ),
            Err(reason) => self.push_error(
                name,
                ParseErrorKind::MalformedAddress {
                    literal: literal.to_string(),
                    reason: reason.to_string(),
                },
                argument_span,
            ),
        }
        name_end
    }

    fn push_error(&mut self, name: &str, kind: ParseErrorKind, span: Span) {
        let position = self.lines.position(self.text, span.start);
        self.output.errors.push(ParseError {
            name: name.to_string(),
            kind,
            span,
            position,
        });
    }

    fn skip_while(&self, mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
        while i < self.bytes.len() && pred(self.bytes[i]) {
            i += 1;
        }
        i
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
