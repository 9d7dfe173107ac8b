use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based line/character position in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    /// One-based `line:column`, the way editors and compilers print locations
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// Byte range into the original text, inclusive-exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Maps byte offsets to line/character positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Character column is counted in chars, not bytes.
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let character = text[line_start..offset].chars().count();
        Position::new(line as u32, character as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let text = "pragma solidity ^0.8.0;\n\ncontract A {\n    @DAI x;\n}\n";
        let index = LineIndex::new(text);
        let offset = text.find('@').unwrap();
        let position = index.position(text, offset);
        assert_eq!(position, Position::new(3, 4));
        assert_eq!(position.to_string(), "4:5");
        assert_eq!(index.position(text, 0), Position::new(0, 0));
    }

    #[test]
    fn test_span_slice() {
        let text = "abc @DAI def";
        let span = Span::new(4, 8);
        assert_eq!(span.slice(text), "@DAI");
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
    }
}
