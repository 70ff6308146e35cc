//! Byte offsets to line/column positions
//!
//! Warnings and tokens carry byte offsets only. These helpers turn them into
//! 1-based line/column pairs for diagnostics; columns count code points.

use memchr::memchr_iter;
use std::fmt;

/// A position in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in code points)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Position of `offset` in `input`, clamped to the input length
    pub fn from_offset(input: &str, offset: usize) -> Self {
        LineIndex::new(input).position(offset)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Line start table for repeated lookups in one input
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    input: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `input`
    pub fn new(input: &'a str) -> Self {
        let mut line_starts = Vec::with_capacity(16);
        line_starts.push(0);
        line_starts.extend(memchr_iter(b'\n', input.as_bytes()).map(|nl| nl + 1));
        Self { input, line_starts }
    }

    /// Number of lines
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset`, clamped to the input length
    pub fn position(&self, offset: usize) -> SourcePosition {
        let mut offset = offset.min(self.input.len());
        while !self.input.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.input[line_start..offset].chars().count() + 1;

        SourcePosition::new(offset, line + 1, column)
    }
}
