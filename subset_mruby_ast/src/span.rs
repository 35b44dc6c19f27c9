//! Span information for source locations

use serde::{Deserialize, Serialize};

/// Byte range of a token together with its starting line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
    /// Line number (1-indexed)
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    /// Get the length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Line start table for mapping byte offsets to lines
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte positions where each line starts
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
        Self { line_starts }
    }

    /// Line (1-indexed) containing a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Create a span with line information
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(start, end, self.line_of(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("ab\ncd\n\nef");

        assert_eq!(index.line_of(0), 1); // 'a'
        assert_eq!(index.line_of(2), 1); // '\n'
        assert_eq!(index.line_of(3), 2); // 'c'
        assert_eq!(index.line_of(6), 3); // empty line
        assert_eq!(index.line_of(7), 4); // 'e'
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_span() {
        let index = LineIndex::new("x\n(int)");
        let span = index.span(2, 7);
        assert_eq!(span.line, 2);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }
}
