//! Utilities for position/range conversions

use crate::error::SourceLocation;

/// Byte offsets of line starts, for turning offsets into line/column pairs.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            line_starts,
            len: content.len(),
        }
    }

    /// 1-based line and byte column for an offset. Offsets past the end clamp to the end.
    pub fn location(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        SourceLocation {
            offset,
            line: line_idx + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_on_first_line() {
        let index = LineIndex::new("const a = 1;\n<template></template>\n");
        let loc = index.location(6);
        assert_eq!((loc.line, loc.column), (1, 7));
    }

    #[test]
    fn test_location_at_line_start() {
        let index = LineIndex::new("a\nb\nc");
        let loc = index.location(2);
        assert_eq!((loc.line, loc.column), (2, 1));
        let loc = index.location(4);
        assert_eq!((loc.line, loc.column), (3, 1));
    }

    #[test]
    fn test_location_clamps_past_end() {
        let index = LineIndex::new("ab\n");
        let loc = index.location(50);
        assert_eq!(loc.offset, 3);
        assert_eq!((loc.line, loc.column), (2, 1));
    }
}
