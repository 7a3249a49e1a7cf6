//!
//! Error types shared by every stage of the splicing pipeline.
//!
//! Any error aborts the whole per-file operation: there is no partial output.

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// A position in source text. `line` and `column` are 1-based, `column` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum SpliceError {
    /// The template tag scanner rejected the input
    #[error("{file}:{location}: failed to scan template tags: {message}")]
    Scan {
        file: String,
        message: String,
        location: SourceLocation,
    },

    /// The host parser rejected the rewritten text. Since template contents have already been
    /// replaced by placeholders, the culprit is host code outside every template region.
    #[error("{file}:{location}: syntax error: {message}")]
    HostSyntax {
        file: String,
        message: String,
        location: SourceLocation,
    },

    /// The host grammar could not be loaded
    #[error("host parser unavailable: {0}")]
    HostUnavailable(String),

    /// Templates were scanned but never matched to a host node
    #[error("failed to process all templates, {unconsumed} remaining")]
    Reconciliation { unconsumed: usize, ranges: Vec<Range<usize>> },

    /// Internal consistency check failed; indicates a bug rather than bad input
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl SpliceError {
    /// Location in the original source, for errors that carry one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Scan { location, .. } | Self::HostSyntax { location, .. } => Some(*location),
            _ => None,
        }
    }
}
