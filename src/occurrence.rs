//! Template occurrences: one `<template>` region found in a source file.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Opening tag name recognised by the scanner.
pub const TEMPLATE_TAG: &str = "template";

/// Syntactic position a template was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    /// Where an expression or statement is expected
    Expression,
    /// Directly inside a class body, in member position
    ClassMember,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expression => "expression",
            Self::ClassMember => "class-member",
        }
    }
}

/// Whitespace surrounding the meaningful part of a template's contents.
///
/// Recorded by the rewriter so printers can re-indent a template without re-deriving
/// where its text starts and ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentLayout {
    /// Content range with leading and trailing whitespace removed
    pub trimmed_range: Range<usize>,
    /// Line breaks before the first non-whitespace character
    pub leading_newlines: usize,
    /// Line breaks after the last non-whitespace character
    pub trailing_newlines: usize,
    /// Width of the indentation of the first non-blank line
    pub indent: usize,
    /// The template has no content besides whitespace
    pub is_blank: bool,
}

/// A single template occurrence, as normalized by the scanner.
///
/// All ranges are byte offsets into the original source. The rewriter preserves length,
/// so they stay valid in the rewritten text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTemplate {
    pub kind: TemplateKind,
    /// Full tag-inclusive range, `<template>` through `</template>`
    pub range: Range<usize>,
    /// Inner template text only
    pub content_range: Range<usize>,
    pub start_tag_range: Range<usize>,
    pub end_tag_range: Range<usize>,
    /// `range` in UTF-16 code units
    pub utf16_range: Range<usize>,
    /// The template source, passed through untouched
    pub contents: String,
    /// Set by the rewriter
    pub layout: Option<ContentLayout>,
}

/// Compute the whitespace layout of a template's contents.
///
/// `content_start` is the absolute offset of `contents` in the source.
pub fn content_layout(contents: &str, content_start: usize) -> ContentLayout {
    let trimmed_start = contents.len() - contents.trim_start().len();
    let trimmed_end = contents.trim_end().len();

    if trimmed_start == contents.len() {
        return ContentLayout {
            trimmed_range: content_start..content_start,
            leading_newlines: contents.matches('\n').count(),
            trailing_newlines: 0,
            indent: 0,
            is_blank: true,
        };
    }

    let leading = &contents[..trimmed_start];
    let trailing = &contents[trimmed_end..];
    // Indentation is measured on the line holding the first non-blank character
    let indent = leading.rsplit('\n').next().map_or(0, |line| line.chars().count());

    ContentLayout {
        trimmed_range: content_start + trimmed_start..content_start + trimmed_end,
        leading_newlines: leading.matches('\n').count(),
        trailing_newlines: trailing.matches('\n').count(),
        indent,
        is_blank: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_of_inline_content() {
        let layout = content_layout("Hello", 10);
        assert_eq!(layout.trimmed_range, 10..15);
        assert_eq!(layout.leading_newlines, 0);
        assert_eq!(layout.trailing_newlines, 0);
        assert_eq!(layout.indent, 0);
        assert!(!layout.is_blank);
    }

    #[test]
    fn test_layout_of_multiline_content() {
        let contents = "\n\n    <h1>Hi</h1>\n  ";
        let layout = content_layout(contents, 100);
        assert_eq!(layout.trimmed_range, 106..117);
        assert_eq!(layout.leading_newlines, 2);
        assert_eq!(layout.trailing_newlines, 1);
        assert_eq!(layout.indent, 4);
    }

    #[test]
    fn test_layout_of_blank_content() {
        let layout = content_layout("\n  \n", 5);
        assert!(layout.is_blank);
        assert_eq!(layout.trimmed_range, 5..5);
        assert_eq!(layout.leading_newlines, 2);
    }

    #[test]
    fn test_layout_of_empty_content() {
        let layout = content_layout("", 5);
        assert!(layout.is_blank);
        assert_eq!(layout.leading_newlines, 0);
    }
}
