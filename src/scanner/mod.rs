//! Template scanning.
//!
//! The scanner locates every `<template>` region in raw JavaScript/TypeScript source. The
//! tag grammar itself is delegated to a [`TemplateParser`]; this module only invokes it,
//! normalizes what it returns into [`RawTemplate`]s and guarantees their ordering.
//!
//! # Guarantees
//!
//! The returned templates are:
//! - sorted by ascending start offset,
//! - non-overlapping and non-empty,
//! - within bounds and on UTF-8 character boundaries.
//!
//! A parser that breaks any of these produces a [`SpliceError::Scan`] rather than a
//! silently wrong splice further down the pipeline.

pub mod content_tag;

pub use content_tag::ContentTagParser;

use crate::error::SpliceError;
use crate::occurrence::{RawTemplate, TemplateKind};
use crate::utils::LineIndex;
use crate::utils::utf8_offsets::byte_range_to_utf16;
use std::ops::Range;

/// A template region as reported by a [`TemplateParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub kind: TemplateKind,
    /// Tag-inclusive byte range
    pub range: Range<usize>,
    /// Inner content byte range
    pub content_range: Range<usize>,
}

/// Rejection reported by a [`TemplateParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub message: String,
    /// Byte offset the failure refers to
    pub offset: usize,
}

impl ScanFailure {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parser for the embedded template tag grammar.
pub trait TemplateParser: Send + Sync {
    /// Find every template region in `source`. `file_name` is only used for diagnostics.
    fn parse(&self, source: &str, file_name: &str) -> Result<Vec<TagMatch>, ScanFailure>;
}

/// Scan `source` for templates using `parser`.
pub fn scan(parser: &dyn TemplateParser, source: &str, file_name: &str) -> Result<Vec<RawTemplate>, SpliceError> {
    let scan_error = |message: String, offset: usize| SpliceError::Scan {
        file: file_name.to_string(),
        message,
        location: LineIndex::new(source).location(offset),
    };

    let mut matches = parser
        .parse(source, file_name)
        .map_err(|failure| scan_error(failure.message, failure.offset))?;
    matches.sort_by_key(|m| m.range.start);

    let mut templates = Vec::with_capacity(matches.len());
    let mut previous_end = 0;

    for tag in matches {
        if let Some(problem) = validate(source, &tag) {
            return Err(scan_error(problem, tag.range.start));
        }
        if tag.range.start < previous_end {
            return Err(scan_error(
                format!("template at {:?} overlaps the previous template", tag.range),
                tag.range.start,
            ));
        }
        previous_end = tag.range.end;

        templates.push(RawTemplate {
            kind: tag.kind,
            start_tag_range: tag.range.start..tag.content_range.start,
            end_tag_range: tag.content_range.end..tag.range.end,
            utf16_range: byte_range_to_utf16(source, &tag.range),
            contents: source[tag.content_range.clone()].to_string(),
            range: tag.range,
            content_range: tag.content_range,
            layout: None,
        });
    }

    log::debug!("{file_name}: found {} template tag(s)", templates.len());
    Ok(templates)
}

/// Describe what is wrong with `tag`, if anything
fn validate(source: &str, tag: &TagMatch) -> Option<String> {
    let TagMatch {
        range, content_range, ..
    } = tag;

    if range.is_empty() {
        return Some(format!("empty template region at {range:?}"));
    }
    if range.end > source.len() {
        return Some(format!(
            "template region {range:?} exceeds source length {}",
            source.len()
        ));
    }
    if content_range.start < range.start || content_range.end > range.end || content_range.start > content_range.end {
        return Some(format!(
            "content range {content_range:?} is not inside template region {range:?}"
        ));
    }
    let boundaries = [range.start, range.end, content_range.start, content_range.end];
    if let Some(offset) = boundaries.iter().find(|&&o| !source.is_char_boundary(o)) {
        return Some(format!("offset {offset} is not on a character boundary"));
    }
    None
}
