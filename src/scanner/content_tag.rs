//! Built-in lexical finder for `<template>` tags in JavaScript/TypeScript source.
//!
//! This does not parse JavaScript. It tracks just enough lexical state to tell a tag apart
//! from the same characters inside a comment, string, template literal or regular
//! expression, and from a `<` comparison:
//!
//! - A tag may only start where an expression may start, i.e. not right after an
//!   identifier, literal, `)` or `]` on the same line. `a <template> b` is therefore a
//!   comparison, while a tag opening a new line after `foo()` starts a statement.
//! - `)` closing the head of `if`, `while`, `for` or `with` is followed by a statement, so a
//!   `/` there starts a regular expression rather than a division.
//! - Braces are tracked as frames so a tag sitting directly in a class body (after `{`,
//!   `;`, `}` or a member ending in a line break) is classified as
//!   [`TemplateKind::ClassMember`]. Braces inside the `<…>` type arguments of a class
//!   heading never open the body.
//! - Nested `<template>` openers inside a template are counted so the matching closer is used.

use super::{ScanFailure, TagMatch, TemplateParser};
use crate::occurrence::{TEMPLATE_TAG, TemplateKind};

/// Keywords after which an expression (and thus a tag or regex literal) may start
const EXPRESSION_KEYWORDS: &[&str] = &[
    "await",
    "case",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "in",
    "instanceof",
    "new",
    "of",
    "return",
    "throw",
    "typeof",
    "void",
    "yield",
];

/// Keywords whose parenthesized head is followed by a statement
const CONTROL_KEYWORDS: &[&str] = &["for", "if", "while", "with"];

/// Finds `<template>` tags without a full host parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTagParser;

impl TemplateParser for ContentTagParser {
    fn parse(&self, source: &str, file_name: &str) -> Result<Vec<TagMatch>, ScanFailure> {
        log::trace!("scanning {file_name} for <{TEMPLATE_TAG}> tags");
        TagLexer::new(source).run()
    }
}

/// The last significant token seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    /// Identifier, literal, `)` or `]`: whatever follows is an operator
    Value,
    Keyword,
    /// `if`, `while`, `for` or `with`, waiting for its `(`
    Control,
    Punct(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Block,
    ClassBody,
    /// `${` inside a template literal
    Interpolation,
}

struct TagLexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    prev: Prev,
    frames: Vec<Frame>,
    /// One entry per open `(`, true when it opened the head of a control statement
    parens: Vec<bool>,
    /// Paren depth at which a `class` keyword is waiting for its body
    pending_class: Option<usize>,
    /// `<…>` nesting in the heading of the pending class
    class_angles: usize,
    /// Offset just past the last significant token
    token_end: usize,
    matches: Vec<TagMatch>,
}

impl<'a> TagLexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            prev: Prev::Start,
            frames: Vec::new(),
            parens: Vec::new(),
            pending_class: None,
            class_angles: 0,
            token_end: 0,
            matches: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<TagMatch>, ScanFailure> {
        if self.src.starts_with("#!") {
            self.skip_line();
        }

        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.pos += 1;
                    continue;
                }
                b'/' if matches!(self.bytes.get(self.pos + 1), Some(b'/' | b'*')) => {
                    self.comment()?;
                    continue;
                }
                b'/' if self.expression_allowed() => self.regex()?,
                b'\'' | b'"' => {
                    self.string(b)?;
                    self.prev = Prev::Value;
                }
                b'`' => {
                    let start = self.pos;
                    self.pos += 1;
                    self.template_literal(start)?;
                }
                b'<' if self.tag_allowed() && self.is_tag_open(self.pos) => self.template_tag()?,
                b'<' | b'>' if self.in_class_heading() => self.class_angle(b),
                b'{' => self.open_brace(),
                b'}' => self.close_brace()?,
                b'(' => {
                    self.parens.push(self.prev == Prev::Control);
                    self.punct(b);
                }
                b')' => {
                    let closes_control_head = self.parens.pop().unwrap_or(false);
                    self.pos += 1;
                    self.prev = if closes_control_head { Prev::Punct(b')') } else { Prev::Value };
                }
                b']' => {
                    self.pos += 1;
                    self.prev = Prev::Value;
                }
                b'0'..=b'9' => self.number(),
                _ if is_ident_byte(b) => self.word(),
                _ => self.punct(b),
            }
            self.token_end = self.pos;
        }

        Ok(self.matches)
    }

    fn expression_allowed(&self) -> bool {
        !matches!(self.prev, Prev::Value)
    }

    /// A line break separates the current position from the last token
    fn after_line_break(&self) -> bool {
        self.bytes[self.token_end..self.pos].contains(&b'\n')
    }

    /// `<template` at the start of a line is never a comparison
    fn tag_allowed(&self) -> bool {
        self.expression_allowed() || self.after_line_break()
    }

    fn in_class_heading(&self) -> bool {
        self.pending_class == Some(self.parens.len())
    }

    fn class_angle(&mut self, b: u8) {
        let arrow = b == b'>' && self.pos > 0 && self.bytes[self.pos - 1] == b'=';
        match b {
            b'<' => self.class_angles += 1,
            _ if !arrow => self.class_angles = self.class_angles.saturating_sub(1),
            _ => {}
        }
        self.punct(b);
    }

    fn punct(&mut self, b: u8) {
        self.pos += 1;
        self.prev = Prev::Punct(b);
    }

    fn skip_line(&mut self) {
        self.pos = self.src[self.pos..].find('\n').map_or(self.bytes.len(), |i| self.pos + i);
    }

    fn comment(&mut self) -> Result<(), ScanFailure> {
        if self.bytes.get(self.pos + 1) == Some(&b'/') {
            self.skip_line();
            return Ok(());
        }
        let start = self.pos;
        match self.src[self.pos + 2..].find("*/") {
            Some(i) => self.pos += 2 + i + 2,
            None => return Err(ScanFailure::new("unterminated comment", start)),
        }
        Ok(())
    }

    fn regex(&mut self) -> Result<(), ScanFailure> {
        let start = self.pos;
        let mut in_class = false;
        self.pos += 1;

        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(b'\n') | None => {
                    return Err(ScanFailure::new("unterminated regular expression", start));
                }
                Some(_) => self.pos += 1,
            }
        }

        // Flags
        while self.bytes.get(self.pos).is_some_and(|&b| is_ident_byte(b)) {
            self.pos += 1;
        }
        self.prev = Prev::Value;
        Ok(())
    }

    fn string(&mut self, quote: u8) -> Result<(), ScanFailure> {
        let start = self.pos;
        self.pos += 1;

        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.pos += 2,
                Some(&b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'\n') | None => return Err(ScanFailure::new("unterminated string literal", start)),
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Scan template literal text up to its closing backtick or the next `${`.
    fn template_literal(&mut self, start: usize) -> Result<(), ScanFailure> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    self.prev = Prev::Value;
                    return Ok(());
                }
                Some(b'$') if self.bytes.get(self.pos + 1) == Some(&b'{') => {
                    self.pos += 2;
                    self.frames.push(Frame::Interpolation);
                    self.prev = Prev::Punct(b'{');
                    return Ok(());
                }
                Some(_) => self.pos += 1,
                None => return Err(ScanFailure::new("unterminated template literal", start)),
            }
        }
    }

    fn open_brace(&mut self) {
        let frame = if self.in_class_heading() && self.class_angles == 0 {
            self.pending_class = None;
            Frame::ClassBody
        } else {
            Frame::Block
        };
        self.frames.push(frame);
        self.punct(b'{');
    }

    fn close_brace(&mut self) -> Result<(), ScanFailure> {
        self.pos += 1;
        match self.frames.pop() {
            Some(Frame::Interpolation) => self.template_literal(self.pos - 1),
            _ => {
                self.prev = Prev::Punct(b'}');
                Ok(())
            }
        }
    }

    fn number(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            self.pos += 1;
        }
        self.prev = Prev::Value;
    }

    fn word(&mut self) {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| is_ident_byte(b)) {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];

        let member_name = self.prev == Prev::Punct(b'.');

        if word == "class" && !member_name {
            self.pending_class = Some(self.parens.len());
            self.class_angles = 0;
        }
        self.prev = if member_name {
            Prev::Value
        } else if CONTROL_KEYWORDS.contains(&word) || (word == "await" && self.prev == Prev::Control) {
            Prev::Control
        } else if EXPRESSION_KEYWORDS.contains(&word) {
            Prev::Keyword
        } else {
            Prev::Value
        };
    }

    /// `<template` followed by `>` or whitespace
    fn is_tag_open(&self, at: usize) -> bool {
        self.tag_name_followed_by_boundary(at, "<")
    }

    /// `</template` followed by `>` or whitespace
    fn is_tag_close(&self, at: usize) -> bool {
        self.tag_name_followed_by_boundary(at, "</")
    }

    fn tag_name_followed_by_boundary(&self, at: usize, opener: &str) -> bool {
        let rest = &self.src[at..];
        rest.strip_prefix(opener)
            .and_then(|r| r.strip_prefix(TEMPLATE_TAG))
            .and_then(|r| r.bytes().next())
            .is_some_and(|b| b == b'>' || b.is_ascii_whitespace())
    }

    /// Offset just past the `>` closing a tag that starts at `at`
    fn tag_end(&self, at: usize) -> Option<usize> {
        let mut quote = None;
        for (i, b) in self.bytes[at..].iter().enumerate() {
            match (quote, *b) {
                (None, b'"' | b'\'') => quote = Some(*b),
                (Some(q), b) if b == q => quote = None,
                (None, b'>') => return Some(at + i + 1),
                _ => {}
            }
        }
        None
    }

    fn template_tag(&mut self) -> Result<(), ScanFailure> {
        let start = self.pos;
        let line_start = self.after_line_break();
        let unterminated = || ScanFailure::new(format!("unterminated <{TEMPLATE_TAG}> tag"), start);

        let content_start = self.tag_end(start).ok_or_else(unterminated)?;
        let mut depth = 1;
        let mut cursor = content_start;

        let (content_end, end) = loop {
            let at = cursor + self.src[cursor..].find('<').ok_or_else(unterminated)?;
            if self.is_tag_close(at) {
                depth -= 1;
                if depth == 0 {
                    break (at, self.tag_end(at).ok_or_else(unterminated)?);
                }
            } else if self.is_tag_open(at) {
                depth += 1;
            }
            cursor = at + 1;
        };

        let in_member_position =
            matches!(self.prev, Prev::Punct(b'{' | b';' | b'}')) || (self.prev == Prev::Value && line_start);
        let kind = if self.frames.last() == Some(&Frame::ClassBody) && in_member_position {
            TemplateKind::ClassMember
        } else {
            TemplateKind::Expression
        };

        self.matches.push(TagMatch {
            kind,
            range: start..end,
            content_range: content_start..content_end,
        });
        self.pos = end;
        // The placeholder replacing the tag ends in `}`
        self.prev = Prev::Punct(b'}');
        Ok(())
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
