//!
//! Source rewriting: replaces every template region with host-legal placeholder text.
//!
//! Each placeholder has exactly the byte length of the region it replaces, so every offset
//! outside the templates is unchanged and each template's range can be looked up verbatim in
//! the host tree. The template text itself is kept inside a block comment, which keeps line
//! numbers stable for host diagnostics.

use crate::error::SpliceError;
use crate::occurrence::{RawTemplate, TemplateKind, content_layout};
use serde::Serialize;

/// Replacement for `/` inside placeholder bodies, so a template can never close the comment
const SLASH_REPLACEMENT: char = '~';

/// Host syntax a template was replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placeholder {
    /// `{/* … */}`: parses as a block statement or an object expression
    Block,
    /// `({/* … */})`: a template followed by `as` or `satisfies`
    ParenthesizedObject,
    /// `static{/* … */}`: a class static block
    StaticBlock,
}

impl Placeholder {
    fn choose(template: &RawTemplate, source: &str) -> Self {
        match template.kind {
            TemplateKind::ClassMember => Self::StaticBlock,
            TemplateKind::Expression => match next_word(source, template.range.end) {
                Some("as" | "satisfies") => Self::ParenthesizedObject,
                _ => Self::Block,
            },
        }
    }

    fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            Self::Block => ("{/*", "*/}"),
            Self::ParenthesizedObject => ("({/*", "*/})"),
            Self::StaticBlock => ("static{/*", "*/}"),
        }
    }
}

/// Output of [`rewrite`]
#[derive(Debug, Clone)]
pub struct RewrittenSource {
    pub text: String,
    /// Templates in scan order, each with its `layout` filled in
    pub templates: Vec<RawTemplate>,
    /// Placeholder used for each template, parallel to `templates`
    pub placeholders: Vec<Placeholder>,
}

/// The first whitespace-delimited word at or after `offset`
fn next_word(source: &str, offset: usize) -> Option<&str> {
    source.get(offset..)?.split_whitespace().next()
}

fn placeholder_text(template: &RawTemplate, placeholder: Placeholder) -> Result<String, SpliceError> {
    let (prefix, suffix) = placeholder.delimiters();
    let body = template.contents.replace('/', &SLASH_REPLACEMENT.to_string());

    let padding = template
        .range
        .len()
        .checked_sub(prefix.len() + body.len() + suffix.len())
        .ok_or_else(|| {
            SpliceError::InvariantViolation(format!(
                "template at {:?} is too short for a {placeholder:?} placeholder",
                template.range
            ))
        })?;

    let mut text = String::with_capacity(template.range.len());
    text.push_str(prefix);
    text.push_str(&body);
    text.extend(std::iter::repeat_n(' ', padding));
    text.push_str(suffix);
    Ok(text)
}

/// Replace every template in `source` with a same-length placeholder.
///
/// `templates` must be sorted and non-overlapping, as returned by the scanner.
pub fn rewrite(source: &str, mut templates: Vec<RawTemplate>) -> Result<RewrittenSource, SpliceError> {
    let mut text = String::with_capacity(source.len());
    let mut placeholders = Vec::with_capacity(templates.len());
    let mut copied_to = 0;

    for template in templates.iter_mut() {
        if template.range.start < copied_to {
            return Err(SpliceError::InvariantViolation(format!(
                "template at {:?} is out of order",
                template.range
            )));
        }

        let placeholder = Placeholder::choose(template, source);
        text.push_str(&source[copied_to..template.range.start]);
        text.push_str(&placeholder_text(template, placeholder)?);
        copied_to = template.range.end;

        template.layout = Some(content_layout(&template.contents, template.content_range.start));
        placeholders.push(placeholder);
        log::trace!("template at {:?} -> {placeholder:?}", template.range);
    }
    text.push_str(&source[copied_to..]);

    if text.len() != source.len() {
        return Err(SpliceError::InvariantViolation(format!(
            "rewritten source is {} bytes, original is {}",
            text.len(),
            source.len()
        )));
    }

    Ok(RewrittenSource {
        text,
        templates,
        placeholders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ContentTagParser, scan};
    use pretty_assertions::assert_eq;

    fn rewrite_source(source: &str) -> RewrittenSource {
        let templates = scan(&ContentTagParser, source, "test.gts").unwrap();
        rewrite(source, templates).unwrap()
    }

    #[test]
    fn test_expression_becomes_block() {
        let source = "<template>Hi</template>";
        let out = rewrite_source(source);
        assert_eq!(out.text, format!("{{/*Hi{}*/}}", " ".repeat(15)));
        assert_eq!(out.placeholders, vec![Placeholder::Block]);
    }

    #[test]
    fn test_class_member_becomes_static_block() {
        let source = "class A {\n  <template>Hi</template>\n}";
        let out = rewrite_source(source);
        assert_eq!(out.text, format!("class A {{\n  static{{/*Hi{}*/}}\n}}", " ".repeat(9)));
        assert_eq!(out.placeholders, vec![Placeholder::StaticBlock]);
    }

    #[test]
    fn test_type_assertion_becomes_parenthesized_object() {
        let source = "export default <template>Hi</template> satisfies TOC<Sig>;";
        let out = rewrite_source(source);
        assert_eq!(
            out.text,
            format!("export default ({{/*Hi{}*/}}) satisfies TOC<Sig>;", " ".repeat(13))
        );
        assert_eq!(out.placeholders, vec![Placeholder::ParenthesizedObject]);

        let out = rewrite_source("const A = <template>Hi</template>\n  as Component;");
        assert_eq!(out.placeholders, vec![Placeholder::ParenthesizedObject]);
    }

    #[test]
    fn test_word_starting_with_as_is_not_assertion() {
        let out = rewrite_source("<template>Hi</template>\nassert(true);");
        assert_eq!(out.placeholders, vec![Placeholder::Block]);
    }

    #[test]
    fn test_slashes_cannot_close_the_comment() {
        let source = "<template>a */ b</template>";
        let out = rewrite_source(source);
        assert_eq!(out.text, format!("{{/*a *~ b{}*/}}", " ".repeat(15)));
    }

    #[test]
    fn test_length_and_surroundings_preserved() {
        let source = "import x from 'y';\nconst A = <template>\n  <p>é</p>\n</template>;\nexport { A };\n";
        let out = rewrite_source(source);
        assert_eq!(out.text.len(), source.len());

        let template = &out.templates[0];
        assert_eq!(&out.text[..template.range.start], &source[..template.range.start]);
        assert_eq!(&out.text[template.range.end..], &source[template.range.end..]);
        // Line breaks inside the template survive, so host line numbers still line up
        assert_eq!(
            out.text.matches('\n').count(),
            source.matches('\n').count()
        );
    }

    #[test]
    fn test_layout_is_attached() {
        let source = "<template>\n  <h1>Hi</h1>\n</template>";
        let out = rewrite_source(source);
        let layout = out.templates[0].layout.as_ref().unwrap();
        assert_eq!(layout.leading_newlines, 1);
        assert_eq!(layout.trailing_newlines, 1);
        assert_eq!(layout.indent, 2);
        assert_eq!(&source[layout.trimmed_range.clone()], "<h1>Hi</h1>");
    }

    #[test]
    fn test_too_short_region_is_an_invariant_violation() {
        let template = RawTemplate {
            kind: TemplateKind::ClassMember,
            range: 0..4,
            content_range: 2..2,
            start_tag_range: 0..2,
            end_tag_range: 2..4,
            utf16_range: 0..4,
            contents: String::new(),
            layout: None,
        };
        let err = rewrite("<t/>", vec![template]).unwrap_err();
        assert!(matches!(err, SpliceError::InvariantViolation(_)));
    }
}
