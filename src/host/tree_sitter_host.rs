//! Host parser backed by the tree-sitter JavaScript and TypeScript grammars.

use super::{Comment, Dialect, HostNode, HostOptions, HostParser, HostTree, SyntaxKind, SyntaxNode};
use crate::error::{SourceLocation, SpliceError};
use tree_sitter::{Language, Node, Parser};

/// Longest snippet of offending text quoted in a syntax error
const SNIPPET_LIMIT: usize = 24;

#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterHost;

impl TreeSitterHost {
    fn language(dialect: Dialect) -> Language {
        match dialect {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl HostParser for TreeSitterHost {
    fn parse(&self, text: &str, options: &HostOptions) -> Result<HostTree, SpliceError> {
        let mut parser = Parser::new();
        parser
            .set_language(&Self::language(options.dialect))
            .map_err(|e| SpliceError::HostUnavailable(format!("failed to load the {} grammar: {e}", options.dialect)))?;

        let tree = parser
            .parse(text, None)
            .ok_or_else(|| SpliceError::HostUnavailable(format!("{} parser produced no tree", options.dialect)))?;

        let root = tree.root_node();
        if root.has_error() {
            let culprit = first_error(root).unwrap_or(root);
            return Err(syntax_error(culprit, text, &options.file_path));
        }

        let mut converter = Converter {
            source: text,
            comments: Vec::new(),
        };
        let root = converter.convert(root);
        log::trace!(
            "{}: host tree has {} top-level node(s), {} comment(s)",
            options.file_path,
            root.children.len(),
            converter.comments.len()
        );

        Ok(HostTree {
            root: root.into(),
            comments: converter.comments,
        })
    }
}

/// Find the first ERROR or MISSING node, depth-first.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

fn syntax_error(node: Node<'_>, text: &str, file: &str) -> SpliceError {
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet = node
            .utf8_text(text.as_bytes())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default();
        match snippet.char_indices().nth(SNIPPET_LIMIT) {
            Some((cut, _)) => format!("unexpected `{}…`", &snippet[..cut]),
            None if snippet.is_empty() => "unexpected end of input".to_string(),
            None => format!("unexpected `{snippet}`"),
        }
    };

    let position = node.start_position();
    SpliceError::HostSyntax {
        file: file.to_string(),
        message,
        location: SourceLocation {
            offset: node.start_byte(),
            line: position.row + 1,
            column: position.column + 1,
        },
    }
}

fn syntax_kind(node: Node<'_>) -> SyntaxKind {
    match node.kind() {
        "program" => SyntaxKind::Program,
        "object" => SyntaxKind::ObjectExpression,
        "statement_block" => SyntaxKind::BlockStatement,
        "class_static_block" => SyntaxKind::StaticBlock,
        "class_body" => SyntaxKind::ClassBody,
        "expression_statement" => SyntaxKind::ExpressionStatement,
        "as_expression" | "satisfies_expression" => SyntaxKind::TypeAssertion,
        "export_statement" if is_default_export(node) => SyntaxKind::ExportDefaultDeclaration,
        other => SyntaxKind::Other(other),
    }
}

fn is_default_export(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == "default");
    found
}

/// Builds the host tree from a tree-sitter CST, collecting comments on the way.
struct Converter<'s> {
    source: &'s str,
    comments: Vec<Comment>,
}

impl Converter<'_> {
    fn convert(&mut self, node: Node<'_>) -> SyntaxNode {
        let mut cursor = node.walk();
        let named: Vec<Node<'_>> = node.named_children(&mut cursor).collect();

        let mut children: Vec<SyntaxNode> = Vec::with_capacity(named.len());
        let mut pending = Vec::new();
        let mut previous_end_row = None;

        for child in named {
            if child.kind() == "comment" {
                let comment = self.comment(child);
                // A comment on the line a sibling ends on trails that sibling
                if previous_end_row != Some(child.start_position().row) {
                    pending.push(comment.clone());
                }
                self.comments.push(comment);
                continue;
            }

            let mut converted = self.convert(child);
            converted.leading_comments.splice(0..0, pending.drain(..));
            previous_end_row = Some(child.end_position().row);
            children.push(converted);
        }

        // `( expr )` collapses into `expr`, flagged as parenthesized
        if node.kind() == "parenthesized_expression"
            && children.len() == 1
            && let Some(mut inner) = children.pop()
        {
            inner.parenthesized = true;
            return inner;
        }

        SyntaxNode {
            kind: syntax_kind(node),
            range: node.byte_range(),
            parenthesized: false,
            leading_comments: Vec::new(),
            children: children.into_iter().map(HostNode::Syntax).collect(),
        }
    }

    fn comment(&self, node: Node<'_>) -> Comment {
        let text = self.source[node.byte_range()].to_string();
        Comment {
            block: text.starts_with("/*"),
            range: node.byte_range(),
            text,
        }
    }
}
