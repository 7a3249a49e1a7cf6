//! Host parser boundary and the host syntax tree.
//!
//! The host tree is deliberately small: it keeps the node kinds the reconciler and the
//! default-template rule care about and folds everything else into [`SyntaxKind::Other`].
//! Once reconciled, a node is either ordinary host syntax ([`HostNode::Syntax`]) or a
//! template ([`HostNode::Template`]); printers match on the variant.

pub mod tree_sitter_host;

pub use tree_sitter_host::TreeSitterHost;

use crate::error::SpliceError;
use crate::occurrence::RawTemplate;
use crate::reconcile::MatchRule;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

/// Host language dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "js")]
    JavaScript,
    #[default]
    #[serde(alias = "ts")]
    TypeScript,
}

impl Dialect {
    /// Pick the dialect from a file extension. Anything that is not plainly JavaScript is
    /// parsed as TypeScript, which accepts a superset of the syntax.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gjs" | "js" | "mjs" | "cjs") => Self::JavaScript,
            _ => Self::TypeScript,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "gjs" => Ok(Self::JavaScript),
            "typescript" | "ts" | "gts" => Ok(Self::TypeScript),
            other => Err(format!("unknown dialect '{other}', expected 'javascript' or 'typescript'")),
        }
    }
}

/// Options handed to the host parser.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    pub dialect: Dialect,
    /// Used for diagnostics only
    pub file_path: String,
}

/// A source comment as reported by the host parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub range: Range<usize>,
    /// `/* … */` as opposed to `// …`
    pub block: bool,
}

/// Host node kinds the splicer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Program,
    ObjectExpression,
    BlockStatement,
    StaticBlock,
    ClassBody,
    ExportDefaultDeclaration,
    ExpressionStatement,
    /// `expr as T` or `expr satisfies T`
    TypeAssertion,
    /// Any other host node, by its grammar name
    Other(&'static str),
}

impl SyntaxKind {
    /// Kinds a template placeholder can turn into
    pub fn is_template_eligible(&self) -> bool {
        matches!(self, Self::ObjectExpression | Self::BlockStatement | Self::StaticBlock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "Program",
            Self::ObjectExpression => "ObjectExpression",
            Self::BlockStatement => "BlockStatement",
            Self::StaticBlock => "StaticBlock",
            Self::ClassBody => "ClassBody",
            Self::ExportDefaultDeclaration => "ExportDefaultDeclaration",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::TypeAssertion => "TypeAssertion",
            Self::Other(name) => *name,
        }
    }
}

impl Serialize for SyntaxKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordinary host syntax node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub range: Range<usize>,
    /// The node was wrapped in parentheses; `range` excludes them
    pub parenthesized: bool,
    pub leading_comments: Vec<Comment>,
    pub children: Vec<HostNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            parenthesized: false,
            leading_comments: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<HostNode>) -> Self {
        self.children = children;
        self
    }

    pub fn parenthesized(mut self) -> Self {
        self.parenthesized = true;
        self
    }
}

/// Everything a printer needs to render a template in place of its placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMarker {
    pub template: RawTemplate,
    /// This is the file's default template
    pub is_default: bool,
    /// Comments that preceded the placeholder node
    pub leading_comments: Vec<Comment>,
    /// Tolerance rule the placeholder was matched with
    pub rule: MatchRule,
}

/// A placeholder node that has been matched to its template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateNode {
    /// Kind of the placeholder node this replaced
    pub replaced_kind: SyntaxKind,
    pub range: Range<usize>,
    pub parenthesized: bool,
    pub marker: TemplateMarker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum HostNode {
    Syntax(SyntaxNode),
    Template(TemplateNode),
}

impl HostNode {
    pub fn range(&self) -> &Range<usize> {
        match self {
            Self::Syntax(node) => &node.range,
            Self::Template(node) => &node.range,
        }
    }

    /// Template nodes are leaves
    pub fn children(&self) -> &[HostNode] {
        match self {
            Self::Syntax(node) => &node.children,
            Self::Template(_) => &[],
        }
    }

    pub fn as_syntax(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Syntax(node) => Some(node),
            Self::Template(_) => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateNode> {
        match self {
            Self::Template(node) => Some(node),
            Self::Syntax(_) => None,
        }
    }

    /// This node and all its descendants, pre-order.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

impl From<SyntaxNode> for HostNode {
    fn from(node: SyntaxNode) -> Self {
        Self::Syntax(node)
    }
}

/// Pre-order iterator over a [`HostNode`] subtree.
pub struct PreOrder<'a> {
    stack: Vec<&'a HostNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a HostNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Parsed host file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTree {
    pub root: HostNode,
    /// Every comment in the file, in source order
    pub comments: Vec<Comment>,
}

impl HostTree {
    /// Template nodes in pre-order
    pub fn template_nodes(&self) -> impl Iterator<Item = &TemplateNode> {
        self.root.pre_order().filter_map(HostNode::as_template)
    }
}

/// Parser for the host language.
///
/// Implementations must be pure: the same text and options always yield the same tree.
pub trait HostParser: Send + Sync {
    fn parse(&self, text: &str, options: &HostOptions) -> Result<HostTree, SpliceError>;
}
