//! Which template is the file's default template.
//!
//! The answer depends only on where the placeholder sits in the host tree, never on the
//! order templates were scanned in.

use crate::host::{SyntaxKind, SyntaxNode};

/// Decides whether a matched placeholder node is the default template.
pub trait DefaultTemplatePredicate: Send + Sync {
    /// `ancestors` runs from the root down to the node's parent.
    fn is_default(&self, node: &SyntaxNode, ancestors: &[&SyntaxNode]) -> bool;
}

/// A template is the default when it is the value of `export default`, looking through
/// `as` and `satisfies`. With `implicit_top_level`, a template standing alone as a top-level
/// statement counts as well, since it is exported implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportDefaultPredicate {
    pub implicit_top_level: bool,
}

impl Default for ExportDefaultPredicate {
    fn default() -> Self {
        Self {
            implicit_top_level: true,
        }
    }
}

impl DefaultTemplatePredicate for ExportDefaultPredicate {
    fn is_default(&self, node: &SyntaxNode, ancestors: &[&SyntaxNode]) -> bool {
        let Some(parent) = ancestors
            .iter()
            .rev()
            .find(|ancestor| ancestor.kind != SyntaxKind::TypeAssertion)
        else {
            return false;
        };

        match parent.kind {
            SyntaxKind::ExportDefaultDeclaration => true,
            SyntaxKind::Program => self.implicit_top_level && node.kind == SyntaxKind::BlockStatement,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: SyntaxKind) -> SyntaxNode {
        SyntaxNode::new(kind, 0..0)
    }

    #[test]
    fn test_export_default_value() {
        let predicate = ExportDefaultPredicate::default();
        let program = node(SyntaxKind::Program);
        let export = node(SyntaxKind::ExportDefaultDeclaration);
        let assertion = node(SyntaxKind::TypeAssertion);
        let object = node(SyntaxKind::ObjectExpression);

        assert!(predicate.is_default(&object, &[&program, &export]));
        assert!(predicate.is_default(&object, &[&program, &export, &assertion]));
    }

    #[test]
    fn test_nested_value_is_not_default() {
        let predicate = ExportDefaultPredicate::default();
        let program = node(SyntaxKind::Program);
        let export = node(SyntaxKind::ExportDefaultDeclaration);
        let call = node(SyntaxKind::Other("call_expression"));
        let object = node(SyntaxKind::ObjectExpression);

        assert!(!predicate.is_default(&object, &[&program, &export, &call]));
        assert!(!predicate.is_default(&object, &[&program, &node(SyntaxKind::Other("variable_declarator"))]));
    }

    #[test]
    fn test_top_level_block() {
        let program = node(SyntaxKind::Program);
        let block = node(SyntaxKind::BlockStatement);

        assert!(ExportDefaultPredicate::default().is_default(&block, &[&program]));
        let explicit_only = ExportDefaultPredicate {
            implicit_top_level: false,
        };
        assert!(!explicit_only.is_default(&block, &[&program]));
    }

    #[test]
    fn test_class_member_is_never_default() {
        let predicate = ExportDefaultPredicate::default();
        let chain = [
            node(SyntaxKind::Program),
            node(SyntaxKind::ExportDefaultDeclaration),
            node(SyntaxKind::Other("class")),
            node(SyntaxKind::ClassBody),
        ];
        let ancestors: Vec<&SyntaxNode> = chain.iter().collect();
        assert!(!predicate.is_default(&node(SyntaxKind::StaticBlock), &ancestors));
    }

    #[test]
    fn test_root_has_no_parent() {
        assert!(!ExportDefaultPredicate::default().is_default(&node(SyntaxKind::BlockStatement), &[]));
    }
}
