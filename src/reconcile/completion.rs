//! Postcondition on a reconciled tree: every scanned template has exactly one node.

use crate::error::SpliceError;
use crate::host::HostTree;
use std::collections::HashSet;
use std::ops::Range;

/// Check that `tree` holds one template node per entry of `scanned`, the tag ranges the
/// scanner reported. Returns the number of template nodes.
pub fn verify_complete(tree: &HostTree, scanned: &[Range<usize>]) -> Result<usize, SpliceError> {
    let mut seen: HashSet<&Range<usize>> = HashSet::with_capacity(scanned.len());

    for node in tree.template_nodes() {
        let range = &node.marker.template.range;
        if !seen.insert(range) {
            return Err(SpliceError::InvariantViolation(format!(
                "template at {range:?} is attached to more than one node"
            )));
        }
    }

    if seen.len() > scanned.len() {
        return Err(SpliceError::InvariantViolation(format!(
            "{} template nodes for {} scanned templates",
            seen.len(),
            scanned.len()
        )));
    }

    let missing: Vec<Range<usize>> = scanned.iter().filter(|r| !seen.contains(r)).cloned().collect();
    if !missing.is_empty() {
        return Err(SpliceError::Reconciliation {
            unconsumed: missing.len(),
            ranges: missing,
        });
    }

    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostNode, SyntaxKind, SyntaxNode, TemplateMarker, TemplateNode};
    use crate::reconcile::MatchRule;
    use crate::occurrence::{RawTemplate, TemplateKind};

    fn template_node(range: Range<usize>) -> HostNode {
        HostNode::Template(TemplateNode {
            replaced_kind: SyntaxKind::BlockStatement,
            range: range.clone(),
            parenthesized: false,
            marker: TemplateMarker {
                template: RawTemplate {
                    kind: TemplateKind::Expression,
                    range: range.clone(),
                    content_range: range.clone(),
                    start_tag_range: range.start..range.start,
                    end_tag_range: range.end..range.end,
                    utf16_range: range.clone(),
                    contents: String::new(),
                    layout: None,
                },
                is_default: false,
                leading_comments: Vec::new(),
                rule: MatchRule::Exact,
            },
        })
    }

    fn tree(children: Vec<HostNode>) -> HostTree {
        HostTree {
            root: SyntaxNode::new(SyntaxKind::Program, 0..100).with_children(children).into(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_empty_file_passes() {
        assert_eq!(verify_complete(&tree(Vec::new()), &[]).unwrap(), 0);
    }

    #[test]
    fn test_all_templates_present() {
        let tree = tree(vec![template_node(0..30), template_node(40..70)]);
        assert_eq!(verify_complete(&tree, &[0..30, 40..70]).unwrap(), 2);
    }

    #[test]
    fn test_undercount_is_a_hard_failure() {
        let tree = tree(vec![template_node(0..30)]);
        match verify_complete(&tree, &[0..30, 40..70]).unwrap_err() {
            SpliceError::Reconciliation { unconsumed, ranges } => {
                assert_eq!(unconsumed, 1);
                assert_eq!(ranges, vec![40..70]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_double_consumption_is_detected() {
        let nested = SyntaxNode::new(SyntaxKind::ExpressionStatement, 50..90).with_children(vec![template_node(0..30)]);
        let tree = tree(vec![template_node(0..30), nested.into()]);
        let err = verify_complete(&tree, &[0..30]).unwrap_err();
        assert!(matches!(err, SpliceError::InvariantViolation(_)));
    }
}
