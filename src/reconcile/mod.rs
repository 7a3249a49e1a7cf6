//! Node reconciliation: turning placeholder nodes back into templates.
//!
//! The scanner and the host parser share no node identity, so templates are recognised by
//! position alone. Reconciliation runs in two passes:
//!
//! 1. A read-only pre-order walk claims, for every template-eligible node, the first pooled
//!    template whose range matches under the [tolerance table](rules). Each match is recorded
//!    as a [`MatchDecision`] together with the default-template verdict for its position.
//! 2. The decisions are applied: each matched node is replaced by a [`HostNode::Template`]
//!    that carries the template and the node's leading comments.
//!
//! A file has at most one default template. When the predicate flags several positions,
//! none of them keeps the flag.
//!
//! Any template left unclaimed after the walk fails the whole operation before the tree is
//! touched.

pub mod completion;
pub mod default_occurrence;
pub mod pool;
pub mod rules;

pub use completion::verify_complete;
pub use default_occurrence::{DefaultTemplatePredicate, ExportDefaultPredicate};
pub use pool::OccurrencePool;
pub use rules::{MATCH_RULES, MatchRule};

use crate::error::SpliceError;
use crate::host::{HostNode, HostTree, SyntaxNode, TemplateMarker, TemplateNode};
use crate::occurrence::RawTemplate;
use serde::Serialize;
use std::ops::Range;

/// A node matched to a template during the read-only pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchDecision {
    /// Child indices leading from the root to the node
    pub path: Vec<usize>,
    /// Scan index of the template
    pub template_index: usize,
    pub rule: MatchRule,
    pub is_default: bool,
}

/// Summary of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Applied decisions, in tree pre-order
    pub decisions: Vec<MatchDecision>,
}

impl ReconcileReport {
    pub fn matched(&self) -> usize {
        self.decisions.len()
    }

    /// Matches that needed a tolerance window
    pub fn tolerant_matches(&self) -> usize {
        self.decisions.iter().filter(|d| d.rule != MatchRule::Exact).count()
    }

    pub fn default_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.is_default).count()
    }
}

/// Read-only pass over the host tree.
struct Collector<'a> {
    pool: &'a mut OccurrencePool,
    predicate: &'a dyn DefaultTemplatePredicate,
    decisions: Vec<MatchDecision>,
    path: Vec<usize>,
}

impl<'a> Collector<'a> {
    fn visit<'t>(&mut self, node: &'t HostNode, ancestors: &mut Vec<&'t SyntaxNode>) {
        // Nodes reconciled earlier are leaves
        let HostNode::Syntax(syntax) = node else {
            return;
        };

        if syntax.kind.is_template_eligible()
            && let Some((template_index, rule)) = self.pool.claim_match(&syntax.range, syntax.parenthesized)
        {
            let is_default = self.predicate.is_default(syntax, ancestors.as_slice());
            log::trace!(
                "{} at {:?} matched template #{template_index} ({rule:?}, default: {is_default})",
                syntax.kind,
                syntax.range
            );
            self.decisions.push(MatchDecision {
                path: self.path.clone(),
                template_index,
                rule,
                is_default,
            });
            return;
        }

        ancestors.push(syntax);
        for (index, child) in syntax.children.iter().enumerate() {
            self.path.push(index);
            self.visit(child, ancestors);
            self.path.pop();
        }
        ancestors.pop();
    }
}

/// Attach every template in `templates` to its placeholder node in `tree`.
///
/// `templates` must be in scan order. On error `tree` is left as it was.
pub fn reconcile(
    tree: &mut HostTree,
    templates: Vec<RawTemplate>,
    predicate: &dyn DefaultTemplatePredicate,
) -> Result<ReconcileReport, SpliceError> {
    let mut pool = OccurrencePool::new(templates);

    let mut collector = Collector {
        pool: &mut pool,
        predicate,
        decisions: Vec::new(),
        path: Vec::new(),
    };
    collector.visit(&tree.root, &mut Vec::new());
    let mut decisions = collector.decisions;
    keep_unique_default(&mut decisions);

    let unconsumed = pool.unclaimed_count();
    if unconsumed > 0 {
        let ranges = pool.unclaimed_ranges();
        log::debug!("{unconsumed} template(s) without a placeholder node: {ranges:?}");
        return Err(SpliceError::Reconciliation { unconsumed, ranges });
    }

    let mut template_ranges: Vec<Range<usize>> = Vec::with_capacity(decisions.len());
    for decision in &decisions {
        let template = pool.take(decision.template_index)?;
        template_ranges.push(template.range.clone());
        apply(&mut tree.root, decision, template)?;
    }

    // Comments inside a placeholder are template text, not host comments
    tree.comments.retain(|comment| {
        !template_ranges
            .iter()
            .any(|range| range.start <= comment.range.start && comment.range.end <= range.end)
    });

    let report = ReconcileReport { decisions };
    log::debug!(
        "reconciled {} template(s), {} via tolerance, {} default",
        report.matched(),
        report.tolerant_matches(),
        report.default_count()
    );
    Ok(report)
}

fn keep_unique_default(decisions: &mut [MatchDecision]) {
    let candidates = decisions.iter().filter(|d| d.is_default).count();
    if candidates > 1 {
        log::warn!("{candidates} templates sit in a default position, none is used as the default");
        for decision in decisions.iter_mut() {
            decision.is_default = false;
        }
    }
}

fn node_at_path<'t>(root: &'t mut HostNode, path: &[usize]) -> Option<&'t mut HostNode> {
    path.iter().try_fold(root, |node, &index| match node {
        HostNode::Syntax(syntax) => syntax.children.get_mut(index),
        HostNode::Template(_) => None,
    })
}

fn apply(root: &mut HostNode, decision: &MatchDecision, template: RawTemplate) -> Result<(), SpliceError> {
    let node = node_at_path(root, &decision.path).ok_or_else(|| {
        SpliceError::InvariantViolation(format!("no host node at path {:?}", decision.path))
    })?;

    let HostNode::Syntax(syntax) = &mut *node else {
        return Err(SpliceError::InvariantViolation(format!(
            "node at path {:?} already holds a template",
            decision.path
        )));
    };

    let replacement = TemplateNode {
        replaced_kind: syntax.kind,
        range: syntax.range.clone(),
        parenthesized: syntax.parenthesized,
        marker: TemplateMarker {
            template,
            is_default: decision.is_default,
            leading_comments: std::mem::take(&mut syntax.leading_comments),
            rule: decision.rule,
        },
    };
    *node = HostNode::Template(replacement);
    Ok(())
}
