//! Tolerance table for matching host nodes to template ranges.
//!
//! The host grammar and the template scanner measure the same region independently. The
//! relationships listed here are the only ones accepted; a fixture that needs another one
//! means a new entry, reviewed on its own, never a wider window.

use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    /// Template range equals the node range
    Exact,
    /// Node is parenthesized and the template range also covers the parentheses
    Parenthesized,
    /// Template range ends one past the node, at a trailing token the host left out
    TrailingToken,
}

/// Rules in the order they are tried
pub const MATCH_RULES: [MatchRule; 3] = [MatchRule::Exact, MatchRule::Parenthesized, MatchRule::TrailingToken];

impl MatchRule {
    pub fn matches(&self, node_range: &Range<usize>, parenthesized: bool, template_range: &Range<usize>) -> bool {
        match self {
            Self::Exact => template_range == node_range,
            Self::Parenthesized => {
                parenthesized
                    && node_range.start.checked_sub(1) == Some(template_range.start)
                    && node_range.end + 1 == template_range.end
            }
            Self::TrailingToken => {
                template_range.start == node_range.start && template_range.end == node_range.end + 1
            }
        }
    }

    /// First rule under which `template_range` matches the node
    pub fn find(node_range: &Range<usize>, parenthesized: bool, template_range: &Range<usize>) -> Option<Self> {
        MATCH_RULES
            .into_iter()
            .find(|rule| rule.matches(node_range, parenthesized, template_range))
    }
}
