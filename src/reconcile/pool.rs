use super::rules::{MATCH_RULES, MatchRule};
use crate::error::SpliceError;
use crate::occurrence::RawTemplate;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Unclaimed,
    Claimed,
    Taken,
}

/// Templates waiting to be matched, addressed by their scan index.
///
/// Matching happens in two steps: [`claim_match`](Self::claim_match) marks a template as
/// spoken for while the tree is walked, [`take`](Self::take) moves it out once the tree is
/// being rewritten. Entries never move, so indices stay valid throughout.
#[derive(Debug)]
pub struct OccurrencePool {
    templates: Vec<Option<RawTemplate>>,
    states: Vec<SlotState>,
}

impl OccurrencePool {
    pub fn new(templates: Vec<RawTemplate>) -> Self {
        let states = vec![SlotState::Unclaimed; templates.len()];
        Self {
            templates: templates.into_iter().map(Some).collect(),
            states,
        }
    }

    /// Claim the first unclaimed template matching a node, trying each rule in priority
    /// order before moving on to the next one.
    pub fn claim_match(&mut self, node_range: &Range<usize>, parenthesized: bool) -> Option<(usize, MatchRule)> {
        let found = MATCH_RULES.into_iter().find_map(|rule| {
            self.unclaimed()
                .find(|(_, template)| rule.matches(node_range, parenthesized, &template.range))
                .map(|(index, _)| (index, rule))
        })?;

        self.states[found.0] = SlotState::Claimed;
        Some(found)
    }

    /// Move a claimed template out of the pool.
    pub fn take(&mut self, index: usize) -> Result<RawTemplate, SpliceError> {
        match self.states.get(index) {
            Some(SlotState::Claimed) => {}
            Some(state) => {
                return Err(SpliceError::InvariantViolation(format!(
                    "template #{index} cannot be taken, it is {state:?}"
                )));
            }
            None => {
                return Err(SpliceError::InvariantViolation(format!(
                    "template #{index} is not in a pool of {}",
                    self.templates.len()
                )));
            }
        }

        let template = self.templates[index].take().ok_or_else(|| {
            SpliceError::InvariantViolation(format!("claimed template #{index} disappeared before removal"))
        })?;
        self.states[index] = SlotState::Taken;
        Ok(template)
    }

    /// Number of templates no node has claimed
    pub fn unclaimed_count(&self) -> usize {
        self.states.iter().filter(|s| **s == SlotState::Unclaimed).count()
    }

    /// Ranges of the unclaimed templates, in scan order
    pub fn unclaimed_ranges(&self) -> Vec<Range<usize>> {
        self.unclaimed().map(|(_, template)| template.range.clone()).collect()
    }

    fn unclaimed(&self) -> impl Iterator<Item = (usize, &RawTemplate)> {
        self.templates
            .iter()
            .zip(&self.states)
            .enumerate()
            .filter_map(|(index, (template, state))| match (template, state) {
                (Some(template), SlotState::Unclaimed) => Some((index, template)),
                _ => None,
            })
    }
}
