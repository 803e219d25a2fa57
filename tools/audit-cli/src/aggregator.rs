use crate::classifier::CheckOutcome;
use std::collections::HashMap;

/// Ordered accumulation of outcomes for one run. Owned by the orchestrator
/// and reset at the start of every run; never a process-wide global.
#[derive(Debug, Default)]
pub struct Aggregator {
    outcomes: HashMap<String, CheckOutcome>,
    order: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an outcome. The order slot is claimed on first sight of the
    /// name; re-recording overwrites the outcome without duplicating the
    /// slot.
    pub fn record(&mut self, outcome: CheckOutcome) {
        if !self.order.iter().any(|name| name == &outcome.check_name) {
            self.order.push(outcome.check_name.clone());
        }
        self.outcomes.insert(outcome.check_name.clone(), outcome);
    }

    /// Clear both the keyed store and the order list.
    pub fn reset(&mut self) {
        self.outcomes.clear();
        self.order.clear();
    }

    /// Outcomes in first-recorded order, independent of the map's native
    /// iteration order.
    pub fn ordered_outcomes(&self) -> Vec<&CheckOutcome> {
        self.order
            .iter()
            .filter_map(|name| self.outcomes.get(name))
            .collect()
    }

    pub fn total_issues(&self) -> u32 {
        self.outcomes
            .values()
            .map(|outcome| outcome.issue_count.unwrap_or(0))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
