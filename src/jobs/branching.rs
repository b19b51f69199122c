//! Smallest-domain-first branching.

use crate::cp::{Brancher, Decision, SearchState};

/// Picks the unbound variable with the fewest values left (lowest index on
/// ties) and tries its smallest value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestDomainFirst;

impl Brancher for SmallestDomainFirst {
    fn next_decision(&mut self, state: &SearchState<'_>) -> Option<Decision> {
        let var = state.unbound().min_by_key(|&v| state.domain(v).len())?;
        Some(Decision::assign(var, state.min(var)?))
    }
}
