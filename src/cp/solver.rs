//! Depth-first search driver.

use std::time::{Duration, Instant};

use super::model::{CpModel, ObjectiveBounds};
use super::variables::{Domain, VarId};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Search space exhausted after finding a solution; the best one is optimal.
    Optimal,
    /// A solution was found and search stopped there.
    Feasible,
    /// Search space exhausted without a solution.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Time limit reached. A solution may or may not have been found.
    Timeout,
}

/// What the search stops at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchGoal {
    /// Stop at the first complete assignment.
    #[default]
    FirstSolution,
    /// Keep searching for strictly better solutions until exhaustion.
    Minimize,
}

/// Solver configuration.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Maximum wall time. `None` for no limit.
    pub time_limit: Option<Duration>,
    pub goal: SearchGoal,
}

impl SolverConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_goal(mut self, goal: SearchGoal) -> Self {
        self.goal = goal;
        self
    }
}

/// A branching decision: try `var = value`.
///
/// On failure the search refutes the decision (`var != value`) and goes on,
/// unless the decision is commit-or-fail, in which case failure propagates
/// to the previous decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub var: VarId,
    pub value: usize,
    pub refutable: bool,
    /// Placement on a value nothing else uses yet. Only counted.
    pub probe: bool,
}

impl Decision {
    pub fn assign(var: VarId, value: usize) -> Self {
        Self {
            var,
            value,
            refutable: true,
            probe: false,
        }
    }

    pub fn assign_or_fail(var: VarId, value: usize) -> Self {
        Self {
            refutable: false,
            ..Self::assign(var, value)
        }
    }

    pub fn as_probe(self) -> Self {
        Self {
            probe: true,
            ..self
        }
    }
}

/// Read-only view of the domains at a search node.
#[derive(Debug, Clone, Copy)]
pub struct SearchState<'a> {
    domains: &'a [Domain],
}

impl<'a> SearchState<'a> {
    pub fn new(domains: &'a [Domain]) -> Self {
        Self { domains }
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, var: VarId) -> &'a Domain {
        &self.domains[var]
    }

    pub fn is_bound(&self, var: VarId) -> bool {
        self.domains[var].is_bound()
    }

    pub fn value(&self, var: VarId) -> Option<usize> {
        self.domains[var].value()
    }

    pub fn contains(&self, var: VarId, value: usize) -> bool {
        self.domains[var].contains(value)
    }

    pub fn min(&self, var: VarId) -> Option<usize> {
        self.domains[var].min()
    }

    pub fn max(&self, var: VarId) -> Option<usize> {
        self.domains[var].max()
    }

    /// Unbound variables in index order.
    pub fn unbound(&self) -> impl Iterator<Item = VarId> + 'a {
        let domains = self.domains;
        (0..domains.len()).filter(move |&v| !domains[v].is_bound())
    }

    pub fn all_bound(&self) -> bool {
        self.domains.iter().all(Domain::is_bound)
    }
}

/// Chooses the next decision at a search node, or `None` once every
/// variable is bound.
///
/// Implementations must only propose values contained in the current domain
/// and must not keep state that changes their answer for the same state.
pub trait Brancher {
    fn next_decision(&mut self, state: &SearchState<'_>) -> Option<Decision>;
}

impl<F> Brancher for F
where
    F: FnMut(&SearchState<'_>) -> Option<Decision>,
{
    fn next_decision(&mut self, state: &SearchState<'_>) -> Option<Decision> {
        self(state)
    }
}

/// Result of one search.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective value of the best solution, if any.
    pub objective: Option<i64>,
    /// Value per variable of the best solution, if any.
    pub assignment: Option<Vec<usize>>,
    /// Decisions applied plus decisions refuted.
    pub branches: u64,
    /// Decisions flagged as probes.
    pub probes: u64,
    /// Complete assignments found.
    pub solutions: u32,
    /// Wall time.
    pub elapsed: Duration,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective: None,
            assignment: None,
            branches: 0,
            probes: 0,
            solutions: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.objective.is_some()
    }
}

/// Trait for CP solver implementations.
pub trait CpSolver {
    /// Searches `model` with decisions from `brancher`.
    fn solve<B: Brancher>(&self, model: &CpModel, brancher: B, config: &SolverConfig)
        -> CpSolution;
}

/// Depth-first search with chronological backtracking.
///
/// Each decision saves a snapshot of the domains; backtracking restores the
/// snapshot and refutes the decision. Under [`SearchGoal::Minimize`] every
/// solution tightens the objective upper bound to `value - 1` for the rest
/// of the search.
///
/// The clock is checked on entry and every [`DepthFirstSolver::CHECK_INTERVAL`]
/// nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirstSolver;

struct Frame {
    saved: Vec<Domain>,
    decision: Decision,
}

impl DepthFirstSolver {
    pub const CHECK_INTERVAL: u64 = 64;

    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for DepthFirstSolver {
    fn solve<B: Brancher>(
        &self,
        model: &CpModel,
        mut brancher: B,
        config: &SolverConfig,
    ) -> CpSolution {
        let start = Instant::now();
        if model.validate().is_err() {
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }
        let timed_out = || config.time_limit.is_some_and(|limit| start.elapsed() >= limit);

        let mut bounds: ObjectiveBounds = model.bounds();
        let mut domains = model.domains().to_vec();
        let mut stack: Vec<Frame> = Vec::new();
        let mut best: Option<(i64, Vec<usize>)> = None;
        let (mut branches, mut probes, mut solutions, mut nodes) = (0u64, 0u64, 0u32, 0u64);

        let mut consistent = model.propagate(&mut domains, bounds).is_ok();
        let status = loop {
            if nodes % Self::CHECK_INTERVAL == 0 && timed_out() {
                break SolverStatus::Timeout;
            }
            nodes += 1;

            if consistent {
                let state = SearchState::new(&domains);
                match brancher.next_decision(&state) {
                    Some(decision) => {
                        debug_assert!(
                            domains[decision.var].contains(decision.value),
                            "brancher proposed value {} outside the domain of variable {}",
                            decision.value,
                            decision.var
                        );
                        branches += 1;
                        if decision.probe {
                            probes += 1;
                        }
                        stack.push(Frame {
                            saved: domains.clone(),
                            decision,
                        });
                        domains[decision.var].assign(decision.value);
                        consistent = model.propagate(&mut domains, bounds).is_ok();
                        continue;
                    }
                    None if state.all_bound() => {
                        let value = model.objective().and_then(|o| o.value(&domains)).unwrap_or(0);
                        let assignment = domains.iter().filter_map(Domain::value).collect();
                        solutions += 1;
                        best = Some((value, assignment));
                        if config.goal == SearchGoal::FirstSolution || model.objective().is_none() {
                            break SolverStatus::Feasible;
                        }
                        bounds.tighten_ub(value - 1);
                    }
                    // brancher gave up on an incomplete assignment
                    None => {}
                }
            }

            // backtrack to the most recent refutable decision
            let mut exhausted = true;
            while let Some(frame) = stack.pop() {
                if frame.decision.refutable {
                    domains = frame.saved;
                    domains[frame.decision.var].remove(frame.decision.value);
                    branches += 1;
                    consistent = model.propagate(&mut domains, bounds).is_ok();
                    exhausted = false;
                    break;
                }
            }
            if exhausted {
                break if best.is_some() {
                    SolverStatus::Optimal
                } else {
                    SolverStatus::Infeasible
                };
            }
        };

        let (objective, assignment) = match best {
            Some((value, assignment)) => (Some(value), Some(assignment)),
            None => (None, None),
        };
        CpSolution {
            status,
            objective,
            assignment,
            branches,
            probes,
            solutions,
            elapsed: start.elapsed(),
        }
    }
}
