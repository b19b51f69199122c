//! Core trait for bound-driven optimization.

use std::time::Duration;

use crate::cp::{CpSolution, ObjectiveBounds, SearchGoal};

/// Parameters of one solve round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRequest {
    /// Constraint on the objective for this round only.
    pub bounds: ObjectiveBounds,
    pub goal: SearchGoal,
    /// Budget for this round. `None` for no limit.
    pub time_limit: Option<Duration>,
}

/// A minimization problem that can be searched under objective bounds.
///
/// Users implement this trait to specify:
/// - The trivially known objective range
/// - How to build a fresh model for the given bounds and search it
///
/// Each call to [`solve_round`](BoundedProblem::solve_round) must build its
/// own model; nothing may carry over between rounds.
///
/// # Examples
///
/// ```
/// use u_placement::cp::{CpSolution, SolverStatus};
/// use u_placement::optimizer::{BoundedProblem, RoundRequest};
///
/// /// Any value in 3..=10 is feasible.
/// struct AtLeastThree;
///
/// impl BoundedProblem for AtLeastThree {
///     fn objective_range(&self) -> (i64, i64) {
///         (0, 10)
///     }
///
///     fn solve_round(&self, request: &RoundRequest) -> CpSolution {
///         let lo = request.bounds.lb.unwrap_or(0).max(3);
///         let hi = request.bounds.ub.unwrap_or(10);
///         let mut solution = CpSolution::empty(SolverStatus::Infeasible);
///         if lo <= hi {
///             solution.status = SolverStatus::Feasible;
///             solution.objective = Some(lo);
///             solution.assignment = Some(vec![]);
///         }
///         solution
///     }
/// }
/// ```
pub trait BoundedProblem {
    /// `(lb, ub)` such that every solution has an objective within the range.
    fn objective_range(&self) -> (i64, i64);

    /// Builds a fresh model constrained to `request.bounds` and searches it.
    fn solve_round(&self, request: &RoundRequest) -> CpSolution;
}
