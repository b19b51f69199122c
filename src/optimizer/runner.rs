//! Bound-driven optimization loop.
//!
//! # Algorithm
//!
//! Every strategy drives a sequence of solve rounds on a [`BoundedProblem`]:
//!
//! 1. Compute the remaining budget (overall limit minus elapsed so far)
//! 2. Solve one round under the next objective bounds
//! 3. Classify the outcome: solution found, proven infeasible, or
//!    inconclusive (time-limited)
//! 4. Move the bound, or stop
//!
//! An inconclusive round never moves a bound. The strategy stops and reports
//! its incumbent with the time-limit flag, or fails with
//! [`PlacementError::TimeLimitExceeded`] when it has none.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::config::{OptimizerConfig, Strategy};
use super::types::{BoundedProblem, RoundRequest};
use crate::cp::{CpSolution, ObjectiveBounds, SearchGoal, SolverStatus};
use crate::error::{PlacementError, PlacementResult};

/// Summary of one solve round.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundRecord {
    pub bounds: ObjectiveBounds,
    pub goal: SearchGoal,
    pub status: SolverStatus,
    pub objective: Option<i64>,
    pub branches: u64,
    pub elapsed: Duration,
}

/// Final result of an optimizer run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationReport {
    /// Strategy that produced this report.
    pub strategy: Strategy,
    /// Best objective value found.
    pub objective: i64,
    /// Value per variable of the best solution.
    pub assignment: Vec<usize>,
    /// Whether `objective` is proven optimal.
    pub proven_optimal: bool,
    /// Whether any round hit the time limit.
    pub time_limit_exceeded: bool,
    /// Best known lower bound on the optimum.
    pub lower_bound: i64,
    /// Branches across all rounds.
    pub branches: u64,
    /// Probe decisions across all rounds.
    pub probes: u64,
    /// Wall time across all rounds.
    pub elapsed: Duration,
    /// Rounds in execution order.
    pub rounds: Vec<RoundRecord>,
}

enum Verdict {
    Found(i64, Vec<usize>),
    Infeasible,
    Inconclusive,
    Invalid,
}

/// A missing value counts as infeasibility only when the search was
/// exhausted within its allowance.
fn classify(outcome: CpSolution, allowance: Option<Duration>) -> Verdict {
    match (outcome.objective, outcome.assignment) {
        (Some(objective), Some(assignment)) => Verdict::Found(objective, assignment),
        _ => match outcome.status {
            SolverStatus::ModelInvalid => Verdict::Invalid,
            SolverStatus::Infeasible if !allowance.is_some_and(|limit| outcome.elapsed >= limit) => {
                Verdict::Infeasible
            }
            _ => Verdict::Inconclusive,
        },
    }
}

/// Accumulates totals across the rounds of one strategy.
struct Session<'a, P: ?Sized> {
    problem: &'a P,
    strategy: Strategy,
    time_limit: Option<Duration>,
    rounds: Vec<RoundRecord>,
    branches: u64,
    probes: u64,
    elapsed: Duration,
    timed_out: bool,
}

impl<'a, P: BoundedProblem + ?Sized> Session<'a, P> {
    fn new(problem: &'a P, config: &OptimizerConfig) -> Self {
        Self {
            problem,
            strategy: config.strategy,
            time_limit: config.time_limit,
            rounds: Vec::new(),
            branches: 0,
            probes: 0,
            elapsed: Duration::ZERO,
            timed_out: false,
        }
    }

    /// Budget left for the next round; zero once exhausted.
    fn remaining(&self) -> Option<Duration> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed))
    }

    fn round(&mut self, bounds: ObjectiveBounds, goal: SearchGoal) -> CpSolution {
        let request = RoundRequest {
            bounds,
            goal,
            time_limit: self.remaining(),
        };
        // charge model construction too, not only the search
        let started = Instant::now();
        let mut outcome = self.problem.solve_round(&request);
        outcome.elapsed = outcome.elapsed.max(started.elapsed());

        self.branches += outcome.branches;
        self.probes += outcome.probes;
        self.elapsed += outcome.elapsed;
        self.timed_out |= outcome.status == SolverStatus::Timeout;
        debug!(
            strategy = self.strategy.name(),
            round = self.rounds.len(),
            lb = ?bounds.lb,
            ub = ?bounds.ub,
            status = ?outcome.status,
            objective = ?outcome.objective,
            branches = outcome.branches,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "solve round finished"
        );
        self.rounds.push(RoundRecord {
            bounds,
            goal,
            status: outcome.status,
            objective: outcome.objective,
            branches: outcome.branches,
            elapsed: outcome.elapsed,
        });
        outcome
    }

    /// Runs a first-solution round under `bounds` and classifies it.
    fn probe(&mut self, bounds: ObjectiveBounds) -> Verdict {
        let allowance = self.remaining();
        let outcome = self.round(bounds, SearchGoal::FirstSolution);
        classify(outcome, allowance)
    }

    fn report(
        self,
        objective: i64,
        assignment: Vec<usize>,
        proven_optimal: bool,
        lower_bound: i64,
    ) -> OptimizationReport {
        let over_budget = self.time_limit.is_some_and(|limit| self.elapsed >= limit);
        OptimizationReport {
            strategy: self.strategy,
            objective,
            assignment,
            proven_optimal,
            time_limit_exceeded: self.timed_out || over_budget,
            lower_bound,
            branches: self.branches,
            probes: self.probes,
            elapsed: self.elapsed,
            rounds: self.rounds,
        }
    }
}

/// Runs one bound-driven strategy on a [`BoundedProblem`].
///
/// # Examples
///
/// ```
/// use u_placement::optimizer::{Optimizer, OptimizerConfig, Strategy};
/// use u_placement::vm::{Service, VmInstance, VmPlacement};
///
/// let instance = VmInstance::from_services(
///     &[Service::new(2, 1), Service::new(2, 1), Service::new(2, 1)],
///     2,
///     3,
/// )
/// .unwrap();
/// let problem = VmPlacement::new(instance);
///
/// let config = OptimizerConfig::default()
///     .with_strategy(Strategy::DestructiveLowerBound { start: None });
/// let report = Optimizer::new(config).run(&problem).unwrap();
/// assert_eq!(report.objective, 2);
/// assert!(report.proven_optimal);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs the configured strategy.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::InvalidConfig`] if the configuration is inconsistent
    ///   or a starting bound falls outside the trivial objective range
    /// - [`PlacementError::ModelInfeasible`] if no objective value within the
    ///   trivial range admits a solution
    /// - [`PlacementError::TimeLimitExceeded`] if the budget ran out before
    ///   any solution was found
    pub fn run<P: BoundedProblem + ?Sized>(
        &self,
        problem: &P,
    ) -> PlacementResult<OptimizationReport> {
        self.config
            .validate()
            .map_err(PlacementError::InvalidConfig)?;

        let strategy = self.config.strategy;
        let (lo, hi) = problem.objective_range();
        if lo > hi {
            info!(
                strategy = strategy.name(),
                lo, hi, "trivial bounds cross, problem is infeasible"
            );
            return Err(PlacementError::ModelInfeasible);
        }
        self.config
            .validate_against(lo, hi)
            .map_err(PlacementError::InvalidConfig)?;

        let mut session = Session::new(problem, &self.config);
        let result = match strategy {
            Strategy::BranchAndBound => branch_and_bound(&mut session, lo),
            Strategy::DestructiveLowerBound { start } => {
                destructive_lower_bound(&mut session, start.unwrap_or(lo), lo, hi)
            }
            Strategy::DestructiveUpperBound { start } => {
                destructive_upper_bound(&mut session, start.unwrap_or(hi), lo, hi)
            }
            Strategy::BinarySearch { lb, ub } => {
                binary_search(&mut session, lb.unwrap_or(lo.saturating_sub(1)), ub.unwrap_or(hi), hi)
            }
        };

        let result = result.map(|(objective, assignment, proven, lower_bound)| {
            session.report(objective, assignment, proven, lower_bound)
        });
        match &result {
            Ok(report) => info!(
                strategy = strategy.name(),
                objective = report.objective,
                proven_optimal = report.proven_optimal,
                time_limit_exceeded = report.time_limit_exceeded,
                rounds = report.rounds.len(),
                branches = report.branches,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "optimization finished"
            ),
            Err(error) => info!(strategy = strategy.name(), %error, "optimization failed"),
        }
        result
    }
}

/// (objective, assignment, proven optimal, lower bound)
type Outcome = PlacementResult<(i64, Vec<usize>, bool, i64)>;

fn branch_and_bound<P: BoundedProblem + ?Sized>(session: &mut Session<'_, P>, lo: i64) -> Outcome {
    let allowance = session.remaining();
    let outcome = session.round(ObjectiveBounds::none(), SearchGoal::Minimize);
    let proven = outcome.status == SolverStatus::Optimal;
    match classify(outcome, allowance) {
        Verdict::Found(z, assignment) => Ok((z, assignment, proven, if proven { z } else { lo })),
        Verdict::Infeasible => Err(PlacementError::ModelInfeasible),
        Verdict::Inconclusive => Err(PlacementError::TimeLimitExceeded { lower_bound: lo }),
        Verdict::Invalid => Err(PlacementError::ModelInvalid),
    }
}

/// Every failed probe raises the bound by one. Optimality is proven once a
/// probe above `start` succeeds, since the one below it failed.
fn destructive_lower_bound<P: BoundedProblem + ?Sized>(
    session: &mut Session<'_, P>,
    start: i64,
    lo: i64,
    hi: i64,
) -> Outcome {
    let mut bound = start;
    loop {
        match session.probe(ObjectiveBounds::at_most(bound)) {
            Verdict::Found(z, assignment) => {
                let proven = bound > start || z <= lo;
                return Ok((z, assignment, proven, if proven { z } else { lo }));
            }
            Verdict::Infeasible if bound >= hi => return Err(PlacementError::ModelInfeasible),
            Verdict::Infeasible => bound += 1,
            Verdict::Inconclusive => {
                let lower_bound = if bound > start { bound } else { lo };
                return Err(PlacementError::TimeLimitExceeded { lower_bound });
            }
            Verdict::Invalid => return Err(PlacementError::ModelInvalid),
        }
    }
}

/// A start below the optimum fails before any incumbent exists. That
/// failure raises the floor and the walk restarts from `hi`.
fn destructive_upper_bound<P: BoundedProblem + ?Sized>(
    session: &mut Session<'_, P>,
    start: i64,
    lo: i64,
    hi: i64,
) -> Outcome {
    let mut floor = lo;
    let mut bound = start;
    let mut best: Option<(i64, Vec<usize>)> = None;
    let proven = loop {
        match session.probe(ObjectiveBounds::at_most(bound)) {
            Verdict::Found(z, assignment) => {
                best = Some((z, assignment));
                if z <= floor {
                    break true;
                }
                bound = z - 1;
            }
            Verdict::Infeasible if best.is_none() && bound < hi => {
                debug!(bound, hi, "start below the optimum, restarting from the ceiling");
                floor = floor.max(bound + 1);
                bound = hi;
            }
            Verdict::Infeasible => break true,
            Verdict::Inconclusive => break false,
            Verdict::Invalid => return Err(PlacementError::ModelInvalid),
        }
    };
    match best {
        Some((z, assignment)) => Ok((z, assignment, proven, if proven { z } else { floor })),
        None if proven => Err(PlacementError::ModelInfeasible),
        None => Err(PlacementError::TimeLimitExceeded { lower_bound: floor }),
    }
}

/// Values `<= lb` are known infeasible; `ub` is the ceiling. A ceiling
/// below `hi` that turns out infeasible widens the interval to `(ub, hi]`.
fn binary_search<P: BoundedProblem + ?Sized>(
    session: &mut Session<'_, P>,
    mut lb: i64,
    mut ub: i64,
    hi: i64,
) -> Outcome {
    if lb >= ub {
        return Err(PlacementError::InvalidConfig(format!(
            "binary search needs lb < ub, got lb={lb} ub={ub}"
        )));
    }
    let mut best: Option<(i64, Vec<usize>)> = None;
    let mut conclusive = true;
    loop {
        while ub.abs_diff(lb) > 1 {
            let mid = lb + (ub.abs_diff(lb) / 2) as i64;
            match session.probe(ObjectiveBounds::between(lb + 1, mid)) {
                Verdict::Found(z, assignment) => {
                    ub = z;
                    best = Some((z, assignment));
                }
                Verdict::Infeasible => lb = mid,
                Verdict::Inconclusive => {
                    conclusive = false;
                    break;
                }
                Verdict::Invalid => return Err(PlacementError::ModelInvalid),
            }
        }
        if !conclusive || best.is_some() {
            break;
        }

        // the ceiling itself was never confirmed
        match session.probe(ObjectiveBounds::between(lb + 1, ub)) {
            Verdict::Found(z, assignment) => {
                best = Some((z, assignment));
                break;
            }
            Verdict::Infeasible if ub < hi => {
                debug!(ub, hi, "ceiling infeasible, widening to the trivial upper bound");
                lb = ub;
                ub = hi;
            }
            Verdict::Infeasible => return Err(PlacementError::ModelInfeasible),
            Verdict::Inconclusive => {
                conclusive = false;
                break;
            }
            Verdict::Invalid => return Err(PlacementError::ModelInvalid),
        }
    }

    match best {
        Some((z, assignment)) => Ok((z, assignment, conclusive, if conclusive { z } else { lb + 1 })),
        None => Err(PlacementError::TimeLimitExceeded { lower_bound: lb + 1 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Every objective value in `optimum..=ceiling` is feasible. Rounds capped
    /// below `slow_below` time out, and each round reports `round_time` of
    /// elapsed time.
    struct Staircase {
        optimum: i64,
        ceiling: i64,
        slow_below: i64,
        round_time: Duration,
        requests: RefCell<Vec<RoundRequest>>,
    }

    impl Staircase {
        fn new(optimum: i64, ceiling: i64) -> Self {
            Self {
                optimum,
                ceiling,
                slow_below: i64::MIN,
                round_time: Duration::from_millis(1),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn slow_below(mut self, value: i64) -> Self {
            self.slow_below = value;
            self
        }
    }

    impl BoundedProblem for Staircase {
        fn objective_range(&self) -> (i64, i64) {
            (1, self.ceiling)
        }

        fn solve_round(&self, request: &RoundRequest) -> CpSolution {
            self.requests.borrow_mut().push(*request);
            let lo = request.bounds.lb.unwrap_or(i64::MIN);
            let hi = request.bounds.ub.unwrap_or(self.ceiling);
            let mut solution = CpSolution::empty(SolverStatus::Infeasible);
            solution.elapsed = self.round_time;
            solution.branches = 10;

            if request.time_limit.is_some_and(|t| t.is_zero()) || hi < self.slow_below {
                solution.status = SolverStatus::Timeout;
                solution.elapsed = request.time_limit.unwrap_or(self.round_time);
                return solution;
            }
            let target = match request.goal {
                SearchGoal::Minimize => self.optimum,
                // first solutions land at the top of the window
                SearchGoal::FirstSolution => hi.min(self.ceiling),
            };
            if target >= self.optimum && target >= lo && target <= hi {
                solution.status = match request.goal {
                    SearchGoal::Minimize => SolverStatus::Optimal,
                    SearchGoal::FirstSolution => SolverStatus::Feasible,
                };
                solution.objective = Some(target);
                solution.assignment = Some(vec![target as usize]);
            }
            solution
        }
    }

    fn run(problem: &Staircase, strategy: Strategy) -> PlacementResult<OptimizationReport> {
        Optimizer::new(OptimizerConfig::default().with_strategy(strategy)).run(problem)
    }

    #[test]
    fn test_all_strategies_agree() {
        for strategy in Strategy::all() {
            let problem = Staircase::new(7, 20);
            let report = run(&problem, strategy).unwrap();
            assert_eq!(report.objective, 7, "{}", strategy.name());
            assert!(report.proven_optimal, "{}", strategy.name());
            assert!(!report.time_limit_exceeded);
            assert_eq!(report.lower_bound, 7);
            assert_eq!(report.branches, 10 * report.rounds.len() as u64);
        }
    }

    #[test]
    fn test_branch_and_bound_single_round() {
        let problem = Staircase::new(4, 9);
        let report = run(&problem, Strategy::BranchAndBound).unwrap();
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].bounds, ObjectiveBounds::none());
        assert_eq!(report.rounds[0].goal, SearchGoal::Minimize);
    }

    #[test]
    fn test_destructive_lower_bound_probes_each_value_once() {
        let problem = Staircase::new(6, 10);
        let report = run(&problem, Strategy::DestructiveLowerBound { start: None }).unwrap();
        let probed: Vec<_> = report.rounds.iter().map(|r| r.bounds.ub.unwrap()).collect();
        assert_eq!(probed, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_destructive_lower_bound_respects_ceiling() {
        let problem = Staircase::new(30, 10);
        let result = run(&problem, Strategy::DestructiveLowerBound { start: Some(8) });
        assert_eq!(result.unwrap_err(), PlacementError::ModelInfeasible);
        assert_eq!(problem.requests.borrow().len(), 3);
    }

    #[test]
    fn test_destructive_lower_bound_start_above_optimum() {
        let problem = Staircase::new(3, 10);
        let report = run(&problem, Strategy::DestructiveLowerBound { start: Some(6) }).unwrap();
        assert_eq!(report.objective, 6);
        assert!(!report.proven_optimal);
        assert_eq!(report.lower_bound, 1);
    }

    #[test]
    fn test_starting_bounds_outside_range_are_rejected() {
        for strategy in [
            Strategy::DestructiveLowerBound { start: Some(0) },
            Strategy::DestructiveLowerBound { start: Some(11) },
            Strategy::DestructiveUpperBound { start: Some(0) },
            Strategy::BinarySearch { lb: Some(10), ub: None },
            Strategy::BinarySearch { lb: None, ub: Some(0) },
        ] {
            let problem = Staircase::new(3, 10);
            let result = run(&problem, strategy);
            assert!(
                matches!(result, Err(PlacementError::InvalidConfig(_))),
                "{strategy:?}: {result:?}"
            );
            assert!(problem.requests.borrow().is_empty());
        }
    }

    #[test]
    fn test_destructive_upper_bound_restarts_below_optimum() {
        let problem = Staircase::new(6, 10);
        let report = run(&problem, Strategy::DestructiveUpperBound { start: Some(4) }).unwrap();
        assert_eq!(report.objective, 6);
        assert!(report.proven_optimal);
        assert_eq!(report.lower_bound, 6);
        let probed: Vec<_> = report.rounds.iter().map(|r| r.bounds.ub.unwrap()).collect();
        assert_eq!(probed, vec![4, 10, 9, 8, 7, 6, 5]);
    }

    #[test]
    fn test_destructive_upper_bound_restart_keeps_floor_on_timeout() {
        // the failed start and the restart fit the budget, the third round does not
        let mut problem = Staircase::new(6, 20);
        problem.round_time = Duration::from_millis(10);
        let config = OptimizerConfig::default()
            .with_strategy(Strategy::DestructiveUpperBound { start: Some(3) })
            .with_time_limit(Duration::from_millis(15));
        let report = Optimizer::new(config).run(&problem).unwrap();
        assert_eq!(report.objective, 20);
        assert!(report.time_limit_exceeded);
        assert!(!report.proven_optimal);
        assert_eq!(report.lower_bound, 4);
        assert_eq!(problem.requests.borrow().len(), 3);
    }

    #[test]
    fn test_destructive_upper_bound_walks_down() {
        let problem = Staircase::new(6, 10);
        let report = run(&problem, Strategy::DestructiveUpperBound { start: None }).unwrap();
        let probed: Vec<_> = report.rounds.iter().map(|r| r.bounds.ub.unwrap()).collect();
        assert_eq!(probed, vec![10, 9, 8, 7, 6, 5]);
        assert_eq!(report.rounds.last().unwrap().status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_destructive_upper_bound_infeasible_start() {
        let problem = Staircase::new(12, 10);
        let result = run(&problem, Strategy::DestructiveUpperBound { start: None });
        assert_eq!(result.unwrap_err(), PlacementError::ModelInfeasible);
    }

    #[test]
    fn test_binary_search_round_count() {
        let problem = Staircase::new(37, 100);
        let report = run(&problem, Strategy::BinarySearch { lb: None, ub: None }).unwrap();
        assert_eq!(report.objective, 37);
        // (0, 100]: ceil(log2(101)) = 7, plus the ceiling check
        assert!(report.rounds.len() <= 8, "{} rounds", report.rounds.len());
    }

    #[test]
    fn test_binary_search_confirms_ceiling() {
        let problem = Staircase::new(10, 10);
        let report = run(&problem, Strategy::BinarySearch { lb: None, ub: None }).unwrap();
        assert_eq!(report.objective, 10);
        assert!(report.proven_optimal);
        let last = report.rounds.last().unwrap();
        assert_eq!(last.bounds, ObjectiveBounds::between(10, 10));
    }

    #[test]
    fn test_binary_search_widens_low_ceiling() {
        let problem = Staircase::new(7, 20);
        let report = run(&problem, Strategy::BinarySearch { lb: None, ub: Some(4) }).unwrap();
        assert_eq!(report.objective, 7);
        assert!(report.proven_optimal);
        assert_eq!(report.lower_bound, 7);
        assert!(report
            .rounds
            .iter()
            .any(|r| r.bounds == ObjectiveBounds::between(4, 4) && r.status == SolverStatus::Infeasible));
    }

    #[test]
    fn test_binary_search_infeasible() {
        let problem = Staircase::new(11, 10);
        let result = run(&problem, Strategy::BinarySearch { lb: None, ub: None });
        assert_eq!(result.unwrap_err(), PlacementError::ModelInfeasible);
    }

    #[test]
    fn test_binary_search_bad_interval() {
        let problem = Staircase::new(3, 10);
        let result = run(&problem, Strategy::BinarySearch { lb: Some(20), ub: None });
        assert!(matches!(result, Err(PlacementError::InvalidConfig(_))));
    }

    #[test]
    fn test_timeout_is_not_infeasibility_for_lower_bounding() {
        let problem = Staircase::new(6, 10).slow_below(i64::MAX);
        let result = run(&problem, Strategy::DestructiveLowerBound { start: None });
        assert_eq!(
            result.unwrap_err(),
            PlacementError::TimeLimitExceeded { lower_bound: 1 }
        );
        assert_eq!(problem.requests.borrow().len(), 1);
    }

    #[test]
    fn test_timeout_keeps_incumbent_for_binary_search() {
        // probes capped below 8 stall
        let problem = Staircase::new(3, 16).slow_below(8);
        let report = run(&problem, Strategy::BinarySearch { lb: Some(2), ub: None }).unwrap();
        assert!(report.time_limit_exceeded);
        assert!(!report.proven_optimal);
        assert_eq!(report.objective, 9);
        assert_eq!(report.lower_bound, 3);
        assert_eq!(report.rounds.len(), 2);
    }

    #[test]
    fn test_budget_shrinks_across_rounds() {
        let problem = Staircase::new(4, 10);
        let config = OptimizerConfig::default()
            .with_strategy(Strategy::DestructiveLowerBound { start: None })
            .with_time_limit(Duration::from_millis(100));
        let report = Optimizer::new(config).run(&problem).unwrap();
        assert_eq!(report.objective, 4);

        let limits: Vec<_> = problem
            .requests
            .borrow()
            .iter()
            .map(|r| r.time_limit.unwrap())
            .collect();
        assert_eq!(limits.len(), 4);
        assert_eq!(limits[0], Duration::from_millis(100));
        for pair in limits.windows(2) {
            assert!(pair[1] + Duration::from_millis(1) <= pair[0], "{limits:?}");
        }
    }

    #[test]
    fn test_round_time_covers_model_construction() {
        /// Spends its time before the search starts and reports none of it.
        struct SlowBuild {
            limits: RefCell<Vec<Option<Duration>>>,
        }
        impl BoundedProblem for SlowBuild {
            fn objective_range(&self) -> (i64, i64) {
                (1, 5)
            }
            fn solve_round(&self, request: &RoundRequest) -> CpSolution {
                self.limits.borrow_mut().push(request.time_limit);
                std::thread::sleep(Duration::from_millis(20));
                let mut solution = CpSolution::empty(SolverStatus::Infeasible);
                if request.bounds.ub.is_some_and(|ub| ub >= 3) {
                    solution.status = SolverStatus::Feasible;
                    solution.objective = Some(3);
                    solution.assignment = Some(vec![3]);
                }
                solution
            }
        }

        let problem = SlowBuild {
            limits: RefCell::new(Vec::new()),
        };
        let config = OptimizerConfig::default()
            .with_strategy(Strategy::DestructiveLowerBound { start: None })
            .with_time_limit(Duration::from_secs(10));
        let report = Optimizer::new(config).run(&problem).unwrap();
        assert_eq!(report.objective, 3);
        assert!(report.elapsed >= Duration::from_millis(60));
        assert!(report.rounds.iter().all(|r| r.elapsed >= Duration::from_millis(20)));

        let limits = problem.limits.borrow();
        assert_eq!(limits.len(), 3);
        assert!(limits[2].unwrap() <= Duration::from_secs(10) - Duration::from_millis(40));
    }

    #[test]
    fn test_infeasible_past_allowance_is_inconclusive() {
        let mut problem = Staircase::new(5, 10);
        problem.round_time = Duration::from_millis(10);
        let config = OptimizerConfig::default()
            .with_strategy(Strategy::DestructiveLowerBound { start: None })
            .with_time_limit(Duration::from_millis(25));
        let result = Optimizer::new(config).run(&problem);
        assert_eq!(
            result.unwrap_err(),
            PlacementError::TimeLimitExceeded { lower_bound: 3 }
        );
        assert_eq!(problem.requests.borrow().len(), 3);
    }

    #[test]
    fn test_upper_bounding_reports_incumbent_on_timeout() {
        let mut problem = Staircase::new(2, 10);
        problem.round_time = Duration::from_millis(10);
        let config = OptimizerConfig::default()
            .with_strategy(Strategy::DestructiveUpperBound { start: None })
            .with_time_limit(Duration::from_millis(30));
        let report = Optimizer::new(config).run(&problem).unwrap();
        assert_eq!(report.objective, 8);
        assert!(report.time_limit_exceeded);
        assert!(!report.proven_optimal);
        assert_eq!(report.lower_bound, 1);

        // the budget was gone before the fourth round
        let last = *problem.requests.borrow().last().unwrap();
        assert_eq!(last.time_limit, Some(Duration::ZERO));
        assert_eq!(report.rounds.last().unwrap().status, SolverStatus::Timeout);
    }

    #[test]
    fn test_crossed_trivial_bounds() {
        struct Crossed;
        impl BoundedProblem for Crossed {
            fn objective_range(&self) -> (i64, i64) {
                (4, 2)
            }
            fn solve_round(&self, _request: &RoundRequest) -> CpSolution {
                unreachable!("no round may run when the trivial bounds cross")
            }
        }
        for strategy in Strategy::all() {
            let result = Optimizer::new(OptimizerConfig::default().with_strategy(strategy)).run(&Crossed);
            assert_eq!(result.unwrap_err(), PlacementError::ModelInfeasible);
        }
    }
}
