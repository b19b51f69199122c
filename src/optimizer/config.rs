//! Optimizer configuration.

use std::time::Duration;

/// Meta-strategy that drives the solve rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// One minimizing search; each solution tightens the bound of the next.
    #[default]
    BranchAndBound,

    /// Probe `objective <= L` for `L = start, start + 1, ...` until feasible.
    DestructiveLowerBound {
        /// First value probed. Defaults to the problem's trivial lower bound.
        start: Option<i64>,
    },

    /// Probe `objective <= U`, then `<= best - 1`, until infeasible.
    DestructiveUpperBound {
        /// First value probed. Defaults to the problem's trivial upper bound.
        start: Option<i64>,
    },

    /// Halve the interval `(lb, ub]` with feasibility probes on `[lb + 1, mid]`.
    BinarySearch {
        /// Largest value known to be infeasible. Defaults to trivial lower bound - 1.
        lb: Option<i64>,
        /// Ceiling of the search. Defaults to the trivial upper bound.
        ub: Option<i64>,
    },
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::BranchAndBound => "branch-and-bound",
            Strategy::DestructiveLowerBound { .. } => "destructive-lower-bound",
            Strategy::DestructiveUpperBound { .. } => "destructive-upper-bound",
            Strategy::BinarySearch { .. } => "binary-search",
        }
    }

    /// All four strategies with default starting bounds.
    pub fn all() -> [Strategy; 4] {
        [
            Strategy::BranchAndBound,
            Strategy::DestructiveLowerBound { start: None },
            Strategy::DestructiveUpperBound { start: None },
            Strategy::BinarySearch { lb: None, ub: None },
        ]
    }
}

/// Configuration for the [`Optimizer`](super::Optimizer).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_placement::optimizer::{OptimizerConfig, Strategy};
///
/// let config = OptimizerConfig::default()
///     .with_strategy(Strategy::BinarySearch { lb: None, ub: None })
///     .with_time_limit(Duration::from_secs(15));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimizerConfig {
    pub strategy: Strategy,
    /// Overall budget shared by all rounds. `None` for no limit.
    pub time_limit: Option<Duration>,
}

impl OptimizerConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Strategy::BinarySearch {
            lb: Some(lb),
            ub: Some(ub),
        } = self.strategy
        {
            if lb >= ub {
                return Err(format!("binary search needs lb < ub, got lb={lb} ub={ub}"));
            }
        }
        Ok(())
    }

    /// Checks explicit starting bounds against the trivial objective range
    /// `lo..=hi` of a problem.
    pub fn validate_against(&self, lo: i64, hi: i64) -> Result<(), String> {
        match self.strategy {
            Strategy::BranchAndBound => {}
            Strategy::DestructiveLowerBound { start: Some(start) } => {
                if start < lo || start > hi {
                    return Err(format!(
                        "lower bounding start {start} outside the objective range [{lo}, {hi}]"
                    ));
                }
            }
            Strategy::DestructiveUpperBound { start: Some(start) } => {
                if start < lo {
                    return Err(format!(
                        "upper bounding start {start} below the objective lower bound {lo}"
                    ));
                }
            }
            Strategy::BinarySearch { lb, ub } => {
                if let Some(lb) = lb.filter(|&lb| lb >= hi) {
                    return Err(format!(
                        "binary search lb {lb} must stay below the objective upper bound {hi}"
                    ));
                }
                if let Some(ub) = ub.filter(|&ub| ub < lo) {
                    return Err(format!(
                        "binary search ub {ub} below the objective lower bound {lo}"
                    ));
                }
            }
            Strategy::DestructiveLowerBound { start: None }
            | Strategy::DestructiveUpperBound { start: None } => {}
        }
        Ok(())
    }
}
