//! Bound-driven optimization.
//!
//! Finds and proves the optimum of a minimization problem by repeatedly
//! solving fresh models under tightened objective bounds.
//!
//! # Strategies
//!
//! - **Branch-and-bound**: a single minimizing search
//! - **Destructive lower bounding**: raise a bound from below until feasible
//! - **Destructive upper bounding**: lower a bound from above until infeasible
//! - **Binary search**: halve the objective interval per round
//!
//! All strategies share one time budget. A round that runs out of time is
//! inconclusive and never counts as a proof of infeasibility.

mod config;
mod runner;
mod types;

pub use config::{OptimizerConfig, Strategy};
pub use runner::{OptimizationReport, Optimizer, RoundRecord};
pub use types::{BoundedProblem, RoundRequest};
