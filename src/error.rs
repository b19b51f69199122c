//! Error types for placement and optimization.

use thiserror::Error;

/// Malformed input records, rejected before any model is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("resource {resource} has negative capacity {capacity}")]
    NegativeCapacity { resource: usize, capacity: i64 },

    #[error("workload {workload} has non-positive requirement {requirement}")]
    NonPositiveRequirement { workload: usize, requirement: i64 },

    #[error("workload {workload} requires {requirement}, more than any resource can host")]
    Oversized { workload: usize, requirement: i64 },

    #[error("{workloads} workloads but no resources to host them")]
    NoResources { workloads: usize },

    #[error("job {job} has {found} durations, expected one per server type ({expected})")]
    DurationCount {
        job: usize,
        found: usize,
        expected: usize,
    },

    #[error("job {job} has negative duration {duration}")]
    NegativeDuration { job: usize, duration: i64 },

    #[error("server type {server_type} has negative cost {cost}")]
    NegativeCost { server_type: usize, cost: i64 },
}

/// Errors surfaced by the optimizer and the instance constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("no assignment satisfies the constraints")]
    ModelInfeasible,

    /// The budget ran out before any solution was found. This is never a
    /// proof of infeasibility.
    #[error("time limit exceeded before a solution was found (lower bound {lower_bound})")]
    TimeLimitExceeded { lower_bound: i64 },

    #[error("the solver rejected a generated model")]
    ModelInvalid,

    #[error("invalid optimizer configuration: {0}")]
    InvalidConfig(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;
