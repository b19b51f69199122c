//! Workload placement by constraint programming with bound-driven optimization.
//!
//! Packs workloads onto the fewest capacity-bounded resources, subject to
//! anti-affinity groups, and proves the resource count optimal:
//!
//! - **CP engine**: finite-domain variables, forward-checking constraints,
//!   objective bounds and a depth-first search driven by a pluggable
//!   branching policy.
//! - **VM placement**: workloads with capacity requirements and
//!   anti-affinity groups, symmetry breaking between interchangeable
//!   workloads, and max-requirement-first best-fit branching.
//! - **Job assignment**: jobs assigned to server types under a
//!   `makespan * cost` objective, with smallest-domain-first branching.
//! - **Optimizer**: branch-and-bound, destructive lower bounding,
//!   destructive upper bounding and binary search over the objective, under
//!   one shared time budget.
//!
//! # Architecture
//!
//! The optimizer only sees the [`optimizer::BoundedProblem`] trait: a
//! trivial objective range plus one bounded solve round. Every round builds
//! a fresh model, so no solver state crosses rounds. A round that runs out
//! of time is never taken as a proof of infeasibility.
//!
//! The library emits `tracing` events and never installs a subscriber.

pub mod cp;
pub mod error;
pub mod jobs;
pub mod optimizer;
pub mod vm;

pub use error::{InputError, PlacementError, PlacementResult};
