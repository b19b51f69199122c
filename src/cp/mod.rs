//! Constraint Programming (CP) engine.
//!
//! A small finite-domain engine covering what the placement models need:
//! bitset domains, forward-checking constraints, objective bound filtering
//! and a depth-first search driven by a pluggable [`Brancher`].
//!
//! # Key Components
//!
//! - **Variables**: [`Domain`], addressed by [`VarId`]
//! - **Constraints**: [`Constraint`]: AllDifferent, Less, Capacity, Packing
//! - **Model**: [`CpModel`]: variables, constraints, [`Objective`], [`ObjectiveBounds`]
//! - **Solver**: [`CpSolver`] trait, [`DepthFirstSolver`] implementation
//!
//! # Design
//!
//! This is not a general propagation engine: constraints filter by forward
//! checking only, and there is no arc consistency. Models are meant to be
//! built fresh for every search and dropped afterwards.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod model;
mod solver;
mod variables;

pub use model::{Constraint, CpModel, Objective, ObjectiveBounds};
pub use solver::{
    Brancher, CpSolution, CpSolver, Decision, DepthFirstSolver, SearchGoal, SearchState,
    SolverConfig, SolverStatus,
};
pub use variables::{Domain, VarId};
