//! Job assignment to server types.
//!
//! Every job runs on exactly one server type. Types trade speed for cost;
//! the objective `makespan * total cost` balances the two.
//!
//! - [`JobInstance`]: validated jobs and server types
//! - [`JobAssignment`]: fresh model per round, implements
//!   [`BoundedProblem`](crate::optimizer::BoundedProblem)
//! - [`SmallestDomainFirst`]: first-fail branching on the smallest value

mod branching;
mod instance;
mod model;

pub use branching::SmallestDomainFirst;
pub use instance::{Job, JobInstance, ServerType};
pub use model::JobAssignment;
