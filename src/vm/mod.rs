//! Workload placement on the fewest resources.
//!
//! Workloads (virtual machines) carry a capacity requirement and belong to
//! an anti-affinity group; members of one group must run on distinct
//! resources. The objective is `1 + max(resource index)`, so minimizing it
//! packs the workloads onto a prefix of the resource list.
//!
//! # Key Components
//!
//! - [`VmInstance`]: validated workloads and resources
//! - [`VmPlacement`]: fresh model per round, implements
//!   [`BoundedProblem`](crate::optimizer::BoundedProblem)
//! - [`MaxRequirementFirst`]: best-fit branching with an anchored first decision
//! - [`random_instance`]: seeded instance generator
//!
//! # Symmetry Breaking
//!
//! Members of one group with equal requirements are interchangeable; the
//! model orders them (`x_i < x_j`), which keeps at least one optimal
//! assignment.

mod branching;
mod generate;
mod instance;
mod model;

pub use branching::MaxRequirementFirst;
pub use generate::{random_instance, RandomInstanceConfig};
pub use instance::{Resource, Service, Violation, VmInstance, Workload};
pub use model::VmPlacement;
