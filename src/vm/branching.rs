//! Max-requirement-first, best-fit branching.

use std::cmp::Reverse;

use tracing::trace;

use super::instance::VmInstance;
use crate::cp::{Brancher, Decision, SearchState};

/// Branching policy for workload placement.
///
/// # Algorithm
///
/// - **Variable**: the unbound workload with the largest requirement; ties
///   go to the workload with the largest group, then to the lowest index
/// - **Value**: the resource in the domain left with the least slack after
///   placement (best-fit), lowest index on ties. When no resource has room
///   the domain minimum is proposed and left to propagation.
/// - **Anchor**: while nothing is bound, the selected workload goes on
///   resource 0. On a homogeneous pool every solution can be relabelled to
///   agree with the anchor, so it is committed without a refutation branch.
///
/// A decision that opens an empty resource is flagged as a probe.
#[derive(Debug, Clone)]
pub struct MaxRequirementFirst<'a> {
    instance: &'a VmInstance,
    /// Workloads in selection order.
    order: Vec<usize>,
    homogeneous: bool,
}

impl<'a> MaxRequirementFirst<'a> {
    pub fn new(instance: &'a VmInstance) -> Self {
        let workloads = instance.workloads();
        let mut order: Vec<usize> = (0..workloads.len()).collect();
        order.sort_by_key(|&i| {
            (
                Reverse(workloads[i].requirement),
                Reverse(instance.group_size(workloads[i].group)),
                i,
            )
        });
        Self {
            instance,
            order,
            homogeneous: instance.is_homogeneous(),
        }
    }

    /// Committed load per resource.
    fn loads(&self, state: &SearchState<'_>) -> Vec<i64> {
        let mut loads = vec![0; self.instance.resource_count()];
        for (i, w) in self.instance.workloads().iter().enumerate() {
            if let Some(r) = state.value(i) {
                loads[r] += w.requirement;
            }
        }
        loads
    }
}

impl Brancher for MaxRequirementFirst<'_> {
    fn next_decision(&mut self, state: &SearchState<'_>) -> Option<Decision> {
        let var = self.order.iter().copied().find(|&i| !state.is_bound(i))?;
        let requirement = self.instance.workloads()[var].requirement;
        let loads = self.loads(state);

        let nothing_bound = state.unbound().count() == state.var_count();
        let decision = if nothing_bound && state.contains(var, 0) {
            if self.homogeneous {
                Decision::assign_or_fail(var, 0)
            } else {
                Decision::assign(var, 0)
            }
        } else {
            let resources = self.instance.resources();
            let value = state
                .domain(var)
                .iter()
                .map(|r| (resources[r].capacity - loads[r] - requirement, r))
                .filter(|&(slack, _)| slack >= 0)
                .min()
                .map(|(_, r)| r)
                .or_else(|| state.min(var))?;
            Decision::assign(var, value)
        };

        if loads[decision.value] == 0 {
            trace!(
                workload = var,
                resource = decision.value,
                refutable = decision.refutable,
                "probing empty resource"
            );
            Some(decision.as_probe())
        } else {
            Some(decision)
        }
    }
}
