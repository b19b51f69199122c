//! Placement model builder.

use super::branching::MaxRequirementFirst;
use super::instance::VmInstance;
use crate::cp::{
    CpModel, CpSolution, CpSolver, DepthFirstSolver, Objective, ObjectiveBounds, SolverConfig,
};
use crate::optimizer::{BoundedProblem, RoundRequest};

/// Placement of a [`VmInstance`] on the fewest resources.
///
/// Every round builds a fresh [`CpModel`]:
///
/// - one variable per workload, domain `0..resources`
/// - all-different over each group
/// - one capacity constraint per resource, plus a packing relaxation over all
/// - `x_i < x_j` for consecutive members of a group with equal requirement
/// - objective `1 + max(x)`, restricted to the round's bounds
///
/// # Examples
///
/// ```
/// use u_placement::cp::ObjectiveBounds;
/// use u_placement::vm::{Service, VmInstance, VmPlacement};
///
/// let instance = VmInstance::from_services(&[Service::new(3, 1)], 4, 2).unwrap();
/// let model = VmPlacement::new(instance).build_model(ObjectiveBounds::at_most(3));
/// assert_eq!(model.var_count(), 3);
/// // 1 all-different + 2 orderings + 4 capacities + 1 packing
/// assert_eq!(model.constraint_count(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct VmPlacement {
    instance: VmInstance,
    symmetry_breaking: bool,
}

impl VmPlacement {
    pub fn new(instance: VmInstance) -> Self {
        Self {
            instance,
            symmetry_breaking: true,
        }
    }

    /// Disables the ordering constraints between interchangeable workloads.
    pub fn without_symmetry_breaking(mut self) -> Self {
        self.symmetry_breaking = false;
        self
    }

    pub fn instance(&self) -> &VmInstance {
        &self.instance
    }

    pub fn build_model(&self, bounds: ObjectiveBounds) -> CpModel {
        let instance = &self.instance;
        let resources = instance.resource_count();
        let mut model = CpModel::new("vm-placement");
        let vars: Vec<_> = (0..instance.workload_count())
            .map(|i| model.new_var(format!("vm{i}"), resources))
            .collect();

        for members in instance.groups().values() {
            if members.len() > 1 {
                model.add_all_different(members.iter().map(|&m| vars[m]).collect());
            }
            if self.symmetry_breaking {
                let workloads = instance.workloads();
                for pair in members.windows(2) {
                    if workloads[pair[0]].requirement == workloads[pair[1]].requirement {
                        model.add_less(vars[pair[0]], vars[pair[1]]);
                    }
                }
            }
        }

        let terms: Vec<_> = instance
            .workloads()
            .iter()
            .zip(&vars)
            .map(|(w, &v)| (v, w.requirement))
            .collect();
        for (r, resource) in instance.resources().iter().enumerate() {
            model.add_capacity(r, terms.clone(), resource.capacity);
        }
        model.add_packing(terms, instance.resources().iter().map(|r| r.capacity).collect());

        model.set_objective(Objective::MaxPlusOne { vars });
        model.set_bounds(bounds);
        model
    }
}

impl BoundedProblem for VmPlacement {
    fn objective_range(&self) -> (i64, i64) {
        (self.instance.lower_bound(), self.instance.upper_bound())
    }

    fn solve_round(&self, request: &RoundRequest) -> CpSolution {
        let model = self.build_model(request.bounds);
        let config = SolverConfig {
            time_limit: request.time_limit,
            goal: request.goal,
        };
        DepthFirstSolver.solve(&model, MaxRequirementFirst::new(&self.instance), &config)
    }
}
