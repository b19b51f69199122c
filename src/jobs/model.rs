//! Job-assignment model builder.

use super::branching::SmallestDomainFirst;
use super::instance::JobInstance;
use crate::cp::{
    CpModel, CpSolution, CpSolver, DepthFirstSolver, Objective, ObjectiveBounds, SolverConfig,
};
use crate::optimizer::{BoundedProblem, RoundRequest};

/// Assignment of every job in a [`JobInstance`] to a server type,
/// minimizing `makespan * total cost`.
#[derive(Debug, Clone)]
pub struct JobAssignment {
    instance: JobInstance,
}

impl JobAssignment {
    pub fn new(instance: JobInstance) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &JobInstance {
        &self.instance
    }

    /// One variable per job over the server types, with the cost expression
    /// as objective.
    pub fn build_model(&self, bounds: ObjectiveBounds) -> CpModel {
        let instance = &self.instance;
        let mut model = CpModel::new("job-assignment");
        let vars = (0..instance.job_count())
            .map(|i| model.new_var(format!("job{i}"), instance.type_count()))
            .collect();
        model.set_objective(Objective::MakespanCost {
            vars,
            durations: instance.jobs().iter().map(|j| j.durations.clone()).collect(),
            costs: instance.server_types().iter().map(|t| t.cost).collect(),
        });
        model.set_bounds(bounds);
        model
    }
}

impl BoundedProblem for JobAssignment {
    fn objective_range(&self) -> (i64, i64) {
        (self.instance.lower_bound(), self.instance.upper_bound())
    }

    fn solve_round(&self, request: &RoundRequest) -> CpSolution {
        let model = self.build_model(request.bounds);
        let config = SolverConfig {
            time_limit: request.time_limit,
            goal: request.goal,
        };
        DepthFirstSolver.solve(&model, SmallestDomainFirst, &config)
    }
}
