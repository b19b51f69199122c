//! Jobs, server types, and validated job-assignment instances.

use crate::error::{InputError, PlacementResult};

/// A job with one duration per server type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub durations: Vec<i64>,
}

impl Job {
    pub fn new(durations: Vec<i64>) -> Self {
        Self { durations }
    }
}

/// A kind of server, billed per job it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerType {
    pub cost: i64,
}

impl ServerType {
    pub fn new(cost: i64) -> Self {
        Self { cost }
    }
}

/// A validated job-assignment instance.
///
/// Each job runs on one server type. The cost of an assignment is
/// `makespan * total cost`, where the makespan is the longest duration of
/// any job on its type and the total cost sums the type cost of every job.
///
/// # Examples
///
/// ```
/// use u_placement::jobs::{Job, JobInstance, ServerType};
///
/// let instance = JobInstance::new(
///     vec![Job::new(vec![6, 2]), Job::new(vec![4, 1])],
///     vec![ServerType::new(1), ServerType::new(3)],
/// )
/// .unwrap();
/// assert_eq!(instance.makespan(&[0, 1]), 6);
/// assert_eq!(instance.total_cost(&[0, 1]), 4);
/// assert_eq!(instance.objective(&[0, 1]), 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct JobInstance {
    jobs: Vec<Job>,
    server_types: Vec<ServerType>,
}

impl JobInstance {
    /// Validates and builds an instance.
    ///
    /// # Errors
    ///
    /// [`InputError`] for a negative cost or duration, a duration list that
    /// does not match the server types, or jobs without server types.
    pub fn new(jobs: Vec<Job>, server_types: Vec<ServerType>) -> PlacementResult<Self> {
        if let Some((server_type, t)) = server_types.iter().enumerate().find(|(_, t)| t.cost < 0) {
            return Err(InputError::NegativeCost {
                server_type,
                cost: t.cost,
            }
            .into());
        }
        if server_types.is_empty() && !jobs.is_empty() {
            return Err(InputError::NoResources {
                workloads: jobs.len(),
            }
            .into());
        }
        for (job, j) in jobs.iter().enumerate() {
            if j.durations.len() != server_types.len() {
                return Err(InputError::DurationCount {
                    job,
                    found: j.durations.len(),
                    expected: server_types.len(),
                }
                .into());
            }
            if let Some(&duration) = j.durations.iter().find(|&&d| d < 0) {
                return Err(InputError::NegativeDuration { job, duration }.into());
            }
        }
        Ok(Self { jobs, server_types })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn server_types(&self) -> &[ServerType] {
        &self.server_types
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn type_count(&self) -> usize {
        self.server_types.len()
    }

    pub fn makespan(&self, assignment: &[usize]) -> i64 {
        self.jobs
            .iter()
            .zip(assignment)
            .map(|(j, &t)| j.durations[t])
            .max()
            .unwrap_or(0)
    }

    pub fn total_cost(&self, assignment: &[usize]) -> i64 {
        assignment
            .iter()
            .fold(0i64, |sum, &t| sum.saturating_add(self.server_types[t].cost))
    }

    /// `makespan * total_cost`, clamped to `i64::MAX`.
    pub fn objective(&self, assignment: &[usize]) -> i64 {
        self.makespan(assignment)
            .saturating_mul(self.total_cost(assignment))
    }

    /// Every job on its fastest type, paying the cheapest cost.
    pub fn lower_bound(&self) -> i64 {
        let makespan = self
            .jobs
            .iter()
            .filter_map(|j| j.durations.iter().min())
            .max()
            .copied()
            .unwrap_or(0);
        let cheapest = self.server_types.iter().map(|t| t.cost).min().unwrap_or(0);
        makespan
            .saturating_mul(cheapest)
            .saturating_mul(self.jobs.len() as i64)
    }

    /// Every job on its slowest type, paying the dearest cost.
    pub fn upper_bound(&self) -> i64 {
        let makespan = self
            .jobs
            .iter()
            .filter_map(|j| j.durations.iter().max())
            .max()
            .copied()
            .unwrap_or(0);
        let dearest = self.server_types.iter().map(|t| t.cost).max().unwrap_or(0);
        makespan
            .saturating_mul(dearest)
            .saturating_mul(self.jobs.len() as i64)
    }
}
