//! Workloads, resources, and validated placement instances.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::error::{InputError, PlacementResult};

/// A workload unit (virtual machine) to place on exactly one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Workload {
    /// Capacity consumed on the hosting resource.
    pub requirement: i64,
    /// Anti-affinity group: workloads of one group need distinct resources.
    pub group: usize,
}

impl Workload {
    pub fn new(requirement: i64, group: usize) -> Self {
        Self { requirement, group }
    }
}

/// A capacity-bounded host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    pub capacity: i64,
}

impl Resource {
    pub fn new(capacity: i64) -> Self {
        Self { capacity }
    }
}

/// A replicated service: `replicas` identical workloads in one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Service {
    pub replicas: usize,
    /// Requirement of each replica.
    pub requirement: i64,
}

impl Service {
    pub fn new(replicas: usize, requirement: i64) -> Self {
        Self {
            replicas,
            requirement,
        }
    }
}

/// A constraint violated by an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("assignment covers {found} workloads, expected {expected}")]
    Length { expected: usize, found: usize },

    #[error("workload {workload} placed on unknown resource {resource}")]
    UnknownResource { workload: usize, resource: usize },

    #[error("resource {resource} carries {load}, capacity {capacity}")]
    OverCapacity {
        resource: usize,
        load: i64,
        capacity: i64,
    },

    #[error("workloads {first} and {second} of group {group} share resource {resource}")]
    AntiAffinity {
        group: usize,
        resource: usize,
        first: usize,
        second: usize,
    },
}

/// A validated placement instance.
///
/// # Examples
///
/// ```
/// use u_placement::vm::{Service, VmInstance};
///
/// // two services of 2 replicas each, 3 servers of capacity 4
/// let instance = VmInstance::from_services(&[Service::new(2, 3), Service::new(2, 1)], 3, 4)
///     .unwrap();
/// assert_eq!(instance.workload_count(), 4);
/// assert_eq!(instance.group_size(0), 2);
/// assert_eq!(instance.lower_bound(), 2);
/// assert!(instance.verify(&[0, 1, 0, 1]).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VmInstance {
    workloads: Vec<Workload>,
    resources: Vec<Resource>,
    /// Members of each group, in index order.
    groups: BTreeMap<usize, Vec<usize>>,
}

impl VmInstance {
    /// Validates and builds an instance.
    ///
    /// # Errors
    ///
    /// [`InputError`] for a negative capacity, a non-positive requirement, a
    /// workload that fits on no resource, or workloads without resources.
    pub fn new(workloads: Vec<Workload>, resources: Vec<Resource>) -> PlacementResult<Self> {
        if let Some((resource, r)) = resources.iter().enumerate().find(|(_, r)| r.capacity < 0) {
            return Err(InputError::NegativeCapacity {
                resource,
                capacity: r.capacity,
            }
            .into());
        }
        if resources.is_empty() && !workloads.is_empty() {
            return Err(InputError::NoResources {
                workloads: workloads.len(),
            }
            .into());
        }
        let largest = resources.iter().map(|r| r.capacity).max().unwrap_or(0);
        for (workload, w) in workloads.iter().enumerate() {
            if w.requirement <= 0 {
                return Err(InputError::NonPositiveRequirement {
                    workload,
                    requirement: w.requirement,
                }
                .into());
            }
            if w.requirement > largest {
                return Err(InputError::Oversized {
                    workload,
                    requirement: w.requirement,
                }
                .into());
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, w) in workloads.iter().enumerate() {
            groups.entry(w.group).or_default().push(i);
        }
        Ok(Self {
            workloads,
            resources,
            groups,
        })
    }

    /// Expands services into workloads (service index = group) and hosts
    /// them on `servers` identical resources.
    pub fn from_services(services: &[Service], servers: usize, capacity: i64) -> PlacementResult<Self> {
        let workloads = services
            .iter()
            .enumerate()
            .flat_map(|(group, s)| std::iter::repeat_n(Workload::new(s.requirement, group), s.replicas))
            .collect();
        Self::uniform(workloads, servers, capacity)
    }

    /// Hosts `workloads` on `count` resources of equal capacity.
    pub fn uniform(workloads: Vec<Workload>, count: usize, capacity: i64) -> PlacementResult<Self> {
        Self::new(workloads, vec![Resource::new(capacity); count])
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn workload_count(&self) -> usize {
        self.workloads.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Groups and their members in index order.
    pub fn groups(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.groups
    }

    pub fn group_size(&self, group: usize) -> usize {
        self.groups.get(&group).map_or(0, Vec::len)
    }

    /// Whether all resources have the same capacity.
    pub fn is_homogeneous(&self) -> bool {
        self.resources.windows(2).all(|w| w[0].capacity == w[1].capacity)
    }

    /// Trivial lower bound on the resource count: the largest group, and
    /// the total requirement over the largest capacity.
    pub fn lower_bound(&self) -> i64 {
        if self.workloads.is_empty() {
            return 0;
        }
        let largest_group = self.groups.values().map(Vec::len).max().unwrap_or(0) as i64;
        let total: i64 = self.workloads.iter().map(|w| w.requirement).sum();
        let largest = self.resources.iter().map(|r| r.capacity).max().unwrap_or(1).max(1);
        largest_group.max((total + largest - 1) / largest).max(1)
    }

    /// Trivial upper bound on the resource count.
    pub fn upper_bound(&self) -> i64 {
        if self.workloads.is_empty() {
            0
        } else {
            self.resources.len() as i64
        }
    }

    /// Load per resource under `assignment`. Unknown resources are ignored.
    pub fn loads(&self, assignment: &[usize]) -> Vec<i64> {
        let mut loads = vec![0; self.resources.len()];
        for (w, &r) in self.workloads.iter().zip(assignment) {
            if let Some(load) = loads.get_mut(r) {
                *load += w.requirement;
            }
        }
        loads
    }

    /// `1 + max(assignment)`, the resource count when filled from index 0.
    pub fn objective(&self, assignment: &[usize]) -> i64 {
        assignment.iter().max().map_or(0, |&m| m as i64 + 1)
    }

    /// Checks a complete assignment against capacity and anti-affinity.
    pub fn verify(&self, assignment: &[usize]) -> Result<(), Violation> {
        if assignment.len() != self.workloads.len() {
            return Err(Violation::Length {
                expected: self.workloads.len(),
                found: assignment.len(),
            });
        }
        if let Some((workload, &resource)) = assignment
            .iter()
            .enumerate()
            .find(|&(_, &r)| r >= self.resources.len())
        {
            return Err(Violation::UnknownResource { workload, resource });
        }
        for (resource, (&load, r)) in self.loads(assignment).iter().zip(&self.resources).enumerate() {
            if load > r.capacity {
                return Err(Violation::OverCapacity {
                    resource,
                    load,
                    capacity: r.capacity,
                });
            }
        }
        for (&group, members) in &self.groups {
            let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
            for &m in members {
                if let Some(&first) = seen.get(&assignment[m]) {
                    return Err(Violation::AntiAffinity {
                        group,
                        resource: assignment[m],
                        first,
                        second: m,
                    });
                }
                seen.insert(assignment[m], m);
            }
        }
        Ok(())
    }
}
