//! Random instance generation for benchmarks and property tests.

use rand::Rng;

use super::instance::{Service, VmInstance};
use crate::error::{PlacementError, PlacementResult};

/// Shape of a random service-based instance.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_placement::vm::{random_instance, RandomInstanceConfig};
///
/// let config = RandomInstanceConfig::default().with_services(5).with_servers(8);
/// let mut rng = StdRng::seed_from_u64(42);
/// let instance = random_instance(&config, &mut rng).unwrap();
/// assert_eq!(instance.resource_count(), 8);
/// assert_eq!(instance.groups().len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct RandomInstanceConfig {
    /// Number of services (anti-affinity groups).
    pub services: usize,

    /// Replicas per service are drawn from `1..=max_replicas`.
    pub max_replicas: usize,

    /// Requirements are drawn from `1..=max_requirement`.
    pub max_requirement: i64,

    /// Number of identical servers.
    pub servers: usize,

    /// Capacity of each server.
    pub capacity: i64,
}

impl Default for RandomInstanceConfig {
    fn default() -> Self {
        Self {
            services: 6,
            max_replicas: 3,
            max_requirement: 4,
            servers: 8,
            capacity: 8,
        }
    }
}

impl RandomInstanceConfig {
    pub fn with_services(mut self, services: usize) -> Self {
        self.services = services;
        self
    }

    pub fn with_max_replicas(mut self, max_replicas: usize) -> Self {
        self.max_replicas = max_replicas;
        self
    }

    pub fn with_max_requirement(mut self, max_requirement: i64) -> Self {
        self.max_requirement = max_requirement;
        self
    }

    pub fn with_servers(mut self, servers: usize) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.servers == 0 {
            return Err("servers must be at least 1".into());
        }
        if self.max_replicas == 0 {
            return Err("max_replicas must be at least 1".into());
        }
        if self.max_requirement < 1 {
            return Err("max_requirement must be at least 1".into());
        }
        if self.max_requirement > self.capacity {
            return Err(format!(
                "max_requirement ({}) exceeds capacity ({})",
                self.max_requirement, self.capacity
            ));
        }
        Ok(())
    }
}

/// Draws services from `config` and hosts them on a homogeneous pool.
///
/// Instances may be infeasible, e.g. when a service has more replicas than
/// there are servers.
pub fn random_instance<R: Rng>(
    config: &RandomInstanceConfig,
    rng: &mut R,
) -> PlacementResult<VmInstance> {
    config.validate().map_err(PlacementError::InvalidConfig)?;
    let services: Vec<Service> = (0..config.services)
        .map(|_| {
            Service::new(
                rng.random_range(1..=config.max_replicas),
                rng.random_range(1..=config.max_requirement),
            )
        })
        .collect();
    VmInstance::from_services(&services, config.servers, config.capacity)
}
