//! CP model definition and constraint filtering.

use super::variables::{Domain, VarId};

/// Marker returned when filtering empties a domain or detects a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Failure;

type Filtered = Result<bool, Failure>;

/// A constraint in the CP model.
///
/// Only the constraint kinds needed by the placement models are supported.
/// Each one filters domains by forward checking; no arc consistency.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Pairwise distinct values.
    AllDifferent {
        /// Constrained variables.
        vars: Vec<VarId>,
    },

    /// Strict ordering: `left < right`.
    Less { left: VarId, right: VarId },

    /// Linear sum over indicator terms: `sum(weight * [var == value]) <= capacity`.
    Capacity {
        /// The value (resource index) whose load is bounded.
        value: usize,
        /// (variable, weight) pairs.
        terms: Vec<(VarId, i64)>,
        /// Maximum total weight.
        capacity: i64,
    },

    /// Aggregate packing relaxation: the unplaced weight must fit into the
    /// free capacity of the values still reachable by unbound variables.
    Packing {
        terms: Vec<(VarId, i64)>,
        /// Capacity per value.
        capacities: Vec<i64>,
    },
}

impl Constraint {
    fn vars(&self) -> Vec<VarId> {
        match self {
            Constraint::AllDifferent { vars } => vars.clone(),
            Constraint::Less { left, right } => vec![*left, *right],
            Constraint::Capacity { terms, .. } | Constraint::Packing { terms, .. } => {
                terms.iter().map(|&(v, _)| v).collect()
            }
        }
    }

    /// Filters domains once. Returns whether any domain changed.
    fn filter(&self, domains: &mut [Domain]) -> Filtered {
        match self {
            Constraint::AllDifferent { vars } => {
                let fixed: Vec<(VarId, usize)> = vars
                    .iter()
                    .filter_map(|&v| domains[v].value().map(|val| (v, val)))
                    .collect();
                let mut changed = false;
                for &(owner, val) in &fixed {
                    for &other in vars {
                        if other != owner && domains[other].remove(val) {
                            if domains[other].is_empty() {
                                return Err(Failure);
                            }
                            changed = true;
                        }
                    }
                }
                // pigeonhole
                if Domain::union_len(vars.iter().map(|&v| &domains[v])) < vars.len() {
                    return Err(Failure);
                }
                Ok(changed)
            }
            Constraint::Less { left, right } => {
                let lo = domains[*left].min().ok_or(Failure)?;
                let mut changed = domains[*right].remove_below(lo + 1);
                let hi = domains[*right].max().ok_or(Failure)?;
                changed |= domains[*left].remove_from(hi);
                if domains[*left].is_empty() {
                    return Err(Failure);
                }
                Ok(changed)
            }
            Constraint::Capacity {
                value,
                terms,
                capacity,
            } => {
                let load: i64 = terms
                    .iter()
                    .filter(|&&(v, _)| domains[v].value() == Some(*value))
                    .map(|&(_, w)| w)
                    .sum();
                if load > *capacity {
                    return Err(Failure);
                }
                let mut changed = false;
                for &(v, w) in terms {
                    if !domains[v].is_bound() && load + w > *capacity && domains[v].remove(*value) {
                        if domains[v].is_empty() {
                            return Err(Failure);
                        }
                        changed = true;
                    }
                }
                Ok(changed)
            }
            Constraint::Packing { terms, capacities } => {
                let mut free = capacities.clone();
                let mut reachable = vec![false; capacities.len()];
                let mut unplaced = 0;
                for &(v, w) in terms {
                    match domains[v].value() {
                        Some(val) => free[val] -= w,
                        None => {
                            unplaced += w;
                            for val in domains[v].iter() {
                                reachable[val] = true;
                            }
                        }
                    }
                }
                let room: i64 = free
                    .iter()
                    .zip(&reachable)
                    .filter(|&(_, &r)| r)
                    .map(|(&f, _)| f.max(0))
                    .sum();
                if unplaced > room {
                    return Err(Failure);
                }
                Ok(false)
            }
        }
    }
}

/// Optional bounds on the objective value, `lb <= objective <= ub`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveBounds {
    pub lb: Option<i64>,
    pub ub: Option<i64>,
}

impl ObjectiveBounds {
    /// No bounds.
    pub fn none() -> Self {
        Self::default()
    }

    /// `objective <= ub`.
    pub fn at_most(ub: i64) -> Self {
        Self { lb: None, ub: Some(ub) }
    }

    /// `lb <= objective <= ub`.
    pub fn between(lb: i64, ub: i64) -> Self {
        Self {
            lb: Some(lb),
            ub: Some(ub),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lb.is_none() && self.ub.is_none()
    }

    /// Tightens the upper bound, keeping the smaller of the two.
    pub fn tighten_ub(&mut self, ub: i64) {
        self.ub = Some(self.ub.map_or(ub, |cur| cur.min(ub)));
    }
}

/// Objective expression of the model. Search minimizes it.
#[derive(Debug, Clone)]
pub enum Objective {
    /// `1 + max(vars)`, or 0 when `vars` is empty.
    ///
    /// With resource indices as values this counts resources used, assuming
    /// they are filled from index 0 upwards.
    MaxPlusOne { vars: Vec<VarId> },

    /// `max_i(durations[i][x_i]) * sum_i(costs[x_i])`.
    MakespanCost {
        vars: Vec<VarId>,
        /// Per variable, per value duration table.
        durations: Vec<Vec<i64>>,
        /// Per value cost.
        costs: Vec<i64>,
    },
}

impl Objective {
    fn vars(&self) -> &[VarId] {
        match self {
            Objective::MaxPlusOne { vars } | Objective::MakespanCost { vars, .. } => vars,
        }
    }

    /// Range of objective values compatible with the current domains.
    ///
    /// Returns `None` if a domain is empty.
    pub fn range(&self, domains: &[Domain]) -> Option<(i64, i64)> {
        match self {
            Objective::MaxPlusOne { vars } => {
                let mut lo = 0;
                let mut hi = 0;
                for &v in vars {
                    lo = lo.max(domains[v].min()? as i64 + 1);
                    hi = hi.max(domains[v].max()? as i64 + 1);
                }
                Some((lo, hi))
            }
            Objective::MakespanCost {
                vars,
                durations,
                costs,
            } => {
                let (mut mk_lo, mut mk_hi, mut cost_lo, mut cost_hi) = (0i64, 0i64, 0i64, 0i64);
                for (i, &v) in vars.iter().enumerate() {
                    let d = &domains[v];
                    if d.is_empty() {
                        return None;
                    }
                    mk_lo = mk_lo.max(d.iter().map(|x| durations[i][x]).min()?);
                    mk_hi = mk_hi.max(d.iter().map(|x| durations[i][x]).max()?);
                    cost_lo = cost_lo.saturating_add(d.iter().map(|x| costs[x]).min()?);
                    cost_hi = cost_hi.saturating_add(d.iter().map(|x| costs[x]).max()?);
                }
                // values past i64::MAX clamp to it
                Some((mk_lo.saturating_mul(cost_lo), mk_hi.saturating_mul(cost_hi)))
            }
        }
    }

    /// Objective value of a complete assignment.
    pub fn value(&self, domains: &[Domain]) -> Option<i64> {
        if self.vars().iter().any(|&v| !domains[v].is_bound()) {
            return None;
        }
        self.range(domains).map(|(lo, _)| lo)
    }

    /// Removes values that cannot respect `bounds`.
    fn filter(&self, domains: &mut [Domain], bounds: ObjectiveBounds) -> Filtered {
        let (lo, hi) = self.range(domains).ok_or(Failure)?;
        if bounds.ub.is_some_and(|ub| lo > ub) || bounds.lb.is_some_and(|lb| hi < lb) {
            return Err(Failure);
        }
        match self {
            Objective::MaxPlusOne { vars } => {
                let mut changed = false;
                if let Some(ub) = bounds.ub {
                    let limit = ub.max(0) as usize;
                    for &v in vars {
                        changed |= domains[v].remove_from(limit);
                        if domains[v].is_empty() {
                            return Err(Failure);
                        }
                    }
                }
                if let Some(lb) = bounds.lb.filter(|&lb| lb > 1) {
                    // some variable must reach lb - 1
                    let threshold = (lb - 1) as usize;
                    let mut reaching = vars
                        .iter()
                        .copied()
                        .filter(|&v| domains[v].max().is_some_and(|m| m >= threshold));
                    match (reaching.next(), reaching.next()) {
                        (None, _) => return Err(Failure),
                        (Some(only), None) => {
                            changed |= domains[only].remove_below(threshold);
                        }
                        _ => {}
                    }
                }
                Ok(changed)
            }
            Objective::MakespanCost {
                vars,
                durations,
                costs,
            } => {
                let Some(ub) = bounds.ub else {
                    return Ok(false);
                };
                let min_dur: Vec<i64> = vars
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| domains[v].iter().map(|x| durations[i][x]).min().unwrap_or(0))
                    .collect();
                let min_cost: Vec<i64> = vars
                    .iter()
                    .map(|&v| domains[v].iter().map(|x| costs[x]).min().unwrap_or(0))
                    .collect();
                let total_cost = min_cost.iter().fold(0i64, |sum, &c| sum.saturating_add(c));
                let mut changed = false;
                for (i, &v) in vars.iter().enumerate() {
                    if domains[v].is_bound() {
                        continue;
                    }
                    let mk_others = min_dur
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != i)
                        .map(|(_, &d)| d)
                        .max()
                        .unwrap_or(0);
                    let cost_others = total_cost - min_cost[i];
                    let doomed: Vec<usize> = domains[v]
                        .iter()
                        .filter(|&x| {
                            let cost = cost_others.saturating_add(costs[x]);
                            mk_others.max(durations[i][x]).saturating_mul(cost) > ub
                        })
                        .collect();
                    for x in doomed {
                        changed |= domains[v].remove(x);
                    }
                    if domains[v].is_empty() {
                        return Err(Failure);
                    }
                }
                Ok(changed)
            }
        }
    }
}

/// A constraint programming model over finite integer domains.
///
/// # Examples
///
/// ```
/// use u_placement::cp::{CpModel, Objective};
///
/// let mut model = CpModel::new("example");
/// let a = model.new_var("a", 3);
/// let b = model.new_var("b", 3);
/// model.add_all_different(vec![a, b]);
/// model.add_less(a, b);
/// model.set_objective(Objective::MaxPlusOne { vars: vec![a, b] });
/// assert!(model.validate().is_ok());
/// assert_eq!(model.var_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    names: Vec<String>,
    domains: Vec<Domain>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    bounds: ObjectiveBounds,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            domains: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            bounds: ObjectiveBounds::none(),
        }
    }

    /// Adds a variable with domain `0..size`.
    pub fn new_var(&mut self, name: impl Into<String>, size: usize) -> VarId {
        self.names.push(name.into());
        self.domains.push(Domain::full(size));
        self.domains.len() - 1
    }

    /// Adds a constraint.
    pub fn post(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn add_all_different(&mut self, vars: Vec<VarId>) {
        self.post(Constraint::AllDifferent { vars });
    }

    pub fn add_less(&mut self, left: VarId, right: VarId) {
        self.post(Constraint::Less { left, right });
    }

    pub fn add_capacity(&mut self, value: usize, terms: Vec<(VarId, i64)>, capacity: i64) {
        self.post(Constraint::Capacity {
            value,
            terms,
            capacity,
        });
    }

    pub fn add_packing(&mut self, terms: Vec<(VarId, i64)>, capacities: Vec<i64>) {
        self.post(Constraint::Packing { terms, capacities });
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Constrains the objective to `bounds`.
    pub fn set_bounds(&mut self, bounds: ObjectiveBounds) {
        self.bounds = bounds;
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn bounds(&self) -> ObjectiveBounds {
        self.bounds
    }

    pub fn var_name(&self, var: VarId) -> Option<&str> {
        self.names.get(var).map(String::as_str)
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Initial domains, before any filtering.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Validates the model for consistency.
    ///
    /// Checks that all referenced variables exist, that objective tables
    /// cover every domain value, and that bounds come with an objective.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.domains.len();
        for constraint in &self.constraints {
            if let Some(v) = constraint.vars().into_iter().find(|&v| v >= n) {
                return Err(format!("undefined variable: {v}"));
            }
            if let Constraint::Packing { terms, capacities } = constraint {
                let uncovered = terms
                    .iter()
                    .find(|&&(v, _)| self.domains[v].max().is_some_and(|m| m >= capacities.len()));
                if let Some(&(v, _)) = uncovered {
                    return Err(format!("packing: no capacity for domain of {}", self.names[v]));
                }
            }
        }
        match &self.objective {
            Some(objective) => {
                if let Some(&v) = objective.vars().iter().find(|&&v| v >= n) {
                    return Err(format!("undefined variable: {v}"));
                }
                if let Objective::MakespanCost {
                    vars,
                    durations,
                    costs,
                } = objective
                {
                    if durations.len() != vars.len() {
                        return Err("makespan-cost: vars and durations length mismatch".into());
                    }
                    for (i, &v) in vars.iter().enumerate() {
                        let size = self.domains[v].max().map_or(0, |m| m + 1);
                        if durations[i].len() < size || costs.len() < size {
                            return Err(format!(
                                "makespan-cost: tables do not cover domain of {}",
                                self.names[v]
                            ));
                        }
                    }
                }
            }
            None if !self.bounds.is_unbounded() => {
                return Err("objective bounds without an objective".into());
            }
            None => {}
        }
        Ok(())
    }

    /// Filters `domains` to a fixpoint under all constraints and the
    /// objective bounds.
    pub(crate) fn propagate(
        &self,
        domains: &mut [Domain],
        bounds: ObjectiveBounds,
    ) -> Result<(), Failure> {
        if domains.iter().any(Domain::is_empty) {
            return Err(Failure);
        }
        loop {
            let mut changed = false;
            for constraint in &self.constraints {
                changed |= constraint.filter(domains)?;
            }
            if let Some(objective) = &self.objective {
                changed |= objective.filter(domains, bounds)?;
            }
            if !changed {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixpoint(model: &CpModel) -> Result<Vec<Domain>, Failure> {
        let mut domains = model.domains().to_vec();
        model.propagate(&mut domains, model.bounds())?;
        Ok(domains)
    }

    #[test]
    fn test_model_creation() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 4);
        let b = model.new_var("b", 4);
        model.add_all_different(vec![a, b]);
        model.add_capacity(0, vec![(a, 2), (b, 3)], 4);
        model.set_objective(Objective::MaxPlusOne { vars: vec![a, b] });

        assert_eq!(model.var_count(), 2);
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.var_name(b), Some("b"));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let mut model = CpModel::new("test");
        model.add_less(0, 1);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_bounds_without_objective() {
        let mut model = CpModel::new("test");
        model.new_var("a", 2);
        model.set_bounds(ObjectiveBounds::at_most(1));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_makespan_tables_must_cover_domain() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 3);
        model.set_objective(Objective::MakespanCost {
            vars: vec![a],
            durations: vec![vec![1, 2]],
            costs: vec![1, 1, 1],
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_all_different_forward_checking() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 3);
        let b = model.new_var("b", 3);
        model.add_all_different(vec![a, b]);
        let mut domains = model.domains().to_vec();
        domains[a].assign(1);
        model.propagate(&mut domains, ObjectiveBounds::none()).unwrap();
        assert!(!domains[b].contains(1));
        assert_eq!(domains[b].len(), 2);
    }

    #[test]
    fn test_all_different_pigeonhole() {
        let mut model = CpModel::new("test");
        let vars: Vec<_> = (0..4).map(|i| model.new_var(format!("x{i}"), 2)).collect();
        model.add_all_different(vars);
        assert_eq!(fixpoint(&model), Err(Failure));
    }

    #[test]
    fn test_less_filters_both_sides() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 4);
        let b = model.new_var("b", 4);
        model.add_less(a, b);
        let domains = fixpoint(&model).unwrap();
        assert_eq!(domains[a].max(), Some(2));
        assert_eq!(domains[b].min(), Some(1));
    }

    #[test]
    fn test_capacity_removes_overflowing_values() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 2);
        let b = model.new_var("b", 2);
        model.add_capacity(0, vec![(a, 4), (b, 3)], 5);
        let mut domains = model.domains().to_vec();
        domains[a].assign(0);
        model.propagate(&mut domains, ObjectiveBounds::none()).unwrap();
        assert_eq!(domains[b].value(), Some(1));
    }

    #[test]
    fn test_capacity_overload_fails() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 1);
        let b = model.new_var("b", 1);
        model.add_capacity(0, vec![(a, 4), (b, 3)], 5);
        assert_eq!(fixpoint(&model), Err(Failure));
    }

    #[test]
    fn test_packing_detects_total_overflow() {
        let mut model = CpModel::new("test");
        let vars: Vec<_> = (0..3).map(|i| model.new_var(format!("x{i}"), 2)).collect();
        // 3 * 3 = 9 units into 2 * 4 = 8 units of room; no single value overflows yet
        model.add_packing(vars.iter().map(|&v| (v, 3)).collect(), vec![4, 4]);
        assert_eq!(fixpoint(&model), Err(Failure));

        let mut model = CpModel::new("test");
        let vars: Vec<_> = (0..3).map(|i| model.new_var(format!("x{i}"), 2)).collect();
        model.add_packing(vars.iter().map(|&v| (v, 3)).collect(), vec![4, 5]);
        assert!(fixpoint(&model).is_ok());
    }

    #[test]
    fn test_packing_ignores_unreachable_room() {
        let mut model = CpModel::new("test");
        let vars: Vec<_> = (0..3).map(|i| model.new_var(format!("x{i}"), 3)).collect();
        model.add_packing(vars.iter().map(|&v| (v, 4)).collect(), vec![4, 4, 10]);
        let mut domains = model.domains().to_vec();
        domains[vars[0]].assign(0);
        assert!(model.propagate(&mut domains, ObjectiveBounds::none()).is_ok());
        // the room of value 2 is out of reach once it leaves both domains
        domains[vars[1]].remove(2);
        domains[vars[2]].remove(2);
        assert_eq!(model.propagate(&mut domains, ObjectiveBounds::none()), Err(Failure));
    }

    #[test]
    fn test_packing_capacities_must_cover_domain() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 3);
        model.add_packing(vec![(a, 1)], vec![4, 4]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_max_plus_one_upper_bound() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 5);
        model.set_objective(Objective::MaxPlusOne { vars: vec![a] });
        model.set_bounds(ObjectiveBounds::at_most(2));
        let domains = fixpoint(&model).unwrap();
        assert_eq!(domains[a].max(), Some(1));

        model.set_bounds(ObjectiveBounds::at_most(0));
        assert_eq!(fixpoint(&model), Err(Failure));
    }

    #[test]
    fn test_max_plus_one_lower_bound_single_support() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 5);
        let b = model.new_var("b", 5);
        model.set_objective(Objective::MaxPlusOne { vars: vec![a, b] });
        let mut domains = model.domains().to_vec();
        domains[a].assign(0);
        model
            .propagate(&mut domains, ObjectiveBounds::between(4, 5))
            .unwrap();
        assert_eq!(domains[b].min(), Some(3));
    }

    #[test]
    fn test_objective_range_and_value() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 2);
        let b = model.new_var("b", 2);
        let objective = Objective::MakespanCost {
            vars: vec![a, b],
            durations: vec![vec![4, 2], vec![3, 1]],
            costs: vec![1, 5],
        };
        let mut domains = model.domains().to_vec();
        assert_eq!(objective.range(&domains), Some((2 * 2, 4 * 10)));
        assert_eq!(objective.value(&domains), None);
        domains[a].assign(1);
        domains[b].assign(0);
        assert_eq!(objective.value(&domains), Some(3 * 6));
    }

    #[test]
    fn test_makespan_cost_saturates() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 2);
        let b = model.new_var("b", 2);
        model.set_objective(Objective::MakespanCost {
            vars: vec![a, b],
            durations: vec![vec![i64::MAX / 2, 1], vec![i64::MAX / 2, 1]],
            costs: vec![i64::MAX / 2, 1],
        });
        let objective = model.objective().unwrap();
        let domains = model.domains().to_vec();
        assert_eq!(objective.range(&domains), Some((2, i64::MAX)));

        // only the cheap fast value keeps the product under the bound
        model.set_bounds(ObjectiveBounds::at_most(1_000));
        let domains = fixpoint(&model).unwrap();
        assert_eq!(domains[a].value(), Some(1));
        assert_eq!(domains[b].value(), Some(1));
    }

    #[test]
    fn test_makespan_cost_upper_bound_prunes() {
        let mut model = CpModel::new("test");
        let a = model.new_var("a", 2);
        model.set_objective(Objective::MakespanCost {
            vars: vec![a],
            durations: vec![vec![10, 3]],
            costs: vec![1, 2],
        });
        model.set_bounds(ObjectiveBounds::at_most(6));
        let domains = fixpoint(&model).unwrap();
        assert_eq!(domains[a].value(), Some(1));
    }
}
