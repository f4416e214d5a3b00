//! Feature Registry
//!
//! Owns every registered feature and the ordering edges between them, and
//! turns them into a deterministic execution order per phase.

mod graph;

use crate::error::{OrchestrationError, Result};
use crate::feature::Feature;
use crate::phase::{Phase, PhaseSet};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

struct Entry {
    feature: Box<dyn Feature>,
    enabled: bool,
}

/// Registry of features keyed by unique name
///
/// # Example
///
/// ```rust
/// use featurekit::feature::HookFeature;
/// use featurekit::phase::Phase;
/// use featurekit::registry::FeatureRegistry;
///
/// let mut registry = FeatureRegistry::new();
/// registry.register(HookFeature::new("logging").on(Phase::Prepare, |_| Ok(())))?;
/// registry.register(HookFeature::new("greetings").on(Phase::Prepare, |_| Ok(())))?;
/// registry.add_dependency("logging", "greetings", Phase::Prepare)?;
///
/// assert_eq!(registry.resolve_order(Phase::Prepare)?, vec!["logging", "greetings"]);
/// # Ok::<(), featurekit::OrchestrationError>(())
/// ```
#[derive(Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, Entry>,
    /// Explicit edges, keyed by the phase whose order they constrain
    edges: BTreeMap<Phase, BTreeSet<(String, String)>>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features: BTreeMap<&str, bool> = self
            .features
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.enabled))
            .collect();
        f.debug_struct("FeatureRegistry")
            .field("features", &features)
            .field("edges", &self.edges)
            .finish()
    }
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature under its name
    pub fn register<F: Feature + 'static>(&mut self, feature: F) -> Result<&mut Self> {
        self.register_boxed(Box::new(feature))
    }

    pub fn register_boxed(&mut self, feature: Box<dyn Feature>) -> Result<&mut Self> {
        let name = feature.name().to_string();
        if self.features.contains_key(&name) {
            return Err(OrchestrationError::DuplicateName { name });
        }

        tracing::debug!(feature = %name, phases = %feature.phases(), "Registering feature");
        let enabled = feature.is_enabled();
        self.features.insert(name, Entry { feature, enabled });
        Ok(self)
    }

    /// Require `from` to pass `phase` before `to` begins it.
    ///
    /// Teardown phases replay their setup order backwards, so an edge on
    /// `Stop` or `Unprepare` is stored reversed on `Start` or `Prepare`.
    pub fn add_dependency(&mut self, from: &str, to: &str, phase: Phase) -> Result<&mut Self> {
        self.ensure_known(from)?;
        self.ensure_known(to)?;

        let (from, to) = if phase.is_teardown() { (to, from) } else { (from, to) };
        self.edges
            .entry(phase.ordering_phase())
            .or_default()
            .insert((from.to_string(), to.to_string()));
        Ok(self)
    }

    /// Require `from` to pass every phase before `to`
    pub fn add_dependency_all(&mut self, from: &str, to: &str) -> Result<&mut Self> {
        for phase in Phase::FORWARD {
            self.add_dependency(from, to, phase)?;
        }
        Ok(self)
    }

    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let entry = self
            .features
            .get_mut(name)
            .ok_or_else(|| OrchestrationError::unknown(name))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.features.get(name).map(|e| e.enabled)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Registered names in lexicographic order
    pub fn names(&self) -> Vec<&str> {
        self.features.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Feature> {
        self.features.get(name).map(|e| e.feature.as_ref())
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Feature + 'static)> {
        self.features.get_mut(name).map(|e| e.feature.as_mut())
    }

    pub fn phases_of(&self, name: &str) -> Option<PhaseSet> {
        self.features.get(name).map(|e| e.feature.phases())
    }

    /// Features that must precede `name` in `phase`
    pub fn dependencies_of(&self, name: &str, phase: Phase) -> Result<BTreeSet<String>> {
        self.ensure_known(name)?;
        Ok(self
            .run_edges(phase)?
            .into_iter()
            .filter(|(_, to)| *to == name)
            .map(|(from, _)| from.to_string())
            .collect())
    }

    /// Features that must follow `name` in `phase`
    pub fn dependents_of(&self, name: &str, phase: Phase) -> Result<BTreeSet<String>> {
        self.ensure_known(name)?;
        Ok(self
            .run_edges(phase)?
            .into_iter()
            .filter(|(from, _)| *from == name)
            .map(|(_, to)| to.to_string())
            .collect())
    }

    /// Edges as `(earlier, later)` in the execution order of `phase`
    fn run_edges(&self, phase: Phase) -> Result<Vec<(&str, &str)>> {
        let edges = self.edges_for(phase.ordering_phase())?;
        Ok(edges
            .into_iter()
            .map(|(from, to)| if phase.is_teardown() { (to, from) } else { (from, to) })
            .collect())
    }

    /// Deterministic order of the enabled features for `phase`.
    ///
    /// Disabled features still take part in the sort so that ordering passing
    /// through them is preserved. Teardown phases return the reverse of their
    /// paired setup order.
    pub fn resolve_order(&self, phase: Phase) -> Result<Vec<String>> {
        let ordering = phase.ordering_phase();
        let nodes: BTreeSet<&str> = self.features.keys().map(String::as_str).collect();
        let edges = self.edges_for(ordering)?;

        let order = graph::topological_order(&nodes, &edges).map_err(|cycle| {
            OrchestrationError::CyclicDependency {
                phase: ordering,
                cycle: cycle.into_iter().map(str::to_string).collect(),
            }
        })?;

        let mut order: Vec<String> = order
            .into_iter()
            .filter(|name| self.is_enabled(name).unwrap_or(false))
            .map(str::to_string)
            .collect();

        if phase.is_teardown() {
            order.reverse();
        }
        Ok(order)
    }

    /// Resolve every forward phase so configuration errors surface up front
    pub fn validate(&self) -> Result<()> {
        for phase in Phase::FORWARD {
            self.resolve_order(phase)?;
        }
        Ok(())
    }

    /// Explicit edges for `phase` plus the edges features declare themselves
    fn edges_for(&self, phase: Phase) -> Result<BTreeSet<(&str, &str)>> {
        let mut edges: BTreeSet<(&str, &str)> = self
            .edges
            .get(&phase)
            .into_iter()
            .flatten()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();

        for (name, entry) in &self.features {
            for dep in entry.feature.starts_after() {
                let (dep, _) = self
                    .features
                    .get_key_value(dep.as_str())
                    .ok_or_else(|| OrchestrationError::unknown(dep.clone()))?;
                edges.insert((dep.as_str(), name.as_str()));
            }
        }
        Ok(edges)
    }

    fn ensure_known(&self, name: &str) -> Result<()> {
        if self.features.contains_key(name) {
            Ok(())
        } else {
            Err(OrchestrationError::unknown(name))
        }
    }
}
