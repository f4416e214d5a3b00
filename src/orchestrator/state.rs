//! Run State
//!
//! Record of which features passed which phase during one run. Created on
//! `run()`, mutated only by the orchestrator, read by features through
//! [`FeatureContext`](crate::feature::FeatureContext).

use crate::phase::Phase;
use crate::registry::FeatureRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Overall progress of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run has started
    Idle,
    /// Forward phases are executing
    Starting,
    /// Every forward phase passed
    Running,
    /// A forward phase failed and the run was unwound
    Failed,
    /// Shutdown finished
    Stopped,
}

/// Per-feature lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum FeatureState {
    Registered,
    /// Registered but not taking part in this run
    Disabled,
    /// Last forward hook that ran successfully
    Completed(Phase),
    Running,
    /// Last teardown hook that ran
    TornDown(Phase),
    Stopped,
    /// Forward hook that failed; terminal for forward progress
    Failed(Phase),
}

/// What happened when a feature reached a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    /// Skipped because the feature is disabled
    Disabled,
    Failed { error: String },
}

/// One entry of the run log
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub feature: String,
    pub phase: Phase,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}

/// Lifecycle-scoped record of a single run
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    run_id: Uuid,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    features: BTreeMap<String, FeatureState>,
    records: Vec<PhaseRecord>,
    /// Features that got through each forward phase, in execution order
    passed: BTreeMap<Phase, Vec<String>>,
    #[serde(skip)]
    torn_down: BTreeSet<(Phase, String)>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::nil(),
            status: RunStatus::Idle,
            started_at: None,
            finished_at: None,
            features: BTreeMap::new(),
            records: Vec::new(),
            passed: BTreeMap::new(),
            torn_down: BTreeSet::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn feature_state(&self, feature: &str) -> Option<FeatureState> {
        self.features.get(feature).copied()
    }

    /// True once `feature` ran its `phase` hook successfully
    pub fn has_completed(&self, feature: &str, phase: Phase) -> bool {
        self.records
            .iter()
            .any(|r| r.feature == feature && r.phase == phase && r.outcome == Outcome::Completed)
    }

    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    /// Features that got through a forward phase, in the order they did
    pub fn setup_order(&self, phase: Phase) -> &[String] {
        self.passed.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render the state for diagnostics
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn begin(&mut self, registry: &FeatureRegistry) {
        *self = Self::new();
        self.run_id = Uuid::new_v4();
        self.status = RunStatus::Starting;
        self.started_at = Some(Utc::now());
        for name in registry.names() {
            let state = if registry.is_enabled(name).unwrap_or(false) {
                FeatureState::Registered
            } else {
                FeatureState::Disabled
            };
            self.features.insert(name.to_string(), state);
        }
    }

    /// `ran` is false when the feature does not participate in `phase`
    pub(crate) fn pass(&mut self, feature: &str, phase: Phase, ran: bool) {
        self.passed
            .entry(phase)
            .or_default()
            .push(feature.to_string());
        if ran {
            self.set_state(feature, FeatureState::Completed(phase));
            self.record(feature, phase, Outcome::Completed);
        }
    }

    pub(crate) fn skip_disabled(&mut self, feature: &str, phase: Phase) {
        self.record(feature, phase, Outcome::Disabled);
    }

    pub(crate) fn fail(&mut self, feature: &str, phase: Phase, error: String) {
        self.set_state(feature, FeatureState::Failed(phase));
        self.record(feature, phase, Outcome::Failed { error });
    }

    /// Features still owed a `phase` teardown, in teardown order
    pub(crate) fn teardown_candidates(&self, phase: Phase) -> Vec<String> {
        let Some(setup) = phase.setup_pair() else {
            return Vec::new();
        };
        self.setup_order(setup)
            .iter()
            .rev()
            .filter(|name| !self.torn_down.contains(&(phase, (*name).clone())))
            .cloned()
            .collect()
    }

    /// `outcome` is `None` when the feature has no hook for `phase`
    pub(crate) fn tear_down(&mut self, feature: &str, phase: Phase, outcome: Option<Outcome>) {
        self.torn_down.insert((phase, feature.to_string()));
        if let Some(outcome) = outcome {
            self.set_state(feature, FeatureState::TornDown(phase));
            self.record(feature, phase, outcome);
        }
    }

    pub(crate) fn mark_running(&mut self) {
        self.status = RunStatus::Running;
        for state in self.features.values_mut() {
            if !matches!(state, FeatureState::Disabled) {
                *state = FeatureState::Running;
            }
        }
    }

    pub(crate) fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
        for state in self.features.values_mut() {
            if matches!(
                state,
                FeatureState::Completed(_) | FeatureState::Running | FeatureState::TornDown(_)
            ) {
                *state = FeatureState::Stopped;
            }
        }
    }

    fn set_state(&mut self, feature: &str, state: FeatureState) {
        self.features.insert(feature.to_string(), state);
    }

    fn record(&mut self, feature: &str, phase: Phase, outcome: Outcome) {
        self.records.push(PhaseRecord {
            feature: feature.to_string(),
            phase,
            outcome,
            at: Utc::now(),
        });
    }
}
