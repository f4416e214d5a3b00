use crate::config::ProgramOptions;
use crate::orchestrator::{FeatureState, RunState};
use crate::phase::Phase;
use uuid::Uuid;

/// Read-only view handed to every hook
///
/// Features can read the program identity, the shared options and the
/// progress of the current run, but cannot touch orchestration internals.
pub struct FeatureContext<'a> {
    feature: &'a str,
    program_name: &'a str,
    options: &'a ProgramOptions,
    state: &'a RunState,
}

impl<'a> FeatureContext<'a> {
    pub(crate) fn new(
        feature: &'a str,
        program_name: &'a str,
        options: &'a ProgramOptions,
        state: &'a RunState,
    ) -> Self {
        Self {
            feature,
            program_name,
            options,
            state,
        }
    }

    /// Name of the feature the hook belongs to
    pub fn feature_name(&self) -> &str {
        self.feature
    }

    pub fn program_name(&self) -> &str {
        self.program_name
    }

    pub fn options(&self) -> &ProgramOptions {
        self.options
    }

    pub fn run_id(&self) -> Uuid {
        self.state.run_id()
    }

    /// Has `feature` successfully run its `phase` hook in this run?
    pub fn has_completed(&self, feature: &str, phase: Phase) -> bool {
        self.state.has_completed(feature, phase)
    }

    pub fn state_of(&self, feature: &str) -> Option<FeatureState> {
        self.state.feature_state(feature)
    }
}
