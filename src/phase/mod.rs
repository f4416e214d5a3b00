//! Lifecycle Phases
//!
//! Every feature is driven through the same fixed sequence of phases.
//!
//! ```text
//! 1. CollectOptions    ← forward
//!    ↓
//! 2. ValidateOptions   ← forward
//!    ↓
//! 3. Prepare           ← forward, paired with Unprepare
//!    ↓
//! 4. Start             ← forward, paired with Stop
//!    ↓
//! [Running...]
//!    ↓
//! 5. Stop              ← teardown (reverse of Start)
//!    ↓
//! 6. Unprepare         ← teardown (reverse of Prepare)
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// One stage of the application lifecycle
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Phase {
    /// Features declare the options they understand
    CollectOptions,
    /// Features check the values collected for their options
    ValidateOptions,
    /// Features acquire configuration-level resources
    Prepare,
    /// Features start doing work
    Start,
    /// Features stop doing work
    Stop,
    /// Features release what they acquired in Prepare
    Unprepare,
}

impl Phase {
    /// Phases executed by `run()`, in order
    pub const FORWARD: [Phase; 4] = [
        Phase::CollectOptions,
        Phase::ValidateOptions,
        Phase::Prepare,
        Phase::Start,
    ];

    /// Phases executed by `shutdown()` and unwind, in order
    pub const TEARDOWN: [Phase; 2] = [Phase::Stop, Phase::Unprepare];

    /// Returns true for Stop and Unprepare
    pub fn is_teardown(self) -> bool {
        matches!(self, Phase::Stop | Phase::Unprepare)
    }

    /// The setup phase a teardown phase undoes
    pub fn setup_pair(self) -> Option<Phase> {
        match self {
            Phase::Stop => Some(Phase::Start),
            Phase::Unprepare => Some(Phase::Prepare),
            _ => None,
        }
    }

    /// The teardown phase that undoes a setup phase
    pub fn teardown_pair(self) -> Option<Phase> {
        match self {
            Phase::Start => Some(Phase::Stop),
            Phase::Prepare => Some(Phase::Unprepare),
            _ => None,
        }
    }

    /// The phase whose ordering edges govern this phase.
    ///
    /// Teardown phases never have an order of their own: they replay the
    /// paired setup order backwards.
    pub fn ordering_phase(self) -> Phase {
        self.setup_pair().unwrap_or(self)
    }
}

/// A set of phases a feature participates in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseSet(BTreeSet<Phase>);

impl PhaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every phase
    pub fn all() -> Self {
        Phase::FORWARD.iter().chain(Phase::TEARDOWN.iter()).copied().collect()
    }

    pub fn with(mut self, phase: Phase) -> Self {
        self.0.insert(phase);
        self
    }

    pub fn insert(&mut self, phase: Phase) {
        self.0.insert(phase);
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.0.contains(&phase)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Phase> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Phase> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = Phase>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Phase; N]> for PhaseSet {
    fn from(phases: [Phase; N]) -> Self {
        phases.into_iter().collect()
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|p| p.as_ref()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
