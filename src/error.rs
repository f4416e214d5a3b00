use crate::feature::FeatureError;
use crate::phase::Phase;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Feature already registered: {name}")]
    DuplicateName { name: String },

    #[error("Unknown feature: {name}")]
    UnknownFeature { name: String },

    #[error("Cyclic dependency detected during {phase}: {}", .cycle.join(" -> "))]
    CyclicDependency { phase: Phase, cycle: Vec<String> },

    #[error("Feature '{feature}' failed during {phase}: {source}{teardown}")]
    PhaseExecution {
        feature: String,
        phase: Phase,
        source: FeatureError,
        /// Teardown failures observed while unwinding
        teardown: TeardownReport,
    },

    #[error("Teardown failed: {0}")]
    Teardown(TeardownReport),

    #[error("Invalid orchestrator state: {0}")]
    InvalidState(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl OrchestrationError {
    /// True for errors detected before any phase runs
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::UnknownFeature { .. }
                | Self::CyclicDependency { .. }
                | Self::InvalidSettings(_)
        )
    }

    pub(crate) fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownFeature { name: name.into() }
    }
}

/// A teardown hook that failed during unwind or shutdown
#[derive(Debug, Error)]
#[error("{feature} ({phase}): {source}")]
pub struct TeardownError {
    pub feature: String,
    pub phase: Phase,
    pub source: FeatureError,
}

/// Every teardown failure of one unwind or shutdown, in the order they happened
#[derive(Debug, Default)]
pub struct TeardownReport(Vec<TeardownError>);

impl TeardownReport {
    pub fn push(&mut self, error: TeardownError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[TeardownError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<TeardownError> {
        self.0
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, " ({} teardown error(s): ", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_every_member() {
        let err = OrchestrationError::CyclicDependency {
            phase: Phase::Prepare,
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency detected during prepare: a -> b -> a"
        );
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_report_lists_all_failures() {
        let mut report = TeardownReport::default();
        report.push(TeardownError {
            feature: "db".into(),
            phase: Phase::Stop,
            source: FeatureError::shutdown_failed("pool busy"),
        });
        report.push(TeardownError {
            feature: "cache".into(),
            phase: Phase::Unprepare,
            source: FeatureError::shutdown_failed("flush failed"),
        });

        let err = OrchestrationError::Teardown(report);
        let message = err.to_string();
        assert!(message.contains("2 teardown error(s)"));
        assert!(message.contains("db (stop)"));
        assert!(message.contains("cache (unprepare)"));
        assert!(!err.is_configuration_error());
    }
}
