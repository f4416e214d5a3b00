//! Application Bootstrap
//!
//! Provides a high-level API that owns the feature registry and the run
//! state, and exposes `run()`/`shutdown()` to the process entry point.

mod shutdown;

pub use shutdown::shutdown_signal;

use crate::config::{OrchestratorSettings, ProgramOptions};
use crate::error::{OrchestrationError, Result};
use crate::feature::Feature;
use crate::features::{GreetingsFeature, LoggingFeature};
use crate::orchestrator::{Orchestrator, RunState};
use crate::phase::Phase;
use crate::registry::FeatureRegistry;
use std::future::Future;

/// A registry, an orchestrator and the state of the current run
///
/// # Example
///
/// ```rust
/// use featurekit::Application;
/// use featurekit::feature::HookFeature;
/// use featurekit::phase::Phase;
///
/// let mut app = Application::builder()
///     .program_name("orbitd")
///     .with_default_features()
///     .feature(HookFeature::new("database").on(Phase::Start, |_| Ok(())))
///     .dependency("logging", "database", Phase::Start)
///     .build()?;
///
/// app.run()?;
/// // serve...
/// app.shutdown()?;
/// # Ok::<(), featurekit::OrchestrationError>(())
/// ```
pub struct Application {
    registry: FeatureRegistry,
    orchestrator: Orchestrator,
    state: RunState,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn options(&self) -> &ProgramOptions {
        self.orchestrator.options()
    }

    pub fn program_name(&self) -> &str {
        &self.orchestrator.settings().program_name
    }

    /// Drive every feature through the forward phases
    pub fn run(&mut self) -> Result<()> {
        self.orchestrator.run(&mut self.registry, &mut self.state)
    }

    /// Run the teardown phases
    pub fn shutdown(&mut self) -> Result<()> {
        self.orchestrator.shutdown(&mut self.registry, &mut self.state)
    }

    /// Start up, wait for `signal`, then shut down.
    ///
    /// A startup failure is returned right away; the run has already been
    /// unwound by then.
    pub async fn run_until<S>(&mut self, signal: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        self.run()?;
        tracing::info!("Waiting for shutdown signal...");
        signal.await;
        self.shutdown()
    }
}

/// Builder for Application
///
/// Registration errors are kept until [`ApplicationBuilder::build`] so the
/// builder can be chained.
pub struct ApplicationBuilder {
    registry: FeatureRegistry,
    settings: OrchestratorSettings,
    options: ProgramOptions,
    dependencies: Vec<(String, String, Option<Phase>)>,
    error: Option<OrchestrationError>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            registry: FeatureRegistry::new(),
            settings: OrchestratorSettings::default(),
            options: ProgramOptions::new(),
            dependencies: Vec::new(),
            error: None,
        }
    }

    /// Replace the orchestrator settings
    pub fn settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.settings.program_name = name.into();
        self
    }

    /// Use a pre-populated option store, e.g. [`ProgramOptions::from_env`]
    pub fn options(mut self, options: ProgramOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a feature
    pub fn feature<F: Feature + 'static>(mut self, feature: F) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register(feature) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Require `from` to pass `phase` before `to`
    pub fn dependency(mut self, from: &str, to: &str, phase: Phase) -> Self {
        self.dependencies
            .push((from.to_string(), to.to_string(), Some(phase)));
        self
    }

    /// Require `from` to pass every phase before `to`
    pub fn dependency_all(mut self, from: &str, to: &str) -> Self {
        self.dependencies.push((from.to_string(), to.to_string(), None));
        self
    }

    /// Register `logging` and `greetings`, with logging first in every phase.
    ///
    /// The greeting uses the program name set so far.
    pub fn with_default_features(self) -> Self {
        let progname = self.settings.program_name.clone();
        self.feature(LoggingFeature::new())
            .feature(GreetingsFeature::new(progname))
            .dependency_all(LoggingFeature::NAME, GreetingsFeature::NAME)
    }

    /// Build the application
    ///
    /// # Errors
    ///
    /// Returns the first registration error, an unknown feature in a
    /// dependency or in the disabled list, or a dependency cycle.
    pub fn build(mut self) -> Result<Application> {
        if let Some(e) = self.error {
            return Err(e);
        }

        for (from, to, phase) in &self.dependencies {
            match phase {
                Some(phase) => self.registry.add_dependency(from, to, *phase)?,
                None => self.registry.add_dependency_all(from, to)?,
            };
        }
        for name in &self.settings.disabled {
            if !self.registry.contains(name) {
                return Err(OrchestrationError::UnknownFeature { name: name.clone() });
            }
        }
        self.registry.validate()?;

        tracing::debug!(
            "Application built with {} features: {}",
            self.registry.len(),
            self.registry.names().join(", ")
        );

        Ok(Application {
            registry: self.registry,
            orchestrator: Orchestrator::with_options(self.settings, self.options),
            state: RunState::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureError;
    use crate::orchestrator::RunStatus;
    use crate::phase::PhaseSet;
    use crate::testing::{Journal, failing, recording};

    fn prepare_pair() -> PhaseSet {
        PhaseSet::from([Phase::Prepare, Phase::Unprepare])
    }

    #[test]
    fn test_logging_before_greetings() {
        let journal = Journal::default();
        let mut app = Application::builder()
            .feature(recording("greetings", prepare_pair(), &journal))
            .feature(recording("logging", prepare_pair(), &journal))
            .dependency("logging", "greetings", Phase::Prepare)
            .build()
            .unwrap();

        app.run().unwrap();
        assert_eq!(journal.calls(), vec!["logging.prepare", "greetings.prepare"]);

        app.shutdown().unwrap();
        assert_eq!(
            journal.calls(),
            vec![
                "logging.prepare",
                "greetings.prepare",
                "greetings.unprepare",
                "logging.unprepare",
            ]
        );
    }

    #[test]
    fn test_failed_logging_prepare_stops_everything() {
        let journal = Journal::default();
        let mut app = Application::builder()
            .feature(recording("greetings", prepare_pair(), &journal))
            .feature(failing("logging", Phase::Prepare, prepare_pair(), &journal))
            .dependency("logging", "greetings", Phase::Prepare)
            .build()
            .unwrap();

        let err = app.run().unwrap_err();
        match &err {
            OrchestrationError::PhaseExecution {
                feature,
                phase,
                source,
                teardown,
            } => {
                assert_eq!(feature, "logging");
                assert_eq!(*phase, Phase::Prepare);
                assert!(matches!(source, FeatureError::InitializationFailed(_)));
                assert!(teardown.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(journal.calls(), vec!["logging.prepare"]);

        app.shutdown().unwrap();
        assert_eq!(journal.calls(), vec!["logging.prepare"]);
        assert_eq!(app.state().status(), RunStatus::Failed);
    }

    #[test]
    fn test_build_reports_registration_errors() {
        let err = Application::builder()
            .feature(recording("a", PhaseSet::new(), &Journal::default()))
            .feature(recording("a", PhaseSet::new(), &Journal::default()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestrationError::DuplicateName { .. }));

        let err = Application::builder()
            .feature(recording("a", PhaseSet::new(), &Journal::default()))
            .dependency("a", "b", Phase::Prepare)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestrationError::UnknownFeature { .. }));

        let err = Application::builder()
            .feature(recording("a", PhaseSet::new(), &Journal::default()))
            .settings(OrchestratorSettings::default().disable("ghost"))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestrationError::UnknownFeature { .. }));

        let err = Application::builder()
            .feature(recording("a", PhaseSet::new(), &Journal::default()))
            .feature(recording("b", PhaseSet::new(), &Journal::default()))
            .dependency_all("a", "b")
            .dependency("b", "a", Phase::ValidateOptions)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestrationError::CyclicDependency { .. }));
    }

    #[test]
    fn test_default_features() {
        // logging stays off so the global subscriber is left alone
        let mut app = Application::builder()
            .settings(
                OrchestratorSettings::default()
                    .program_name("orbitd")
                    .disable(LoggingFeature::NAME),
            )
            .with_default_features()
            .build()
            .unwrap();

        assert_eq!(app.program_name(), "orbitd");
        assert_eq!(
            app.registry().get("greetings").and_then(|f| f.identity()),
            Some("orbitd")
        );
        assert_eq!(
            app.registry()
                .dependents_of(LoggingFeature::NAME, Phase::Prepare)
                .unwrap(),
            std::collections::BTreeSet::from(["greetings".to_string()])
        );

        app.run().unwrap();
        assert_eq!(app.registry().is_enabled(LoggingFeature::NAME), Some(false));
        assert_eq!(
            app.state().setup_order(Phase::Prepare),
            ["greetings".to_string()]
        );
        app.shutdown().unwrap();
        assert!(app.state().has_completed("greetings", Phase::Unprepare));
        assert!(app.state().finished_at().is_some());
    }

    #[test]
    fn test_invalid_option_fails_validation() {
        let options = ProgramOptions::new();
        options.set(LoggingFeature::LEVEL_OPTION, "featurekit=loudest");
        let mut app = Application::builder()
            .options(options)
            .with_default_features()
            .build()
            .unwrap();

        let err = app.run().unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::PhaseExecution {
                phase: Phase::ValidateOptions,
                ..
            }
        ));
        assert!(!app.state().has_completed("greetings", Phase::Prepare));
    }

    #[tokio::test]
    async fn test_run_until_signal() {
        let journal = Journal::default();
        let mut app = Application::builder()
            .feature(recording("server", PhaseSet::all(), &journal))
            .build()
            .unwrap();

        app.run_until(std::future::ready(())).await.unwrap();
        assert_eq!(journal.calls().len(), 6);
        assert_eq!(app.state().status(), RunStatus::Stopped);
    }
}
