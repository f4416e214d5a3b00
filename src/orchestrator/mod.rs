//! Lifecycle Orchestrator
//!
//! Drives every enabled feature through the forward phases in resolved order
//! and tears them down in exact reverse order.
//!
//! # Failure handling
//!
//! ```text
//! CollectOptions ── ValidateOptions ── Prepare ── Start
//!                                        │          │
//!                             hook fails ┘          └ hook fails
//!                                        ↓          ↓
//!                                     unwind: Stop (reverse Start order)
//!                                             Unprepare (reverse Prepare order)
//! ```
//!
//! Only features that got through a setup phase are torn down for it. A
//! teardown failure is logged, collected and never stops the unwind.

mod state;

pub use state::{FeatureState, Outcome, PhaseRecord, RunState, RunStatus};

use crate::config::{OrchestratorSettings, ProgramOptions};
use crate::error::{OrchestrationError, Result, TeardownError, TeardownReport};
use crate::feature::{FeatureContext, HookResult, dispatch};
use crate::phase::Phase;
use crate::registry::FeatureRegistry;
use std::time::Instant;

/// Computes execution order and runs hooks
///
/// The orchestrator holds no features and no run state of its own; both are
/// passed in so the caller decides their lifetime.
///
/// # Example
///
/// ```rust
/// use featurekit::feature::HookFeature;
/// use featurekit::orchestrator::{Orchestrator, RunState, RunStatus};
/// use featurekit::phase::Phase;
/// use featurekit::registry::FeatureRegistry;
/// use featurekit::OrchestratorSettings;
///
/// let mut registry = FeatureRegistry::new();
/// registry.register(HookFeature::new("database").on(Phase::Start, |_| Ok(())))?;
///
/// let orchestrator = Orchestrator::new(OrchestratorSettings::default());
/// let mut state = RunState::new();
/// orchestrator.run(&mut registry, &mut state)?;
/// assert_eq!(state.status(), RunStatus::Running);
///
/// orchestrator.shutdown(&mut registry, &mut state)?;
/// assert_eq!(state.status(), RunStatus::Stopped);
/// # Ok::<(), featurekit::OrchestrationError>(())
/// ```
pub struct Orchestrator {
    settings: OrchestratorSettings,
    options: ProgramOptions,
}

impl Orchestrator {
    pub fn new(settings: OrchestratorSettings) -> Self {
        Self::with_options(settings, ProgramOptions::new())
    }

    pub fn with_options(settings: OrchestratorSettings, options: ProgramOptions) -> Self {
        Self { settings, options }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn options(&self) -> &ProgramOptions {
        &self.options
    }

    /// Drive every enabled feature through the forward phases.
    ///
    /// Configuration errors are returned before any hook runs. A failing
    /// hook stops forward progress, the run is unwound, and only then is the
    /// failure returned.
    pub fn run(&self, registry: &mut FeatureRegistry, state: &mut RunState) -> Result<()> {
        if matches!(state.status(), RunStatus::Starting | RunStatus::Running) {
            return Err(OrchestrationError::InvalidState(
                "run() called while a run is active".to_string(),
            ));
        }

        for name in &self.settings.disabled {
            registry.disable(name)?;
        }

        let mut plan = Vec::with_capacity(Phase::FORWARD.len());
        for phase in Phase::FORWARD {
            plan.push((phase, registry.resolve_order(phase)?));
        }

        state.begin(registry);
        let span = tracing::info_span!(
            "run",
            run_id = %state.run_id(),
            program = %self.settings.program_name
        );
        let _guard = span.enter();
        tracing::info!("Starting {} features...", registry.len());

        let disabled: Vec<String> = registry
            .names()
            .into_iter()
            .filter(|name| registry.is_enabled(name) == Some(false))
            .map(str::to_string)
            .collect();

        for (phase, order) in plan {
            tracing::info!("Calling {} hooks...", phase);

            for name in &disabled {
                tracing::debug!("Skipping disabled feature: {}", name);
                state.skip_disabled(name, phase);
            }

            let mut executed = 0;
            for name in &order {
                match self.invoke(registry, state, name, phase) {
                    None => state.pass(name, phase, false),
                    Some(Ok(())) => {
                        executed += 1;
                        state.pass(name, phase, true);
                    }
                    Some(Err(source)) => {
                        tracing::error!("{} failed for {}: {}", phase, name, source);
                        state.fail(name, phase, source.to_string());

                        let teardown = self.unwind(registry, state);
                        state.finish(RunStatus::Failed);
                        return Err(OrchestrationError::PhaseExecution {
                            feature: name.clone(),
                            phase,
                            source,
                            teardown,
                        });
                    }
                }
            }

            tracing::info!("{} complete ({} hooks executed)", phase, executed);
        }

        state.mark_running();
        tracing::info!("All features running");
        Ok(())
    }

    /// Run the teardown phases for everything that was set up.
    ///
    /// Calling this again, or after a failed run that was already unwound,
    /// does nothing.
    pub fn shutdown(&self, registry: &mut FeatureRegistry, state: &mut RunState) -> Result<()> {
        match state.status() {
            RunStatus::Idle => {
                return Err(OrchestrationError::InvalidState(
                    "shutdown() called before run()".to_string(),
                ));
            }
            RunStatus::Failed | RunStatus::Stopped => {
                tracing::debug!("Nothing to shut down");
                return Ok(());
            }
            RunStatus::Starting | RunStatus::Running => {}
        }

        let span = tracing::info_span!("shutdown", run_id = %state.run_id());
        let _guard = span.enter();
        tracing::info!("Shutting down features...");

        let report = self.unwind(registry, state);
        state.finish(RunStatus::Stopped);

        if report.is_empty() {
            tracing::info!("Shutdown complete");
            Ok(())
        } else {
            tracing::warn!("Shutdown complete with {} teardown error(s)", report.len());
            Err(OrchestrationError::Teardown(report))
        }
    }

    /// Best-effort teardown in reverse setup order
    fn unwind(&self, registry: &mut FeatureRegistry, state: &mut RunState) -> TeardownReport {
        let mut report = TeardownReport::default();

        for phase in Phase::TEARDOWN {
            let candidates = state.teardown_candidates(phase);
            if candidates.is_empty() {
                continue;
            }
            tracing::info!("Calling {} hooks...", phase);

            for name in candidates {
                match self.invoke(registry, state, &name, phase) {
                    None => state.tear_down(&name, phase, None),
                    Some(Ok(())) => state.tear_down(&name, phase, Some(Outcome::Completed)),
                    Some(Err(source)) => {
                        // Log error but continue with other features
                        tracing::warn!("{} failed for {}: {}", phase, name, source);
                        state.tear_down(
                            &name,
                            phase,
                            Some(Outcome::Failed {
                                error: source.to_string(),
                            }),
                        );
                        report.push(TeardownError {
                            feature: name,
                            phase,
                            source,
                        });
                    }
                }
            }
        }

        report
    }

    /// Call one hook, `None` if the feature does not take part in `phase`
    fn invoke(
        &self,
        registry: &mut FeatureRegistry,
        state: &RunState,
        name: &str,
        phase: Phase,
    ) -> Option<HookResult> {
        let feature = registry.get_mut(name)?;
        if !feature.phases().contains(phase) {
            return None;
        }

        tracing::debug!("{}: {}", phase, name);
        let ctx = FeatureContext::new(name, &self.settings.program_name, &self.options, state);
        let started = Instant::now();
        let result = dispatch(feature, phase, &ctx);

        let elapsed = started.elapsed();
        if elapsed > self.settings.slow_hook_threshold {
            tracing::warn!(
                feature = name,
                %phase,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Slow hook"
            );
        }

        if result.is_none() {
            tracing::debug!("{} has no {} hook, skipping", name, phase);
        }
        result
    }
}
