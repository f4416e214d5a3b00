//! Feature hook trait
//!
//! A feature overrides only the hooks it needs. The orchestrator only calls
//! the hooks of phases listed in [`Feature::phases`]. A hook left at its
//! default reports [`FeatureError::NotImplemented`], which the orchestrator
//! treats as not taking part in that phase.

use super::{FeatureContext, FeatureError, HookResult};
use crate::phase::{Phase, PhaseSet};

/// A named unit of functionality driven through the lifecycle
///
/// # Participation
///
/// A feature takes part in a phase when the phase is listed in
/// [`phases`](Feature::phases) *and* its hook is overridden:
///
/// - listed and overridden: the hook runs and its outcome is recorded
/// - listed but not overridden: skipped, no record and no state change
/// - overridden but not listed: never called
///
/// # Example
///
/// ```rust
/// use featurekit::feature::{Feature, FeatureContext, FeatureError, HookResult};
/// use featurekit::phase::{Phase, PhaseSet};
///
/// struct DatabaseFeature {
///     pool: Option<Vec<String>>,
/// }
///
/// impl Feature for DatabaseFeature {
///     fn name(&self) -> &str {
///         "database"
///     }
///
///     fn phases(&self) -> PhaseSet {
///         PhaseSet::from([Phase::Prepare, Phase::Unprepare])
///     }
///
///     fn starts_after(&self) -> Vec<String> {
///         vec!["logging".to_string()]
///     }
///
///     fn prepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
///         self.pool = Some(Vec::new());
///         Ok(())
///     }
///
///     fn unprepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
///         self.pool.take().ok_or_else(|| FeatureError::shutdown_failed("no pool"))?;
///         Ok(())
///     }
/// }
/// ```
pub trait Feature: Send {
    /// Unique name of the feature
    fn name(&self) -> &str;

    /// Phases whose hooks this feature implements.
    ///
    /// A hook overridden for a phase missing from this set is never called.
    fn phases(&self) -> PhaseSet;

    /// Features that must pass every phase before this one does
    fn starts_after(&self) -> Vec<String> {
        Vec::new()
    }

    /// Initial enabled flag; the registry and settings may override it
    fn is_enabled(&self) -> bool {
        true
    }

    /// Optional human-readable identity, e.g. a program name
    fn identity(&self) -> Option<&str> {
        None
    }

    /// Declare options in the shared store
    fn collect_options(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::CollectOptions))
    }

    /// Check option values
    fn validate_options(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::ValidateOptions))
    }

    fn prepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::Prepare))
    }

    fn start(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::Start))
    }

    fn stop(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::Stop))
    }

    fn unprepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        Err(FeatureError::NotImplemented(Phase::Unprepare))
    }
}

/// Call the hook slot for `phase`, `None` when the slot was left at its default
pub(crate) fn dispatch(
    feature: &mut dyn Feature,
    phase: Phase,
    ctx: &FeatureContext<'_>,
) -> Option<HookResult> {
    let result = match phase {
        Phase::CollectOptions => feature.collect_options(ctx),
        Phase::ValidateOptions => feature.validate_options(ctx),
        Phase::Prepare => feature.prepare(ctx),
        Phase::Start => feature.start(ctx),
        Phase::Stop => feature.stop(ctx),
        Phase::Unprepare => feature.unprepare(ctx),
    };
    match result {
        Err(FeatureError::NotImplemented(_)) => None,
        other => Some(other),
    }
}
