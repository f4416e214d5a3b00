use crate::feature::{Feature, FeatureContext, FeatureError, HookResult};
use crate::phase::{Phase, PhaseSet};
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber
///
/// Declares `log.level` (an `EnvFilter` directive, default `info`). `RUST_LOG`
/// wins over the option when set.
#[derive(Default)]
pub struct LoggingFeature {
    installed: bool,
}

impl LoggingFeature {
    pub const NAME: &'static str = "logging";
    pub const LEVEL_OPTION: &'static str = "log.level";

    pub fn new() -> Self {
        Self::default()
    }

    /// Did this feature install the global subscriber?
    pub fn installed(&self) -> bool {
        self.installed
    }

    fn filter(ctx: &FeatureContext<'_>) -> Result<EnvFilter, FeatureError> {
        let level = ctx
            .options()
            .get(Self::LEVEL_OPTION)
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::try_new(&level)
            .map_err(|e| FeatureError::invalid_option(Self::LEVEL_OPTION, e.to_string()))
    }
}

impl Feature for LoggingFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::from([
            Phase::CollectOptions,
            Phase::ValidateOptions,
            Phase::Prepare,
            Phase::Unprepare,
        ])
    }

    fn collect_options(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        ctx.options()
            .declare(Self::LEVEL_OPTION, Some("info"), "log filter directive");
        Ok(())
    }

    fn validate_options(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        Self::filter(ctx).map(|_| ())
    }

    fn prepare(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => Self::filter(ctx)?,
        };

        // Another subscriber may already own the global slot
        self.installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok();
        tracing::debug!(installed = self.installed, "Logging prepared");
        Ok(())
    }

    fn unprepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        tracing::debug!("Logging unprepared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramOptions;
    use crate::orchestrator::RunState;

    #[test]
    fn test_collect_then_validate() {
        let options = ProgramOptions::new();
        let state = RunState::new();
        let ctx = FeatureContext::new(LoggingFeature::NAME, "testd", &options, &state);
        let mut feature = LoggingFeature::new();

        feature.collect_options(&ctx).unwrap();
        assert_eq!(options.get(LoggingFeature::LEVEL_OPTION).as_deref(), Some("info"));
        feature.validate_options(&ctx).unwrap();

        options.set(LoggingFeature::LEVEL_OPTION, "featurekit=debug,warn");
        feature.validate_options(&ctx).unwrap();
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let options = ProgramOptions::new();
        options.set(LoggingFeature::LEVEL_OPTION, "featurekit=loudest");
        let state = RunState::new();
        let ctx = FeatureContext::new(LoggingFeature::NAME, "testd", &options, &state);

        let err = LoggingFeature::new().validate_options(&ctx).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidOption { option, .. } if option == "log.level"));
    }
}
