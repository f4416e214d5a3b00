use super::{Feature, FeatureContext, FeatureError, HookResult};
use crate::phase::{Phase, PhaseSet};
use std::collections::BTreeMap;

type Hook = Box<dyn FnMut(&FeatureContext<'_>) -> HookResult + Send>;

/// A feature assembled from closures
///
/// Each phase has one optional handler slot. The feature participates in
/// exactly the phases whose slot is populated.
///
/// # Example
///
/// ```rust
/// use featurekit::feature::HookFeature;
/// use featurekit::phase::Phase;
///
/// let banner = HookFeature::new("banner")
///     .after("logging")
///     .on(Phase::Prepare, |ctx| {
///         tracing::info!("{} is starting", ctx.program_name());
///         Ok(())
///     });
/// ```
pub struct HookFeature {
    name: String,
    identity: Option<String>,
    starts_after: Vec<String>,
    enabled: bool,
    hooks: BTreeMap<Phase, Hook>,
}

impl HookFeature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: None,
            starts_after: Vec::new(),
            enabled: true,
            hooks: BTreeMap::new(),
        }
    }

    /// Populate the handler slot for `phase`, replacing any previous handler
    pub fn on<F>(mut self, phase: Phase, hook: F) -> Self
    where
        F: FnMut(&FeatureContext<'_>) -> HookResult + Send + 'static,
    {
        self.hooks.insert(phase, Box::new(hook));
        self
    }

    /// Order this feature after `name` in every phase
    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.starts_after.push(name.into());
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn call(&mut self, phase: Phase, ctx: &FeatureContext<'_>) -> HookResult {
        match self.hooks.get_mut(&phase) {
            Some(hook) => hook(ctx),
            None => Err(FeatureError::NotImplemented(phase)),
        }
    }
}

impl Feature for HookFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn phases(&self) -> PhaseSet {
        self.hooks.keys().copied().collect()
    }

    fn starts_after(&self) -> Vec<String> {
        self.starts_after.clone()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn collect_options(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::CollectOptions, ctx)
    }

    fn validate_options(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::ValidateOptions, ctx)
    }

    fn prepare(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::Prepare, ctx)
    }

    fn start(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::Start, ctx)
    }

    fn stop(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::Stop, ctx)
    }

    fn unprepare(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        self.call(Phase::Unprepare, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_follow_populated_slots() {
        let feature = HookFeature::new("x")
            .on(Phase::Unprepare, |_| Ok(()))
            .on(Phase::Prepare, |_| Ok(()));
        assert_eq!(
            feature.phases(),
            PhaseSet::from([Phase::Prepare, Phase::Unprepare])
        );
        assert!(feature.is_enabled());
        assert_eq!(feature.identity(), None);
    }

    #[test]
    fn test_builder_flags() {
        let feature = HookFeature::new("x")
            .after("a")
            .after("b")
            .with_identity("prog")
            .disabled();
        assert_eq!(feature.starts_after(), vec!["a", "b"]);
        assert_eq!(feature.identity(), Some("prog"));
        assert!(!feature.is_enabled());
        assert!(feature.phases().is_empty());
    }
}
