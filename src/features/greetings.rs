use crate::feature::{Feature, FeatureContext, HookResult};
use crate::phase::{Phase, PhaseSet};

/// Prints a banner when the program comes up and a farewell when it goes down
///
/// It holds no resources, so `unprepare` has nothing to release.
pub struct GreetingsFeature {
    progname: String,
    greeted: bool,
}

impl GreetingsFeature {
    pub const NAME: &'static str = "greetings";

    pub fn new(progname: impl Into<String>) -> Self {
        Self {
            progname: progname.into(),
            greeted: false,
        }
    }

    pub fn banner(&self) -> String {
        format!("{} {} is starting up", self.progname, env!("CARGO_PKG_VERSION"))
    }
}

impl Feature for GreetingsFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::from([Phase::Prepare, Phase::Unprepare])
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.progname)
    }

    fn prepare(&mut self, ctx: &FeatureContext<'_>) -> HookResult {
        if !self.greeted {
            tracing::info!(run_id = %ctx.run_id(), "{}", self.banner());
            self.greeted = true;
        }
        Ok(())
    }

    fn unprepare(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
        tracing::info!("{} has been shut down", self.progname);
        Ok(())
    }
}
