//! # Featurekit
//!
//! Phase-driven startup and shutdown for applications built from
//! independently developed features.
//!
//! A feature opts into a subset of the lifecycle phases. The orchestrator
//! resolves a deterministic order per phase from the declared dependency
//! edges, drives every enabled feature forward, and tears down in exact
//! reverse order. If a forward hook fails, everything that was set up is
//! unwound before the error is returned, so a caller never sees a
//! half-started application.
//!
//! ## Features
//!
//! - **Deterministic ordering**: topological sort with a lexicographic tie-break
//! - **Symmetric teardown**: Stop and Unprepare replay Start and Prepare backwards
//! - **Unwind on failure**: teardown errors are collected, never fatal to the unwind
//! - **Shared options**: features declare and validate options before Prepare
//! - **Run State**: every transition is recorded and can be rendered as JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use featurekit::prelude::*;
//!
//! struct Database {
//!     connected: bool,
//! }
//!
//! impl Feature for Database {
//!     fn name(&self) -> &str {
//!         "database"
//!     }
//!
//!     fn phases(&self) -> PhaseSet {
//!         PhaseSet::from([Phase::Start, Phase::Stop])
//!     }
//!
//!     fn starts_after(&self) -> Vec<String> {
//!         vec!["logging".to_string()]
//!     }
//!
//!     fn start(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
//!         self.connected = true;
//!         Ok(())
//!     }
//!
//!     fn stop(&mut self, _ctx: &FeatureContext<'_>) -> HookResult {
//!         self.connected = false;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), OrchestrationError> {
//!     let mut app = Application::builder()
//!         .settings(OrchestratorSettings::from_env()?)
//!         .options(ProgramOptions::from_env("FEATUREKIT"))
//!         .with_default_features()
//!         .feature(Database { connected: false })
//!         .build()?;
//!
//!     app.run_until(shutdown_signal()).await
//! }
//! ```

pub mod application;
pub mod config;
pub mod error;
pub mod feature;
pub mod features;
pub mod orchestrator;
pub mod phase;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types
pub use application::{Application, ApplicationBuilder, shutdown_signal};
pub use config::{OrchestratorSettings, ProgramOptions};
pub use error::{OrchestrationError, Result, TeardownError, TeardownReport};
pub use feature::{Feature, FeatureContext, FeatureError, HookFeature, HookResult};
pub use orchestrator::{Orchestrator, RunState, RunStatus};
pub use phase::{Phase, PhaseSet};
pub use registry::FeatureRegistry;

/// Prelude module for convenient imports
///
/// ```
/// use featurekit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::application::{Application, ApplicationBuilder, shutdown_signal};
    pub use crate::config::{OrchestratorSettings, ProgramOptions};
    pub use crate::error::{OrchestrationError, TeardownError, TeardownReport};
    pub use crate::feature::{Feature, FeatureContext, FeatureError, HookFeature, HookResult};
    pub use crate::features::{GreetingsFeature, LoggingFeature};
    pub use crate::orchestrator::{FeatureState, Orchestrator, Outcome, RunState, RunStatus};
    pub use crate::phase::{Phase, PhaseSet};
    pub use crate::registry::FeatureRegistry;
}
