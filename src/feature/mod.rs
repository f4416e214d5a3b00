//! Feature contract
//!
//! A feature is a named, independently developed unit of functionality that
//! opts into a subset of the lifecycle [`Phase`](crate::phase::Phase)s.
//!
//! Two ways to write one:
//! - implement [`Feature`] on your own type and override the hooks you need
//! - assemble a [`HookFeature`] from closures

mod context;
mod error;
mod hooks;
mod traits;

pub use context::FeatureContext;
pub use error::{FeatureError, HookResult};
pub use hooks::HookFeature;
pub use traits::Feature;

pub(crate) use traits::dispatch;
