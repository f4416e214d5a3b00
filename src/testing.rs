//! Test helpers shared by the module tests

use crate::feature::{FeatureError, HookFeature};
use crate::phase::{Phase, PhaseSet};
use std::sync::{Arc, Mutex};

/// Shared log of hook calls, entries look like `name.phase`
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A feature that logs every hook it has
pub(crate) fn recording(name: &str, phases: PhaseSet, journal: &Journal) -> HookFeature {
    phases.iter().fold(HookFeature::new(name), |feature, phase| {
        let journal = journal.clone();
        let entry = format!("{}.{}", name, phase);
        feature.on(phase, move |_| {
            journal.push(entry.clone());
            Ok(())
        })
    })
}

/// Like [`recording`], but the `fail_on` hook returns an error after logging
pub(crate) fn failing(
    name: &str,
    fail_on: Phase,
    phases: PhaseSet,
    journal: &Journal,
) -> HookFeature {
    phases.iter().fold(HookFeature::new(name), |feature, phase| {
        let journal = journal.clone();
        let entry = format!("{}.{}", name, phase);
        feature.on(phase, move |_| {
            journal.push(entry.clone());
            if phase == fail_on {
                Err(FeatureError::init_failed(format!("{} refused", entry)))
            } else {
                Ok(())
            }
        })
    })
}
