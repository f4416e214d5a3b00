//! Program options and orchestrator settings

use crate::error::{OrchestrationError, Result};
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// A declared option together with its current value
#[derive(Debug, Clone)]
struct OptionEntry {
    value: Option<String>,
    description: Option<String>,
}

/// Shared key/value option store
///
/// Features declare their options during `CollectOptions`, check them during
/// `ValidateOptions` and read them afterwards. Cloning is cheap and every
/// clone sees the same values.
#[derive(Clone, Default)]
pub struct ProgramOptions {
    options: Arc<DashMap<String, OptionEntry>>,
}

impl ProgramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every environment variable starting with `prefix`.
    ///
    /// `PREFIX_LOG_LEVEL=debug` becomes `log.level = "debug"`.
    pub fn from_env(prefix: &str) -> Self {
        let options = Self::new();
        let prefix = format!("{}_", prefix.to_ascii_uppercase());
        for (key, value) in env::vars() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                options.set(&option_key(rest), &value);
            }
        }
        options
    }

    /// Declare an option with a default.
    ///
    /// A value that was already set (e.g. from the environment) wins over the default.
    pub fn declare(&self, key: &str, default: Option<&str>, description: &str) {
        let mut entry = self
            .options
            .entry(key.to_string())
            .or_insert_with(|| OptionEntry {
                value: None,
                description: None,
            });
        entry.description = Some(description.to_string());
        if entry.value.is_none() {
            entry.value = default.map(str::to_string);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.options.get(key).and_then(|v| v.value.clone())
    }

    /// Parse the value of `key`, `Ok(None)` when it is unset
    pub fn get_parsed<T>(&self, key: &str) -> std::result::Result<Option<T>, T::Err>
    where
        T: FromStr,
    {
        self.get(key).map(|v| v.parse::<T>()).transpose()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.options
            .entry(key.to_string())
            .and_modify(|e| e.value = Some(value.to_string()))
            .or_insert_with(|| OptionEntry {
                value: Some(value.to_string()),
                description: None,
            });
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.options
            .get(key)
            .is_some_and(|e| e.description.is_some())
    }

    pub fn description(&self, key: &str) -> Option<String> {
        self.options.get(key).and_then(|e| e.description.clone())
    }

    /// All option keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.options.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

fn option_key(env_suffix: &str) -> String {
    env_suffix.to_ascii_lowercase().replace('_', ".")
}

/// Knobs for the orchestrator itself
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Program identity handed to every feature
    pub program_name: String,
    /// Features that are registered but must not run
    pub disabled: Vec<String>,
    /// Hooks running longer than this are reported
    pub slow_hook_threshold: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            program_name: env!("CARGO_PKG_NAME").to_string(),
            disabled: Vec::new(),
            slow_hook_threshold: Duration::from_secs(5),
        }
    }
}

impl OrchestratorSettings {
    pub const ENV_PROGRAM_NAME: &'static str = "FEATUREKIT_PROGRAM_NAME";
    pub const ENV_DISABLED_FEATURES: &'static str = "FEATUREKIT_DISABLED_FEATURES";
    pub const ENV_SLOW_HOOK_MS: &'static str = "FEATUREKIT_SLOW_HOOK_MS";

    /// Read settings from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(name) = lookup(Self::ENV_PROGRAM_NAME).filter(|n| !n.trim().is_empty()) {
            settings.program_name = name.trim().to_string();
        }

        if let Some(list) = lookup(Self::ENV_DISABLED_FEATURES) {
            settings.disabled = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(ms) = lookup(Self::ENV_SLOW_HOOK_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                OrchestrationError::InvalidSettings(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    Self::ENV_SLOW_HOOK_MS,
                    ms
                ))
            })?;
            settings.slow_hook_threshold = Duration::from_millis(ms);
        }

        Ok(settings)
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }

    pub fn disable(mut self, feature: impl Into<String>) -> Self {
        self.disabled.push(feature.into());
        self
    }

    pub fn slow_hook_threshold(mut self, threshold: Duration) -> Self {
        self.slow_hook_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_declare_keeps_existing_value() {
        let options = ProgramOptions::new();
        options.set("log.level", "debug");
        options.declare("log.level", Some("info"), "log level");
        options.declare("server.threads", Some("4"), "worker threads");

        assert_eq!(options.get("log.level").as_deref(), Some("debug"));
        assert_eq!(options.get_parsed::<u32>("server.threads").unwrap(), Some(4));
        assert!(options.is_declared("log.level"));
        assert_eq!(options.keys(), vec!["log.level", "server.threads"]);
    }

    #[test]
    fn test_get_parsed_reports_bad_values() {
        let options = ProgramOptions::new();
        options.set("server.threads", "many");
        assert!(options.get_parsed::<u32>("server.threads").is_err());
        assert_eq!(options.get_parsed::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn test_clones_share_values() {
        let options = ProgramOptions::new();
        let other = options.clone();
        other.set("a", "1");
        assert_eq!(options.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_option_key_from_env_suffix() {
        assert_eq!(option_key("LOG_LEVEL"), "log.level");
    }

    #[test]
    fn test_settings_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (OrchestratorSettings::ENV_PROGRAM_NAME, "orbitd"),
            (OrchestratorSettings::ENV_DISABLED_FEATURES, "greetings, ,metrics"),
            (OrchestratorSettings::ENV_SLOW_HOOK_MS, "250"),
        ]);
        let settings =
            OrchestratorSettings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.program_name, "orbitd");
        assert_eq!(settings.disabled, vec!["greetings", "metrics"]);
        assert_eq!(settings.slow_hook_threshold, Duration::from_millis(250));
    }

    #[test]
    fn test_settings_reject_bad_threshold() {
        let result = OrchestratorSettings::from_lookup(|k| {
            (k == OrchestratorSettings::ENV_SLOW_HOOK_MS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(OrchestrationError::InvalidSettings(_))));
    }
}
