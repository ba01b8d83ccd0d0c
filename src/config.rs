// SPDX-License-Identifier: MIT

//! Tiered configuration lookup.
//!
//! A [`PolicyStore`] asks each of its strategies in order and returns the
//! first value found, or the caller's default when none has it.  On Windows
//! the usual chain is the group-policy registry key followed by the
//! application's own (legacy) registry key.

use std::collections::HashMap;

#[cfg(target_os = "windows")]
mod registry;

#[cfg(target_os = "windows")]
pub use registry::RegistryKey;

/// One place a configuration value may come from.
pub trait LookupStrategy {
    fn string(&self, name: &str) -> Option<String>;
    fn integer(&self, name: &str) -> Option<u64>;
}

/// Ordered lookup strategies.  First hit wins.
#[derive(Default)]
pub struct PolicyStore {
    strategies: Vec<Box<dyn LookupStrategy>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy, consulted after all the ones added before it.
    pub fn with(mut self, strategy: impl LookupStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// The policy key first, then the legacy key, both under `HKEY_LOCAL_MACHINE`.
    #[cfg(target_os = "windows")]
    pub fn windows_default(policy_base: &str, legacy_base: &str) -> Self {
        Self::new()
            .with(RegistryKey::local_machine(policy_base))
            .with(RegistryKey::local_machine(legacy_base))
    }

    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.strategies
            .iter()
            .find_map(|s| s.string(name))
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_integer(&self, name: &str, default: u64) -> u64 {
        self.strategies
            .iter()
            .find_map(|s| s.integer(name))
            .unwrap_or(default)
    }
}

/// Values held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticValues {
    strings: HashMap<String, String>,
    integers: HashMap<String, u64>,
}

impl StaticValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, name: &str, value: &str) -> Self {
        self.strings.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_integer(mut self, name: &str, value: u64) -> Self {
        self.integers.insert(name.to_string(), value);
        self
    }
}

impl LookupStrategy for StaticValues {
    fn string(&self, name: &str) -> Option<String> {
        self.strings.get(name).cloned()
    }

    fn integer(&self, name: &str) -> Option<u64> {
        self.integers.get(name).copied()
    }
}
