//! Name -> domain lookup for enabled collectors.

use std::collections::HashMap;

use crate::domain::{DOMAINS, DomainSpec};

/// Collectors that can be enabled by name.
#[derive(Debug, Clone)]
pub struct CollectorRegistry {
    domains: HashMap<&'static str, &'static DomainSpec>,
}

impl CollectorRegistry {
    /// Registry over the built-in domain table.
    pub fn builtin() -> Self {
        Self::from_domains(DOMAINS)
    }

    pub fn from_domains(domains: &[&'static DomainSpec]) -> Self {
        Self {
            domains: domains.iter().map(|d| (d.collector, *d)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static DomainSpec> {
        self.domains.get(name).copied()
    }

    /// Registered collector names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.domains.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse a comma-separated collector list.
///
/// Entries are trimmed, empty entries dropped, order kept. Unknown names are
/// kept here and skipped when the cycle runs.
pub fn parse_enabled(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
