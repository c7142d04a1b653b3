//! Workspace configuration read from the environment.
//!
//! - `PROJGRAPH_LOG`: tracing filter directive (default: "info")
//! - `PROJGRAPH_CASE_INSENSITIVE_PATHS`: "1"/"true" to compare paths
//!   ignoring case (default: off)

use projgraph_store::PathComparison;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "PROJGRAPH_LOG";

/// Environment variable enabling case-insensitive path comparison.
pub const CASE_INSENSITIVE_PATHS_ENV: &str = "PROJGRAPH_CASE_INSENSITIVE_PATHS";

/// Settings shared by every project of a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// How registry and output-path keys are compared.
    pub path_comparison: PathComparison,
    /// Filter directive handed to the tracing subscriber.
    pub log_filter: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            path_comparison: PathComparison::Ordinal,
            log_filter: "info".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = WorkspaceConfig::default();
        let path_comparison = match lookup(CASE_INSENSITIVE_PATHS_ENV).as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("TRUE") | Some("yes") => PathComparison::IgnoreCase,
            _ => defaults.path_comparison,
        };
        let log_filter = lookup(LOG_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        WorkspaceConfig {
            path_comparison,
            log_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(WorkspaceConfig::from_lookup(lookup(&[])), WorkspaceConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = WorkspaceConfig::from_lookup(lookup(&[
            (CASE_INSENSITIVE_PATHS_ENV, "true"),
            (LOG_ENV, "projgraph_project=debug"),
        ]));
        assert_eq!(config.path_comparison, PathComparison::IgnoreCase);
        assert_eq!(config.log_filter, "projgraph_project=debug");
    }

    #[test]
    fn unrecognized_flag_keeps_ordinal() {
        let config = WorkspaceConfig::from_lookup(lookup(&[(CASE_INSENSITIVE_PATHS_ENV, "maybe")]));
        assert_eq!(config.path_comparison, PathComparison::Ordinal);
    }
}
