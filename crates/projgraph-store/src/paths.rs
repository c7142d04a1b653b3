//! Path key normalization.
//!
//! Registries and the output-path index key their maps by path. Hosts on
//! case-insensitive file systems compare paths ignoring case; everything
//! else compares them byte for byte.

use serde::{Deserialize, Serialize};

/// How two paths are compared when used as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathComparison {
    #[default]
    Ordinal,
    IgnoreCase,
}

impl PathComparison {
    /// Returns the map key for `path` under this comparison.
    pub fn key(self, path: &str) -> String {
        match self {
            PathComparison::Ordinal => path.to_string(),
            PathComparison::IgnoreCase => path.to_lowercase(),
        }
    }
}
