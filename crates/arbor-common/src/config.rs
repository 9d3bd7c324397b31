//! Configuration structures for Arbor.

use crate::error::{ArborError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest degree for which splits leave both halves non-empty.
pub const MIN_DEGREE: usize = 3;

/// Degree used when none is configured.
pub const DEFAULT_DEGREE: usize = 4;

/// Configuration for a B+ tree instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum number of pointers per node. Leaves hold at most `degree - 1` keys.
    pub degree: usize,
    /// Re-check every structural invariant after each mutation.
    pub check_invariants: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            check_invariants: false,
        }
    }
}

impl TreeConfig {
    /// Creates a config with the given degree and default settings otherwise.
    pub fn with_degree(degree: usize) -> Self {
        Self {
            degree,
            ..Default::default()
        }
    }

    /// Checks that the configured values describe a usable tree.
    pub fn validate(&self) -> Result<()> {
        if self.degree < MIN_DEGREE {
            return Err(ArborError::InvalidDegree {
                degree: self.degree,
                min: MIN_DEGREE,
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TreeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
