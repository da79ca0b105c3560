//! Configuration schema types for `vgraph.toml`
//!
//! Defines the host globals exposed through reserved variables and the resolver
//! limits, plus their validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::MAX_BLOCKS;
use crate::context::Globals;
use crate::resolve::DEFAULT_MAX_DEPTH;

/// Resolver limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Recursion ceiling for a single resolution
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Maximum number of arena blocks a loaded graph may use
    #[serde(default = "default_max_blocks")]
    pub max_blocks: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: default_max_depth(), max_blocks: default_max_blocks() }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_blocks() -> usize {
    MAX_BLOCKS
}

/// Complete `vgraph.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VgraphConfig {
    /// World state answered by reserved variables
    #[serde(default)]
    pub globals: Globals,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// A single config validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl VgraphConfig {
    /// Check value constraints that the TOML types cannot express.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.globals.month > 11 {
            errors.push(ConfigValidationError {
                field: "globals.month".to_string(),
                message: "must be between 0 and 11".to_string(),
            });
        }

        if self.resolver.max_depth == 0 {
            errors.push(ConfigValidationError {
                field: "resolver.max_depth".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.resolver.max_blocks == 0 {
            errors.push(ConfigValidationError {
                field: "resolver.max_blocks".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }
}
