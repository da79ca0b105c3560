//! Configuration for the resolver and the `vgraph` CLI
//!
//! Provides types and loading for `vgraph.toml`.

pub mod loader;
pub mod schema;

pub use loader::{load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
