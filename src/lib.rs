//! Sprite-variant resolution engine
//!
//! Given a graph of pre-built nodes and a runtime context, deterministically
//! selects one terminal result:
//! - `arena`: block-allocated node store with stable handles
//! - `variables` and `eval`: variable access and fixed-width adjustment arithmetic
//! - `resolve`: the recursive dispatcher over deterministic, randomized and real nodes
//! - `parser` and `config`: graph snapshots and `vgraph.toml` for the `vgraph` CLI

pub mod arena;
pub mod cli;
pub mod config;
pub mod context;
pub mod eval;
pub mod host;
pub mod models;
pub mod parser;
pub mod resolve;
pub mod variables;
