//! Data model for resolution graphs.
//!
//! Nodes form a directed graph stored in a [`NodeArena`](crate::arena::NodeArena):
//! - `Deterministic` nodes compute a value from variables and pick a child by range
//! - `Randomized` nodes pick a child from random bits and reseed on triggers
//! - `Real` nodes are resolved by the host
//! - `Callback` and `Result` nodes are terminals

mod adjust;
mod node;

pub use adjust::{AdjustOp, Adjustment, DivMod};
pub use node::{
    CallbackNode, CompareMode, DeterministicNode, Node, NodeId, RandomizedNode, RealNode,
    Range, ReleaseStats, ResultNode, Scope, Target, ValueWidth,
};
