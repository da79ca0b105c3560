//! Node types for the resolution graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::adjust::Adjustment;

/// Stable handle to a node stored in a [`NodeArena`](crate::arena::NodeArena).
///
/// Handles are plain indices, so growing the arena never invalidates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Index of this node in arena order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child reference. `None` is the null node, which resolves to nothing.
pub type Target = Option<NodeId>;

/// Which variable namespace is active while a node is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Variables of the object being drawn
    #[default]
    #[serde(rename = "self")]
    Own,
    /// Variables of the related parent object (e.g. the vehicle a wagon belongs to)
    Parent,
}

/// Integer width of a deterministic node's arithmetic pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueWidth {
    #[default]
    Byte,
    Word,
    Dword,
}

impl ValueWidth {
    /// Number of bits in this width.
    pub fn bits(self) -> u32 {
        match self {
            ValueWidth::Byte => 8,
            ValueWidth::Word => 16,
            ValueWidth::Dword => 32,
        }
    }
}

/// How a randomized node compares its trigger mask against pending triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Any matching trigger bit succeeds
    #[default]
    Any,
    /// Every bit of the trigger mask must be pending
    All,
}

/// A node whose resolution is handed to the host unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RealNode {
    #[serde(default)]
    pub loaded: Vec<Target>,
    #[serde(default)]
    pub loading: Vec<Target>,
}

/// Inclusive unsigned range selecting a child.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Range {
    pub low: u32,
    pub high: u32,
    pub target: Target,
}

impl Range {
    pub fn new(low: u32, high: u32, target: Target) -> Self {
        Self { low, high, target }
    }

    /// Whether `value` lies within `[low, high]`.
    pub fn contains(&self, value: u32) -> bool {
        value >= self.low && value <= self.high
    }
}

/// A node that computes a value from variables and picks a child by range.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeterministicNode {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub width: ValueWidth,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    #[serde(default)]
    pub ranges: Vec<Range>,
    #[serde(default)]
    pub default: Target,
}

/// A node that picks a child from random bits, optionally reseeding on triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RandomizedNode {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub triggers: u8,
    #[serde(default)]
    pub compare: CompareMode,
    #[serde(default)]
    pub lowest_bit: u8,
    pub targets: Vec<Target>,
}

impl RandomizedNode {
    /// Number of selectable groups.
    pub fn group_count(&self) -> usize {
        self.targets.len()
    }

    /// Bits of the random source this node consumes: `(group_count - 1) << lowest_bit`.
    pub fn selection_mask(&self) -> u32 {
        let span = self.group_count().saturating_sub(1) as u32;
        span.checked_shl(u32::from(self.lowest_bit)).unwrap_or(0)
    }
}

/// Terminal carrying a callback result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallbackNode {
    pub result: u16,
}

/// Terminal carrying a set of sprites.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultNode {
    pub sprite: u32,
    #[serde(default = "default_count")]
    pub count: u8,
}

fn default_count() -> u8 {
    1
}

/// One unit in the resolution graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Real(RealNode),
    Deterministic(DeterministicNode),
    Randomized(RandomizedNode),
    Callback(CallbackNode),
    Result(ResultNode),
}

impl Default for Node {
    /// A zeroed slot: a callback returning 0.
    fn default() -> Self {
        Node::Callback(CallbackNode::default())
    }
}

/// Counts of sub-allocations dropped during arena teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseStats {
    pub nodes: usize,
    pub adjustments: usize,
    pub ranges: usize,
    pub targets: usize,
}

impl Node {
    /// Short lowercase name of the node kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Real(_) => "real",
            Node::Deterministic(_) => "deterministic",
            Node::Randomized(_) => "randomized",
            Node::Callback(_) => "callback",
            Node::Result(_) => "result",
        }
    }

    /// Whether resolution stops at this node.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Callback(_) | Node::Result(_))
    }

    /// Every child reference held by this node, in declaration order.
    pub fn targets(&self) -> Vec<Target> {
        match self {
            Node::Real(real) => real.loaded.iter().chain(&real.loading).copied().collect(),
            Node::Deterministic(det) => det
                .adjustments
                .iter()
                .map(|adjust| adjust.subroutine)
                .filter(Option::is_some)
                .chain(det.ranges.iter().map(|range| range.target))
                .chain(std::iter::once(det.default))
                .collect(),
            Node::Randomized(rand) => rand.targets.clone(),
            Node::Callback(_) | Node::Result(_) => Vec::new(),
        }
    }

    /// Check the shape invariants a node must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), String> {
        if let Node::Randomized(rand) = self {
            let count = rand.group_count();
            if count == 0 || !count.is_power_of_two() {
                return Err(format!("group count {} is not a power of two", count));
            }
            let span_bits = count.trailing_zeros();
            if u32::from(rand.lowest_bit) + span_bits > 32 {
                return Err(format!(
                    "selection mask for {} groups at bit {} exceeds 32 bits",
                    count, rand.lowest_bit
                ));
            }
        }
        Ok(())
    }

    /// Drop the sub-lists owned by this node's kind, adding their sizes to `stats`.
    pub(crate) fn release(&mut self, stats: &mut ReleaseStats) {
        stats.nodes += 1;
        match self {
            Node::Real(real) => {
                stats.targets += real.loaded.len() + real.loading.len();
                real.loaded = Vec::new();
                real.loading = Vec::new();
            }
            Node::Deterministic(det) => {
                stats.adjustments += det.adjustments.len();
                stats.ranges += det.ranges.len();
                det.adjustments = Vec::new();
                det.ranges = Vec::new();
            }
            Node::Randomized(rand) => {
                stats.targets += rand.targets.len();
                rand.targets = Vec::new();
            }
            Node::Callback(_) | Node::Result(_) => {}
        }
    }
}
