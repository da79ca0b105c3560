//! Evaluation context and host capability
//!
//! A [`ResolverContext`] is the mutable scratch state of one top-level resolution:
//! it is passed by `&mut` through every recursive call and collects the side
//! effects callers observe afterwards (last value, pending reseed). Everything the
//! engine cannot know on its own is asked of a [`ResolverHost`].

use serde::{Deserialize, Serialize};

use crate::models::{NodeId, RealNode, Scope};

/// Climate of the host world. Affects the snow line variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Landscape {
    #[default]
    Temperate,
    Arctic,
    Tropic,
    Toyland,
}

impl Landscape {
    /// Numeric code exposed to graphs.
    pub fn code(self) -> u32 {
        match self {
            Landscape::Temperate => 0,
            Landscape::Arctic => 1,
            Landscape::Tropic => 2,
            Landscape::Toyland => 3,
        }
    }
}

/// Host-wide values exposed through the reserved variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    /// Days since year 0
    pub date: i32,
    pub year: i32,
    /// Month of the year, 0-11
    pub month: u8,
    pub date_fraction: u16,
    pub tick_counter: u16,
    pub landscape: Landscape,
    pub display_options: u8,
    pub snow_line: u8,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            date: crate::variables::DAYS_TILL_ORIGINAL_BASE_YEAR,
            year: crate::variables::ORIGINAL_BASE_YEAR,
            month: 0,
            date_fraction: 0,
            tick_counter: 0,
            landscape: Landscape::Temperate,
            display_options: 0,
            snow_line: 0,
        }
    }
}

/// Per-resolution scratch state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverContext {
    /// Variable namespace of the node currently being evaluated
    pub scope: Scope,
    /// Running accumulator; updated by every deterministic node
    pub last_value: u32,
    /// Trigger bits active for this resolution (0 when not triggered)
    pub trigger: u8,
    /// Random bits the host should refresh afterwards
    pub reseed: u32,
    pub callback: u16,
    pub callback_param1: u32,
    pub callback_param2: u32,
    pub globals: Globals,
}

impl ResolverContext {
    /// Create a context over the given host globals.
    pub fn new(globals: Globals) -> Self {
        Self { globals, ..Default::default() }
    }

    /// Set the callback being answered and its parameters.
    pub fn with_callback(mut self, callback: u16, param1: u32, param2: u32) -> Self {
        self.callback = callback;
        self.callback_param1 = param1;
        self.callback_param2 = param2;
        self
    }

    pub fn with_trigger(mut self, trigger: u8) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_last_value(mut self, last_value: u32) -> Self {
        self.last_value = last_value;
        self
    }
}

/// Capabilities the host supplies to the resolver.
///
/// Implementations decide what feature-specific variables mean, where random bits
/// and trigger state live, and how `Real` nodes pick a result. The context is
/// passed so that the active [`Scope`] is visible.
pub trait ResolverHost {
    /// Value of a variable not covered by the reserved set.
    ///
    /// Return [`UNSUPPORTED`](crate::variables::UNSUPPORTED) for unknown variables.
    fn variable(&self, ctx: &ResolverContext, variable: u8, parameter: u8) -> u32;

    /// Random bits of the object in the active scope.
    fn random_bits(&self, ctx: &ResolverContext) -> u32;

    /// Triggers waiting on the object in the active scope.
    fn triggers(&self, ctx: &ResolverContext) -> u8;

    /// Store the waiting triggers after reconciliation.
    fn set_triggers(&mut self, ctx: &ResolverContext, triggers: u8);

    /// Pick the result of a `Real` node.
    fn resolve_real(&self, ctx: &ResolverContext, real: &RealNode) -> Option<NodeId>;
}
