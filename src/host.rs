//! A table-driven [`ResolverHost`]
//!
//! `FixedHost` answers variables from a lookup table, returns fixed random bits,
//! and keeps one byte of waiting triggers. It backs the `vgraph` CLI and is handy
//! for exercising graphs without a real game world behind them.

use std::cell::Cell;
use std::collections::HashMap;

use crate::context::{ResolverContext, ResolverHost};
use crate::models::{NodeId, RealNode, Scope};
use crate::variables::UNSUPPORTED;

/// Which result list of a `Real` node the host picks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RealPolicy {
    /// First entry of `loaded`, falling back to `loading`
    #[default]
    Loaded,
    /// First entry of `loading`, falling back to `loaded`
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VarKey {
    scope: Option<Scope>,
    variable: u8,
    parameter: Option<u8>,
}

/// Host with fixed, table-driven answers.
#[derive(Debug, Clone, Default)]
pub struct FixedHost {
    variables: HashMap<VarKey, u32>,
    random_bits: HashMap<Scope, u32>,
    waiting_triggers: u8,
    real_policy: RealPolicy,
    reads: Cell<usize>,
}

impl FixedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `variable` with `value` for any scope and parameter.
    pub fn with_variable(mut self, variable: u8, value: u32) -> Self {
        self.set_variable(None, variable, None, value);
        self
    }

    /// Answer `variable` with `value` only for the given parameter.
    pub fn with_parameterized(mut self, variable: u8, parameter: u8, value: u32) -> Self {
        self.set_variable(None, variable, Some(parameter), value);
        self
    }

    /// Answer `variable` with `value` only while `scope` is active.
    pub fn with_scoped(mut self, scope: Scope, variable: u8, value: u32) -> Self {
        self.set_variable(Some(scope), variable, None, value);
        self
    }

    /// Random bits reported for every scope without its own bits.
    pub fn with_random_bits(mut self, bits: u32) -> Self {
        self.random_bits.insert(Scope::Own, bits);
        self
    }

    /// Random bits reported while the parent scope is active.
    pub fn with_parent_random_bits(mut self, bits: u32) -> Self {
        self.random_bits.insert(Scope::Parent, bits);
        self
    }

    pub fn with_waiting_triggers(mut self, triggers: u8) -> Self {
        self.waiting_triggers = triggers;
        self
    }

    pub fn with_real_policy(mut self, policy: RealPolicy) -> Self {
        self.real_policy = policy;
        self
    }

    /// Insert or replace a table entry.
    pub fn set_variable(
        &mut self,
        scope: Option<Scope>,
        variable: u8,
        parameter: Option<u8>,
        value: u32,
    ) {
        self.variables.insert(VarKey { scope, variable, parameter }, value);
    }

    /// Current waiting-trigger byte.
    pub fn waiting_triggers(&self) -> u8 {
        self.waiting_triggers
    }

    /// How many times a variable was requested from this host.
    pub fn variable_reads(&self) -> usize {
        self.reads.get()
    }

    fn lookup(&self, scope: Scope, variable: u8, parameter: u8) -> Option<u32> {
        [
            (Some(scope), Some(parameter)),
            (Some(scope), None),
            (None, Some(parameter)),
            (None, None),
        ]
        .into_iter()
        .find_map(|(scope, parameter)| {
            self.variables.get(&VarKey { scope, variable, parameter }).copied()
        })
    }
}

impl ResolverHost for FixedHost {
    fn variable(&self, ctx: &ResolverContext, variable: u8, parameter: u8) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.lookup(ctx.scope, variable, parameter).unwrap_or(UNSUPPORTED)
    }

    fn random_bits(&self, ctx: &ResolverContext) -> u32 {
        self.random_bits
            .get(&ctx.scope)
            .or_else(|| self.random_bits.get(&Scope::Own))
            .copied()
            .unwrap_or(0)
    }

    fn triggers(&self, _ctx: &ResolverContext) -> u8 {
        self.waiting_triggers
    }

    fn set_triggers(&mut self, _ctx: &ResolverContext, triggers: u8) {
        self.waiting_triggers = triggers;
    }

    fn resolve_real(&self, _ctx: &ResolverContext, real: &RealNode) -> Option<NodeId> {
        let (primary, secondary) = match self.real_policy {
            RealPolicy::Loaded => (&real.loaded, &real.loading),
            RealPolicy::Loading => (&real.loading, &real.loaded),
        };
        primary.first().or_else(|| secondary.first()).copied().flatten()
    }
}
