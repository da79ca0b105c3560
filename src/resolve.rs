//! Recursive resolution of node graphs
//!
//! [`Resolver::resolve`] is the single recursive entry point: it dispatches on the
//! node kind and every resolver calls back into it for children. Resolution
//! always ends on a terminal (a stored `Callback`/`Result` node, whatever the host
//! picked for a `Real` node, or a callback synthesized by a deterministic node
//! without ranges) or on the null node.
//!
//! # Example
//!
//! ```
//! use variantgraph::arena::NodeArena;
//! use variantgraph::context::ResolverContext;
//! use variantgraph::host::FixedHost;
//! use variantgraph::models::{AdjustOp, Adjustment, CallbackNode, DeterministicNode, Node, Range};
//! use variantgraph::resolve::{Resolution, Resolver};
//!
//! let mut arena = NodeArena::new();
//! let low = arena.insert(Node::Callback(CallbackNode { result: 1 })).unwrap();
//! let high = arena.insert(Node::Callback(CallbackNode { result: 2 })).unwrap();
//! let root = arena
//!     .insert(Node::Deterministic(DeterministicNode {
//!         adjustments: vec![Adjustment::new(0x40, AdjustOp::Add)],
//!         ranges: vec![Range::new(0, 9, Some(low)), Range::new(10, 255, Some(high))],
//!         ..Default::default()
//!     }))
//!     .unwrap();
//!
//! let mut host = FixedHost::new().with_variable(0x40, 12);
//! let mut ctx = ResolverContext::default();
//! let result = Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
//! assert_eq!(result, Some(Resolution::Node(high)));
//! ```

use thiserror::Error;

use crate::arena::NodeArena;
use crate::context::{ResolverContext, ResolverHost};
use crate::eval::eval_adjust;
use crate::models::{CompareMode, DeterministicNode, Node, NodeId, RandomizedNode, Target};
use crate::variables::{get_variable, UNSUPPORTED, VAR_SUBROUTINE};

/// Default recursion ceiling.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Callback result reported when a subroutine did not end on a callback.
pub const CALLBACK_FAILED: u32 = 0xFFFF;

/// Marks a callback result computed directly by a range-less deterministic node.
pub const DIRECT_VALUE_FLAG: u16 = 0x8000;

/// Fatal inconsistency found while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The graph is deeper than allowed, most likely cyclic
    #[error("resolution depth limit of {limit} exceeded at node {node}")]
    DepthExceeded { limit: usize, node: NodeId },
    /// A reference points outside the arena
    #[error("reference to unknown node {0}")]
    UnknownNode(NodeId),
    /// A randomized node produced an index it has no target for
    #[error("randomized node {node} selected group {index} of {count}")]
    GroupIndexOutOfRange { node: NodeId, index: usize, count: usize },
}

/// Outcome of resolving a non-null node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A node stored in the arena
    Node(NodeId),
    /// A callback result synthesized during resolution
    Callback(u16),
}

impl Resolution {
    /// Callback result carried by this outcome, if it is a callback.
    pub fn callback_result(&self, arena: &NodeArena) -> Option<u16> {
        match self {
            Resolution::Callback(result) => Some(*result),
            Resolution::Node(id) => match arena.get(*id)? {
                Node::Callback(callback) => Some(callback.result),
                _ => None,
            },
        }
    }
}

/// Resolves nodes of one arena.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    arena: &'a NodeArena,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        Self { arena, max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Set the recursion ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn arena(&self) -> &'a NodeArena {
        self.arena
    }

    /// Resolve `node` to a terminal.
    ///
    /// A null node resolves to `None` without touching the context or the host.
    pub fn resolve<H: ResolverHost + ?Sized>(
        &self,
        node: Target,
        ctx: &mut ResolverContext,
        host: &mut H,
    ) -> Result<Option<Resolution>, ResolveError> {
        self.resolve_at(node, ctx, host, 0)
    }

    fn resolve_at<H: ResolverHost + ?Sized>(
        &self,
        node: Target,
        ctx: &mut ResolverContext,
        host: &mut H,
        depth: usize,
    ) -> Result<Option<Resolution>, ResolveError> {
        let Some(id) = node else {
            return Ok(None);
        };
        if depth >= self.max_depth {
            tracing::warn!(node = %id, limit = self.max_depth, "Resolution depth limit hit");
            return Err(ResolveError::DepthExceeded { limit: self.max_depth, node: id });
        }
        let node = self.arena.get(id).ok_or(ResolveError::UnknownNode(id))?;
        tracing::trace!(node = %id, kind = node.kind_name(), depth, "Resolving node");

        match node {
            Node::Real(real) => Ok(host.resolve_real(ctx, real).map(Resolution::Node)),
            Node::Deterministic(det) => self.resolve_deterministic(det, ctx, host, depth),
            Node::Randomized(rand) => self.resolve_randomized(id, rand, ctx, host, depth),
            Node::Callback(_) | Node::Result(_) => Ok(Some(Resolution::Node(id))),
        }
    }

    fn resolve_deterministic<H: ResolverHost + ?Sized>(
        &self,
        node: &DeterministicNode,
        ctx: &mut ResolverContext,
        host: &mut H,
        depth: usize,
    ) -> Result<Option<Resolution>, ResolveError> {
        let mut last_value = ctx.last_value;
        let mut value = UNSUPPORTED;

        ctx.scope = node.scope;

        for adjust in &node.adjustments {
            let fetched = match (adjust.variable, adjust.subroutine) {
                (VAR_SUBROUTINE, Some(subroutine)) => {
                    self.eval_subroutine(subroutine, ctx, host, depth)?
                }
                _ => get_variable(ctx, host, adjust.variable, adjust.parameter),
            };
            value = eval_adjust(node.width, adjust, last_value, fetched);
            last_value = value;
        }

        ctx.last_value = last_value;

        let target = if value == UNSUPPORTED {
            // Unsupported property, whether nothing was evaluated or the pipeline hit all ones.
            node.ranges.first().map_or(node.default, |range| range.target)
        } else if node.ranges.is_empty() {
            let result = (value & 0x7FFF) as u16 | DIRECT_VALUE_FLAG;
            return Ok(Some(Resolution::Callback(result)));
        } else {
            node.ranges
                .iter()
                .find(|range| range.contains(value))
                .map_or(node.default, |range| range.target)
        };

        self.resolve_at(target, ctx, host, depth + 1)
    }

    /// Resolve a subroutine node and read its callback result.
    ///
    /// The subroutine shares the caller's context, so it also sees and updates
    /// `last_value` and the active scope. The caller's scope is restored afterwards.
    fn eval_subroutine<H: ResolverHost + ?Sized>(
        &self,
        subroutine: NodeId,
        ctx: &mut ResolverContext,
        host: &mut H,
        depth: usize,
    ) -> Result<u32, ResolveError> {
        let scope = ctx.scope;
        let resolved = self.resolve_at(Some(subroutine), ctx, host, depth + 1)?;
        ctx.scope = scope;
        Ok(resolved
            .and_then(|resolution| resolution.callback_result(self.arena))
            .map_or(CALLBACK_FAILED, u32::from))
    }

    fn resolve_randomized<H: ResolverHost + ?Sized>(
        &self,
        id: NodeId,
        node: &RandomizedNode,
        ctx: &mut ResolverContext,
        host: &mut H,
        depth: usize,
    ) -> Result<Option<Resolution>, ResolveError> {
        ctx.scope = node.scope;

        let mask = node.selection_mask();

        if ctx.trigger != 0 {
            let mut waiting = host.triggers(ctx);
            let matched = node.triggers & (waiting | ctx.trigger);
            let fired = match node.compare {
                CompareMode::Any => matched != 0,
                CompareMode::All => matched == node.triggers,
            };

            if fired {
                waiting &= !matched;
                ctx.reseed |= mask;
            } else {
                waiting |= ctx.trigger;
            }

            tracing::debug!(node = %id, fired, waiting, reseed = ctx.reseed, "Reconciled triggers");
            host.set_triggers(ctx, waiting);
        }

        let index = ((host.random_bits(ctx) & mask) >> node.lowest_bit) as usize;
        let target = *node.targets.get(index).ok_or(ResolveError::GroupIndexOutOfRange {
            node: id,
            index,
            count: node.group_count(),
        })?;

        self.resolve_at(target, ctx, host, depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Globals;
    use crate::host::FixedHost;
    use crate::models::{
        AdjustOp, Adjustment, CallbackNode, RealNode, Range, ResultNode, Scope, ValueWidth,
    };

    fn callback(arena: &mut NodeArena, result: u16) -> NodeId {
        arena.insert(Node::Callback(CallbackNode { result })).unwrap()
    }

    fn ctx() -> ResolverContext {
        ResolverContext::new(Globals::default())
    }

    fn randomized(targets: Vec<Target>, lowest_bit: u8, triggers: u8, compare: CompareMode) -> Node {
        Node::Randomized(RandomizedNode {
            scope: Scope::Own,
            triggers,
            compare,
            lowest_bit,
            targets,
        })
    }

    #[test]
    fn test_null_is_noop() {
        let arena = NodeArena::new();
        let mut host = FixedHost::new().with_waiting_triggers(0x05);
        let mut ctx = ctx().with_trigger(0x01).with_last_value(7);
        let before = ctx.clone();

        let result = Resolver::new(&arena).resolve(None, &mut ctx, &mut host).unwrap();
        assert_eq!(result, None);
        assert_eq!(ctx, before);
        assert_eq!(host.variable_reads(), 0);
        assert_eq!(host.waiting_triggers(), 0x05);
    }

    #[test]
    fn test_terminal_returns_itself() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 3);
        let sprites = arena.insert(Node::Result(ResultNode { sprite: 100, count: 4 })).unwrap();
        let resolver = Resolver::new(&arena);
        let mut host = FixedHost::new();

        assert_eq!(
            resolver.resolve(Some(leaf), &mut ctx(), &mut host).unwrap(),
            Some(Resolution::Node(leaf))
        );
        assert_eq!(
            resolver.resolve(Some(sprites), &mut ctx(), &mut host).unwrap(),
            Some(Resolution::Node(sprites))
        );
    }

    #[test]
    fn test_real_delegates_to_host() {
        let mut arena = NodeArena::new();
        let loaded = arena.insert(Node::Result(ResultNode { sprite: 10, count: 1 })).unwrap();
        let real = arena
            .insert(Node::Real(RealNode { loaded: vec![Some(loaded)], loading: vec![] }))
            .unwrap();

        let mut host = FixedHost::new();
        let result = Resolver::new(&arena).resolve(Some(real), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(loaded)));
    }

    #[test]
    fn test_deterministic_range_scenario() {
        let mut arena = NodeArena::new();
        let a = callback(&mut arena, 1);
        let b = callback(&mut arena, 2);
        let c = callback(&mut arena, 3);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Byte,
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Add).with_shift_mask(0, 0xFF)],
                ranges: vec![Range::new(0, 10, Some(a)), Range::new(11, 20, Some(b))],
                default: Some(c),
                ..Default::default()
            }))
            .unwrap();

        let mut host = FixedHost::new().with_variable(0x40, 5);
        let mut ctx = ctx().with_last_value(10);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(b)));
        assert_eq!(ctx.last_value, 15);
    }

    #[test]
    fn test_first_matching_range_wins() {
        let mut arena = NodeArena::new();
        let a = callback(&mut arena, 1);
        let b = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Replace)],
                ranges: vec![Range::new(5, 5, Some(a)), Range::new(0, 10, Some(b))],
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new().with_variable(0x40, 5);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(a)));
    }

    #[test]
    fn test_no_match_uses_default() {
        let mut arena = NodeArena::new();
        let a = callback(&mut arena, 1);
        let fallback = callback(&mut arena, 9);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Replace)],
                ranges: vec![Range::new(0, 3, Some(a))],
                default: Some(fallback),
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new().with_variable(0x40, 200);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(fallback)));
    }

    #[test]
    fn test_null_default_propagates_none() {
        let mut arena = NodeArena::new();
        let a = callback(&mut arena, 1);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Replace)],
                ranges: vec![Range::new(0, 3, Some(a))],
                default: None,
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new().with_variable(0x40, 4);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_zero_ranges_synthesizes_callback() {
        let mut arena = NodeArena::new();
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Word,
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Replace)],
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new().with_variable(0x40, 0xF123);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Callback(0x7123 | 0x8000)));
        assert_eq!(result.unwrap().callback_result(&arena), Some(0xF123));
    }

    #[test]
    fn test_no_adjustments_takes_first_range() {
        let mut arena = NodeArena::new();
        let first = callback(&mut arena, 1);
        let other = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                ranges: vec![Range::new(100, 200, Some(first)), Range::new(0, 99, Some(other))],
                default: Some(other),
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new();
        let mut ctx = ctx().with_last_value(42);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(first)));
        assert_eq!(ctx.last_value, 42);
    }

    #[test]
    fn test_no_adjustments_no_ranges_takes_default() {
        let mut arena = NodeArena::new();
        let fallback = callback(&mut arena, 5);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                default: Some(fallback),
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(fallback)));
    }

    #[test]
    fn test_computed_all_ones_takes_first_range() {
        let mut arena = NodeArena::new();
        let first = callback(&mut arena, 1);
        let top = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Dword,
                adjustments: vec![Adjustment::new(0x1A, AdjustOp::Replace)],
                ranges: vec![Range::new(0, 0, Some(first)), Range::new(1, u32::MAX, Some(top))],
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(first)));
    }

    #[test]
    fn test_computed_all_ones_without_ranges_takes_default() {
        let mut arena = NodeArena::new();
        let fallback = callback(&mut arena, 7);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Dword,
                adjustments: vec![Adjustment::new(0x1A, AdjustOp::Replace)],
                default: Some(fallback),
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(fallback)));
    }

    #[test]
    fn test_unsupported_host_variable_takes_first_range() {
        let mut arena = NodeArena::new();
        let first = callback(&mut arena, 1);
        let top = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Dword,
                adjustments: vec![Adjustment::new(0x55, AdjustOp::Replace)],
                ranges: vec![Range::new(0, 0, Some(first)), Range::new(1, u32::MAX, Some(top))],
                ..Default::default()
            }))
            .unwrap();
        let mut host = FixedHost::new();
        let mut ctx = ctx();
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(first)));
        assert_eq!(ctx.last_value, UNSUPPORTED);
        assert_eq!(host.variable_reads(), 1);
    }

    #[test]
    fn test_narrow_all_ones_is_an_ordinary_value() {
        let mut arena = NodeArena::new();
        let first = callback(&mut arena, 1);
        let top = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Byte,
                adjustments: vec![Adjustment::new(0x55, AdjustOp::Replace)],
                ranges: vec![Range::new(0, 0, Some(first)), Range::new(1, 0xFF, Some(top))],
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(top)));
    }

    #[test]
    fn test_last_value_threads_through_nodes() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 1);
        let other = callback(&mut arena, 2);
        let inner = arena
            .insert(Node::Deterministic(DeterministicNode {
                adjustments: vec![Adjustment::new(0x1C, AdjustOp::Replace)],
                ranges: vec![Range::new(8, 8, Some(leaf))],
                default: Some(other),
                ..Default::default()
            }))
            .unwrap();
        let outer = arena
            .insert(Node::Deterministic(DeterministicNode {
                adjustments: vec![
                    Adjustment::new(0x40, AdjustOp::Replace),
                    Adjustment::new(0x41, AdjustOp::Mul),
                ],
                ranges: vec![Range::new(0, 255, Some(inner))],
                ..Default::default()
            }))
            .unwrap();

        let mut host = FixedHost::new().with_variable(0x40, 2).with_variable(0x41, 4);
        let mut ctx = ctx();
        let result = Resolver::new(&arena).resolve(Some(outer), &mut ctx, &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(leaf)));
        assert_eq!(ctx.last_value, 8);
    }

    #[test]
    fn test_scope_set_for_variable_lookup() {
        let mut arena = NodeArena::new();
        let own = callback(&mut arena, 1);
        let parent = callback(&mut arena, 2);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                scope: Scope::Parent,
                adjustments: vec![Adjustment::new(0x40, AdjustOp::Replace)],
                ranges: vec![Range::new(1, 1, Some(own)), Range::new(2, 2, Some(parent))],
                ..Default::default()
            }))
            .unwrap();
        let mut host =
            FixedHost::new().with_variable(0x40, 1).with_scoped(Scope::Parent, 0x40, 2);
        let mut ctx = ctx();
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(parent)));
        assert_eq!(ctx.scope, Scope::Parent);
    }

    #[test]
    fn test_subroutine_feeds_callback_result() {
        let mut arena = NodeArena::new();
        let hit = callback(&mut arena, 1);
        let miss = callback(&mut arena, 2);
        let sub_result = callback(&mut arena, 33);
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Word,
                adjustments: vec![
                    Adjustment::new(VAR_SUBROUTINE, AdjustOp::Replace).with_subroutine(sub_result)
                ],
                ranges: vec![Range::new(33, 33, Some(hit))],
                default: Some(miss),
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(hit)));
    }

    #[test]
    fn test_subroutine_without_callback_fails() {
        let mut arena = NodeArena::new();
        let sprites = arena.insert(Node::Result(ResultNode { sprite: 1, count: 1 })).unwrap();
        let root = arena
            .insert(Node::Deterministic(DeterministicNode {
                width: ValueWidth::Word,
                adjustments: vec![
                    Adjustment::new(VAR_SUBROUTINE, AdjustOp::Replace).with_subroutine(sprites)
                ],
                ..Default::default()
            }))
            .unwrap();
        let result =
            Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Callback(0x7FFF | DIRECT_VALUE_FLAG)));
    }

    #[test]
    fn test_randomized_selection_scenario() {
        let mut arena = NodeArena::new();
        let targets: Vec<Target> = (0..4).map(|i| Some(callback(&mut arena, i))).collect();
        let root = arena.insert(randomized(targets.clone(), 2, 0, CompareMode::Any)).unwrap();

        let mut host = FixedHost::new().with_random_bits(0b110100);
        let result = Resolver::new(&arena).resolve(Some(root), &mut ctx(), &mut host).unwrap();
        assert_eq!(result, Some(Resolution::Node(targets[1].unwrap())));
    }

    #[test]
    fn test_untriggered_leaves_triggers_alone() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 0);
        let root = arena.insert(randomized(vec![Some(leaf); 2], 0, 0x01, CompareMode::Any)).unwrap();
        let mut host = FixedHost::new().with_waiting_triggers(0x01);
        let mut ctx = ctx();
        Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(host.waiting_triggers(), 0x01);
        assert_eq!(ctx.reseed, 0);
    }

    #[test]
    fn test_trigger_any_success_reseeds() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 0);
        let root = arena.insert(randomized(vec![Some(leaf); 4], 3, 0x03, CompareMode::Any)).unwrap();
        let mut host = FixedHost::new().with_waiting_triggers(0x10);
        let mut ctx = ctx().with_trigger(0x01);
        Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(ctx.reseed, 0b11 << 3);
        assert_eq!(host.waiting_triggers(), 0x10);
    }

    #[test]
    fn test_trigger_all_waits_for_every_bit() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 0);
        let root = arena.insert(randomized(vec![Some(leaf); 2], 0, 0x03, CompareMode::All)).unwrap();
        let resolver = Resolver::new(&arena);
        let mut host = FixedHost::new();

        let mut first = ctx().with_trigger(0x01);
        resolver.resolve(Some(root), &mut first, &mut host).unwrap();
        assert_eq!(first.reseed, 0);
        assert_eq!(host.waiting_triggers(), 0x01);

        let mut second = ctx().with_trigger(0x02);
        resolver.resolve(Some(root), &mut second, &mut host).unwrap();
        assert_eq!(second.reseed, 0b1);
        assert_eq!(host.waiting_triggers(), 0x00);
    }

    #[test]
    fn test_zero_trigger_mask_never_fires() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 0);
        let root = arena.insert(randomized(vec![Some(leaf); 2], 0, 0x00, CompareMode::Any)).unwrap();
        let mut host = FixedHost::new().with_waiting_triggers(0x40);
        let mut ctx = ctx().with_trigger(0x40);
        Resolver::new(&arena).resolve(Some(root), &mut ctx, &mut host).unwrap();
        assert_eq!(ctx.reseed, 0);
        assert_eq!(host.waiting_triggers(), 0x40);
    }

    #[test]
    fn test_cycle_hits_depth_limit() {
        let mut arena = NodeArena::new();
        let id = arena.allocate().unwrap();
        arena
            .set(id, Node::Deterministic(DeterministicNode { default: Some(id), ..Default::default() }))
            .unwrap();
        let err = Resolver::new(&arena)
            .with_max_depth(8)
            .resolve(Some(id), &mut ctx(), &mut FixedHost::new())
            .unwrap_err();
        assert_eq!(err, ResolveError::DepthExceeded { limit: 8, node: id });
    }

    #[test]
    fn test_depth_limit_allows_shallow_graphs() {
        let mut arena = NodeArena::new();
        let leaf = callback(&mut arena, 1);
        let mid = arena
            .insert(Node::Deterministic(DeterministicNode { default: Some(leaf), ..Default::default() }))
            .unwrap();
        let root = arena
            .insert(Node::Deterministic(DeterministicNode { default: Some(mid), ..Default::default() }))
            .unwrap();
        let resolver = Resolver::new(&arena).with_max_depth(3);
        let result = resolver.resolve(Some(root), &mut ctx(), &mut FixedHost::new()).unwrap();
        assert_eq!(result, Some(Resolution::Node(leaf)));

        let shallow = Resolver::new(&arena).with_max_depth(2);
        assert!(shallow.resolve(Some(root), &mut ctx(), &mut FixedHost::new()).is_err());
    }

    #[test]
    fn test_unknown_node_is_error() {
        let arena = NodeArena::new();
        let err = Resolver::new(&arena)
            .resolve(Some(NodeId(4)), &mut ctx(), &mut FixedHost::new())
            .unwrap_err();
        assert_eq!(err, ResolveError::UnknownNode(NodeId(4)));
    }
}
