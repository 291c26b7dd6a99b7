// src/escape/mod.rs
//! Escape analysis hooks for allocation nodes.
//!
//! An allocation whose object identity never leaves the compiled unit can
//! have its fields tracked as scalar values instead of being materialized.
//! Each eligible allocation kind contributes a stateless strategy
//! implementing [`EscapeOp`]; the driver walks the allocation's uses,
//! classifies each one, and, when nothing escapes, rewrites every access
//! into a scalar state vector indexed by slot.

pub mod ops;

use crate::graph::{Graph, NodeId, NodeKind};
use crate::meta::{Universe, ValueKind};

pub use ops::{InstanceEscape, NewArrayEscape, escape_op};

/// Upper bound on constant array lengths eligible for virtualization.
pub const MAX_VIRTUALIZED_ARRAY_LENGTH: i64 = 32;

/// A trackable scalar slot of a virtualized allocation. Lives only for the
/// duration of escape analysis on that allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeField {
    pub index: u32,
    pub kind: ValueKind,
    /// Field name or `[i]` for array elements; diagnostics only.
    pub name: String,
}

/// How one use of an allocation affects its virtualizability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseDecision {
    /// A tracked scalar access; rewritten by `update_state`.
    NoEscape,
    /// A use with no scalar effect that can simply be dropped.
    Removable,
    /// Forces the object to be materialized.
    Escapes,
}

/// The per-slot value vector threaded through the rewrite. Slot order is
/// the order reported by [`EscapeOp::fields`].
#[derive(Debug, Default)]
pub struct ScalarState {
    pub slots: Vec<NodeId>,
}

/// Escape-analysis strategy for one allocation node kind.
pub trait EscapeOp {
    /// Whether this allocation is eligible at all (constant bounded length,
    /// resolved type, ...).
    fn can_analyze(&self, graph: &Graph, universe: &Universe, alloc: NodeId) -> bool;

    /// Classifies one use of the allocation.
    fn escape(&self, graph: &Graph, universe: &Universe, alloc: NodeId, usage: NodeId)
    -> UseDecision;

    /// The allocation's trackable scalar slots.
    fn fields(&self, graph: &Graph, universe: &Universe, alloc: NodeId) -> Vec<EscapeField>;

    /// Seeds the state vector with the allocation's initial slot values.
    fn before_update(
        &self,
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
        state: &mut ScalarState,
    );

    /// Rewrites one non-escaping use against the state vector and removes
    /// it from the graph. Loads must observe the most recent store to the
    /// same slot, so the driver presents uses in control order.
    fn update_state(
        &self,
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
        usage: NodeId,
        state: &mut ScalarState,
    );
}

/// Result of the decision phase: what would escape, and which slots the
/// allocation would decompose into.
#[derive(Debug)]
pub struct EscapeDecision {
    pub fields: Vec<EscapeField>,
    pub escaping: Vec<NodeId>,
}

/// The allocation after a successful rewrite: its slots and their final
/// scalar values, for the external materialization driver.
#[derive(Debug)]
pub struct VirtualizedAllocation {
    pub fields: Vec<EscapeField>,
    pub values: Vec<NodeId>,
}

pub struct EscapeAnalyzer;

impl EscapeAnalyzer {
    /// Classifies an allocation without mutating the graph. `None` means
    /// the node is not an analyzable allocation.
    pub fn analyze(graph: &Graph, universe: &Universe, alloc: NodeId) -> Option<EscapeDecision> {
        let op = escape_op(graph.kind(alloc))?;
        if !op.can_analyze(graph, universe, alloc) {
            return None;
        }
        let escaping = graph
            .uses(alloc)
            .iter()
            .copied()
            .filter(|usage| {
                op.escape(graph, universe, alloc, *usage) == UseDecision::Escapes
            })
            .collect();
        Some(EscapeDecision {
            fields: op.fields(graph, universe, alloc),
            escaping,
        })
    }

    /// Scalar-replaces a non-escaping allocation: rewrites every access to
    /// the state vector, drops removable uses, and deletes the allocation.
    /// Returns `None` without touching the graph when the allocation is
    /// ineligible or some use escapes.
    pub fn virtualize(
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
    ) -> Option<VirtualizedAllocation> {
        let decision = Self::analyze(graph, universe, alloc)?;
        if !decision.escaping.is_empty() {
            tracing::trace!(
                alloc = alloc.index(),
                escaping = decision.escaping.len(),
                "allocation escapes"
            );
            return None;
        }
        let op = escape_op(graph.kind(alloc)).expect("analyze succeeded");

        let mut state = ScalarState::default();
        op.before_update(graph, universe, alloc, &mut state);
        debug_assert_eq!(state.slots.len(), decision.fields.len());

        // Uses of an allocation are access nodes, all fixed and dominated
        // by it; walking the control chain from the allocation presents
        // them in order, so every load sees the latest same-slot store.
        let mut cursor = graph.node(alloc).next();
        while let Some(node) = cursor {
            let next = graph.node(node).next();
            if graph.inputs(node).contains(&alloc) {
                op.update_state(graph, universe, alloc, node, &mut state);
            }
            cursor = next;
        }

        debug_assert!(
            graph.uses(alloc).is_empty(),
            "virtualization left a use behind"
        );
        tracing::debug!(
            alloc = alloc.index(),
            kind = graph.kind(alloc).mnemonic(),
            slots = decision.fields.len(),
            "allocation virtualized"
        );
        graph.delete_fixed(alloc);
        Some(VirtualizedAllocation {
            fields: decision.fields,
            values: state.slots,
        })
    }
}

/// Constant-index view of an indexed access against a known-length array.
/// `None` when the index is dynamic or out of bounds.
pub(crate) fn constant_index(graph: &Graph, index: NodeId, length: i64) -> Option<u32> {
    if let NodeKind::Constant(value) = graph.kind(index)
        && let Some(i) = value.as_i64()
        && (0..length).contains(&i)
    {
        return Some(i as u32);
    }
    None
}
