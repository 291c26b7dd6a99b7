// src/canon/mod.rs
//! Canonicalization: local, order-independent node rewriting.
//!
//! Every rule in [`rules`] maps a node to an equivalent, simpler form using
//! only the node, its inputs' stamps, and the host tables. Rules are safe
//! to apply in any order and repeatedly; [`Canonicalizer::run`] drives them
//! to a fixed point over a worklist.

pub mod rules;

use rustc_hash::FxHashSet;

use crate::graph::{Graph, NodeId};
use crate::meta::{Assumptions, Universe};

pub use rules::canonical;

/// Outcome of canonicalizing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    /// No simpler form exists.
    Unchanged,
    /// The node's value is equivalently produced by another node.
    Replace(NodeId),
    /// The node has no observable effect and can be removed.
    Delete,
}

/// Resolution services a canonicalization rule may consult.
///
/// Rules that narrow optimistically must check [`allow_assumptions`] and
/// record every fact they rely on, so the compiled code can be invalidated
/// if the fact is later violated.
///
/// [`allow_assumptions`]: CanonicalizerTool::allow_assumptions
pub trait CanonicalizerTool {
    fn universe(&self) -> &Universe;
    fn assumptions(&mut self) -> &mut Assumptions;
    /// Whether optimistic, invalidatable facts may be used.
    fn allow_assumptions(&self) -> bool {
        true
    }
}

/// The standard tool: host tables plus a per-compilation assumption log.
pub struct CanonicalizerContext<'a> {
    universe: &'a Universe,
    assumptions: &'a mut Assumptions,
    allow_assumptions: bool,
}

impl<'a> CanonicalizerContext<'a> {
    pub fn new(universe: &'a Universe, assumptions: &'a mut Assumptions) -> Self {
        Self {
            universe,
            assumptions,
            allow_assumptions: true,
        }
    }

    /// A context that refuses optimistic narrowing, for compilations that
    /// cannot be invalidated.
    pub fn without_assumptions(universe: &'a Universe, assumptions: &'a mut Assumptions) -> Self {
        Self {
            universe,
            assumptions,
            allow_assumptions: false,
        }
    }
}

impl CanonicalizerTool for CanonicalizerContext<'_> {
    fn universe(&self) -> &Universe {
        self.universe
    }

    fn assumptions(&mut self) -> &mut Assumptions {
        self.assumptions
    }

    fn allow_assumptions(&self) -> bool {
        self.allow_assumptions
    }
}

pub struct Canonicalizer;

impl Canonicalizer {
    /// Canonicalizes every live node to a fixed point. Returns the number
    /// of rewrites applied.
    pub fn run(graph: &mut Graph, tool: &mut dyn CanonicalizerTool) -> usize {
        let mut worklist: Vec<NodeId> = graph.live_nodes().collect();
        let mut queued: FxHashSet<NodeId> = worklist.iter().copied().collect();
        let mut rewrites = 0;
        // Each rewrite strictly simplifies, so the work is bounded; the cap
        // only trips on a non-converging rule, which is a bug.
        let mut budget = (graph.live_nodes().count() + 1) * 32;

        while let Some(node) = worklist.pop() {
            queued.remove(&node);
            if !graph.is_alive(node) {
                continue;
            }
            assert!(budget > 0, "canonicalization did not converge");
            budget -= 1;

            match canonical(graph, tool, node) {
                Canonical::Unchanged => {}
                Canonical::Replace(replacement) => {
                    debug_assert_ne!(replacement, node);
                    tracing::trace!(
                        node = node.index(),
                        from = graph.kind(node).mnemonic(),
                        to = graph.kind(replacement).mnemonic(),
                        "canonicalized"
                    );
                    let users: Vec<NodeId> = graph.uses(node).to_vec();
                    if graph.node(node).is_fixed() {
                        graph.replace_fixed(node, replacement);
                    } else {
                        graph.replace_floating(node, replacement);
                    }
                    for user in users {
                        if queued.insert(user) {
                            worklist.push(user);
                        }
                    }
                    if queued.insert(replacement) {
                        worklist.push(replacement);
                    }
                    rewrites += 1;
                }
                Canonical::Delete => {
                    tracing::trace!(
                        node = node.index(),
                        kind = graph.kind(node).mnemonic(),
                        "elided"
                    );
                    if graph.node(node).is_fixed() {
                        graph.delete_fixed(node);
                    } else {
                        graph.kill(node);
                    }
                    rewrites += 1;
                }
            }
        }
        rewrites
    }
}
