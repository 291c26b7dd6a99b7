// src/graph/mod.rs
//! Arena-allocated node graph.
//!
//! Nodes are identified by `NodeId` handles into a per-graph arena. Every
//! input edge has a reciprocal entry in the target's use list; all edge
//! mutation goes through [`Graph`] methods so the two sides are updated in
//! a single operation and no pass can observe them out of sync. Fixed nodes
//! form a doubly linked control chain from the start node; deleting one
//! splices its predecessor to its successor.

pub mod access;
pub mod node;
pub mod stamp;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::meta::ConstantValue;

pub use access::{FieldAccessView, IndexedAccessView};
pub use node::{Node, NodeKind};
pub use stamp::Stamp;

/// Arena handle of a node. Only valid for the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

pub struct Graph {
    nodes: Vec<Node>,
    uses: Vec<SmallVec<[NodeId; 4]>>,
    constants: FxHashMap<ConstantValue, NodeId>,
    start: NodeId,
}

impl Graph {
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            uses: Vec::new(),
            constants: FxHashMap::default(),
            start: NodeId(0),
        };
        graph.start = graph.insert(NodeKind::Start, Stamp::void(), &[]);
        graph
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0 as usize].kind
    }

    pub fn stamp(&self, id: NodeId) -> Stamp {
        self.nodes[id.0 as usize].stamp
    }

    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].inputs
    }

    /// Nodes currently consuming `id` as an input, in no particular order.
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        &self.uses[id.0 as usize]
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id.0 as usize].alive
    }

    /// Iterates the ids of all live nodes.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| NodeId(i as u32))
    }

    /// The constant node for `value`, uniqued per graph.
    pub fn unique_constant(&mut self, value: ConstantValue) -> NodeId {
        if let Some(id) = self.constants.get(&value) {
            return *id;
        }
        let id = self.insert(NodeKind::Constant(value), Stamp::for_constant(value), &[]);
        self.constants.insert(value, id);
        id
    }

    /// Adds a floating node.
    pub fn add_floating(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        assert!(!kind.is_fixed(), "{} is a fixed node kind", kind.mnemonic());
        self.insert(kind, stamp, inputs)
    }

    /// Adds a fixed node immediately after `anchor` in control order.
    pub fn insert_after(
        &mut self,
        anchor: NodeId,
        kind: NodeKind,
        stamp: Stamp,
        inputs: &[NodeId],
    ) -> NodeId {
        assert!(kind.is_fixed(), "{} is a floating node kind", kind.mnemonic());
        assert!(
            self.nodes[anchor.0 as usize].is_fixed(),
            "anchor must be a fixed node"
        );
        let id = self.insert(kind, stamp, inputs);
        let old_next = self.nodes[anchor.0 as usize].next;
        self.nodes[anchor.0 as usize].next = Some(id);
        self.nodes[id.0 as usize].pred = Some(anchor);
        self.nodes[id.0 as usize].next = old_next;
        if let Some(next) = old_next {
            self.nodes[next.0 as usize].pred = Some(id);
        }
        id
    }

    fn insert(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for input in inputs {
            debug_assert!(self.nodes[input.0 as usize].alive, "input to {kind:?} is dead");
            self.uses[input.0 as usize].push(id);
        }
        self.nodes.push(Node {
            kind,
            stamp,
            inputs: SmallVec::from_slice(inputs),
            next: None,
            pred: None,
            alive: true,
        });
        self.uses.push(SmallVec::new());
        id
    }

    /// Replaces the input at `index` with `new_input`, moving the use edge
    /// from the old input to the new one in the same step.
    pub fn set_input(&mut self, node: NodeId, index: usize, new_input: NodeId) {
        assert!(self.nodes[node.0 as usize].alive, "mutating a dead node");
        assert!(self.nodes[new_input.0 as usize].alive, "new input is dead");
        let old = self.nodes[node.0 as usize].inputs[index];
        if old == new_input {
            return;
        }
        self.remove_use(old, node);
        self.uses[new_input.0 as usize].push(node);
        self.nodes[node.0 as usize].inputs[index] = new_input;
    }

    /// Rewrites every use of `old` to reference `new` instead. Both use
    /// lists and all forward edges are updated before returning.
    pub fn replace_all_uses(&mut self, old: NodeId, new: NodeId) {
        assert_ne!(old, new, "node cannot replace itself");
        let users = std::mem::take(&mut self.uses[old.0 as usize]);
        for user in &users {
            for input in self.nodes[user.0 as usize].inputs.iter_mut() {
                if *input == old {
                    *input = new;
                }
            }
        }
        // A user appears once per referencing input slot, so the moved
        // entries preserve the edge multiset.
        self.uses[new.0 as usize].extend(users);
    }

    /// Replaces a floating node with `replacement` and retires it.
    pub fn replace_floating(&mut self, old: NodeId, replacement: NodeId) {
        assert!(!self.nodes[old.0 as usize].is_fixed(), "use replace_fixed");
        self.replace_all_uses(old, replacement);
        self.kill(old);
    }

    /// Replaces a fixed node's value with `replacement`, splices it out of
    /// the control chain, and retires it.
    pub fn replace_fixed(&mut self, old: NodeId, replacement: NodeId) {
        assert!(self.nodes[old.0 as usize].is_fixed(), "use replace_floating");
        self.replace_all_uses(old, replacement);
        self.splice_out(old);
        self.kill(old);
    }

    /// Deletes a fixed node that produces no used value, keeping the
    /// control chain contiguous.
    pub fn delete_fixed(&mut self, node: NodeId) {
        assert!(self.nodes[node.0 as usize].is_fixed());
        assert!(
            self.uses[node.0 as usize].is_empty(),
            "deleting a fixed node that still has uses"
        );
        self.splice_out(node);
        self.kill(node);
    }

    fn splice_out(&mut self, node: NodeId) {
        let pred = self.nodes[node.0 as usize].pred;
        let next = self.nodes[node.0 as usize].next;
        if let Some(p) = pred {
            self.nodes[p.0 as usize].next = next;
        }
        if let Some(n) = next {
            self.nodes[n.0 as usize].pred = pred;
        }
        self.nodes[node.0 as usize].pred = None;
        self.nodes[node.0 as usize].next = None;
    }

    /// Retires a node with no remaining uses, dropping its input edges.
    pub fn kill(&mut self, node: NodeId) {
        assert!(
            self.uses[node.0 as usize].is_empty(),
            "killing a node that still has uses"
        );
        let inputs = std::mem::take(&mut self.nodes[node.0 as usize].inputs);
        for input in inputs {
            self.remove_use(input, node);
        }
        self.nodes[node.0 as usize].alive = false;
    }

    fn remove_use(&mut self, target: NodeId, user: NodeId) {
        let uses = &mut self.uses[target.0 as usize];
        let pos = uses
            .iter()
            .position(|u| *u == user)
            .expect("use-edge bookkeeping out of sync");
        uses.swap_remove(pos);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ValueKind;

    #[test]
    fn constants_are_uniqued() {
        let mut graph = Graph::new();
        let a = graph.unique_constant(ConstantValue::Int64(42));
        let b = graph.unique_constant(ConstantValue::Int64(42));
        let c = graph.unique_constant(ConstantValue::Int64(7));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn set_input_moves_the_use_edge() {
        let mut graph = Graph::new();
        let a = graph.unique_constant(ConstantValue::Bool(true));
        let b = graph.unique_constant(ConstantValue::Bool(false));
        let not = graph.add_floating(NodeKind::Not, Stamp::primitive(ValueKind::Bool), &[a]);

        assert_eq!(graph.uses(a), &[not]);
        graph.set_input(not, 0, b);
        assert!(graph.uses(a).is_empty());
        assert_eq!(graph.uses(b), &[not]);
        assert_eq!(graph.inputs(not), &[b]);
    }

    #[test]
    fn replace_all_uses_rewrites_every_slot() {
        let mut graph = Graph::new();
        let a = graph.unique_constant(ConstantValue::Int64(1));
        let b = graph.unique_constant(ConstantValue::Int64(2));
        // Two slots referencing the same input.
        let ret = graph.insert_after(
            graph.start(),
            NodeKind::StoreIndexed,
            Stamp::void(),
            &[a, a, a],
        );

        graph.replace_all_uses(a, b);
        assert_eq!(graph.inputs(ret), &[b, b, b]);
        assert!(graph.uses(a).is_empty());
        assert_eq!(graph.uses(b).len(), 3);
    }

    #[test]
    fn deleting_a_fixed_node_splices_control_flow() {
        let mut graph = Graph::new();
        let obj = graph.unique_constant(ConstantValue::Null);
        let first = graph.insert_after(
            graph.start(),
            NodeKind::RegisterFinalizer,
            Stamp::void(),
            &[obj],
        );
        let second = graph.insert_after(first, NodeKind::Return, Stamp::void(), &[]);

        graph.delete_fixed(first);
        assert_eq!(graph.node(graph.start()).next(), Some(second));
        assert_eq!(graph.node(second).pred(), Some(graph.start()));
        assert!(!graph.is_alive(first));
        assert!(graph.uses(obj).is_empty());
    }

    #[test]
    fn insert_after_links_both_directions() {
        let mut graph = Graph::new();
        let obj = graph.unique_constant(ConstantValue::Null);
        let tail = graph.insert_after(graph.start(), NodeKind::Return, Stamp::void(), &[]);
        let mid = graph.insert_after(
            graph.start(),
            NodeKind::NullCheck,
            Stamp::object_unknown().as_non_null(),
            &[obj],
        );
        // mid now sits between start and tail.
        assert_eq!(graph.node(graph.start()).next(), Some(mid));
        assert_eq!(graph.node(mid).next(), Some(tail));
        assert_eq!(graph.node(tail).pred(), Some(mid));
    }

    #[test]
    #[should_panic(expected = "still has uses")]
    fn kill_rejects_live_uses() {
        let mut graph = Graph::new();
        let a = graph.unique_constant(ConstantValue::Int64(1));
        let _not = graph.add_floating(NodeKind::Not, Stamp::primitive(ValueKind::Bool), &[a]);
        graph.kill(a);
    }
}
