// src/plugins/context.rs
//
// The surface a plugin sees of the graph-building front end. The bytecode
// parser implements this for real compilations; GraphKit implements it for
// hand-assembled fragments and tests.

use crate::errors::RegistrationResult;
use crate::graph::{Graph, NodeId, NodeKind, Stamp};
use crate::meta::{Assumptions, ConstantValue, MethodId, Universe};

/// Graph-construction services available to an executing plugin.
pub trait GraphBuilderContext {
    fn universe(&self) -> &Universe;
    fn graph(&self) -> &Graph;
    fn graph_mut(&mut self) -> &mut Graph;
    fn assumptions_mut(&mut self) -> &mut Assumptions;

    /// Adds a floating node.
    fn add_floating(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId;

    /// Appends a fixed node at the current insertion point and advances it.
    fn append_fixed(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId;

    /// Pushes the value the intrinsified call produces.
    fn push_result(&mut self, value: NodeId);

    /// A non-null-proven view of `value`, inserting a guard if its stamp
    /// does not already prove it.
    fn null_checked_value(&mut self, value: NodeId) -> NodeId;

    /// Inline-parses the body of `method` in place of the current call,
    /// with `args` bound to its parameters.
    fn parse_inline(&mut self, method: MethodId, args: &[NodeId]) -> RegistrationResult<()>;
}

/// A minimal building context over a fresh graph.
///
/// Used for assembling standalone fragments and for exercising plugins
/// outside a full parse. It keeps an insertion cursor on the fixed chain
/// and records inline-parse requests instead of parsing (only the bytecode
/// front end can parse).
pub struct GraphKit<'a> {
    universe: &'a Universe,
    graph: Graph,
    assumptions: Assumptions,
    cursor: NodeId,
    results: Vec<NodeId>,
    inline_requests: Vec<(MethodId, Vec<NodeId>)>,
}

impl<'a> GraphKit<'a> {
    pub fn new(universe: &'a Universe) -> Self {
        let graph = Graph::new();
        let cursor = graph.start();
        Self {
            universe,
            graph,
            assumptions: Assumptions::new(),
            cursor,
            results: Vec::new(),
            inline_requests: Vec::new(),
        }
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Values pushed by executed plugins, in order.
    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    /// Inline-parse requests recorded by substitution plugins.
    pub fn inline_requests(&self) -> &[(MethodId, Vec<NodeId>)] {
        &self.inline_requests
    }

    pub fn constant(&mut self, value: ConstantValue) -> NodeId {
        self.graph.unique_constant(value)
    }

    pub fn into_graph(self) -> (Graph, Assumptions) {
        (self.graph, self.assumptions)
    }
}

impl GraphBuilderContext for GraphKit<'_> {
    fn universe(&self) -> &Universe {
        self.universe
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }

    fn add_floating(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        self.graph.add_floating(kind, stamp, inputs)
    }

    fn append_fixed(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        let id = self.graph.insert_after(self.cursor, kind, stamp, inputs);
        self.cursor = id;
        id
    }

    fn push_result(&mut self, value: NodeId) {
        self.results.push(value);
    }

    fn null_checked_value(&mut self, value: NodeId) -> NodeId {
        if self.graph.stamp(value).is_non_null() {
            return value;
        }
        let id = self.graph.add_null_check(self.cursor, value);
        self.cursor = id;
        id
    }

    fn parse_inline(&mut self, method: MethodId, args: &[NodeId]) -> RegistrationResult<()> {
        tracing::trace!(
            method = %self.universe.method_display(method),
            args = args.len(),
            "inline parse requested"
        );
        self.inline_requests.push((method, args.to_vec()));
        Ok(())
    }
}
