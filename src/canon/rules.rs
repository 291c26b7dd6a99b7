// src/canon/rules.rs
//
// The per-kind canonicalization rules. Each rule reads the node and its
// inputs' stamps, never the schedule, so applying it at any point of any
// pass ordering yields the same result.

use crate::canon::{Canonical, CanonicalizerTool};
use crate::graph::{Graph, NodeId, NodeKind, Stamp};
use crate::meta::{Assumption, ConstantValue, TypeId, ValueKind};

/// Computes the canonical form of `node`, creating replacement nodes in the
/// graph as needed. Does not mutate edges of existing nodes; the driver
/// applies the returned decision.
pub fn canonical(graph: &mut Graph, tool: &mut dyn CanonicalizerTool, node: NodeId) -> Canonical {
    match graph.kind(node) {
        NodeKind::ArrayLength => canonical_array_length(graph, node),
        NodeKind::IsNull => canonical_is_null(graph, node),
        NodeKind::Not => canonical_not(graph, node),
        NodeKind::InstanceOf { target, negated } => {
            canonical_instance_of(graph, tool, node, target, negated)
        }
        NodeKind::RegisterFinalizer => canonical_register_finalizer(graph, tool, node),
        _ => Canonical::Unchanged,
    }
}

fn bool_constant(graph: &mut Graph, value: bool) -> NodeId {
    graph.unique_constant(ConstantValue::Bool(value))
}

/// The length of a fresh, size-known allocation is that size expression.
fn canonical_array_length(graph: &mut Graph, node: NodeId) -> Canonical {
    let array = graph.inputs(node)[0];
    if let NodeKind::NewArray(_) = graph.kind(array) {
        return Canonical::Replace(graph.inputs(array)[0]);
    }
    Canonical::Unchanged
}

fn canonical_is_null(graph: &mut Graph, node: NodeId) -> Canonical {
    let object = graph.inputs(node)[0];
    if graph.stamp(object).is_non_null() {
        return Canonical::Replace(bool_constant(graph, false));
    }
    if let NodeKind::Constant(value) = graph.kind(object)
        && value.is_null()
    {
        return Canonical::Replace(bool_constant(graph, true));
    }
    Canonical::Unchanged
}

fn canonical_not(graph: &mut Graph, node: NodeId) -> Canonical {
    let input = graph.inputs(node)[0];
    match graph.kind(input) {
        NodeKind::Constant(value) => match value.as_bool() {
            Some(b) => Canonical::Replace(bool_constant(graph, !b)),
            None => Canonical::Unchanged,
        },
        NodeKind::Not => Canonical::Replace(graph.inputs(input)[0]),
        _ => Canonical::Unchanged,
    }
}

/// How the operand's static type relates to the checked type.
enum TypeRelation {
    /// Every non-null value passes the check.
    AlwaysWhenNonNull,
    /// No value passes the check.
    Never,
    /// Undecidable from the static types alone.
    Unknown,
}

fn canonical_instance_of(
    graph: &mut Graph,
    tool: &mut dyn CanonicalizerTool,
    node: NodeId,
    target: TypeId,
    negated: bool,
) -> Canonical {
    let object = graph.inputs(node)[0];
    let stamp = graph.stamp(object);
    debug_assert!(stamp.is_object(), "type check on non-object value");

    // null is an instance of nothing.
    if let NodeKind::Constant(value) = graph.kind(object)
        && value.is_null()
    {
        return Canonical::Replace(bool_constant(graph, negated));
    }

    // Gather facts from the host tables first; the assumption log borrows
    // the tool mutably below.
    let (relation, narrowed) = {
        let universe = tool.universe();
        let relation = match stamp.object_type() {
            Some(ty) if stamp.is_exact() || universe.is_leaf(ty) => {
                if universe.is_subtype_of(ty, target) {
                    TypeRelation::AlwaysWhenNonNull
                } else {
                    TypeRelation::Never
                }
            }
            Some(ty) if universe.is_subtype_of(ty, target) => TypeRelation::AlwaysWhenNonNull,
            Some(ty) if universe.disjoint(ty, target) => TypeRelation::Never,
            _ => TypeRelation::Unknown,
        };
        let narrowed = universe
            .unique_concrete_subtype(target)
            .filter(|u| *u != target);
        (relation, narrowed)
    };

    match relation {
        TypeRelation::Never => Canonical::Replace(bool_constant(graph, negated)),
        TypeRelation::AlwaysWhenNonNull => {
            if stamp.is_non_null() {
                return Canonical::Replace(bool_constant(graph, !negated));
            }
            // The check degenerates to a null test.
            let is_null = graph.add_is_null(object);
            if negated {
                Canonical::Replace(is_null)
            } else {
                Canonical::Replace(graph.add_floating(
                    NodeKind::Not,
                    Stamp::primitive(ValueKind::Bool),
                    &[is_null],
                ))
            }
        }
        TypeRelation::Unknown => {
            if let Some(subtype) = narrowed
                && tool.allow_assumptions()
            {
                tool.assumptions().record(Assumption::ConcreteSubtype {
                    context: target,
                    subtype,
                });
                let replacement = graph.add_floating(
                    NodeKind::InstanceOf {
                        target: subtype,
                        negated,
                    },
                    Stamp::primitive(ValueKind::Bool),
                    &[object],
                );
                return Canonical::Replace(replacement);
            }
            Canonical::Unchanged
        }
    }
}

/// Finalizer registration is a no-op when the object's type is known to
/// have no finalizer, directly or via a recorded no-finalizable-subclass
/// assumption.
fn canonical_register_finalizer(
    graph: &mut Graph,
    tool: &mut dyn CanonicalizerTool,
    node: NodeId,
) -> Canonical {
    let object = graph.inputs(node)[0];
    let stamp = graph.stamp(object);
    let Some(ty) = stamp.object_type() else {
        return Canonical::Unchanged;
    };

    let (exact_without_finalizer, assumable) = {
        let universe = tool.universe();
        let exact = (stamp.is_exact() || universe.is_leaf(ty)) && !universe.has_finalizer(ty);
        let assumable = !universe.has_finalizable_subclass(ty);
        (exact, assumable)
    };

    if exact_without_finalizer {
        return Canonical::Delete;
    }
    if assumable && tool.allow_assumptions() {
        tool.assumptions()
            .record(Assumption::NoFinalizableSubclass { receiver_type: ty });
        return Canonical::Delete;
    }
    Canonical::Unchanged
}
