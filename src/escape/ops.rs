// src/escape/ops.rs
//
// The escape strategies for the two allocation kinds. Both are stateless;
// all rewrite state travels in the ScalarState passed by the driver.

use crate::escape::{
    EscapeField, EscapeOp, MAX_VIRTUALIZED_ARRAY_LENGTH, ScalarState, UseDecision, constant_index,
};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::meta::{ConstantValue, Universe};

/// Selects the strategy for an allocation node kind.
pub fn escape_op(kind: NodeKind) -> Option<&'static dyn EscapeOp> {
    match kind {
        NodeKind::NewArray(_) => Some(&NewArrayEscape),
        NodeKind::NewInstance(_) => Some(&InstanceEscape),
        _ => None,
    }
}

/// Constant length of an array allocation, when eligible.
fn array_length(graph: &Graph, alloc: NodeId) -> Option<i64> {
    let length = graph.inputs(alloc)[0];
    if let NodeKind::Constant(value) = graph.kind(length) {
        return value.as_i64();
    }
    None
}

pub struct NewArrayEscape;

impl EscapeOp for NewArrayEscape {
    fn can_analyze(&self, graph: &Graph, _universe: &Universe, alloc: NodeId) -> bool {
        match array_length(graph, alloc) {
            Some(len) => (0..=MAX_VIRTUALIZED_ARRAY_LENGTH).contains(&len),
            None => false,
        }
    }

    fn escape(
        &self,
        graph: &Graph,
        _universe: &Universe,
        alloc: NodeId,
        usage: NodeId,
    ) -> UseDecision {
        let len = array_length(graph, alloc).expect("can_analyze checked the length");
        match graph.kind(usage) {
            NodeKind::ArrayLength => UseDecision::NoEscape,
            NodeKind::LoadIndexed => {
                let access = graph.as_indexed_access(usage).expect("kind matched");
                if access.array == alloc && constant_index(graph, access.index, len).is_some() {
                    UseDecision::NoEscape
                } else {
                    UseDecision::Escapes
                }
            }
            NodeKind::StoreIndexed => {
                let access = graph.as_indexed_access(usage).expect("kind matched");
                // A store of the array into itself (or into another array)
                // publishes its identity.
                if access.array == alloc
                    && access.value != Some(alloc)
                    && constant_index(graph, access.index, len).is_some()
                {
                    UseDecision::NoEscape
                } else {
                    UseDecision::Escapes
                }
            }
            _ => UseDecision::Escapes,
        }
    }

    fn fields(&self, graph: &Graph, universe: &Universe, alloc: NodeId) -> Vec<EscapeField> {
        let NodeKind::NewArray(array_type) = graph.kind(alloc) else {
            unreachable!("strategy selected for NewArray");
        };
        let element = universe
            .element_type(array_type)
            .expect("array type has an element type");
        let kind = universe.value_kind(element);
        let len = array_length(graph, alloc).expect("can_analyze checked the length");
        (0..len as u32)
            .map(|index| EscapeField {
                index,
                kind,
                name: format!("[{index}]"),
            })
            .collect()
    }

    fn before_update(
        &self,
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
        state: &mut ScalarState,
    ) {
        // Array elements start zeroed.
        for field in self.fields(graph, universe, alloc) {
            let zero = graph.unique_constant(ConstantValue::default_for(field.kind));
            state.slots.push(zero);
        }
    }

    fn update_state(
        &self,
        graph: &mut Graph,
        _universe: &Universe,
        alloc: NodeId,
        usage: NodeId,
        state: &mut ScalarState,
    ) {
        let len = state.slots.len() as i64;
        match graph.kind(usage) {
            NodeKind::ArrayLength => {
                let length = graph.inputs(alloc)[0];
                graph.replace_fixed(usage, length);
            }
            NodeKind::LoadIndexed => {
                let access = graph.as_indexed_access(usage).expect("kind matched");
                let slot = constant_index(graph, access.index, len).expect("escape() vetted");
                graph.replace_fixed(usage, state.slots[slot as usize]);
            }
            NodeKind::StoreIndexed => {
                let access = graph.as_indexed_access(usage).expect("kind matched");
                let slot = constant_index(graph, access.index, len).expect("escape() vetted");
                state.slots[slot as usize] = access.value.expect("stores carry a value");
                graph.delete_fixed(usage);
            }
            other => unreachable!("unexpected virtualized use {}", other.mnemonic()),
        }
    }
}

pub struct InstanceEscape;

impl InstanceEscape {
    /// Slot index of `field` within the allocation's type, or `None` for a
    /// field of some other type.
    fn slot_of(
        graph: &Graph,
        universe: &Universe,
        alloc: NodeId,
        field: crate::meta::FieldId,
    ) -> Option<u32> {
        let NodeKind::NewInstance(ty) = graph.kind(alloc) else {
            return None;
        };
        if universe.fields_of(ty).contains(&field) {
            Some(universe.field(field).index)
        } else {
            None
        }
    }
}

impl EscapeOp for InstanceEscape {
    fn can_analyze(&self, graph: &Graph, universe: &Universe, alloc: NodeId) -> bool {
        let NodeKind::NewInstance(ty) = graph.kind(alloc) else {
            return false;
        };
        universe.is_resolved(ty) && universe.is_initialized(ty)
    }

    fn escape(
        &self,
        graph: &Graph,
        universe: &Universe,
        alloc: NodeId,
        usage: NodeId,
    ) -> UseDecision {
        match graph.kind(usage) {
            NodeKind::LoadField(field) => {
                let access = graph.as_field_access(usage).expect("kind matched");
                if access.object == alloc
                    && Self::slot_of(graph, universe, alloc, field).is_some()
                {
                    UseDecision::NoEscape
                } else {
                    UseDecision::Escapes
                }
            }
            NodeKind::StoreField(field) => {
                let access = graph.as_field_access(usage).expect("kind matched");
                // Storing the allocation itself anywhere publishes it, as
                // does a store into another object.
                if access.object == alloc
                    && access.value != Some(alloc)
                    && Self::slot_of(graph, universe, alloc, field).is_some()
                {
                    UseDecision::NoEscape
                } else {
                    UseDecision::Escapes
                }
            }
            NodeKind::RegisterFinalizer => {
                if graph.inputs(usage)[0] == alloc {
                    UseDecision::Removable
                } else {
                    UseDecision::Escapes
                }
            }
            _ => UseDecision::Escapes,
        }
    }

    fn fields(&self, graph: &Graph, universe: &Universe, alloc: NodeId) -> Vec<EscapeField> {
        let NodeKind::NewInstance(ty) = graph.kind(alloc) else {
            unreachable!("strategy selected for NewInstance");
        };
        universe
            .fields_of(ty)
            .iter()
            .map(|f| {
                let def = universe.field(*f);
                EscapeField {
                    index: def.index,
                    kind: def.kind,
                    name: def.name.clone(),
                }
            })
            .collect()
    }

    fn before_update(
        &self,
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
        state: &mut ScalarState,
    ) {
        // Fields start at their kind's default value.
        for field in self.fields(graph, universe, alloc) {
            let default = graph.unique_constant(ConstantValue::default_for(field.kind));
            state.slots.push(default);
        }
    }

    fn update_state(
        &self,
        graph: &mut Graph,
        universe: &Universe,
        alloc: NodeId,
        usage: NodeId,
        state: &mut ScalarState,
    ) {
        match graph.kind(usage) {
            NodeKind::LoadField(field) => {
                let slot = Self::slot_of(graph, universe, alloc, field).expect("escape() vetted");
                graph.replace_fixed(usage, state.slots[slot as usize]);
            }
            NodeKind::StoreField(field) => {
                let slot = Self::slot_of(graph, universe, alloc, field).expect("escape() vetted");
                let access = graph.as_field_access(usage).expect("kind matched");
                state.slots[slot as usize] = access.value.expect("stores carry a value");
                graph.delete_fixed(usage);
            }
            NodeKind::RegisterFinalizer => {
                graph.delete_fixed(usage);
            }
            other => unreachable!("unexpected virtualized use {}", other.mnemonic()),
        }
    }
}
