// src/graph/access.rs
//
// Constructors and typed views for the access node family: field and array
// accesses, type checks, allocations, and finalizer registration. Graphs
// are only built against resolved program elements, so constructing an
// access against an unresolved or uninitialized holder is a programming
// error and fails fast.

use crate::graph::node::NodeKind;
use crate::graph::stamp::Stamp;
use crate::graph::{Graph, NodeId};
use crate::meta::{FieldId, TypeId, TypeKind, Universe, ValueKind};

/// Decomposed field access: `LoadField` has no value, `StoreField` does.
#[derive(Debug, Clone, Copy)]
pub struct FieldAccessView {
    pub object: NodeId,
    pub field: FieldId,
    pub value: Option<NodeId>,
}

/// Decomposed array element access.
#[derive(Debug, Clone, Copy)]
pub struct IndexedAccessView {
    pub array: NodeId,
    pub index: NodeId,
    pub value: Option<NodeId>,
}

fn result_stamp(kind: ValueKind) -> Stamp {
    match kind {
        ValueKind::Object => Stamp::object_unknown(),
        ValueKind::Void => Stamp::void(),
        kind => Stamp::primitive(kind),
    }
}

impl Graph {
    fn assert_holder_usable(&self, universe: &Universe, holder: TypeId, what: &str) {
        assert!(
            universe.is_resolved(holder),
            "{what} against unresolved type {}",
            universe.name(holder)
        );
        assert!(
            universe.is_initialized(holder),
            "{what} against uninitialized type {}",
            universe.name(holder)
        );
    }

    pub fn add_load_field(
        &mut self,
        universe: &Universe,
        anchor: NodeId,
        object: NodeId,
        field: FieldId,
    ) -> NodeId {
        let def = universe.field(field);
        self.assert_holder_usable(universe, def.holder, "field access");
        let stamp = result_stamp(def.kind);
        self.insert_after(anchor, NodeKind::LoadField(field), stamp, &[object])
    }

    pub fn add_store_field(
        &mut self,
        universe: &Universe,
        anchor: NodeId,
        object: NodeId,
        field: FieldId,
        value: NodeId,
    ) -> NodeId {
        let def = universe.field(field);
        self.assert_holder_usable(universe, def.holder, "field access");
        self.insert_after(anchor, NodeKind::StoreField(field), Stamp::void(), &[object, value])
    }

    pub fn add_load_indexed(
        &mut self,
        anchor: NodeId,
        array: NodeId,
        index: NodeId,
        element_kind: ValueKind,
    ) -> NodeId {
        let stamp = result_stamp(element_kind);
        self.insert_after(anchor, NodeKind::LoadIndexed, stamp, &[array, index])
    }

    pub fn add_store_indexed(
        &mut self,
        anchor: NodeId,
        array: NodeId,
        index: NodeId,
        value: NodeId,
    ) -> NodeId {
        self.insert_after(
            anchor,
            NodeKind::StoreIndexed,
            Stamp::void(),
            &[array, index, value],
        )
    }

    pub fn add_array_length(&mut self, anchor: NodeId, array: NodeId) -> NodeId {
        self.insert_after(
            anchor,
            NodeKind::ArrayLength,
            Stamp::primitive(ValueKind::Int32),
            &[array],
        )
    }

    pub fn add_new_instance(
        &mut self,
        universe: &Universe,
        anchor: NodeId,
        ty: TypeId,
    ) -> NodeId {
        self.assert_holder_usable(universe, ty, "allocation");
        assert!(
            matches!(universe.kind(ty), TypeKind::Instance),
            "NewInstance of non-instance type {}",
            universe.name(ty)
        );
        let stamp = Stamp::object(ty).as_exact().as_non_null();
        self.insert_after(anchor, NodeKind::NewInstance(ty), stamp, &[])
    }

    pub fn add_new_array(
        &mut self,
        universe: &Universe,
        anchor: NodeId,
        array_type: TypeId,
        length: NodeId,
    ) -> NodeId {
        assert!(
            matches!(universe.kind(array_type), TypeKind::Array),
            "NewArray of non-array type {}",
            universe.name(array_type)
        );
        let stamp = Stamp::object(array_type).as_exact().as_non_null();
        self.insert_after(anchor, NodeKind::NewArray(array_type), stamp, &[length])
    }

    pub fn add_register_finalizer(&mut self, anchor: NodeId, object: NodeId) -> NodeId {
        self.insert_after(anchor, NodeKind::RegisterFinalizer, Stamp::void(), &[object])
    }

    pub fn add_instance_of(
        &mut self,
        universe: &Universe,
        object: NodeId,
        target: TypeId,
        negated: bool,
    ) -> NodeId {
        assert!(
            universe.is_resolved(target),
            "type check against unresolved type {}",
            universe.name(target)
        );
        self.add_floating(
            NodeKind::InstanceOf { target, negated },
            Stamp::primitive(ValueKind::Bool),
            &[object],
        )
    }

    pub fn add_is_null(&mut self, object: NodeId) -> NodeId {
        self.add_floating(NodeKind::IsNull, Stamp::primitive(ValueKind::Bool), &[object])
    }

    /// Guard that proves `object` non-null; its result replaces the raw
    /// object in dominated uses. The guard keeps the input's type and
    /// exactness, adding only non-nullness.
    pub fn add_null_check(&mut self, anchor: NodeId, object: NodeId) -> NodeId {
        let incoming = self.stamp(object);
        assert!(incoming.is_object(), "null check of a non-object value");
        self.insert_after(anchor, NodeKind::NullCheck, incoming.as_non_null(), &[object])
    }

    /// Swaps the length operand of a `NewArray`, moving the use edge with
    /// it.
    pub fn set_length(&mut self, alloc: NodeId, length: NodeId) {
        assert!(
            matches!(self.kind(alloc), NodeKind::NewArray(_)),
            "set_length on {}",
            self.kind(alloc).mnemonic()
        );
        self.set_input(alloc, 0, length);
    }

    pub fn as_field_access(&self, id: NodeId) -> Option<FieldAccessView> {
        match self.kind(id) {
            NodeKind::LoadField(field) => Some(FieldAccessView {
                object: self.inputs(id)[0],
                field,
                value: None,
            }),
            NodeKind::StoreField(field) => Some(FieldAccessView {
                object: self.inputs(id)[0],
                field,
                value: Some(self.inputs(id)[1]),
            }),
            _ => None,
        }
    }

    pub fn as_indexed_access(&self, id: NodeId) -> Option<IndexedAccessView> {
        match self.kind(id) {
            NodeKind::LoadIndexed => Some(IndexedAccessView {
                array: self.inputs(id)[0],
                index: self.inputs(id)[1],
                value: None,
            }),
            NodeKind::StoreIndexed => Some(IndexedAccessView {
                array: self.inputs(id)[0],
                index: self.inputs(id)[1],
                value: Some(self.inputs(id)[2]),
            }),
            _ => None,
        }
    }
}
