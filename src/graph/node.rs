// src/graph/node.rs
//
// Node payloads. Behavior (canonicalization, escape analysis) is dispatched
// over `NodeKind` by operator tables in the respective passes; nodes carry
// only their kind, stamp, and edges.

use smallvec::SmallVec;

use crate::graph::NodeId;
use crate::graph::stamp::Stamp;
use crate::meta::{ConstantValue, FieldId, MethodId, TypeId};

/// The operation a node performs, with its static operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Entry anchor of the fixed-node chain.
    Start,
    /// Method exit; inputs: `[value]` or empty for void.
    Return,
    /// Uniqued compile-time constant.
    Constant(ConstantValue),
    /// Incoming argument by position.
    Parameter(u16),
    /// Boolean negation; inputs: `[condition]`.
    Not,
    /// Null test; inputs: `[object]`.
    IsNull,
    /// Null-check guard producing the proven-non-null object; inputs:
    /// `[object]`.
    NullCheck,
    /// Dynamic type test against `target`; `negated` flips the sense.
    /// Inputs: `[object]`.
    InstanceOf { target: TypeId, negated: bool },
    /// Inputs: `[object]`.
    LoadField(FieldId),
    /// Inputs: `[object, value]`.
    StoreField(FieldId),
    /// Inputs: `[array, index]`.
    LoadIndexed,
    /// Inputs: `[array, index, value]`.
    StoreIndexed,
    /// Inputs: `[array]`.
    ArrayLength,
    /// Fresh instance allocation of an initialized type.
    NewInstance(TypeId),
    /// Fresh array allocation; the operand is the array type. Inputs:
    /// `[length]`.
    NewArray(TypeId),
    /// Enqueues the object for finalization at collection time; inputs:
    /// `[object]`.
    RegisterFinalizer,
    /// Unintrinsified call; inputs are the arguments, receiver first for
    /// instance methods.
    Invoke(MethodId),
}

impl NodeKind {
    /// Fixed nodes occupy a position in control order; floating nodes are
    /// scheduled by data dependence alone.
    pub fn is_fixed(&self) -> bool {
        match self {
            NodeKind::Start
            | NodeKind::Return
            | NodeKind::NullCheck
            | NodeKind::LoadField(_)
            | NodeKind::StoreField(_)
            | NodeKind::LoadIndexed
            | NodeKind::StoreIndexed
            | NodeKind::ArrayLength
            | NodeKind::NewInstance(_)
            | NodeKind::NewArray(_)
            | NodeKind::RegisterFinalizer
            | NodeKind::Invoke(_) => true,
            NodeKind::Constant(_)
            | NodeKind::Parameter(_)
            | NodeKind::Not
            | NodeKind::IsNull
            | NodeKind::InstanceOf { .. } => false,
        }
    }

    /// Short operation name for logging.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::Return => "Return",
            NodeKind::Constant(_) => "Constant",
            NodeKind::Parameter(_) => "Parameter",
            NodeKind::Not => "Not",
            NodeKind::IsNull => "IsNull",
            NodeKind::NullCheck => "NullCheck",
            NodeKind::InstanceOf { .. } => "InstanceOf",
            NodeKind::LoadField(_) => "LoadField",
            NodeKind::StoreField(_) => "StoreField",
            NodeKind::LoadIndexed => "LoadIndexed",
            NodeKind::StoreIndexed => "StoreIndexed",
            NodeKind::ArrayLength => "ArrayLength",
            NodeKind::NewInstance(_) => "NewInstance",
            NodeKind::NewArray(_) => "NewArray",
            NodeKind::RegisterFinalizer => "RegisterFinalizer",
            NodeKind::Invoke(_) => "Invoke",
        }
    }
}

/// One graph vertex. Edges are mutated only through [`crate::graph::Graph`]
/// so forward inputs and reverse use lists stay reciprocal.
#[derive(Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) stamp: Stamp,
    pub(crate) inputs: SmallVec<[NodeId; 2]>,
    pub(crate) next: Option<NodeId>,
    pub(crate) pred: Option<NodeId>,
    pub(crate) alive: bool,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Control successor; `None` for floating nodes and chain tails.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Control predecessor.
    pub fn pred(&self) -> Option<NodeId> {
        self.pred
    }

    pub fn is_fixed(&self) -> bool {
        self.kind.is_fixed()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
