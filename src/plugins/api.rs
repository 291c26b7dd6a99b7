// src/plugins/api.rs
//
// The invocation-plugin contract. A plugin implements the fixed-arity
// `apply0..apply7` overloads it supports (receiver counted separately), or
// `apply_polymorphic` for signature-polymorphic methods; `execute` selects
// the overload from the call site's argument count. An arity the plugin
// does not implement falls through to the default handler, which raises a
// descriptive configuration fault rather than miscompiling.

use std::sync::Arc;

use crate::errors::{RegistrationError, RegistrationResult};
use crate::graph::NodeId;
use crate::meta::{MethodId, Universe};
use crate::plugins::context::GraphBuilderContext;

/// Shared handle to a registered plugin.
pub type PluginRef = Arc<dyn InvocationPlugin>;

/// The method a plugin is being applied to, with the fields plugins and
/// diagnostics need.
#[derive(Debug, Clone, Copy)]
pub struct TargetMethod<'a> {
    pub id: MethodId,
    pub declaring: &'a str,
    pub name: &'a str,
    pub is_static: bool,
    pub signature_polymorphic: bool,
}

impl<'a> TargetMethod<'a> {
    pub fn of(universe: &'a Universe, id: MethodId) -> Self {
        let def = universe.method(id);
        Self {
            id,
            declaring: universe.name(def.holder),
            name: &def.name,
            is_static: def.is_static,
            signature_polymorphic: def.signature_polymorphic,
        }
    }

    pub fn display(&self) -> String {
        format!("{}.{}", self.declaring, self.name)
    }
}

/// Access to the receiver of a non-static call.
///
/// `get` null-checks the receiver (once, caching the guarded value and
/// writing it back into the argument slot); `raw` returns it unchecked for
/// plugins that only inspect it.
pub struct Receiver<'a> {
    args: &'a mut [NodeId],
    checked: Option<NodeId>,
}

impl<'a> Receiver<'a> {
    pub(crate) fn new(args: &'a mut [NodeId]) -> Self {
        assert!(!args.is_empty(), "receiver of a static method");
        Self {
            args,
            checked: None,
        }
    }

    /// The receiver, proven non-null.
    pub fn get(&mut self, b: &mut dyn GraphBuilderContext) -> NodeId {
        if let Some(checked) = self.checked {
            return checked;
        }
        let checked = b.null_checked_value(self.args[0]);
        self.args[0] = checked;
        self.checked = Some(checked);
        checked
    }

    /// The receiver without a null check.
    pub fn raw(&self) -> NodeId {
        self.args[0]
    }
}

/// A call-site intrinsification.
///
/// Implementations override the `applyN` overloads for the arities they
/// were registered with; every overload defaults to the
/// [`default_handler`] fault. One plugin instance serves every call site of
/// its method, so implementations hold no per-call state.
///
/// [`default_handler`]: InvocationPlugin::default_handler
#[allow(unused_variables)]
pub trait InvocationPlugin: Send + Sync {
    /// Whether this plugin only makes sense expanded into a caller and must
    /// never be treated as a standalone compilation root.
    fn inline_only(&self) -> bool {
        false
    }

    fn apply0(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 0)
    }

    fn apply1(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 1)
    }

    fn apply2(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 2)
    }

    fn apply3(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
        arg2: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 3)
    }

    fn apply4(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
        arg2: NodeId,
        arg3: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 4)
    }

    fn apply5(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
        arg2: NodeId,
        arg3: NodeId,
        arg4: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 5)
    }

    fn apply6(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
        arg2: NodeId,
        arg3: NodeId,
        arg4: NodeId,
        arg5: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 6)
    }

    fn apply7(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        arg0: NodeId,
        arg1: NodeId,
        arg2: NodeId,
        arg3: NodeId,
        arg4: NodeId,
        arg5: NodeId,
        arg6: NodeId,
    ) -> RegistrationResult<bool> {
        self.default_handler(target, 7)
    }

    /// Variable-arity entry point for signature-polymorphic methods.
    fn apply_polymorphic(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        args: &[NodeId],
    ) -> RegistrationResult<bool> {
        self.default_handler(target, args.len())
    }

    /// Raised when a call site presents an arity the plugin does not
    /// implement. A configuration error, not a recoverable condition.
    fn default_handler(
        &self,
        target: &TargetMethod<'_>,
        argc: usize,
    ) -> RegistrationResult<bool> {
        Err(RegistrationError::unsupported_arity(target.display(), argc))
    }

    /// Applies the plugin to a call site. `args` are the call's arguments,
    /// receiver first for non-static methods; a null-checked receiver is
    /// written back into `args[0]`. Returns whether the call was replaced.
    fn execute(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        args: &mut [NodeId],
    ) -> RegistrationResult<bool> {
        if target.is_static {
            if target.signature_polymorphic {
                return self.apply_polymorphic(b, target, None, args);
            }
            return match args.len() {
                0 => self.apply0(b, target, None),
                1 => self.apply1(b, target, None, args[0]),
                2 => self.apply2(b, target, None, args[0], args[1]),
                3 => self.apply3(b, target, None, args[0], args[1], args[2]),
                4 => self.apply4(b, target, None, args[0], args[1], args[2], args[3]),
                5 => self.apply5(b, target, None, args[0], args[1], args[2], args[3], args[4]),
                6 => self.apply6(
                    b, target, None, args[0], args[1], args[2], args[3], args[4], args[5],
                ),
                7 => self.apply7(
                    b, target, None, args[0], args[1], args[2], args[3], args[4], args[5], args[6],
                ),
                n => self.default_handler(target, n),
            };
        }

        assert!(!args.is_empty(), "instance call site without a receiver");
        let (recv, rest) = args.split_at_mut(1);
        let mut receiver = Receiver::new(recv);
        if target.signature_polymorphic {
            return self.apply_polymorphic(b, target, Some(&mut receiver), rest);
        }
        match rest.len() {
            0 => self.apply0(b, target, Some(&mut receiver)),
            1 => self.apply1(b, target, Some(&mut receiver), rest[0]),
            2 => self.apply2(b, target, Some(&mut receiver), rest[0], rest[1]),
            3 => self.apply3(b, target, Some(&mut receiver), rest[0], rest[1], rest[2]),
            4 => self.apply4(
                b,
                target,
                Some(&mut receiver),
                rest[0],
                rest[1],
                rest[2],
                rest[3],
            ),
            5 => self.apply5(
                b,
                target,
                Some(&mut receiver),
                rest[0],
                rest[1],
                rest[2],
                rest[3],
                rest[4],
            ),
            6 => self.apply6(
                b,
                target,
                Some(&mut receiver),
                rest[0],
                rest[1],
                rest[2],
                rest[3],
                rest[4],
                rest[5],
            ),
            7 => self.apply7(
                b,
                target,
                Some(&mut receiver),
                rest[0],
                rest[1],
                rest[2],
                rest[3],
                rest[4],
                rest[5],
                rest[6],
            ),
            n => self.default_handler(target, n),
        }
    }
}

impl std::fmt::Debug for dyn InvocationPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationPlugin")
            .field("inline_only", &self.inline_only())
            .finish_non_exhaustive()
    }
}

impl PartialEq for dyn InvocationPlugin {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self as *const _ as *const (), other as *const _ as *const ())
    }
}
