// src/plugins/substitution.rs
//
// Method substitution: instead of emitting nodes itself, the plugin asks
// the front end to inline-parse the body of a designated substitute
// routine at the call site. Substitutes are static methods whose positional
// parameters mirror the original call, receiver included.

use std::sync::OnceLock;

use crate::errors::{RegistrationError, RegistrationResult};
use crate::graph::NodeId;
use crate::meta::{MethodId, Universe};
use crate::plugins::api::{InvocationPlugin, TargetMethod};
use crate::plugins::context::GraphBuilderContext;
use crate::plugins::registry::TypeRef;

/// An [`InvocationPlugin`] whose `execute` expands the call into the
/// parsed body of a substitute routine. Inline-only: the substitution
/// contract makes no sense for a standalone compilation root.
pub struct MethodSubstitutionPlugin {
    /// Declaring type of the substituted method; also the type a receiver
    /// slot resolves to.
    declaring: TypeRef,
    substitute_type: TypeRef,
    original_name: &'static str,
    substitute_name: &'static str,
    /// Original registration parameters, receiver sentinel included.
    params: Vec<TypeRef>,
    resolved: OnceLock<MethodId>,
}

impl MethodSubstitutionPlugin {
    pub fn new(
        declaring: TypeRef,
        substitute_type: TypeRef,
        original_name: &'static str,
        substitute_name: &'static str,
        params: &[TypeRef],
    ) -> Self {
        Self {
            declaring,
            substitute_type,
            original_name,
            substitute_name,
            params: params.to_vec(),
            resolved: OnceLock::new(),
        }
    }

    fn original_display(&self) -> String {
        format!("{}.{}", self.declaring.describe(), self.original_name)
    }

    fn substitute_display(&self) -> String {
        format!("{}.{}", self.substitute_type.describe(), self.substitute_name)
    }

    fn malformed(&self, reason: &'static str) -> RegistrationError {
        RegistrationError::malformed_substitute(
            self.original_display(),
            self.substitute_display(),
            reason,
        )
    }

    /// The substitute's method handle, resolved on first use and cached.
    pub fn substitute(&self, universe: &Universe) -> RegistrationResult<MethodId> {
        if let Some(cached) = self.resolved.get() {
            return Ok(*cached);
        }
        let substitute_type = self
            .substitute_type
            .resolve(universe)
            .ok_or_else(|| self.malformed("substitute declaring type does not resolve"))?;

        // Positional parameters: the receiver slot takes the original
        // declaring type, everything else resolves as registered.
        let mut positional = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let resolved = match param {
                TypeRef::Receiver => self
                    .declaring
                    .resolve(universe)
                    .ok_or_else(|| self.malformed("receiver type does not resolve"))?,
                other => other
                    .resolve(universe)
                    .ok_or_else(|| self.malformed("unresolved parameter type"))?,
            };
            positional.push(resolved);
        }

        let Some(method) =
            universe.find_method(substitute_type, self.substitute_name, true, &positional)
        else {
            if universe
                .find_method(substitute_type, self.substitute_name, false, &positional)
                .is_some()
            {
                return Err(self.malformed("substitute method must be static"));
            }
            return Err(self.malformed("substitute method not found"));
        };
        let _ = self.resolved.set(method);
        Ok(*self.resolved.get().expect("just set"))
    }
}

impl InvocationPlugin for MethodSubstitutionPlugin {
    fn inline_only(&self) -> bool {
        true
    }

    fn execute(
        &self,
        b: &mut dyn GraphBuilderContext,
        _target: &TargetMethod<'_>,
        args: &mut [NodeId],
    ) -> RegistrationResult<bool> {
        let substitute = self.substitute(b.universe())?;
        tracing::trace!(
            original = %self.original_display(),
            substitute = %self.substitute_display(),
            "expanding method substitution"
        );
        b.parse_inline(substitute, args)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TypeId;
    use crate::plugins::context::GraphKit;
    use crate::meta::ConstantValue;

    fn universe_with_substitute() -> (Universe, MethodId, MethodId) {
        let mut universe = Universe::new();
        let buf = universe.add_class("core.Buf", None);
        let shims = universe.add_class("intrinsics.BufShims", None);
        let original = universe.add_method(buf, "fill", false, &[TypeId::INT64]);
        // Receiver becomes the leading positional parameter.
        let substitute = universe.add_method(shims, "fill", true, &[buf, TypeId::INT64]);
        (universe, original, substitute)
    }

    fn plugin() -> MethodSubstitutionPlugin {
        MethodSubstitutionPlugin::new(
            TypeRef::Named("core.Buf"),
            TypeRef::Named("intrinsics.BufShims"),
            "fill",
            "fill",
            &[TypeRef::Receiver, TypeRef::Named("i64")],
        )
    }

    #[test]
    fn substitute_resolves_once_and_is_cached() {
        let (universe, _, substitute) = universe_with_substitute();
        let plugin = plugin();
        assert_eq!(plugin.substitute(&universe).unwrap(), substitute);
        assert_eq!(plugin.substitute(&universe).unwrap(), substitute);
    }

    #[test]
    fn execute_routes_through_inline_parsing() {
        let (universe, original, substitute) = universe_with_substitute();
        let plugin = plugin();
        assert!(plugin.inline_only());

        let mut kit = GraphKit::new(&universe);
        let recv = kit.constant(ConstantValue::Null);
        let value = kit.constant(ConstantValue::Int64(17));
        let target = TargetMethod::of(&universe, original);
        let mut args = [recv, value];
        let handled = plugin.execute(&mut kit, &target, &mut args).unwrap();

        assert!(handled);
        assert_eq!(kit.inline_requests(), &[(substitute, vec![recv, value])]);
    }

    #[test]
    fn non_static_substitute_is_malformed() {
        let mut universe = Universe::new();
        let buf = universe.add_class("core.Buf", None);
        let shims = universe.add_class("intrinsics.BufShims", None);
        universe.add_method(buf, "fill", false, &[TypeId::INT64]);
        universe.add_method(shims, "fill", false, &[buf, TypeId::INT64]);

        let err = plugin().substitute(&universe).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::malformed_substitute(
                "core.Buf.fill",
                "intrinsics.BufShims.fill",
                "substitute method must be static",
            )
        );
    }

    #[test]
    fn missing_substitute_is_malformed() {
        let mut universe = Universe::new();
        universe.add_class("core.Buf", None);
        universe.add_class("intrinsics.BufShims", None);

        let err = plugin().substitute(&universe).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::MalformedSubstitute { reason, .. } if reason == "substitute method not found"
        ));
    }
}
