// tests/plugin_integration.rs
//
// End-to-end exercise of the plugin registry the way a front end drives
// it: registration before compilation, one-shot close, per-call-site
// lookup, and plugin execution into a graph that then canonicalizes.

use std::sync::Arc;

use marten::canon::{Canonicalizer, CanonicalizerContext};
use marten::errors::{RegistrationError, RegistrationResult};
use marten::graph::{NodeId, NodeKind, Stamp};
use marten::meta::{ConstantValue, MethodId, TypeId, Universe, ValueKind};
use marten::plugins::{
    GraphBuilderContext, GraphKit, InvocationPlugin, InvocationPlugins, PluginRef, Receiver,
    Registration, TargetMethod, TypeRef,
};

/// Pushes a distinct constant so tests can tell plugins apart by effect.
struct MarkerPlugin(i64);

impl InvocationPlugin for MarkerPlugin {
    fn apply0(
        &self,
        b: &mut dyn GraphBuilderContext,
        _target: &TargetMethod<'_>,
        _receiver: Option<&mut Receiver<'_>>,
    ) -> RegistrationResult<bool> {
        let marker = b.graph_mut().unique_constant(ConstantValue::Int64(self.0));
        b.push_result(marker);
        Ok(true)
    }

    fn apply1(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        _arg0: NodeId,
    ) -> RegistrationResult<bool> {
        self.apply0(b, target, receiver)
    }

    fn apply2(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        _arg0: NodeId,
        _arg1: NodeId,
    ) -> RegistrationResult<bool> {
        self.apply0(b, target, receiver)
    }

    fn apply3(
        &self,
        b: &mut dyn GraphBuilderContext,
        target: &TargetMethod<'_>,
        receiver: Option<&mut Receiver<'_>>,
        _arg0: NodeId,
        _arg1: NodeId,
        _arg2: NodeId,
    ) -> RegistrationResult<bool> {
        self.apply0(b, target, receiver)
    }
}

fn marker(id: i64) -> PluginRef {
    Arc::new(MarkerPlugin(id))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `core.Math` with static methods of arity 0..=3 plus one left
/// unregistered.
fn math_universe() -> (Universe, Vec<MethodId>, MethodId) {
    let mut universe = Universe::new();
    let math = universe.add_class("core.Math", None);
    let i64_ty = TypeId::INT64;
    let methods = vec![
        universe.add_method(math, "seed", true, &[]),
        universe.add_method(math, "abs", true, &[i64_ty]),
        universe.add_method(math, "min", true, &[i64_ty, i64_ty]),
        universe.add_method(math, "fma", true, &[i64_ty, i64_ty, i64_ty]),
    ];
    let plain = universe.add_method(math, "plain", true, &[]);
    (universe, methods, plain)
}

#[test]
fn registration_round_trip_finds_exactly_what_was_registered() {
    init_tracing();
    let (universe, methods, plain) = math_universe();
    let plugins = InvocationPlugins::new();
    let handles: Vec<PluginRef> = (0..4).map(|i| marker(i as i64)).collect();

    let r = Registration::new(&plugins, TypeRef::Named("core.Math"));
    let i64_ref = TypeRef::Named("i64");
    r.register0("seed", handles[0].clone()).unwrap();
    r.register1("abs", i64_ref.clone(), handles[1].clone()).unwrap();
    r.register2("min", i64_ref.clone(), i64_ref.clone(), handles[2].clone())
        .unwrap();
    r.register3(
        "fma",
        i64_ref.clone(),
        i64_ref.clone(),
        i64_ref.clone(),
        handles[3].clone(),
    )
    .unwrap();

    plugins.close_registration(&universe).unwrap();

    for (method, expected) in methods.iter().zip(&handles) {
        let found = plugins
            .lookup_invocation(*method, &universe)
            .unwrap()
            .expect("registered method must be found");
        assert!(Arc::ptr_eq(&found, expected));
    }
    assert!(plugins.lookup_invocation(plain, &universe).unwrap().is_none());
}

#[test]
fn front_end_flow_intrinsifies_or_emits_the_call() {
    let (universe, methods, plain) = math_universe();
    let plugins = InvocationPlugins::new();
    Registration::new(&plugins, TypeRef::Named("core.Math"))
        .register1("abs", TypeRef::Named("i64"), marker(77))
        .unwrap();
    plugins.close_registration(&universe).unwrap();

    let mut kit = GraphKit::new(&universe);
    let arg = kit.constant(ConstantValue::Int64(-3));

    // Call site with a plugin: the plugin's fragment replaces the call.
    let abs = methods[1];
    let plugin = plugins.lookup_invocation(abs, &universe).unwrap().unwrap();
    let target = TargetMethod::of(&universe, abs);
    let mut args = [arg];
    assert!(plugin.execute(&mut kit, &target, &mut args).unwrap());
    let folded = kit.graph_mut().unique_constant(ConstantValue::Int64(77));
    assert_eq!(kit.results(), &[folded]);

    // Call site without a plugin: the front end emits the invoke.
    assert!(plugins.lookup_invocation(plain, &universe).unwrap().is_none());
    let invoke = kit.append_fixed(
        NodeKind::Invoke(plain),
        Stamp::primitive(ValueKind::Int64),
        &[],
    );
    assert_eq!(kit.graph().kind(invoke), NodeKind::Invoke(plain));
}

#[test]
fn substitution_plugin_inline_parses_the_substitute_body() {
    let mut universe = Universe::new();
    let buf = universe.add_class("core.Buf", None);
    let shims = universe.add_class("intrinsics.BufShims", None);
    let original = universe.add_method(buf, "clear", false, &[]);
    let substitute = universe.add_method(shims, "clear", true, &[buf]);

    let plugins = InvocationPlugins::new();
    Registration::new(&plugins, TypeRef::Named("core.Buf"))
        .register_method_substitution(
            TypeRef::Named("intrinsics.BufShims"),
            "clear",
            &[TypeRef::Receiver],
        )
        .unwrap();
    plugins.close_registration(&universe).unwrap();

    let plugin = plugins
        .lookup_invocation(original, &universe)
        .unwrap()
        .expect("substitution must be registered");
    assert!(plugin.inline_only());

    let mut kit = GraphKit::new(&universe);
    let recv = kit.add_floating(NodeKind::Parameter(0), Stamp::object(buf), &[]);
    let target = TargetMethod::of(&universe, original);
    let mut args = [recv];
    assert!(plugin.execute(&mut kit, &target, &mut args).unwrap());
    assert_eq!(kit.inline_requests(), &[(substitute, vec![recv])]);
}

#[test]
fn plugin_fragment_participates_in_canonicalization() {
    // A plugin that emits `instanceof` against the receiver's exact type;
    // the canonicalizer folds the whole fragment to a constant.
    struct TypeCheckPlugin(TypeId);

    impl InvocationPlugin for TypeCheckPlugin {
        fn apply0(
            &self,
            b: &mut dyn GraphBuilderContext,
            _target: &TargetMethod<'_>,
            receiver: Option<&mut Receiver<'_>>,
        ) -> RegistrationResult<bool> {
            let receiver = receiver.expect("instance method");
            let checked = receiver.get(b);
            let check = b.add_floating(
                NodeKind::InstanceOf {
                    target: self.0,
                    negated: false,
                },
                Stamp::primitive(ValueKind::Bool),
                &[checked],
            );
            b.push_result(check);
            Ok(true)
        }
    }

    let mut universe = Universe::new();
    let point = universe.add_class("geom.Point", None);
    let is_point = universe.add_method(point, "isPoint", false, &[]);

    let plugins = InvocationPlugins::new();
    plugins
        .register(
            Arc::new(TypeCheckPlugin(point)),
            TypeRef::Named("geom.Point"),
            "isPoint",
            &[TypeRef::Receiver],
        )
        .unwrap();
    plugins.close_registration(&universe).unwrap();

    let mut kit = GraphKit::new(&universe);
    let recv = kit.add_floating(
        NodeKind::Parameter(0),
        Stamp::object(point).as_exact(),
        &[],
    );
    let plugin = plugins
        .lookup_invocation(is_point, &universe)
        .unwrap()
        .unwrap();
    let target = TargetMethod::of(&universe, is_point);
    let mut args = [recv];
    plugin.execute(&mut kit, &target, &mut args).unwrap();

    let check = *kit.results().last().unwrap();
    let ret = kit.append_fixed(NodeKind::Return, Stamp::void(), &[check]);
    let (mut graph, mut assumptions) = kit.into_graph();

    let mut tool = CanonicalizerContext::new(&universe, &mut assumptions);
    Canonicalizer::run(&mut graph, &mut tool);

    // The null-checked receiver has an exact stamp, so the type check is
    // statically true.
    assert_eq!(
        graph.kind(graph.inputs(ret)[0]),
        NodeKind::Constant(ConstantValue::Bool(true))
    );
}

#[test]
fn child_registry_rejects_shadowing_a_parent_binding() {
    let (universe, methods, _) = math_universe();
    let parent = Arc::new(InvocationPlugins::new());
    Registration::new(&parent, TypeRef::Named("core.Math"))
        .register0("seed", marker(1))
        .unwrap();

    let child = InvocationPlugins::with_parent(parent.clone());
    let err = Registration::new(&child, TypeRef::Named("core.Math"))
        .register0("seed", marker(2))
        .unwrap_err();
    assert!(matches!(err, RegistrationError::ShadowsParent { .. }));

    // The parent's plugin is still reachable through the child.
    assert!(
        child
            .lookup_invocation(methods[0], &universe)
            .unwrap()
            .is_some()
    );
}

#[test]
fn overwriting_registration_replaces_the_earlier_plugin() {
    let (universe, methods, _) = math_universe();
    let plugins = InvocationPlugins::new();
    let first = marker(1);
    let second = marker(2);

    Registration::new(&plugins, TypeRef::Named("core.Math"))
        .register0("seed", first.clone())
        .unwrap();
    Registration::new(&plugins, TypeRef::Named("core.Math"))
        .set_allow_overwrite(true)
        .register0("seed", second.clone())
        .unwrap();

    let found = plugins
        .lookup_invocation(methods[0], &universe)
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&found, &second));
}

#[test]
fn optional_registrations_tolerate_absent_runtime_types() {
    let (universe, _, _) = math_universe();
    let plugins = InvocationPlugins::new();
    let r = Registration::new(&plugins, TypeRef::Named("vendor.Simd"));
    r.register_optional0("lanes", marker(1)).unwrap();
    r.register_optional2(
        "shuffle",
        TypeRef::Named("vendor.Mask"),
        TypeRef::Named("i64"),
        marker(2),
    )
    .unwrap();

    // Nothing resolves, nothing faults, nothing is found.
    plugins.close_registration(&universe).unwrap();
    assert!(plugins.is_empty());
}
