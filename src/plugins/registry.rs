// src/plugins/registry.rs
//
// The invocation-plugin registry. Registration records symbolic method
// descriptors; nothing touches the host tables until the first lookup (or
// an explicit close), which runs the deferred registrations and builds an
// immutable method-to-plugin table in one shot. After that build the
// registry is read-only and safe to share across compilation threads.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use rustc_hash::FxHashMap;

use crate::errors::{RegistrationError, RegistrationResult};
use crate::meta::{MethodId, TypeId, Universe};
use crate::plugins::api::PluginRef;

/// A type position in a symbolic method descriptor.
///
/// `Named` refs resolve against the host tables at most once per binding;
/// a ref that never resolves simply contributes no lookup entry when its
/// registration is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Marks the receiver slot; only legal as the first parameter of a
    /// non-static registration.
    Receiver,
    Resolved(TypeId),
    Named(&'static str),
}

impl TypeRef {
    /// Symbolic rendering, available before resolution.
    pub(crate) fn describe(&self) -> String {
        match self {
            TypeRef::Receiver => "<receiver>".to_string(),
            TypeRef::Resolved(id) => format!("type#{}", id.index()),
            TypeRef::Named(name) => (*name).to_string(),
        }
    }

    /// The concrete type this ref denotes in the current runtime, if any.
    pub(crate) fn resolve(&self, universe: &Universe) -> Option<TypeId> {
        match self {
            TypeRef::Receiver => unreachable!("receiver ref resolved positionally"),
            TypeRef::Resolved(id) => Some(*id),
            TypeRef::Named(name) => universe
                .find_type(name)
                .filter(|ty| universe.is_resolved(*ty)),
        }
    }
}

/// One registration record: a plugin bound to a symbolic method
/// descriptor. Resolution to a concrete method is lazy, memoized, and
/// monotonic: it happens at most once, or the key remains permanently
/// unresolved (only legal for optional registrations).
pub struct MethodKey {
    name: String,
    is_static: bool,
    is_optional: bool,
    /// Parameter type refs, receiver excluded.
    params: Vec<TypeRef>,
    plugin: PluginRef,
    resolved: OnceLock<Option<MethodId>>,
}

impl MethodKey {
    fn matches(&self, name: &str, is_static: bool, params: &[TypeRef]) -> bool {
        self.is_static == is_static && self.name == name && self.params == params
    }

    /// `name(param, ...)` rendering for diagnostics and duplicate checks.
    fn descriptor(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeRef::describe).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    fn resolve(
        &self,
        universe: &Universe,
        declaring: TypeId,
        class_display: &str,
    ) -> RegistrationResult<Option<MethodId>> {
        if let Some(cached) = self.resolved.get() {
            return Ok(*cached);
        }
        let mut params = Vec::with_capacity(self.params.len());
        for param in &self.params {
            match param.resolve(universe) {
                Some(ty) => params.push(ty),
                None if self.is_optional => {
                    let _ = self.resolved.set(None);
                    return Ok(*self.resolved.get().expect("just set"));
                }
                None => return Err(RegistrationError::missing_type(param.describe())),
            }
        }
        let found = universe.find_method(declaring, &self.name, self.is_static, &params);
        if found.is_none() && !self.is_optional {
            return Err(RegistrationError::missing_method(
                class_display,
                self.descriptor(),
            ));
        }
        // Racing resolutions converge on whichever value was stored first;
        // both compute the same method.
        let _ = self.resolved.set(found);
        Ok(*self.resolved.get().expect("just set"))
    }
}

/// The per-declaring-type collection of registrations. Open while the
/// registry accepts bindings; [`ClassPlugins::close`] produces the
/// resolved lookup map exactly once, as part of the registry build.
struct ClassPlugins {
    declaring: TypeRef,
    keys: Vec<MethodKey>,
}

impl ClassPlugins {
    fn new(declaring: TypeRef) -> Self {
        Self {
            declaring,
            keys: Vec::new(),
        }
    }

    fn display(&self) -> String {
        self.declaring.describe()
    }

    fn register(&mut self, key: MethodKey, allow_overwrite: bool) -> RegistrationResult<()> {
        if let Some(pos) = self
            .keys
            .iter()
            .position(|k| k.matches(&key.name, key.is_static, &key.params))
        {
            if !allow_overwrite {
                return Err(RegistrationError::duplicate_binding(
                    self.display(),
                    key.descriptor(),
                ));
            }
            self.keys[pos] = key;
            return Ok(());
        }
        self.keys.push(key);
        Ok(())
    }

    fn find(&self, name: &str, is_static: bool, params: &[TypeRef]) -> Option<&MethodKey> {
        self.keys
            .iter()
            .find(|k| k.matches(name, is_static, params))
    }

    /// The declaring type in the current runtime. `None` when the symbolic
    /// name does not resolve and every binding is optional.
    fn resolve_declaring(&self, universe: &Universe) -> RegistrationResult<Option<TypeId>> {
        match &self.declaring {
            TypeRef::Resolved(id) => Ok(Some(*id)),
            TypeRef::Named(name) => {
                let resolved = universe
                    .find_type(name)
                    .filter(|ty| universe.is_resolved(*ty));
                match resolved {
                    Some(ty) => Ok(Some(ty)),
                    None if self.keys.iter().all(|k| k.is_optional) => Ok(None),
                    None => Err(RegistrationError::missing_type(*name)),
                }
            }
            TypeRef::Receiver => unreachable!("receiver is not a declaring type"),
        }
    }

    /// Resolves every key and builds this class's closed lookup map.
    fn close(&self, universe: &Universe) -> RegistrationResult<FxHashMap<MethodId, PluginRef>> {
        let mut map = FxHashMap::default();
        let Some(declaring) = self.resolve_declaring(universe)? else {
            return Ok(map);
        };
        for key in &self.keys {
            let Some(method) = key.resolve(universe, declaring, &self.display())? else {
                continue;
            };
            if map.insert(method, key.plugin.clone()).is_some() {
                return Err(RegistrationError::duplicate_binding(
                    self.display(),
                    key.descriptor(),
                ));
            }
        }
        Ok(map)
    }
}

type Deferred = Box<dyn FnOnce(&InvocationPlugins) -> RegistrationResult<()> + Send>;

struct RegistryState {
    classes: Vec<ClassPlugins>,
    deferred: Vec<Deferred>,
    closed: bool,
}

struct LookupTable {
    map: FxHashMap<MethodId, PluginRef>,
}

/// The registry: declaring-type name to [`ClassPlugins`], optionally
/// chained to a parent consulted first.
///
/// Lifecycle: single-writer registration (direct or deferred), then a
/// one-shot build triggered by the first lookup or by
/// [`close_registration`], then unsynchronized read-only lookups from any
/// number of compilation threads. A fault during the build is cached and
/// re-surfaced by every subsequent lookup.
///
/// [`close_registration`]: InvocationPlugins::close_registration
pub struct InvocationPlugins {
    parent: Option<Arc<InvocationPlugins>>,
    state: Mutex<RegistryState>,
    table: OnceLock<RegistrationResult<LookupTable>>,
}

impl InvocationPlugins {
    pub fn new() -> Self {
        Self::with_parent_opt(None)
    }

    /// A child registry; `parent` plugins take precedence and cannot be
    /// shadowed.
    pub fn with_parent(parent: Arc<InvocationPlugins>) -> Self {
        Self::with_parent_opt(Some(parent))
    }

    fn with_parent_opt(parent: Option<Arc<InvocationPlugins>>) -> Self {
        Self {
            parent,
            state: Mutex::new(RegistryState {
                classes: Vec::new(),
                deferred: Vec::new(),
                closed: false,
            }),
            table: OnceLock::new(),
        }
    }

    pub fn parent(&self) -> Option<&Arc<InvocationPlugins>> {
        self.parent.as_ref()
    }

    /// Registers `plugin` for the method `declaring.name(params)`. A
    /// leading [`TypeRef::Receiver`] marks a non-static method.
    pub fn register(
        &self,
        plugin: PluginRef,
        declaring: TypeRef,
        name: &str,
        params: &[TypeRef],
    ) -> RegistrationResult<()> {
        self.register_full(plugin, false, false, declaring, name, params)
    }

    /// Like [`register`], but a method missing from the current runtime is
    /// silently skipped instead of being a fault.
    ///
    /// [`register`]: InvocationPlugins::register
    pub fn register_optional(
        &self,
        plugin: PluginRef,
        declaring: TypeRef,
        name: &str,
        params: &[TypeRef],
    ) -> RegistrationResult<()> {
        self.register_full(plugin, true, false, declaring, name, params)
    }

    pub(crate) fn register_full(
        &self,
        plugin: PluginRef,
        is_optional: bool,
        allow_overwrite: bool,
        declaring: TypeRef,
        name: &str,
        params: &[TypeRef],
    ) -> RegistrationResult<()> {
        assert!(
            declaring != TypeRef::Receiver,
            "receiver is not a declaring type"
        );
        assert!(
            !params.iter().skip(1).any(|p| *p == TypeRef::Receiver),
            "receiver ref only marks the first parameter"
        );
        let is_static = params.first() != Some(&TypeRef::Receiver);
        let key_params: Vec<TypeRef> = if is_static {
            params.to_vec()
        } else {
            params[1..].to_vec()
        };

        let key = MethodKey {
            name: name.to_string(),
            is_static,
            is_optional,
            params: key_params,
            plugin,
            resolved: OnceLock::new(),
        };

        // A parent binding for the same descriptor can never be shadowed.
        let mut ancestor = self.parent.as_deref();
        while let Some(p) = ancestor {
            if p.has_symbolic_binding(&declaring, name, is_static, &key.params) {
                return Err(RegistrationError::shadows_parent(
                    declaring.describe(),
                    key.descriptor(),
                ));
            }
            ancestor = p.parent.as_deref();
        }

        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(RegistrationError::registration_closed(declaring.describe()));
        }
        let index = match state.classes.iter().position(|c| c.declaring == declaring) {
            Some(index) => index,
            None => {
                state.classes.push(ClassPlugins::new(declaring));
                state.classes.len() - 1
            }
        };
        state.classes[index].register(key, allow_overwrite)
    }

    fn has_symbolic_binding(
        &self,
        declaring: &TypeRef,
        name: &str,
        is_static: bool,
        params: &[TypeRef],
    ) -> bool {
        let state = self.state.lock().unwrap();
        state
            .classes
            .iter()
            .filter(|c| c.declaring == *declaring)
            .any(|c| c.find(name, is_static, params).is_some())
    }

    /// Queues a registration callback to run exactly once, before the
    /// first lookup or at [`close_registration`]. The callback registers
    /// against the registry it is handed; it must not perform lookups on
    /// it (the one-shot build is not reentrant).
    ///
    /// [`close_registration`]: InvocationPlugins::close_registration
    pub fn defer(
        &self,
        registration: impl FnOnce(&InvocationPlugins) -> RegistrationResult<()> + Send + 'static,
    ) -> RegistrationResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(RegistrationError::registration_closed("<deferred>"));
        }
        state.deferred.push(Box::new(registration));
        Ok(())
    }

    /// The plugin for `method`, consulting the parent chain first. Absence
    /// is an ordinary outcome; a cached build fault is re-surfaced here.
    pub fn lookup_invocation(
        &self,
        method: MethodId,
        universe: &Universe,
    ) -> RegistrationResult<Option<PluginRef>> {
        if let Some(parent) = &self.parent
            && let Some(plugin) = parent.lookup_invocation(method, universe)?
        {
            return Ok(Some(plugin));
        }
        Ok(self.table(universe)?.map.get(&method).cloned())
    }

    /// Flushes deferred registrations and builds every class's lookup map.
    /// Idempotent.
    pub fn close_registration(&self, universe: &Universe) -> RegistrationResult<()> {
        self.table(universe).map(|_| ())
    }

    fn table(&self, universe: &Universe) -> Result<&LookupTable, RegistrationError> {
        self.table
            .get_or_init(|| self.build(universe))
            .as_ref()
            .map_err(|err| err.clone())
    }

    fn build(&self, universe: &Universe) -> RegistrationResult<LookupTable> {
        // Drain deferred registrations without holding the state lock;
        // callbacks re-enter register(). A callback may defer further
        // registrations, hence the loop.
        loop {
            let batch: Vec<Deferred> = {
                let mut state = self.state.lock().unwrap();
                std::mem::take(&mut state.deferred)
            };
            if batch.is_empty() {
                break;
            }
            for registration in batch {
                registration(self)?;
            }
        }

        let mut state = self.state.lock().unwrap();
        state.closed = true;
        let mut map = FxHashMap::default();
        for class in &state.classes {
            let class_map = class.close(universe)?;
            for (method, plugin) in class_map {
                // The parent chain is consulted first at lookup time, so a
                // resolved collision with it is a shadowing fault, checked
                // here even when registration-time symbolic checks missed
                // it (e.g. Named vs Resolved refs to the same type).
                if let Some(parent) = &self.parent
                    && parent.lookup_invocation(method, universe)?.is_some()
                {
                    return Err(RegistrationError::shadows_parent(
                        class.display(),
                        universe.method_display(method),
                    ));
                }
                if map.insert(method, plugin).is_some() {
                    return Err(RegistrationError::duplicate_binding(
                        class.display(),
                        universe.method_display(method),
                    ));
                }
            }
        }
        tracing::debug!(
            classes = state.classes.len(),
            bindings = map.len(),
            "invocation plugin table built"
        );
        Ok(LookupTable { map })
    }

    /// Whether this registry (or any parent) has any registration, in any
    /// state. Pending deferred registrations count as non-empty.
    pub fn is_empty(&self) -> bool {
        if let Some(parent) = &self.parent
            && !parent.is_empty()
        {
            return false;
        }
        if let Some(Ok(table)) = self.table.get() {
            return table.map.is_empty();
        }
        let state = self.state.lock().unwrap();
        state.deferred.is_empty() && state.classes.iter().all(|c| c.keys.is_empty())
    }

    /// Symbolic `Class.name(params)` renderings of the registered
    /// bindings, parent chain included.
    pub fn bindings(&self) -> Vec<String> {
        let mut out = match &self.parent {
            Some(parent) => parent.bindings(),
            None => Vec::new(),
        };
        out.extend(self.own_bindings());
        out
    }

    fn own_bindings(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut out = Vec::new();
        for class in &state.classes {
            for key in &class.keys {
                out.push(format!("{}.{}", class.display(), key.descriptor()));
            }
        }
        out
    }
}

impl Default for InvocationPlugins {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut own = self.own_bindings();
        own.sort();
        for (i, binding) in own.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{binding}")?;
        }
        if let Some(parent) = &self.parent {
            if !own.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "// parent")?;
            write!(f, "{parent}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ConstantValue, TypeId as MetaTypeId};
    use crate::plugins::api::{InvocationPlugin, Receiver, TargetMethod};
    use crate::plugins::context::GraphBuilderContext;

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
    }

    fn marker(id: i64) -> PluginRef {
        Arc::new(MarkerPlugin(id))
    }

    fn universe_with_str() -> (Universe, MethodId, MethodId) {
        let mut universe = Universe::new();
        let s = universe.add_class("core.Str", None);
        let len = universe.add_method(s, "len", false, &[]);
        let cmp = universe.add_method(s, "cmp", false, &[MetaTypeId::INT64]);
        (universe, len, cmp)
    }

    #[test]
    fn duplicate_registration_without_overwrite_is_a_fault() {
        let plugins = InvocationPlugins::new();
        plugins
            .register(marker(1), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap();
        let err = plugins
            .register(marker(2), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateBinding { .. }));
    }

    #[test]
    fn overwrite_replaces_the_earlier_registration() {
        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        let first = marker(1);
        let second = marker(2);
        plugins
            .register(
                first.clone(),
                TypeRef::Named("core.Str"),
                "len",
                &[TypeRef::Receiver],
            )
            .unwrap();
        plugins
            .register_full(
                second.clone(),
                false,
                true,
                TypeRef::Named("core.Str"),
                "len",
                &[TypeRef::Receiver],
            )
            .unwrap();

        let found = plugins.lookup_invocation(len, &universe).unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert!(!Arc::ptr_eq(&found, &first));
    }

    #[test]
    fn registration_after_close_is_a_fault() {
        let (universe, _, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        plugins.close_registration(&universe).unwrap();
        let err = plugins
            .register(marker(1), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::RegistrationClosed { .. }));
    }

    #[test]
    fn lookup_miss_is_not_an_error() {
        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        assert_eq!(plugins.lookup_invocation(len, &universe).unwrap(), None);
    }

    #[test]
    fn optional_registration_for_missing_method_contributes_nothing() {
        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        plugins
            .register_optional(
                marker(1),
                TypeRef::Named("core.Str"),
                "reverse",
                &[TypeRef::Receiver],
            )
            .unwrap();
        plugins
            .register_optional(
                marker(2),
                TypeRef::Named("ext.Missing"),
                "frob",
                &[],
            )
            .unwrap();

        plugins.close_registration(&universe).unwrap();
        assert_eq!(plugins.lookup_invocation(len, &universe).unwrap(), None);
    }

    #[test]
    fn required_registration_for_missing_method_faults_at_build() {
        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        plugins
            .register(
                marker(1),
                TypeRef::Named("core.Str"),
                "reverse",
                &[TypeRef::Receiver],
            )
            .unwrap();

        let err = plugins.lookup_invocation(len, &universe).unwrap_err();
        assert!(matches!(err, RegistrationError::MissingMethod { .. }));
        // The fault is cached and re-surfaced.
        let again = plugins.lookup_invocation(len, &universe).unwrap_err();
        assert_eq!(err, again);
    }

    #[test]
    fn parent_plugins_take_precedence_and_cannot_be_shadowed() {
        let (universe, len, cmp) = universe_with_str();
        let parent = Arc::new(InvocationPlugins::new());
        let parent_plugin = marker(1);
        parent
            .register(
                parent_plugin.clone(),
                TypeRef::Named("core.Str"),
                "len",
                &[TypeRef::Receiver],
            )
            .unwrap();

        let child = InvocationPlugins::with_parent(parent.clone());
        let child_plugin = marker(2);
        child
            .register(
                child_plugin.clone(),
                TypeRef::Named("core.Str"),
                "cmp",
                &[TypeRef::Receiver, TypeRef::Named("i64")],
            )
            .unwrap();

        // The parent's binding is visible through the child.
        let found = child.lookup_invocation(len, &universe).unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &parent_plugin));
        let found = child.lookup_invocation(cmp, &universe).unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &child_plugin));

        // Registering the parent's descriptor in the child is rejected.
        let err = child
            .register(marker(3), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ShadowsParent { .. }));
    }

    #[test]
    fn shadowing_via_resolved_ref_is_caught_at_build() {
        let (universe, len, _) = universe_with_str();
        let str_ty = universe.find_type("core.Str").unwrap();
        let parent = Arc::new(InvocationPlugins::new());
        parent
            .register(marker(1), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap();

        // Symbolically distinct (Resolved vs Named), so registration
        // succeeds; the build detects the resolved collision.
        let child = InvocationPlugins::with_parent(parent);
        child
            .register(
                marker(2),
                TypeRef::Resolved(str_ty),
                "len",
                &[TypeRef::Receiver],
            )
            .unwrap();
        let err = child.lookup_invocation(len, &universe).unwrap_err();
        assert!(matches!(err, RegistrationError::ShadowsParent { .. }));
    }

    #[test]
    fn deferred_registrations_flush_once_on_first_lookup() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        static RUNS: AtomicUsize = AtomicUsize::new(0);
        RUNS.store(0, Ordering::SeqCst);
        plugins
            .defer(|registry| {
                RUNS.fetch_add(1, Ordering::SeqCst);
                registry.register(
                    marker(1),
                    TypeRef::Named("core.Str"),
                    "len",
                    &[TypeRef::Receiver],
                )
            })
            .unwrap();

        assert!(!plugins.is_empty());
        assert!(plugins.lookup_invocation(len, &universe).unwrap().is_some());
        assert!(plugins.lookup_invocation(len, &universe).unwrap().is_some());
        plugins.close_registration(&universe).unwrap();
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fault_inside_deferred_registration_is_cached() {
        let (universe, len, _) = universe_with_str();
        let plugins = InvocationPlugins::new();
        plugins
            .defer(|registry| {
                registry.register(
                    marker(1),
                    TypeRef::Named("core.Str"),
                    "len",
                    &[TypeRef::Receiver],
                )?;
                // Same descriptor again: a duplicate-binding fault.
                registry.register(
                    marker(2),
                    TypeRef::Named("core.Str"),
                    "len",
                    &[TypeRef::Receiver],
                )
            })
            .unwrap();

        let err = plugins.lookup_invocation(len, &universe).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateBinding { .. }));
        let again = plugins.lookup_invocation(len, &universe).unwrap_err();
        assert_eq!(err, again);
    }

    #[test]
    fn bindings_render_symbolically() {
        let plugins = InvocationPlugins::new();
        plugins
            .register(
                marker(1),
                TypeRef::Named("core.Str"),
                "cmp",
                &[TypeRef::Receiver, TypeRef::Named("i64")],
            )
            .unwrap();
        assert_eq!(plugins.bindings(), vec!["core.Str.cmp(i64)".to_string()]);
        assert_eq!(plugins.to_string(), "core.Str.cmp(i64)");
    }

    #[test]
    fn bindings_include_the_parent_chain() {
        let parent = Arc::new(InvocationPlugins::new());
        parent
            .register(marker(1), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap();
        let child = InvocationPlugins::with_parent(parent);
        child
            .register(
                marker(2),
                TypeRef::Named("core.Str"),
                "cmp",
                &[TypeRef::Receiver, TypeRef::Named("i64")],
            )
            .unwrap();

        assert_eq!(
            child.bindings(),
            vec!["core.Str.len()".to_string(), "core.Str.cmp(i64)".to_string()]
        );
        assert!(child.to_string().contains("// parent"));
    }

    #[test]
    fn is_empty_reflects_parent_chain() {
        let parent = Arc::new(InvocationPlugins::new());
        let child = InvocationPlugins::with_parent(parent.clone());
        assert!(child.is_empty());
        parent
            .register(marker(1), TypeRef::Named("core.Str"), "len", &[TypeRef::Receiver])
            .unwrap();
        assert!(!child.is_empty());
    }
}
