// src/meta/universe.rs
//
// Interned descriptor tables for the program elements the graph core works
// against. The front end populates a Universe once per compilation session;
// the graph core only reads it. Unresolved placeholders are interned like
// any other type so symbolic registrations can name types that may not be
// present in the current runtime.

use hashbrown::HashMap;

use crate::meta::constant::ValueKind;

/// Interned type identity.
///
/// Reserved ids cover the primitive kinds; instance and array types are
/// interned dynamically. `INVALID` is never a real type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub const INVALID: TypeId = TypeId(0);

    pub const VOID: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const INT32: TypeId = TypeId(3);
    pub const INT64: TypeId = TypeId(4);
    pub const FLOAT32: TypeId = TypeId(5);
    pub const FLOAT64: TypeId = TypeId(6);

    /// First non-reserved index.
    pub const FIRST_DYNAMIC: u32 = 7;

    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

/// Interned field identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u32);

impl FieldId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Interned method identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

impl MethodId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(ValueKind),
    Instance,
    Array,
}

#[derive(Debug)]
struct TypeDef {
    name: String,
    kind: TypeKind,
    resolved: bool,
    initialized: bool,
    supertype: Option<TypeId>,
    element: Option<TypeId>,
    leaf: bool,
    has_finalizer: bool,
    has_finalizable_subclass: bool,
    unique_concrete_subtype: Option<TypeId>,
    fields: Vec<FieldId>,
}

/// A declared field: holder type, name, kind, and slot index within the
/// holder's layout.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub holder: TypeId,
    pub name: String,
    pub kind: ValueKind,
    pub index: u32,
}

/// A declared method. `params` excludes the receiver.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub holder: TypeId,
    pub name: String,
    pub is_static: bool,
    pub params: Vec<TypeId>,
    pub signature_polymorphic: bool,
}

/// Descriptor tables for one compilation session.
#[derive(Debug)]
pub struct Universe {
    types: Vec<TypeDef>,
    type_lookup: HashMap<String, TypeId>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
}

impl Universe {
    pub fn new() -> Self {
        let mut universe = Self {
            types: Vec::new(),
            type_lookup: HashMap::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        universe.intern_reserved("<invalid>", TypeKind::Instance, false);
        universe.intern_reserved("void", TypeKind::Primitive(ValueKind::Void), true);
        universe.intern_reserved("bool", TypeKind::Primitive(ValueKind::Bool), true);
        universe.intern_reserved("i32", TypeKind::Primitive(ValueKind::Int32), true);
        universe.intern_reserved("i64", TypeKind::Primitive(ValueKind::Int64), true);
        universe.intern_reserved("f32", TypeKind::Primitive(ValueKind::Float32), true);
        universe.intern_reserved("f64", TypeKind::Primitive(ValueKind::Float64), true);
        universe
    }

    fn intern_reserved(&mut self, name: &str, kind: TypeKind, resolved: bool) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            kind,
            resolved,
            initialized: resolved,
            supertype: None,
            element: None,
            leaf: true,
            has_finalizer: false,
            has_finalizable_subclass: false,
            unique_concrete_subtype: None,
            fields: Vec::new(),
        });
        self.type_lookup.insert(name.to_string(), id);
        id
    }

    /// Interns a resolved, initialized instance type.
    pub fn add_class(&mut self, name: &str, supertype: Option<TypeId>) -> TypeId {
        debug_assert!(
            !self.type_lookup.contains_key(name),
            "type {name} interned twice"
        );
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            kind: TypeKind::Instance,
            resolved: true,
            initialized: true,
            supertype,
            element: None,
            leaf: false,
            has_finalizer: false,
            has_finalizable_subclass: false,
            unique_concrete_subtype: None,
            fields: Vec::new(),
        });
        self.type_lookup.insert(name.to_string(), id);
        id
    }

    /// Interns a placeholder for a type the current runtime does not
    /// provide. Lookups find it, but it reports unresolved.
    pub fn add_unresolved(&mut self, name: &str) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            kind: TypeKind::Instance,
            resolved: false,
            initialized: false,
            supertype: None,
            element: None,
            leaf: false,
            has_finalizer: false,
            has_finalizable_subclass: false,
            unique_concrete_subtype: None,
            fields: Vec::new(),
        });
        self.type_lookup.insert(name.to_string(), id);
        id
    }

    /// Interns the array type of `element` (idempotent per element type).
    pub fn add_array(&mut self, element: TypeId) -> TypeId {
        let name = format!("{}[]", self.name(element));
        if let Some(id) = self.type_lookup.get(name.as_str()) {
            return *id;
        }
        let id = TypeId(self.types.len() as u32);
        let element_is_leaf = self.types[element.0 as usize].leaf;
        self.types.push(TypeDef {
            name: name.clone(),
            kind: TypeKind::Array,
            resolved: true,
            initialized: true,
            supertype: None,
            element: Some(element),
            leaf: element_is_leaf,
            has_finalizer: false,
            has_finalizable_subclass: false,
            unique_concrete_subtype: None,
            fields: Vec::new(),
        });
        self.type_lookup.insert(name, id);
        id
    }

    pub fn set_uninitialized(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].initialized = false;
    }

    /// Marks a type as having no subclasses.
    pub fn set_leaf(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].leaf = true;
    }

    pub fn set_has_finalizer(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].has_finalizer = true;
        self.types[ty.0 as usize].has_finalizable_subclass = true;
    }

    /// Marks a type as possibly having a finalizable subclass without a
    /// finalizer of its own.
    pub fn set_has_finalizable_subclass(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].has_finalizable_subclass = true;
    }

    /// Records the host's unique-concrete-subtype fact for an abstract
    /// type. Callers must not form cycles: the unique subtype of `ty` must
    /// not itself report a unique subtype chain leading back to `ty`; the
    /// canonicalizer relies on this for termination.
    pub fn set_unique_concrete_subtype(&mut self, ty: TypeId, subtype: TypeId) {
        debug_assert_ne!(ty, subtype, "unique concrete subtype must narrow");
        self.types[ty.0 as usize].unique_concrete_subtype = Some(subtype);
    }

    pub fn add_field(&mut self, holder: TypeId, name: &str, kind: ValueKind) -> FieldId {
        let index = self.types[holder.0 as usize].fields.len() as u32;
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDef {
            holder,
            name: name.to_string(),
            kind,
            index,
        });
        self.types[holder.0 as usize].fields.push(id);
        id
    }

    pub fn add_method(
        &mut self,
        holder: TypeId,
        name: &str,
        is_static: bool,
        params: &[TypeId],
    ) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodDef {
            holder,
            name: name.to_string(),
            is_static,
            params: params.to_vec(),
            signature_polymorphic: false,
        });
        id
    }

    pub fn set_signature_polymorphic(&mut self, method: MethodId) {
        self.methods[method.0 as usize].signature_polymorphic = true;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn name(&self, ty: TypeId) -> &str {
        &self.types[ty.0 as usize].name
    }

    pub fn kind(&self, ty: TypeId) -> TypeKind {
        self.types[ty.0 as usize].kind
    }

    pub fn is_resolved(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].resolved
    }

    pub fn is_initialized(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].initialized
    }

    pub fn is_leaf(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].leaf
    }

    pub fn has_finalizer(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].has_finalizer
    }

    pub fn has_finalizable_subclass(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].has_finalizable_subclass
    }

    pub fn unique_concrete_subtype(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.0 as usize].unique_concrete_subtype
    }

    pub fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.0 as usize].element
    }

    pub fn supertype(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.0 as usize].supertype
    }

    /// The value kind of a value of type `ty`.
    pub fn value_kind(&self, ty: TypeId) -> ValueKind {
        match self.types[ty.0 as usize].kind {
            TypeKind::Primitive(kind) => kind,
            TypeKind::Instance | TypeKind::Array => ValueKind::Object,
        }
    }

    /// Reflexive, transitive subtype test along the single-inheritance
    /// supertype chain. Arrays and primitives are subtypes only of
    /// themselves.
    pub fn is_subtype_of(&self, ty: TypeId, of: TypeId) -> bool {
        let mut cur = Some(ty);
        while let Some(t) = cur {
            if t == of {
                return true;
            }
            cur = self.types[t.0 as usize].supertype;
        }
        false
    }

    /// True when no value can be an instance of both types. Holds for
    /// unrelated instance types because the type model is
    /// single-inheritance with no interface types.
    pub fn disjoint(&self, a: TypeId, b: TypeId) -> bool {
        !self.is_subtype_of(a, b) && !self.is_subtype_of(b, a)
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.type_lookup.get(name).copied()
    }

    pub fn fields_of(&self, ty: TypeId) -> &[FieldId] {
        &self.types[ty.0 as usize].fields
    }

    pub fn field(&self, field: FieldId) -> &FieldDef {
        &self.fields[field.0 as usize]
    }

    pub fn find_field(&self, holder: TypeId, name: &str) -> Option<FieldId> {
        self.types[holder.0 as usize]
            .fields
            .iter()
            .copied()
            .find(|f| self.fields[f.0 as usize].name == name)
    }

    pub fn method(&self, method: MethodId) -> &MethodDef {
        &self.methods[method.0 as usize]
    }

    /// Finds a declared method by exact name, staticness, and parameter
    /// types (receiver excluded). Absence is an ordinary outcome.
    pub fn find_method(
        &self,
        holder: TypeId,
        name: &str,
        is_static: bool,
        params: &[TypeId],
    ) -> Option<MethodId> {
        self.methods.iter().position(|m| {
            m.holder == holder && m.is_static == is_static && m.name == name && m.params == params
        }).map(|i| MethodId(i as u32))
    }

    /// `Holder.name` rendering for diagnostics.
    pub fn method_display(&self, method: MethodId) -> String {
        let def = &self.methods[method.0 as usize];
        format!("{}.{}", self.name(def.holder), def.name)
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_primitives_are_interned() {
        let universe = Universe::new();
        assert_eq!(universe.find_type("i64"), Some(TypeId::INT64));
        assert_eq!(universe.value_kind(TypeId::INT64), ValueKind::Int64);
        assert!(universe.is_resolved(TypeId::BOOL));
        assert!(universe.is_leaf(TypeId::FLOAT64));
    }

    #[test]
    fn subtype_chain_walks_supertypes() {
        let mut universe = Universe::new();
        let base = universe.add_class("core.Base", None);
        let mid = universe.add_class("core.Mid", Some(base));
        let leaf = universe.add_class("core.Leaf", Some(mid));
        let other = universe.add_class("core.Other", None);

        assert!(universe.is_subtype_of(leaf, base));
        assert!(universe.is_subtype_of(leaf, leaf));
        assert!(!universe.is_subtype_of(base, leaf));
        assert!(universe.disjoint(leaf, other));
        assert!(!universe.disjoint(leaf, mid));
    }

    #[test]
    fn array_types_intern_once_per_element() {
        let mut universe = Universe::new();
        let a1 = universe.add_array(TypeId::INT64);
        let a2 = universe.add_array(TypeId::INT64);
        assert_eq!(a1, a2);
        assert_eq!(universe.name(a1), "i64[]");
        assert_eq!(universe.element_type(a1), Some(TypeId::INT64));
        assert_eq!(universe.kind(a1), TypeKind::Array);
    }

    #[test]
    fn field_indices_follow_declaration_order() {
        let mut universe = Universe::new();
        let point = universe.add_class("geom.Point", None);
        let x = universe.add_field(point, "x", ValueKind::Int64);
        let y = universe.add_field(point, "y", ValueKind::Int64);

        assert_eq!(universe.field(x).index, 0);
        assert_eq!(universe.field(y).index, 1);
        assert_eq!(universe.find_field(point, "y"), Some(y));
        assert_eq!(universe.fields_of(point), &[x, y]);
    }

    #[test]
    fn method_lookup_matches_exact_signature() {
        let mut universe = Universe::new();
        let math = universe.add_class("core.Math", None);
        let abs = universe.add_method(math, "abs", true, &[TypeId::INT64]);

        assert_eq!(
            universe.find_method(math, "abs", true, &[TypeId::INT64]),
            Some(abs)
        );
        assert_eq!(universe.find_method(math, "abs", true, &[TypeId::INT32]), None);
        assert_eq!(universe.find_method(math, "abs", false, &[TypeId::INT64]), None);
        assert_eq!(universe.method_display(abs), "core.Math.abs");
    }

    #[test]
    fn unresolved_placeholder_is_found_but_not_resolved() {
        let mut universe = Universe::new();
        let ghost = universe.add_unresolved("ext.Ghost");
        assert_eq!(universe.find_type("ext.Ghost"), Some(ghost));
        assert!(!universe.is_resolved(ghost));
    }
}
