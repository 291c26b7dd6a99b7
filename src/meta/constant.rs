// src/meta/constant.rs
//
// Kind-tagged constant values. Floats are stored as bit patterns so
// constants can be interned and uniqued with plain Eq/Hash.

/// Result kind of a node or slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Void,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Object,
}

impl ValueKind {
    /// String name used in diagnostics and binding descriptors.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Void => "void",
            ValueKind::Bool => "bool",
            ValueKind::Int32 => "i32",
            ValueKind::Int64 => "i64",
            ValueKind::Float32 => "f32",
            ValueKind::Float64 => "f64",
            ValueKind::Object => "object",
        }
    }

    #[inline]
    pub fn is_object(self) -> bool {
        matches!(self, ValueKind::Object)
    }

    #[inline]
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueKind::Object | ValueKind::Void)
    }
}

/// A compile-time constant with its kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    /// The null object reference.
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    /// f32 bit pattern; use [`ConstantValue::from_f32`] / [`ConstantValue::as_f32`].
    Float32(u32),
    /// f64 bit pattern; use [`ConstantValue::from_f64`] / [`ConstantValue::as_f64`].
    Float64(u64),
}

impl ConstantValue {
    pub fn from_f32(value: f32) -> Self {
        ConstantValue::Float32(value.to_bits())
    }

    pub fn from_f64(value: f64) -> Self {
        ConstantValue::Float64(value.to_bits())
    }

    pub fn kind(self) -> ValueKind {
        match self {
            ConstantValue::Null => ValueKind::Object,
            ConstantValue::Bool(_) => ValueKind::Bool,
            ConstantValue::Int32(_) => ValueKind::Int32,
            ConstantValue::Int64(_) => ValueKind::Int64,
            ConstantValue::Float32(_) => ValueKind::Float32,
            ConstantValue::Float64(_) => ValueKind::Float64,
        }
    }

    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self, ConstantValue::Null)
    }

    #[inline]
    pub fn is_non_null(self) -> bool {
        !self.is_null()
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i32(self) -> Option<i32> {
        match self {
            ConstantValue::Int32(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view regardless of width.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            ConstantValue::Int32(v) => Some(v as i64),
            ConstantValue::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(self) -> Option<f32> {
        match self {
            ConstantValue::Float32(bits) => Some(f32::from_bits(bits)),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            ConstantValue::Float64(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// The zero/false/null constant for a kind. Scalar-replacement seeds
    /// virtualized slots with these before any store is seen.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => ConstantValue::Bool(false),
            ValueKind::Int32 => ConstantValue::Int32(0),
            ValueKind::Int64 => ConstantValue::Int64(0),
            ValueKind::Float32 => ConstantValue::from_f32(0.0),
            ValueKind::Float64 => ConstantValue::from_f64(0.0),
            ValueKind::Object | ValueKind::Void => ConstantValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_constants_intern_by_bits() {
        assert_eq!(ConstantValue::from_f64(1.5), ConstantValue::from_f64(1.5));
        assert_ne!(ConstantValue::from_f64(1.5), ConstantValue::from_f64(2.5));
        assert_eq!(ConstantValue::from_f64(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn kind_tags() {
        assert_eq!(ConstantValue::Null.kind(), ValueKind::Object);
        assert!(ConstantValue::Null.is_null());
        assert!(ConstantValue::Int64(3).is_non_null());
        assert_eq!(ConstantValue::Int32(7).as_i64(), Some(7));
        assert_eq!(ConstantValue::Bool(true).as_i64(), None);
    }

    #[test]
    fn defaults_match_kind() {
        assert_eq!(
            ConstantValue::default_for(ValueKind::Int64),
            ConstantValue::Int64(0)
        );
        assert_eq!(
            ConstantValue::default_for(ValueKind::Object),
            ConstantValue::Null
        );
    }
}
