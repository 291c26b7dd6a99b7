// src/errors/registration.rs
//! Plugin registration and dispatch faults (E7xxx).
//!
//! These are configuration errors: they indicate a broken plugin setup, not
//! a condition a compilation can recover from. They surface once, abort the
//! compilation unit, and are expected to be caught in development. Ordinary
//! "no plugin registered" outcomes are `Option::None`, never an error.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("a plugin is already registered for {class}.{binding}")]
    #[diagnostic(
        code(E7001),
        help("pass allow_overwrite to Registration if replacement is intended")
    )]
    DuplicateBinding { class: String, binding: String },

    #[error("plugin for {class}.{binding} would shadow a parent registry plugin")]
    #[diagnostic(
        code(E7002),
        help("parent plugins take precedence; register under a different method or in the parent")
    )]
    ShadowsParent { class: String, binding: String },

    #[error("plugin registration for {class} is closed")]
    #[diagnostic(code(E7003))]
    RegistrationClosed { class: String },

    #[error("declaring type {class} does not resolve and its registration is not optional")]
    #[diagnostic(code(E7004))]
    MissingType { class: String },

    #[error("method {class}.{binding} does not resolve and its registration is not optional")]
    #[diagnostic(code(E7005))]
    MissingMethod { class: String, binding: String },

    #[error("invocation plugin for {method} does not handle invocations with {count} argument(s)")]
    #[diagnostic(code(E7006))]
    UnsupportedArity { method: String, count: usize },

    #[error("substitute {substitute} for {original} is malformed: {reason}")]
    #[diagnostic(code(E7007))]
    MalformedSubstitute {
        original: String,
        substitute: String,
        reason: &'static str,
    },
}

impl RegistrationError {
    pub fn duplicate_binding(class: impl Into<String>, binding: impl Into<String>) -> Self {
        RegistrationError::DuplicateBinding {
            class: class.into(),
            binding: binding.into(),
        }
    }

    pub fn shadows_parent(class: impl Into<String>, binding: impl Into<String>) -> Self {
        RegistrationError::ShadowsParent {
            class: class.into(),
            binding: binding.into(),
        }
    }

    pub fn registration_closed(class: impl Into<String>) -> Self {
        RegistrationError::RegistrationClosed {
            class: class.into(),
        }
    }

    pub fn missing_type(class: impl Into<String>) -> Self {
        RegistrationError::MissingType {
            class: class.into(),
        }
    }

    pub fn missing_method(class: impl Into<String>, binding: impl Into<String>) -> Self {
        RegistrationError::MissingMethod {
            class: class.into(),
            binding: binding.into(),
        }
    }

    pub fn unsupported_arity(method: impl Into<String>, count: usize) -> Self {
        RegistrationError::UnsupportedArity {
            method: method.into(),
            count,
        }
    }

    pub fn malformed_substitute(
        original: impl Into<String>,
        substitute: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        RegistrationError::MalformedSubstitute {
            original: original.into(),
            substitute: substitute.into(),
            reason,
        }
    }
}

/// Result type alias for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_binding_message() {
        let err = RegistrationError::duplicate_binding("math.Int", "abs(i64)");
        assert_eq!(
            err.to_string(),
            "a plugin is already registered for math.Int.abs(i64)"
        );
    }

    #[test]
    fn test_unsupported_arity_message() {
        let err = RegistrationError::unsupported_arity("math.Int.abs", 3);
        assert_eq!(
            err.to_string(),
            "invocation plugin for math.Int.abs does not handle invocations with 3 argument(s)"
        );
    }

    #[test]
    fn test_error_codes() {
        use miette::Diagnostic;
        let cases: Vec<(RegistrationError, &str)> = vec![
            (RegistrationError::duplicate_binding("c", "b"), "E7001"),
            (RegistrationError::shadows_parent("c", "b"), "E7002"),
            (RegistrationError::registration_closed("c"), "E7003"),
            (RegistrationError::missing_type("c"), "E7004"),
            (RegistrationError::missing_method("c", "b"), "E7005"),
            (RegistrationError::unsupported_arity("m", 0), "E7006"),
            (
                RegistrationError::malformed_substitute("o", "s", "not static"),
                "E7007",
            ),
        ];
        for (err, expected_code) in cases {
            let code = err.code().expect("should have error code");
            assert_eq!(code.to_string(), expected_code);
        }
    }
}
