// src/plugins/mod.rs
//! Invocation plugins: call-site intrinsification during graph building.
//!
//! The front end asks the registry for a plugin at every call site; a hit
//! replaces the call with a hand-built graph fragment (or, for method
//! substitution, with the parsed body of a substitute routine). Plugins are
//! registered once, before compilation threads start, against symbolic
//! method descriptors that resolve lazily against the host tables.

pub mod api;
pub mod context;
pub mod registration;
pub mod registry;
pub mod substitution;

pub use api::{InvocationPlugin, PluginRef, Receiver, TargetMethod};
pub use context::{GraphBuilderContext, GraphKit};
pub use registration::Registration;
pub use registry::{InvocationPlugins, TypeRef};
pub use substitution::MethodSubstitutionPlugin;
