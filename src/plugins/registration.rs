// src/plugins/registration.rs
//
// Fixed-arity registration helper for plugins declared by one type. Arity
// counts include the receiver slot for non-static methods; dispatch later
// counts the receiver separately.

use std::sync::Arc;

use crate::errors::RegistrationResult;
use crate::plugins::api::PluginRef;
use crate::plugins::registry::{InvocationPlugins, TypeRef};
use crate::plugins::substitution::MethodSubstitutionPlugin;

/// Utility for registering the plugins of one declaring type.
pub struct Registration<'a> {
    plugins: &'a InvocationPlugins,
    declaring: TypeRef,
    allow_overwrite: bool,
}

impl<'a> Registration<'a> {
    pub fn new(plugins: &'a InvocationPlugins, declaring: TypeRef) -> Self {
        Self {
            plugins,
            declaring,
            allow_overwrite: false,
        }
    }

    /// Allows later registrations through this object to replace earlier
    /// bindings for the same descriptor.
    pub fn set_allow_overwrite(mut self, allow_overwrite: bool) -> Self {
        self.allow_overwrite = allow_overwrite;
        self
    }

    fn register(
        &self,
        is_optional: bool,
        name: &str,
        params: &[TypeRef],
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.plugins.register_full(
            plugin,
            is_optional,
            self.allow_overwrite,
            self.declaring.clone(),
            name,
            params,
        )
    }

    pub fn register0(&self, name: &str, plugin: PluginRef) -> RegistrationResult<()> {
        self.register(false, name, &[], plugin)
    }

    pub fn register1(&self, name: &str, arg0: TypeRef, plugin: PluginRef) -> RegistrationResult<()> {
        self.register(false, name, &[arg0], plugin)
    }

    pub fn register2(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(false, name, &[arg0, arg1], plugin)
    }

    pub fn register3(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(false, name, &[arg0, arg1, arg2], plugin)
    }

    pub fn register4(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        arg3: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(false, name, &[arg0, arg1, arg2, arg3], plugin)
    }

    pub fn register5(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        arg3: TypeRef,
        arg4: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(false, name, &[arg0, arg1, arg2, arg3, arg4], plugin)
    }

    pub fn register6(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        arg3: TypeRef,
        arg4: TypeRef,
        arg5: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(false, name, &[arg0, arg1, arg2, arg3, arg4, arg5], plugin)
    }

    pub fn register7(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        arg3: TypeRef,
        arg4: TypeRef,
        arg5: TypeRef,
        arg6: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(
            false,
            name,
            &[arg0, arg1, arg2, arg3, arg4, arg5, arg6],
            plugin,
        )
    }

    pub fn register_optional0(&self, name: &str, plugin: PluginRef) -> RegistrationResult<()> {
        self.register(true, name, &[], plugin)
    }

    pub fn register_optional1(
        &self,
        name: &str,
        arg0: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(true, name, &[arg0], plugin)
    }

    pub fn register_optional2(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(true, name, &[arg0, arg1], plugin)
    }

    pub fn register_optional3(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(true, name, &[arg0, arg1, arg2], plugin)
    }

    pub fn register_optional4(
        &self,
        name: &str,
        arg0: TypeRef,
        arg1: TypeRef,
        arg2: TypeRef,
        arg3: TypeRef,
        plugin: PluginRef,
    ) -> RegistrationResult<()> {
        self.register(true, name, &[arg0, arg1, arg2, arg3], plugin)
    }

    /// Registers a plugin that expands the method into the parsed body of
    /// the like-named static routine on `substitute_type`.
    pub fn register_method_substitution(
        &self,
        substitute_type: TypeRef,
        name: &'static str,
        params: &[TypeRef],
    ) -> RegistrationResult<()> {
        self.register_method_substitution_renamed(substitute_type, name, name, params)
    }

    /// Like [`register_method_substitution`], with a differently named
    /// substitute routine.
    ///
    /// [`register_method_substitution`]: Registration::register_method_substitution
    pub fn register_method_substitution_renamed(
        &self,
        substitute_type: TypeRef,
        name: &'static str,
        substitute_name: &'static str,
        params: &[TypeRef],
    ) -> RegistrationResult<()> {
        let plugin = MethodSubstitutionPlugin::new(
            self.declaring.clone(),
            substitute_type,
            name,
            substitute_name,
            params,
        );
        self.register(false, name, params, Arc::new(plugin))
    }
}
