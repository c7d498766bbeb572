//! Named plugin factories and the config-driven loader.

use super::{Plugin, PluginHandle};
use crate::config::merge_config;
use crate::error::LoadError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Builds a fresh plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Result<Box<dyn Plugin>, LoadError> + Send + Sync>;

/// Maps plugin names to factories.
#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled plugins: `logger` and `dice`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert("logger".to_string(), Box::new(builtin_logger));
        registry
            .factories
            .insert("dice".to_string(), Box::new(builtin_dice));
        registry
    }

    /// Register a factory under `name`. Names are unique.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), LoadError>
    where
        F: Fn() -> Result<Box<dyn Plugin>, LoadError> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(LoadError::EmptyName);
        }
        if self.factories.contains_key(name) {
            return Err(LoadError::Duplicate(name.to_string()));
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve and construct one plugin.
    ///
    /// Errors are returned to the caller. A plugin without defaults only
    /// draws a warning.
    pub fn load_plugin(&self, name: &str) -> Result<Box<dyn Plugin>, LoadError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        let plugin = factory()?;
        if plugin.defaults().is_none() {
            warn!(plugin = %name, "Plugin {} does not define config defaults", name);
        }
        Ok(plugin)
    }

    /// Load and configure every plugin named in `plugins`, in order.
    ///
    /// A plugin that fails to load is logged and skipped; the rest still
    /// load.
    pub fn load_plugins(&self, plugins: &Map<String, Value>) -> Vec<PluginHandle> {
        let mut loaded = Vec::with_capacity(plugins.len());
        for (name, overrides) in plugins {
            match self.load_plugin(name) {
                Ok(plugin) => {
                    let defaults = plugin.defaults().unwrap_or_else(|| Value::Object(Map::new()));
                    let config = merge_config(Some(&defaults), overrides);
                    loaded.push(PluginHandle::new(plugin, config));
                }
                Err(e) => {
                    debug!(plugin = %name, error = %e, "skipping plugin");
                }
            }
        }
        loaded
    }
}

fn builtin_logger() -> Result<Box<dyn Plugin>, LoadError> {
    Ok(Box::new(super::Logger::new()))
}

fn builtin_dice() -> Result<Box<dyn Plugin>, LoadError> {
    Ok(Box::new(super::Dice::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use serde_json::json;

    struct Stub {
        name: &'static str,
        defaults: Option<Value>,
    }

    impl Plugin for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn defaults(&self) -> Option<Value> {
            self.defaults.clone()
        }
        fn begin(&mut self, _config: &Value, _bus: &mut EventBus) {}
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry
            .register("greeter", || {
                Ok(Box::new(Stub {
                    name: "greeter",
                    defaults: Some(json!({ "text": "hello", "channels": ["#a"] })),
                }))
            })
            .unwrap();
        registry
            .register("bare", || {
                Ok(Box::new(Stub {
                    name: "bare",
                    defaults: None,
                }))
            })
            .unwrap();
        registry
            .register("bad", || Err(LoadError::init("bad", "exploded")))
            .unwrap();
        registry
    }

    fn plugins(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn load_unknown_plugin_fails() {
        let err = registry().load_plugin("weather").err().unwrap();
        assert!(matches!(err, LoadError::NotFound(name) if name == "weather"));
    }

    #[test]
    fn load_failing_factory_propagates() {
        let err = registry().load_plugin("bad").err().unwrap();
        assert!(matches!(err, LoadError::Init { .. }));
    }

    #[test]
    fn missing_defaults_still_loads() {
        let plugin = registry().load_plugin("bare").unwrap();
        assert_eq!(plugin.name(), "bare");
    }

    #[test]
    fn register_rejects_duplicates_and_empty_names() {
        let mut registry = registry();
        let dup = registry.register("bare", || Err(LoadError::init("x", "y")));
        assert!(matches!(dup, Err(LoadError::Duplicate(_))));
        let empty = registry.register("", || Err(LoadError::init("x", "y")));
        assert!(matches!(empty, Err(LoadError::EmptyName)));
    }

    #[test]
    fn batch_skips_broken_plugins() {
        let loaded = registry().load_plugins(&plugins(json!({
            "bad": {},
            "greeter": {},
            "missing": {},
        })));
        let names: Vec<&str> = loaded.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["greeter"]);
    }

    #[test]
    fn batch_keeps_declaration_order() {
        let loaded = registry().load_plugins(&plugins(json!({
            "greeter": {},
            "bare": {},
        })));
        let names: Vec<&str> = loaded.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["greeter", "bare"]);
    }

    #[test]
    fn batch_merges_overrides_onto_defaults() {
        let loaded = registry().load_plugins(&plugins(json!({
            "greeter": { "channels": ["#b"] },
        })));
        assert_eq!(
            loaded[0].config(),
            &json!({ "text": "hello", "channels": ["#b"] })
        );
    }

    #[test]
    fn batch_without_defaults_uses_overrides() {
        let loaded = registry().load_plugins(&plugins(json!({
            "bare": { "verbose": true },
        })));
        assert_eq!(loaded[0].config(), &json!({ "verbose": true }));
    }

    #[test]
    fn builtins_are_registered() {
        let registry = PluginRegistry::with_builtins();
        assert!(registry.contains("logger"));
        assert!(registry.contains("dice"));
    }
}
