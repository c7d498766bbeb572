//! Plugins and their lifecycle.
//!
//! A plugin is anything implementing [`Plugin`]: it may declare config
//! defaults, must subscribe itself to the bus in [`Plugin::begin`], and may
//! clean up in [`Plugin::stop`]. Plugins are found by name in a
//! [`PluginRegistry`], which also merges each plugin's defaults with the
//! user's overrides.

pub mod commands;
pub mod dice;
pub mod logger;
mod registry;

pub use commands::{CommandDispatcher, CommandHandler};
pub use dice::Dice;
pub use logger::Logger;
pub use registry::{PluginFactory, PluginRegistry};

use crate::bus::EventBus;
use serde_json::Value;
use tracing::{info, warn};

/// The plugin capability.
pub trait Plugin: Send {
    /// Registry name.
    fn name(&self) -> &str;

    /// Base configuration merged under the user's overrides.
    ///
    /// `None` means the plugin declares no schema; it still loads.
    fn defaults(&self) -> Option<Value> {
        None
    }

    /// Subscribe to the bus. Called exactly once, at startup.
    fn begin(&mut self, config: &Value, bus: &mut EventBus);

    /// Called at most once, at shutdown.
    fn stop(&mut self) {}
}

/// Where a plugin is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Loaded,
    Running,
    Stopped,
}

/// A configured plugin, ready to begin.
pub struct PluginHandle {
    name: String,
    config: Value,
    plugin: Box<dyn Plugin>,
    state: PluginState,
}

impl PluginHandle {
    /// Wrap a plugin with its already-merged config.
    pub fn new(plugin: Box<dyn Plugin>, config: Value) -> Self {
        Self {
            name: plugin.name().to_string(),
            config,
            plugin,
            state: PluginState::Loaded,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The merged configuration.
    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Start the plugin. Further calls are ignored.
    pub fn begin(&mut self, bus: &mut EventBus) {
        if self.state != PluginState::Loaded {
            warn!(plugin = %self.name, state = ?self.state, "begin called twice, ignoring");
            return;
        }
        self.plugin.begin(&self.config, bus);
        self.state = PluginState::Running;
        info!(plugin = %self.name, "plugin started");
    }

    /// Stop a running plugin. Plugins that never began are left alone.
    pub fn stop(&mut self) {
        if self.state != PluginState::Running {
            return;
        }
        self.plugin.stop();
        self.state = PluginState::Stopped;
        info!(plugin = %self.name, "plugin stopped");
    }
}

impl std::fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}
