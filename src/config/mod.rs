//! Configuration loading and plugin config merging.
//!
//! - [`types`]: the bot's JSON config file and its loader
//! - [`merge`]: deep merge of plugin defaults with user overrides

mod merge;
mod types;

pub use merge::merge_config;
pub use types::{Config, ConfigError, ConfigLoader, FileReader, strip_bom};
