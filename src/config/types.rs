//! Core configuration types and loading.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Bot configuration, read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server host, optionally with `:port`.
    pub server: String,
    /// Server port when `server` carries none.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Nickname the bot registers with.
    pub nick: String,
    /// Channels joined after registration.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Server password (PASS), if required.
    #[serde(default)]
    pub password: Option<String>,
    /// Username for USER; defaults to the nick.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Realname for USER; defaults to the nick.
    #[serde(default)]
    pub real_name: Option<String>,
    /// Plugin name to that plugin's override config, in declaration order.
    #[serde(default)]
    pub plugins: Map<String, Value>,
}

fn default_port() -> u16 {
    6667
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::default().load(path)
    }

    /// Parse configuration from raw file contents.
    pub fn from_slice(contents: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(strip_bom(contents))?)
    }

    /// `host:port` to dial, preferring a port embedded in `server`.
    pub fn address(&self) -> (String, u16) {
        if let Some((host, port)) = self.server.rsplit_once(':') {
            if let Ok(port) = port.parse() {
                return (host.to_string(), port);
            }
        }
        (self.server.clone(), self.port)
    }

    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.nick)
    }

    pub fn real_name(&self) -> &str {
        self.real_name.as_deref().unwrap_or(&self.nick)
    }
}

/// Reads a whole file. Swappable so tests never touch the disk.
pub type FileReader = fn(&Path) -> io::Result<Vec<u8>>;

/// Reads JSON documents through an injected [`FileReader`].
#[derive(Clone, Copy)]
pub struct ConfigLoader {
    read_file: FileReader,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            read_file: read_from_disk,
        }
    }
}

fn read_from_disk(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

impl ConfigLoader {
    pub fn with_reader(read_file: FileReader) -> Self {
        Self { read_file }
    }

    /// Load the bot configuration.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Config, ConfigError> {
        self.read_json(path)
    }

    /// Read and parse any JSON document, ignoring a leading UTF-8 BOM.
    pub fn read_json<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let contents = (self.read_file)(path.as_ref())?;
        Ok(serde_json::from_slice(strip_bom(&contents))?)
    }
}

/// Drop a UTF-8 byte order mark, if present.
pub fn strip_bom(contents: &[u8]) -> &[u8] {
    contents.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(contents)
}
