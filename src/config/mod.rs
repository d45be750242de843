//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`ONEM2M_*`), layered over the file
//!
//! ```toml
//! [cse]
//! host = "localhost"
//! port = 8100
//! base_resource = "PN_CSE"
//!
//! [client]
//! timeout_secs = 30
//! originator = "C1234"
//!
//! [listener]
//! port = 8080
//! paths = ["/", "/notify"]
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OneM2MError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// CSE connection settings
    #[serde(default)]
    pub cse: CseConfig,

    /// Request client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Notification listener settings
    #[serde(default)]
    pub listener: ListenerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            OneM2MError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| OneM2MError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Defaults, then the file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/onem2m/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("onem2m").join("config.toml"))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        // CSE settings
        if let Some(host) = var("ONEM2M_CSE_HOST") {
            self.cse.host = host;
        }
        if let Some(port) = var("ONEM2M_CSE_PORT").and_then(|p| p.parse().ok()) {
            self.cse.port = port;
        }
        if let Some(resource) = var("ONEM2M_CSE_RESOURCE") {
            self.cse.base_resource = resource;
        }
        if let Some(scheme) = var("ONEM2M_CSE_SCHEME") {
            self.cse.scheme = scheme;
        }

        // Client settings
        if let Some(originator) = var("ONEM2M_ORIGINATOR") {
            self.client.originator = Some(originator);
        }
        if let Some(timeout) = var("ONEM2M_TIMEOUT_SECS").and_then(|t| t.parse().ok()) {
            self.client.timeout_secs = timeout;
        }

        // Listener settings
        if let Some(host) = var("ONEM2M_LISTENER_HOST") {
            self.listener.host = host;
        }
        if let Some(port) = var("ONEM2M_LISTENER_PORT").and_then(|p| p.parse().ok()) {
            self.listener.port = port;
        }
    }
}

/// CSE connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CseConfig {
    /// URI scheme (`http` or `https`)
    pub scheme: String,

    /// CSE host name
    pub host: String,

    /// CSE port
    pub port: u16,

    /// CSE base resource name, e.g. `PN_CSE`
    pub base_resource: String,
}

impl Default for CseConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8100,
            base_resource: "PN_CSE".to_string(),
        }
    }
}

impl CseConfig {
    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Request client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Default originator (`fr`)
    pub originator: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            originator: None,
        }
    }
}

impl ClientConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Notification listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// Paths accepting notifications
    pub paths: Vec<String>,

    /// Maximum notification body size in bytes
    pub max_body_size: usize,

    /// How long `wait_ready` waits for the socket by default
    pub ready_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            paths: vec!["/".to_string(), "/notify".to_string()],
            max_body_size: 1024 * 1024, // 1 MiB
            ready_timeout_secs: 5,
        }
    }
}

impl ListenerConfig {
    /// Listener on `127.0.0.1:port`
    pub fn localhost(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            ..Self::default()
        }
    }

    /// Resolve the socket address to bind
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                OneM2MError::Config(format!("{}:{} resolves to no address", self.host, self.port))
            })
    }

    /// Default readiness timeout
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}
