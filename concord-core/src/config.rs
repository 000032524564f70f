//! Peer configuration, layered from a config file and environment
//! variables (`CONCORD_*`), following the same `config`-crate convention
//! the rest of the workspace uses.

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub keepalive: KeepaliveConfig,
    pub logging: LoggingConfig,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            tls: TlsConfig::default(),
            keepalive: KeepaliveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl std::fmt::Debug for PeerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerConfig")
            .field("server", &self.server)
            .field("tls", &self.tls)
            .field("keepalive", &self.keepalive)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub resource_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7443".to_string(),
            resource_url: crate::FEDERATED_SERVICE_RESOURCE_URL.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub ca_path: Option<String>,
    /// Skip server-certificate verification. Test mode only; never enable
    /// in a deployment that crosses a trust boundary.
    pub insecure_skip_verify: bool,
    /// How often the certificate keypair is reloaded from disk.
    pub reload_period_secs: u64,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            ca_path: None,
            insecure_skip_verify: false,
            reload_period_secs: 600,
        }
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path.as_ref().map(|_| "<redacted>"))
            .field("ca_path", &self.ca_path)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("reload_period_secs", &self.reload_period_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Server: minimum interval a client is allowed to ping at.
    pub server_min_ping_interval_secs: u64,
    /// Whether the server accepts keepalive pings with no active stream.
    /// Recorded for parity with the protocol's keepalive policy; `tonic`'s
    /// server builder has no direct knob for it (unlike the client side's
    /// `keep_alive_while_idle`), so this is documentation until that lands.
    pub server_permit_without_stream: bool,
    /// Client: ping interval and timeout.
    pub client_ping_interval_secs: u64,
    pub client_ping_timeout_secs: u64,
    pub client_permit_without_stream: bool,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            server_min_ping_interval_secs: 40,
            server_permit_without_stream: true,
            client_ping_interval_secs: 20,
            client_ping_timeout_secs: 20,
            client_permit_without_stream: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl PeerConfig {
    /// Load configuration with priority: environment variables (highest),
    /// config file, then defaults.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, config::FileFormat::Yaml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CONCORD")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::load(None).unwrap_or_default()
    }
}
