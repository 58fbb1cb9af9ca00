//! homekeep configuration (`~/.config/homekeep/config.toml`).
//!
//! Every section is optional; a missing file yields the defaults. Command-line
//! flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hk_core::StampZone;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::paths;

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_INTERVAL_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DASHBOARD_LIMIT: usize = 50;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// `[server]`: HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

/// `[storage]`: file locations. Unset paths resolve under the state dir.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_log_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn items_path(&self) -> PathBuf {
        self.items_file
            .clone()
            .unwrap_or_else(|| paths::state_dir().join(paths::ITEMS_FILE_NAME))
    }

    pub fn pool_log_path(&self) -> PathBuf {
        self.pool_log_file
            .clone()
            .unwrap_or_else(|| paths::state_dir().join(paths::POOL_LOG_FILE_NAME))
    }
}

/// `[pool]`: sensor polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Device status endpoint. The poller is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for the failure backoff. Unset keeps the fixed interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_max_secs: Option<u64>,
    /// Number of snapshots shown on the pool dashboard.
    #[serde(default = "default_dashboard_limit")]
    pub dashboard_limit: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            status_url: None,
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            backoff_max_secs: None,
            dashboard_limit: default_dashboard_limit(),
        }
    }
}

impl PoolConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_max(&self) -> Option<Duration> {
        self.backoff_max_secs.map(Duration::from_secs)
    }
}

/// `[time]`: zone used to stamp entries and snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeConfig {
    /// `"Europe/Berlin"`, `"+01:00"`, `"UTC"` or `"local"`. Defaults to the
    /// host's local zone, resolved for each timestamp.
    #[serde(default, alias = "utc_offset", skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl TimeConfig {
    pub fn zone(&self) -> Result<StampZone> {
        match self.zone.as_deref() {
            Some(value) => StampZone::parse(value).map_err(anyhow::Error::msg),
            None => Ok(StampZone::Local),
        }
    }
}

/// `[log]`: tracing output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily-rotated file here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_request_body_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BODY_BYTES
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_dashboard_limit() -> usize {
    DEFAULT_DASHBOARD_LIMIT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl HomeConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used and a missing file yields `Default`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match paths::default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                bail!("Config file not found: {}", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.interval_secs == 0 {
            bail!("pool.interval_secs must be greater than zero");
        }
        if self.pool.timeout_secs == 0 {
            bail!("pool.timeout_secs must be greater than zero");
        }
        if let Some(max) = self.pool.backoff_max_secs
            && max < self.pool.interval_secs
        {
            bail!(
                "pool.backoff_max_secs ({max}) must not be smaller than pool.interval_secs ({})",
                self.pool.interval_secs
            );
        }
        if let Some(url) = self.pool.status_url.as_deref() {
            validate_status_url(url)?;
        }
        self.time.zone().context("Invalid time.zone")?;
        Ok(())
    }

    /// Commented TOML template written by `homekeep config init`.
    pub fn default_template() -> String {
        r#"# homekeep configuration
# Location: ~/.config/homekeep/config.toml

[server]
bind = "0.0.0.0"
port = 5000
# max_request_body_bytes = 1048576

[storage]
# items_file = "/var/lib/homekeep/pending_items.json"
# pool_log_file = "/var/lib/homekeep/pool_log.jsonl"

[pool]
# Sensor status endpoint. Polling is disabled while this is unset.
# status_url = "http://192.168.1.50/status"
interval_secs = 30
timeout_secs = 5
# Double the delay after each consecutive failure, up to this many seconds.
# backoff_max_secs = 300
dashboard_limit = 50

[time]
# Zone used to stamp entries: an IANA name, a fixed offset or "local".
# zone = "Europe/Berlin"

[log]
level = "info"
# dir = "/var/log/homekeep"
"#
        .to_string()
    }

    /// Write the default template, refusing to overwrite an existing file.
    /// Returns the path written.
    pub fn save_default_template(path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => paths::default_config_path()
                .context("Failed to determine config directory")?,
        };
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, Self::default_template())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(path)
    }
}

fn validate_status_url(url: &str) -> Result<()> {
    let parsed =
        Url::parse(url).with_context(|| format!("pool.status_url '{url}' is not a valid URL"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => bail!("pool.status_url: unsupported URL scheme '{other}://'"),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        bail!("pool.status_url '{url}' has no host");
    }
    Ok(())
}
