//! TOML-based configuration for the controller.
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults (every field is optional).
//! 2. The TOML file given by `--config` (default `app.toml`).  A missing
//!    file is not an error.
//! 3. Environment overrides: `WS_URL` and `PDF_DIR`.
//!
//! Command-line flags (`--ws-url`, `--http-port`) are applied on top of this
//! by `main`.
//!
//! ```toml
//! [network]
//! ws_url = "ws://127.0.0.1:6790"
//! reconnect_base_s = 0.5
//! reconnect_max_s = 15.0
//! connect_timeout_s = 10.0
//!
//! [http]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origin = "http://127.0.0.1:8080"
//!
//! [pdf]
//! dir = "./pdf_for_submission"
//! pattern = "*.pdf"
//! wait_window_s = 5.0
//! watch = false
//!
//! [storage]
//! user_data_file = "user_data.json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a partial file (or none at
//! all) still yields a complete [`AppConfig`].

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use transcribe_core::BackoffPolicy;

use crate::application::pdf_submission::{FilePattern, PdfSubmitterConfig, DEFAULT_SCAN_INTERVAL};

/// Environment variable overriding `network.ws_url`.
pub const ENV_WS_URL: &str = "WS_URL";
/// Environment variable overriding `pdf.dir`.
pub const ENV_PDF_DIR: &str = "PDF_DIR";

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is syntactically valid but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the transcription server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// First reconnect delay in seconds.
    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_s: f64,
    /// Upper bound for the reconnect delay in seconds.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_s: f64,
    /// Limit for a single connection attempt in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_s: f64,
}

/// HTTP trigger endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Origin allowed by CORS (the browser front end).
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

/// PDF submission folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_dir")]
    pub dir: PathBuf,
    /// Shell-style file name pattern (`*` and `?`).
    #[serde(default = "default_pdf_pattern")]
    pub pattern: String,
    /// How long `check-folder` waits for a file, in seconds.
    #[serde(default = "default_wait_window")]
    pub wait_window_s: f64,
    /// Submit new files automatically as they appear.
    #[serde(default)]
    pub watch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_user_data_file")]
    pub user_data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_ws_url() -> String {
    "ws://127.0.0.1:6790".to_string()
}
fn default_reconnect_base() -> f64 {
    0.5
}
fn default_reconnect_max() -> f64 {
    15.0
}
fn default_connect_timeout() -> f64 {
    10.0
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_cors_origin() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_pdf_dir() -> PathBuf {
    PathBuf::from("./pdf_for_submission")
}
fn default_pdf_pattern() -> String {
    "*.pdf".to_string()
}
fn default_wait_window() -> f64 {
    5.0
}
fn default_user_data_file() -> PathBuf {
    PathBuf::from("user_data.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_base_s: default_reconnect_base(),
            reconnect_max_s: default_reconnect_max(),
            connect_timeout_s: default_connect_timeout(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            dir: default_pdf_dir(),
            pattern: default_pdf_pattern(),
            wait_window_s: default_wait_window(),
            watch: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_data_file: default_user_data_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Derived settings ──────────────────────────────────────────────────────────

impl NetworkConfig {
    /// Reconnect backoff built from the two delay settings.
    ///
    /// Call only on a validated config; invalid floats would panic in
    /// `Duration::from_secs_f64`.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_secs_f64(self.reconnect_base_s),
            Duration::from_secs_f64(self.reconnect_max_s),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_s)
    }
}

impl HttpConfig {
    /// The address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("http.host '{}' is not an IP address", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl PdfConfig {
    pub fn submitter_config(&self) -> PdfSubmitterConfig {
        PdfSubmitterConfig {
            dir: self.dir.clone(),
            pattern: FilePattern::new(&self.pattern),
            wait_window: Duration::from_secs_f64(self.wait_window_s),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Applies `WS_URL` and `PDF_DIR` using `lookup` to read variables.
    ///
    /// `lookup` is `|k| std::env::var(k).ok()` in production; tests pass a
    /// closure over a fixed map.  Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
            self.network.ws_url = url;
        }
        if let Some(dir) = lookup(ENV_PDF_DIR).filter(|v| !v.is_empty()) {
            self.pdf.dir = PathBuf::from(dir);
        }
    }

    /// Checks the values that cannot be expressed in the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;
        if !(net.ws_url.starts_with("ws://") || net.ws_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "network.ws_url '{}' must use the ws:// or wss:// scheme",
                net.ws_url
            )));
        }
        let base = seconds("network.reconnect_base_s", net.reconnect_base_s)?;
        let max = seconds("network.reconnect_max_s", net.reconnect_max_s)?;
        let connect_timeout = seconds("network.connect_timeout_s", net.connect_timeout_s)?;
        seconds("pdf.wait_window_s", self.pdf.wait_window_s)?;
        if base.is_zero() {
            return Err(ConfigError::Invalid(
                "network.reconnect_base_s must be greater than 0".to_string(),
            ));
        }
        if max < base {
            return Err(ConfigError::Invalid(
                "network.reconnect_max_s must be at least network.reconnect_base_s".to_string(),
            ));
        }
        if connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "network.connect_timeout_s must be greater than 0".to_string(),
            ));
        }
        if self.pdf.pattern.is_empty() {
            return Err(ConfigError::Invalid("pdf.pattern must not be empty".to_string()));
        }
        self.http.socket_addr()?;
        Ok(())
    }
}

/// Converts a seconds setting, rejecting negative, non-finite, and
/// out-of-range values.
fn seconds(key: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Invalid(format!(
            "{key} must be a non-negative number of seconds within range, got {value}"
        ))
    })
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
