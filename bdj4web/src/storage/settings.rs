//! Settings file management

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

use crate::authn::shared_key::SharedKey;
use crate::errors::WebError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Service settings, read from `settings.json`
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub log_json: bool,

    /// Also write daily-rolling log files here
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Base directory for marquee files and uploads
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Install telemetry log read by the report
    #[serde(default)]
    pub telemetry_log: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Shared keys per endpoint
    #[serde(default)]
    pub keys: KeySettings,

    /// IP to country lookup for the install report
    #[serde(default)]
    pub geolocation: GeolocationSettings,

    /// Support notification mail
    #[serde(default)]
    pub notify: NotifySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            data_dir: None,
            telemetry_log: None,
            server: ServerSettings::default(),
            keys: KeySettings::default(),
            geolocation: GeolocationSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `file`; a missing file yields the defaults
    pub async fn load(file: &File) -> Result<Settings, WebError> {
        match file.read_json::<Settings>().await {
            Ok(settings) => Ok(settings),
            Err(e) if e.is_not_found() => Ok(Settings::default()),
            Err(e) => Err(WebError::ConfigError(format!(
                "unable to read {}: {}",
                file.path().display(),
                e
            ))),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body (uploads included)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Shared keys. An endpoint whose key is not configured rejects keyed requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeySettings {
    #[serde(default)]
    pub marquee: Option<SharedKey>,

    #[serde(default)]
    pub support: Option<SharedKey>,

    #[serde(default)]
    pub test: Option<SharedKey>,
}

/// Geolocation settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_geo_url")]
    pub base_url: String,

    /// Lookup token, kept out of logs
    #[serde(default)]
    pub token: Option<SecretString>,

    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,
}

fn default_geo_url() -> String {
    "https://ipinfo.io".to_string()
}

fn default_geo_timeout() -> u64 {
    5
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_geo_url(),
            token: None,
            timeout_secs: default_geo_timeout(),
        }
    }
}

/// Notification mail settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotifySettings {
    /// Operator address; notifications are only logged when unset
    #[serde(default)]
    pub operator_address: Option<String>,

    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Mailer command reading a full message on stdin
    #[serde(default = "default_sendmail_command")]
    pub sendmail_command: Vec<String>,
}

fn default_from_address() -> String {
    "bdj4web@localhost".to_string()
}

fn default_sendmail_command() -> Vec<String> {
    vec![
        "/usr/sbin/sendmail".to_string(),
        "-t".to_string(),
        "-i".to_string(),
    ]
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            operator_address: None,
            from_address: default_from_address(),
            sendmail_command: default_sendmail_command(),
        }
    }
}
