//! Application configuration options

use std::time::Duration;

use crate::authn::shared_key::SharedKey;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{GeolocationSettings, NotifySettings, Settings};
use crate::upload::decode::DEFAULT_MAX_DECODED_BYTES;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage layout paths
    pub layout: StorageLayout,

    /// Server configuration
    pub server: ServerOptions,

    /// Endpoint shared keys
    pub keys: KeyOptions,

    /// Upper bound for a decoded upload
    pub max_decoded_bytes: usize,

    /// IP geolocation for the install report
    pub geolocation: GeolocationSettings,

    /// Support notification mail
    pub notify: NotifySettings,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            layout: StorageLayout::default(),
            server: ServerOptions::default(),
            keys: KeyOptions::default(),
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
            geolocation: GeolocationSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl AppOptions {
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            layout,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
                request_timeout: Duration::from_secs(settings.server.request_timeout_secs),
                max_body_bytes: settings.server.max_body_bytes,
            },
            keys: KeyOptions {
                marquee: settings.keys.marquee.clone(),
                support: settings.keys.support.clone(),
                test: settings.keys.test.clone(),
            },
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
            geolocation: settings.geolocation.clone(),
            notify: settings.notify.clone(),
        }
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Shared keys per endpoint; `None` rejects every keyed request
#[derive(Debug, Clone, Default)]
pub struct KeyOptions {
    pub marquee: Option<SharedKey>,
    pub support: Option<SharedKey>,
    pub test: Option<SharedKey>,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Request body limit
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}
