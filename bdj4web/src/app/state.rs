//! Application state management

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::WebError;
use crate::http::client::HttpClient;
use crate::marquee::MarqueeStore;
use crate::report::geo::{DisabledLocator, GeoLocator, IpInfoLocator};
use crate::report::ReportRenderer;
use crate::server::state::ServerState;
use crate::storage::settings::{GeolocationSettings, NotifySettings};
use crate::tester::ConnectivityTester;
use crate::upload::notify::{LogNotifier, Notifier, SendmailNotifier};
use crate::upload::UploadReceiver;

/// Main application state
pub struct AppState {
    pub marquee: Arc<MarqueeStore>,
    pub uploads: Arc<UploadReceiver>,
    pub tester: Arc<ConnectivityTester>,
    pub report: Arc<ReportRenderer>,
}

impl AppState {
    /// Initialize application state with the configured collaborators
    pub async fn init(options: &AppOptions) -> Result<Self, WebError> {
        let notifier = build_notifier(&options.notify);
        let geo = build_geo_locator(&options.geolocation)?;
        Self::with_collaborators(options, notifier, geo).await
    }

    /// Initialize application state with explicit notifier and geolocator
    pub async fn with_collaborators(
        options: &AppOptions,
        notifier: Arc<dyn Notifier>,
        geo: Arc<dyn GeoLocator>,
    ) -> Result<Self, WebError> {
        info!("Initializing application state...");

        let layout = &options.layout;
        layout.setup().await?;

        let marquee = Arc::new(MarqueeStore::new(
            layout.marquee_dir(),
            options.keys.marquee.clone(),
        ));
        let uploads = Arc::new(UploadReceiver::new(
            layout.uploads_dir(),
            options.keys.support.clone(),
            notifier,
            options.max_decoded_bytes,
        ));
        let tester = Arc::new(ConnectivityTester::new(
            layout.test_uploads_dir(),
            options.keys.test.clone(),
            options.max_decoded_bytes,
        ));
        let report = Arc::new(ReportRenderer::new(layout.telemetry_log_file(), geo));

        Ok(Self {
            marquee,
            uploads,
            tester,
            report,
        })
    }

    pub fn server_state(&self) -> ServerState {
        ServerState::new(
            self.marquee.clone(),
            self.uploads.clone(),
            self.tester.clone(),
            self.report.clone(),
        )
    }
}

/// Sendmail when an operator address is configured, log-only otherwise
pub fn build_notifier(settings: &NotifySettings) -> Arc<dyn Notifier> {
    match &settings.operator_address {
        Some(to) if !to.trim().is_empty() => Arc::new(SendmailNotifier::new(
            settings.sendmail_command.clone(),
            settings.from_address.clone(),
            to.trim(),
        )),
        _ => Arc::new(LogNotifier),
    }
}

pub fn build_geo_locator(settings: &GeolocationSettings) -> Result<Arc<dyn GeoLocator>, WebError> {
    if !settings.enabled {
        return Ok(Arc::new(DisabledLocator));
    }
    let client = HttpClient::new(
        &settings.base_url,
        Duration::from_secs(settings.timeout_secs),
    )?;
    Ok(Arc::new(IpInfoLocator::new(client, settings.token.clone())))
}
