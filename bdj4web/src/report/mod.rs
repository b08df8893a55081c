pub mod aggregate;
pub mod geo;
pub mod parser;
pub mod record;
pub mod render;

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::WebError;
use crate::filesys::file::File;
use crate::report::geo::{CountryResolver, GeoLocator};

pub use aggregate::{aggregate, compare_versions, Report, VersionSummary};
pub use record::InstallRecord;

/// Turns the installer telemetry log into the HTML install report
#[derive(Clone)]
pub struct ReportRenderer {
    log_file: File,
    geo: Arc<dyn GeoLocator>,
}

impl ReportRenderer {
    pub fn new(log_file: File, geo: Arc<dyn GeoLocator>) -> Self {
        Self { log_file, geo }
    }

    /// Parse the log, resolve countries and aggregate. A missing log is an
    /// empty report.
    pub async fn build(&self) -> Result<Report, WebError> {
        let Some(bytes) = self.log_file.read_optional().await? else {
            debug!(
                "Telemetry log {} not found, rendering empty report",
                self.log_file.path().display()
            );
            return Ok(Report::default());
        };

        let text = String::from_utf8_lossy(&bytes);
        let mut records = parser::parse_log(&text);

        let mut resolver = CountryResolver::new(self.geo.as_ref());
        for record in records.iter_mut() {
            record.country = resolver.resolve(record.ip.as_deref()).await;
        }

        info!("Building install report from {} records", records.len());
        Ok(aggregate(&records))
    }

    pub async fn render(&self) -> Result<String, WebError> {
        let report = self.build().await?;
        Ok(render::render_html(&report))
    }
}
