//! Server state

use std::sync::Arc;

use crate::marquee::MarqueeStore;
use crate::report::ReportRenderer;
use crate::tester::ConnectivityTester;
use crate::upload::UploadReceiver;

/// Server state shared across handlers
pub struct ServerState {
    pub marquee: Arc<MarqueeStore>,
    pub uploads: Arc<UploadReceiver>,
    pub tester: Arc<ConnectivityTester>,
    pub report: Arc<ReportRenderer>,
}

impl ServerState {
    pub fn new(
        marquee: Arc<MarqueeStore>,
        uploads: Arc<UploadReceiver>,
        tester: Arc<ConnectivityTester>,
        report: Arc<ReportRenderer>,
    ) -> Self {
        Self {
            marquee,
            uploads,
            tester,
            report,
        }
    }
}
