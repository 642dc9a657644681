use async_trait::async_trait;
use qg_core::config::NotificationConfig;
use qg_core::types::{ChangeUnit, PipelineRun};
use tracing::{debug, info};

/// Receives the result of every processed unit.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, unit: &ChangeUnit, run: &PipelineRun);
}

/// Logs a notification line for each enabled channel.
///
/// Delivery to the channels themselves is provided by other implementations.
pub struct LogNotifier {
    channels: NotificationConfig,
}

impl LogNotifier {
    pub fn new(channels: NotificationConfig) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, unit: &ChangeUnit, run: &PipelineRun) {
        if !self.channels.any_enabled() {
            debug!(unit = unit.number, "notifications disabled");
            return;
        }
        info!(
            unit = unit.number,
            outcome = ?run.outcome,
            failed_checks = run.failed_checks().count(),
            slack = self.channels.slack,
            email = self.channels.email,
            "notification"
        );
    }
}
