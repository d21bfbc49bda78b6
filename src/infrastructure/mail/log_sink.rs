use crate::domain::errors::NotificationError;
use crate::domain::ports::NotificationSink;
use crate::domain::signals::alert::AlertMessage;
use async_trait::async_trait;
use tracing::info;

/// Dry-run sink: logs the alert and reports it delivered.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        info!(
            from = %message.from,
            to = %message.to,
            "[dry-run] {}",
            message.subject
        );
        Ok(())
    }
}
