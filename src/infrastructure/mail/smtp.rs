use crate::config::MailEnvConfig;
use crate::domain::errors::NotificationError;
use crate::domain::ports::NotificationSink;
use crate::domain::signals::alert::AlertMessage;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Delivers alerts through a plain SMTP relay.
pub struct SmtpNotificationSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotificationSink {
    pub fn new(config: &MailEnvConfig) -> Self {
        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
                .port(config.smtp_port)
                .build();
        Self { transport }
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address.parse::<Mailbox>().map_err(|e| NotificationError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Builds the MIME message for an alert.
pub fn build_message(message: &AlertMessage) -> Result<Message, NotificationError> {
    Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(message.html_body.clone())
        .map_err(|e| NotificationError::Build {
            reason: e.to_string(),
        })
}

#[async_trait]
impl NotificationSink for SmtpNotificationSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        let email = build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Transport {
                reason: e.to_string(),
            })?;

        info!("Mailed {:?} to {}", message.subject, message.to);
        Ok(())
    }
}
