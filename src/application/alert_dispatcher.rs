use crate::domain::market::calendar::AsOf;
use crate::domain::ports::NotificationSink;
use crate::domain::repositories::PositionRepository;
use crate::domain::signals::alert::AlertMessage;
use crate::domain::signals::evaluator::FiredSignal;
use crate::domain::signals::gate::{GateState, NotificationGate};
use crate::domain::tracking::position::Position;
use crate::domain::tracking::user::User;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of dispatching one position's fired signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn merge(&mut self, other: DispatchSummary) {
        self.delivered += other.delivered;
        self.suppressed += other.suppressed;
        self.failed += other.failed;
    }
}

/// Gates fired signals, delivers the eligible ones and records deliveries.
pub struct AlertDispatcher {
    positions: Arc<dyn PositionRepository>,
    sink: Arc<dyn NotificationSink>,
    from_domain: String,
}

impl AlertDispatcher {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        sink: Arc<dyn NotificationSink>,
        from_domain: impl Into<String>,
    ) -> Self {
        Self {
            positions,
            sink,
            from_domain: from_domain.into(),
        }
    }

    /// A failed delivery leaves the channel eligible for the next pass; only
    /// store errors abort.
    pub async fn dispatch(
        &self,
        position: &mut Position,
        user: &User,
        fired: &[FiredSignal],
        as_of: &AsOf,
    ) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        if fired.is_empty() {
            return Ok(summary);
        }

        let Some(to) = user.primary_email() else {
            warn!("User {} has no primary email, skipping alerts", user.id);
            return Ok(summary);
        };
        let gate = NotificationGate::new(user.notification_cooldown);

        for signal in fired {
            let channel = signal.channel();
            if let GateState::Cooling { until } = gate.check(position, channel, as_of.now) {
                info!(
                    "{} {} for position {} not due until {}",
                    position.symbol, channel, position.id, until
                );
                summary.suppressed += 1;
                continue;
            }

            let message = AlertMessage::compose(signal, to, &self.from_domain);
            match self.sink.send(&message).await {
                Ok(()) => {
                    self.positions
                        .mark_notified(position.id, channel, as_of.now)
                        .await
                        .with_context(|| {
                            format!("Failed to record {} alert for position {}", channel, position.id)
                        })?;
                    gate.record_delivery(position, channel, as_of.now);
                    info!("Sent {:?} to {}", message.subject, to);
                    summary.delivered += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to send {} alert for position {} ({}): {}",
                        channel, position.id, position.symbol, e
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
