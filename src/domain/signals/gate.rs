use crate::domain::signals::channel::SignalChannel;
use crate::domain::tracking::position::Position;
use chrono::{DateTime, Duration, Utc};

/// Delivery state of one channel of one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Eligible,
    Cooling { until: DateTime<Utc> },
}

/// Rate limits alerts per (position, channel) using the owner's cooldown.
#[derive(Debug, Clone, Copy)]
pub struct NotificationGate {
    cooldown: Duration,
}

impl NotificationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn state(&self, last_notified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> GateState {
        match last_notified {
            None => GateState::Eligible,
            Some(last) => {
                let until = last + self.cooldown;
                if now > until {
                    GateState::Eligible
                } else {
                    GateState::Cooling { until }
                }
            }
        }
    }

    pub fn check(&self, position: &Position, channel: SignalChannel, now: DateTime<Utc>) -> GateState {
        self.state(position.last_notified.get(channel), now)
    }

    /// Moves the channel to Cooling. Call only after a confirmed delivery.
    pub fn record_delivery(&self, position: &mut Position, channel: SignalChannel, at: DateTime<Utc>) {
        position.last_notified.set(channel, at);
    }
}
