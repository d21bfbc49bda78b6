use serde::{Deserialize, Serialize};
use std::fmt;

/// The six independent notification channels of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalChannel {
    TrailingStop,
    BuyStop,
    SellStop,
    Rise,
    Fall,
    BullBear,
}

impl SignalChannel {
    pub const ALL: [SignalChannel; 6] = [
        SignalChannel::TrailingStop,
        SignalChannel::BuyStop,
        SignalChannel::SellStop,
        SignalChannel::Rise,
        SignalChannel::Fall,
        SignalChannel::BullBear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalChannel::TrailingStop => "trailing_stop",
            SignalChannel::BuyStop => "buy_stop",
            SignalChannel::SellStop => "sell_stop",
            SignalChannel::Rise => "rise",
            SignalChannel::Fall => "fall",
            SignalChannel::BullBear => "bull_bear",
        }
    }

    /// Column holding the channel's last delivery time in the positions table.
    pub fn last_notified_column(&self) -> &'static str {
        match self {
            SignalChannel::TrailingStop => "last_notified_trailing_stop",
            SignalChannel::BuyStop => "last_notified_buy_stop",
            SignalChannel::SellStop => "last_notified_sell_stop",
            SignalChannel::Rise => "last_notified_rise",
            SignalChannel::Fall => "last_notified_fall",
            SignalChannel::BullBear => "last_notified_bull_bear",
        }
    }
}

impl fmt::Display for SignalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_column_follows_channel_name() {
        for channel in SignalChannel::ALL {
            assert_eq!(
                channel.last_notified_column(),
                format!("last_notified_{}", channel)
            );
        }
    }
}
