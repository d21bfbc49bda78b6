use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the external quote/history provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {reason}")]
    Http { reason: String },

    #[error("Provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("Expected JSON content-type, got {content_type}")]
    ContentType { content_type: String },

    #[error("Failed to decode provider response: {reason}")]
    Decode { reason: String },

    #[error("Invalid provider data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Invalid symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("Provider timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },
}

/// Errors raised while delivering an alert
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid mail address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build message: {reason}")]
    Build { reason: String },

    #[error("Mail transport failed: {reason}")]
    Transport { reason: String },
}

/// Errors raised when user input fails validation at the tracker boundary
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Invalid symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("User must have exactly one primary email, found {count}")]
    PrimaryEmail { count: usize },

    #[error("{field} must not be negative, got {value}")]
    NegativePercent { field: &'static str, value: Decimal },

    #[error("{field} must be positive, got {value}")]
    NonPositivePrice { field: &'static str, value: Decimal },

    #[error("{field} must be at most {max}, got {value}")]
    AboveLimit {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },

    #[error("Unknown user {user_id}")]
    UnknownUser { user_id: i64 },

    #[error("Unknown position {position_id}")]
    UnknownPosition { position_id: i64 },
}
