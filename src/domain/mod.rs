// Prices, trends, quotes and the trading calendar
pub mod market;

// Users and their positions
pub mod tracking;

// Signal evaluation and notification gating
pub mod signals;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
