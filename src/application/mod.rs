// Wiring
pub mod bootstrap;

// Per-symbol market data
pub mod history_service;
pub mod quote_cache;
pub mod trend_service;

// Users, positions and alerts
pub mod alert_dispatcher;
pub mod position_tracker;

// Scheduled batch run
pub mod watch_pass;
