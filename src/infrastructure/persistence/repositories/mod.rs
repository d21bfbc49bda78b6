mod hourly_quote_repository;
mod position_repository;
mod price_history_repository;
mod trend_repository;
mod user_repository;

pub use hourly_quote_repository::SqliteHourlyQuoteRepository;
pub use position_repository::SqlitePositionRepository;
pub use price_history_repository::SqlitePriceHistoryRepository;
pub use trend_repository::SqliteTrendRepository;
pub use user_repository::SqliteUserRepository;
