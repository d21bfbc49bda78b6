pub mod core;
pub mod mail;
pub mod mock;
pub mod persistence;
pub mod yql;

pub use mail::{LogNotificationSink, SmtpNotificationSink};
pub use mock::{MockQuoteProvider, RecordingNotificationSink};
pub use persistence::Database;
pub use yql::YqlQuoteProvider;
