pub mod log_sink;
pub mod smtp;

pub use log_sink::LogNotificationSink;
pub use smtp::SmtpNotificationSink;
