// Market data domain
pub mod calendar;
pub mod price;
