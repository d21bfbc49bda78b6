//! Shared fixtures: an in-memory store wired to the scripted provider and a
//! recording sink.

#![allow(dead_code)]

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use std::sync::Arc;
use stockwatcher::application::bootstrap::{
    PersistenceBootstrap, PersistenceHandle, ServicesBootstrap, ServicesHandle,
};
use stockwatcher::domain::market::calendar::AsOf;
use stockwatcher::domain::market::price::HistoricalBar;
use stockwatcher::domain::tracking::position::UserId;
use stockwatcher::domain::tracking::user::User;
use stockwatcher::infrastructure::{Database, MockQuoteProvider, RecordingNotificationSink};

pub const FROM_DOMAIN: &str = "stocks.example.com";

pub struct Harness {
    pub persistence: PersistenceHandle,
    pub services: ServicesHandle,
    pub provider: MockQuoteProvider,
    pub sink: RecordingNotificationSink,
}

pub async fn harness() -> Harness {
    let db = Database::in_memory().await.expect("in-memory database");
    let persistence = PersistenceBootstrap::from_database(db);
    let provider = MockQuoteProvider::new();
    let sink = RecordingNotificationSink::new();
    let services = ServicesBootstrap::with_adapters(
        &persistence,
        Arc::new(provider.clone()),
        Arc::new(sink.clone()),
        FROM_DOMAIN,
    );
    Harness {
        persistence,
        services,
        provider,
        sink,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Pass context for an RFC 3339 instant, New York calendar, hourly buckets.
pub fn as_of(instant: &str) -> AsOf {
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339(instant).unwrap().into();
    AsOf::at(now, chrono_tz::America::New_York, Duration::minutes(60))
}

/// Weekdays from `from` through `to`, inclusive.
pub fn weekdays(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

pub fn bar(date: NaiveDate, close: Decimal) -> HistoricalBar {
    HistoricalBar {
        date,
        open: close,
        close,
        high: close,
        low: close,
        volume: 1_000,
    }
}

/// One bar per date; closes start at `first` and step by `step`.
pub fn ramp_bars(dates: &[NaiveDate], first: Decimal, step: Decimal) -> Vec<HistoricalBar> {
    dates
        .iter()
        .enumerate()
        .map(|(i, d)| bar(*d, first + step * Decimal::from(i as i64)))
        .collect()
}

pub async fn add_user(h: &Harness, email: &str, cooldown: Duration) -> UserId {
    let user = User::new("Test User", email, cooldown);
    h.services.tracker.add_user(&user).await.unwrap()
}
