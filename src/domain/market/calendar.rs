//! Trading calendar and the per-run `AsOf` context.
//!
//! Every operation that needs "now", "today" or the most recent completed
//! trading day receives an [`AsOf`] value instead of reading the clock, so a
//! whole pass shares one consistent view of time and tests can pin it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// How far before the earliest entry date history is fetched: 42 weeks
/// gives enough trading days for a 200-day average.
pub const HISTORY_LOOKBACK_DAYS: i64 = 42 * 7;

/// Holidays are not modelled; every weekday counts as a trading day.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The last weekday strictly before `date`.
pub fn previous_trading_day(date: NaiveDate) -> NaiveDate {
    let mut day = date - Duration::days(1);
    while is_weekend(day) {
        day -= Duration::days(1);
    }
    day
}

/// First calendar day of interest when backfilling history for an entry date.
pub fn history_start(earliest_entry: NaiveDate) -> NaiveDate {
    earliest_entry - Duration::days(HISTORY_LOOKBACK_DAYS)
}

/// Truncates an instant to the start of its quote bucket.
pub fn truncate_to_bucket(ts: DateTime<Utc>, bucket: Duration) -> DateTime<Utc> {
    let width = bucket.num_seconds().max(1);
    let secs = ts.timestamp();
    let start = secs - secs.rem_euclid(width);
    DateTime::from_timestamp(start, 0).unwrap_or(ts)
}

/// Point-in-time context threaded through a watch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsOf {
    /// Wall-clock instant the pass is evaluated at
    pub now: DateTime<Utc>,
    /// Calendar date in the exchange timezone
    pub today: NaiveDate,
    /// Most recent completed trading day ("yesterday", skipping weekends)
    pub last_trading_date: NaiveDate,
    /// Start of the current quote cache bucket
    pub quote_bucket: DateTime<Utc>,
}

impl AsOf {
    pub fn at(now: DateTime<Utc>, exchange_tz: Tz, bucket: Duration) -> Self {
        let today = now.with_timezone(&exchange_tz).date_naive();
        Self {
            now,
            today,
            last_trading_date: previous_trading_day(today),
            quote_bucket: truncate_to_bucket(now, bucket),
        }
    }

    pub fn now(exchange_tz: Tz, bucket: Duration) -> Self {
        Self::at(Utc::now(), exchange_tz, bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_previous_trading_day_skips_weekends() {
        // 2024-01-08 is a Monday
        assert_eq!(previous_trading_day(date("2024-01-08")), date("2024-01-05"));
        assert_eq!(previous_trading_day(date("2024-01-07")), date("2024-01-05"));
        assert_eq!(previous_trading_day(date("2024-01-06")), date("2024-01-05"));
        assert_eq!(previous_trading_day(date("2024-01-09")), date("2024-01-08"));
    }

    #[test]
    fn test_history_start_is_42_weeks_back() {
        assert_eq!(history_start(date("2024-01-08")), date("2023-03-20"));
    }

    #[test]
    fn test_as_of_uses_exchange_date() {
        // 03:30 UTC on Tuesday is still Monday evening in New York
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 3, 30, 0).unwrap();
        let as_of = AsOf::at(now, chrono_tz::America::New_York, Duration::minutes(60));

        assert_eq!(as_of.today, date("2024-01-08"));
        assert_eq!(as_of.last_trading_date, date("2024-01-05"));
        assert_eq!(
            as_of.quote_bucket,
            Utc.with_ymd_and_hms(2024, 1, 9, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_truncate_to_fifteen_minute_bucket() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 9, 14, 44, 59).unwrap();
        assert_eq!(
            truncate_to_bucket(ts, Duration::minutes(15)),
            Utc.with_ymd_and_hms(2024, 1, 9, 14, 30, 0).unwrap()
        );
    }
}
