mod common;

use common::{as_of, date, harness, ramp_bars, weekdays};
use rust_decimal_macros::dec;
use tokio_test::assert_ok;

/// The 201 most recent weekdays up to 2014-01-14.
fn last_201_days() -> Vec<chrono::NaiveDate> {
    let all = weekdays(date("2013-01-01"), date("2014-01-14"));
    all[all.len() - 201..].to_vec()
}

#[tokio::test]
async fn test_trends_from_201_stored_closes() {
    let h = harness().await;
    let days = last_201_days();
    h.provider
        .set_history("MSFT", ramp_bars(&days, dec!(100.00), dec!(0.10)))
        .await;

    let pass = as_of("2014-01-15T15:00:00Z");
    assert_eq!(
        assert_ok!(h.services.history.record_history("MSFT", &pass).await),
        201
    );
    assert_eq!(assert_ok!(h.services.trends.record_trends("MSFT").await), 1);

    let trends = h
        .persistence
        .trend_repository
        .find_recent("MSFT", 10)
        .await
        .unwrap();
    assert_eq!(trends.len(), 1);
    let latest = &trends[0];
    assert_eq!(latest.trade_day_index, 201);
    assert_eq!(latest.date, date("2014-01-14"));
    assert!((latest.avg50 - 117.55).abs() < 1e-9);
    assert!((latest.avg200 - 110.05).abs() < 1e-9);
    assert!((latest.sma_percent - (117.55 / 110.05 - 1.0) * 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_short_history_has_no_trends() {
    let h = harness().await;
    let days = last_201_days();
    h.provider
        .set_history("MSFT", ramp_bars(&days[1..], dec!(100.00), dec!(0.10)))
        .await;

    let pass = as_of("2014-01-15T15:00:00Z");
    assert_eq!(
        assert_ok!(h.services.history.record_history("MSFT", &pass).await),
        200
    );
    assert_eq!(assert_ok!(h.services.trends.record_trends("MSFT").await), 0);
}

#[tokio::test]
async fn test_recompute_replaces_rows_after_new_bar() {
    let h = harness().await;
    let mut days = last_201_days();
    days.push(date("2014-01-15"));
    h.provider
        .set_history("MSFT", ramp_bars(&days, dec!(100.00), dec!(0.10)))
        .await;

    assert_ok!(
        h.services
            .history
            .record_history("MSFT", &as_of("2014-01-15T15:00:00Z"))
            .await
    );
    assert_ok!(h.services.trends.record_trends("MSFT").await);
    assert_ok!(
        h.services
            .history
            .record_history("MSFT", &as_of("2014-01-16T15:00:00Z"))
            .await
    );
    assert_eq!(assert_ok!(h.services.trends.record_trends("MSFT").await), 2);

    let recent = h
        .persistence
        .trend_repository
        .find_recent("MSFT", 2)
        .await
        .unwrap();
    assert_eq!(recent[0].trade_day_index, 202);
    assert_eq!(recent[1].trade_day_index, 201);
    // closes 115.20 ..= 120.10
    assert!((recent[0].avg50 - 117.65).abs() < 1e-9);
}
