mod common;

use chrono::{DateTime, Duration, Utc};
use common::{FROM_DOMAIN, Harness, add_user, as_of, bar, date, harness, weekdays};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockwatcher::domain::signals::channel::SignalChannel;
use stockwatcher::domain::tracking::position::{Position, PositionId, SignalSettings};
use tokio_test::{assert_err, assert_ok};

const T0: &str = "2014-01-15T15:00:00Z";

/// Long MSFT with a 20% trailing stop over flat 50.00 closes: stop at 40.00.
async fn watched_msft(h: &Harness, cooldown: Duration, price: Decimal) -> PositionId {
    let user = add_user(h, "ann@example.com", cooldown).await;
    let position = Position::new(user, "MSFT", date("2013-10-01"), dec!(45.00), 100).with_signals(
        SignalSettings {
            trailing_stop_percent: Some(dec!(20)),
            ..Default::default()
        },
    );
    let id = h.services.tracker.add_position(position).await.unwrap();

    let closes = weekdays(date("2012-01-02"), date("2014-01-31"))
        .into_iter()
        .map(|d| bar(d, dec!(50.00)))
        .collect();
    h.provider.set_history("MSFT", closes).await;
    h.provider.set_price("MSFT", price).await;
    id
}

fn at(offset_secs: i64) -> stockwatcher::domain::market::calendar::AsOf {
    let t0: DateTime<Utc> = DateTime::parse_from_rfc3339(T0).unwrap().into();
    as_of(&(t0 + Duration::seconds(offset_secs)).to_rfc3339())
}

async fn last_notified(h: &Harness, id: PositionId) -> Option<DateTime<Utc>> {
    h.services
        .tracker
        .position(id)
        .await
        .unwrap()
        .unwrap()
        .last_notified
        .get(SignalChannel::TrailingStop)
}

#[tokio::test]
async fn test_cooldown_gates_repeat_alerts() {
    let h = harness().await;
    let id = watched_msft(&h, Duration::seconds(60), dec!(39.99)).await;
    let pass = h.services.watch_pass();

    let first = assert_ok!(pass.run(at(0), false).await);
    assert_eq!(first.positions_evaluated, 1);
    assert_eq!(first.signals_fired, 1);
    assert_eq!(first.alerts.delivered, 1);
    assert_eq!(last_notified(&h, id).await, Some(at(0).now));

    let sent = h.sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
    assert_eq!(
        sent[0].from,
        format!("stock-watcher-MSFT <stock.watcher.MSFT@{}>", FROM_DOMAIN)
    );
    assert_eq!(sent[0].subject, "MSFT price fell below trailing stop 40.00");
    assert!(sent[0].html_body.starts_with("<html><body>"));

    let cooling = assert_ok!(pass.run(at(30), false).await);
    assert_eq!(cooling.signals_fired, 1);
    assert_eq!(cooling.alerts.delivered, 0);
    assert_eq!(cooling.alerts.suppressed, 1);
    assert_eq!(h.sink.attempts(), 1);
    assert_eq!(last_notified(&h, id).await, Some(at(0).now));

    let again = assert_ok!(pass.run(at(61), false).await);
    assert_eq!(again.alerts.delivered, 1);
    assert_eq!(h.sink.sent().await.len(), 2);
    assert_eq!(last_notified(&h, id).await, Some(at(61).now));
}

#[tokio::test]
async fn test_cooldown_boundary_is_still_cooling() {
    let h = harness().await;
    watched_msft(&h, Duration::seconds(60), dec!(39.99)).await;
    let pass = h.services.watch_pass();

    assert_ok!(pass.run(at(0), false).await);
    let boundary = assert_ok!(pass.run(at(60), false).await);
    assert_eq!(boundary.alerts.suppressed, 1);
    assert_eq!(h.sink.attempts(), 1);
}

#[tokio::test]
async fn test_price_above_stop_sends_nothing() {
    let h = harness().await;
    let id = watched_msft(&h, Duration::seconds(60), dec!(40.01)).await;

    let report = assert_ok!(h.services.watch_pass().run(at(0), false).await);
    assert_eq!(report.positions_evaluated, 1);
    assert_eq!(report.signals_fired, 0);
    assert_eq!(h.sink.attempts(), 0);
    assert_eq!(last_notified(&h, id).await, None);
}

#[tokio::test]
async fn test_failed_delivery_is_retried_next_pass() {
    let h = harness().await;
    let id = watched_msft(&h, Duration::seconds(60), dec!(39.99)).await;
    let pass = h.services.watch_pass();

    h.sink.fail(true);
    let failed = assert_ok!(pass.run(at(0), false).await);
    assert_eq!(failed.alerts.failed, 1);
    assert_eq!(failed.alerts.delivered, 0);
    assert_eq!(last_notified(&h, id).await, None);

    h.sink.fail(false);
    let retried = assert_ok!(pass.run(at(10), false).await);
    assert_eq!(retried.alerts.delivered, 1);
    assert_eq!(h.sink.attempts(), 2);
    assert_eq!(last_notified(&h, id).await, Some(at(10).now));
}

#[tokio::test]
async fn test_quote_failure_fails_the_pass() {
    let h = harness().await;
    watched_msft(&h, Duration::seconds(60), dec!(39.99)).await;
    h.provider.fail_current(true);

    assert_err!(h.services.watch_pass().run(at(0), false).await);
    assert_eq!(h.sink.attempts(), 0);
}

#[tokio::test]
async fn test_history_failure_evaluates_with_stored_data() {
    let h = harness().await;
    watched_msft(&h, Duration::seconds(60), dec!(39.99)).await;
    let pass = h.services.watch_pass();
    assert_ok!(pass.run(at(0), false).await);

    h.provider.fail_history(true);
    let next_day = at(24 * 3600);
    let report = assert_ok!(pass.run(next_day, false).await);
    assert_eq!(report.failed_symbols, vec!["MSFT".to_string()]);
    assert_eq!(report.positions_evaluated, 1);
    assert_eq!(report.alerts.delivered, 1);
}

#[tokio::test]
async fn test_channels_are_gated_independently() {
    let h = harness().await;
    let user = add_user(&h, "bob@example.com", Duration::hours(24)).await;
    let position = Position::new(user, "MSFT", date("2013-10-01"), dec!(45.00), 100).with_signals(
        SignalSettings {
            trailing_stop_percent: Some(dec!(20)),
            buy_stop_price: Some(dec!(42.00)),
            ..Default::default()
        },
    );
    let id = h.services.tracker.add_position(position).await.unwrap();
    let closes = weekdays(date("2012-01-02"), date("2014-01-31"))
        .into_iter()
        .map(|d| bar(d, dec!(50.00)))
        .collect();
    h.provider.set_history("MSFT", closes).await;
    h.provider.set_price("MSFT", dec!(39.99)).await;

    let report = assert_ok!(h.services.watch_pass().run(at(0), false).await);
    assert_eq!(report.signals_fired, 2);
    assert_eq!(report.alerts.delivered, 2);

    let stored = h.services.tracker.position(id).await.unwrap().unwrap();
    assert!(stored.last_notified.get(SignalChannel::BuyStop).is_some());
    assert!(stored.last_notified.get(SignalChannel::Rise).is_none());
}

#[tokio::test]
async fn test_store_fault_on_one_position_does_not_stop_others() {
    let h = harness().await;
    let user = add_user(&h, "ann@example.com", Duration::seconds(60)).await;
    let closes: Vec<_> = weekdays(date("2012-01-02"), date("2014-01-31"))
        .into_iter()
        .map(|d| bar(d, dec!(50.00)))
        .collect();
    let mut ids = Vec::new();
    for symbol in ["AAPL", "MSFT"] {
        let position = Position::new(user, symbol, date("2013-10-01"), dec!(45.00), 100)
            .with_signals(SignalSettings {
                trailing_stop_percent: Some(dec!(20)),
                ..Default::default()
            });
        ids.push(h.services.tracker.add_position(position).await.unwrap());
        h.provider.set_history(symbol, closes.clone()).await;
        h.provider.set_price(symbol, dec!(39.99)).await;
    }
    let pass = h.services.watch_pass();
    assert_eq!(assert_ok!(pass.run(at(0), false).await).alerts.delivered, 2);

    sqlx::query("UPDATE price_history SET close = 'n/a' WHERE symbol = 'AAPL' AND date = '2014-01-14'")
        .execute(&h.persistence.db.pool)
        .await
        .unwrap();

    let report = assert_ok!(pass.run(at(120), false).await);
    assert_eq!(report.failed_positions, vec![ids[0]]);
    assert_eq!(report.positions_evaluated, 1);
    assert_eq!(report.alerts.delivered, 1);

    let sent = h.sink.sent().await;
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].subject, "MSFT price fell below trailing stop 40.00");
    assert_eq!(last_notified(&h, ids[0]).await, Some(at(0).now));
    assert_eq!(last_notified(&h, ids[1]).await, Some(at(120).now));
}
