use crate::domain::market::price::{PricePoint, TrendPoint};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub const SHORT_WINDOW: usize = 50;
pub const LONG_WINDOW: usize = 200;

/// Trend rows exist only for trade days past this index.
pub const MIN_TREND_INDEX: i64 = 200;

/// Computes 50/200-day simple moving averages over `history`.
///
/// `history` must be one symbol's points sorted by trade-day index with no
/// gaps. Each window covers the N most recent trade days ending at the row
/// itself. Sums are kept in `Decimal` so the running subtraction never drifts;
/// only the final averages are converted to `f64`.
pub fn compute_trends(history: &[PricePoint]) -> Vec<TrendPoint> {
    let mut trends = Vec::new();
    let mut sum_short = Decimal::ZERO;
    let mut sum_long = Decimal::ZERO;

    for (i, point) in history.iter().enumerate() {
        sum_short += point.close;
        sum_long += point.close;
        if i >= SHORT_WINDOW {
            sum_short -= history[i - SHORT_WINDOW].close;
        }
        if i >= LONG_WINDOW {
            sum_long -= history[i - LONG_WINDOW].close;
        }

        if point.trade_day_index <= MIN_TREND_INDEX || i + 1 < LONG_WINDOW {
            continue;
        }

        let avg50 = sum_short / Decimal::from(SHORT_WINDOW as i64);
        let avg200 = sum_long / Decimal::from(LONG_WINDOW as i64);
        trends.push(TrendPoint {
            symbol: point.symbol.clone(),
            date: point.date,
            trade_day_index: point.trade_day_index,
            avg50: avg50.to_f64().unwrap_or_default(),
            avg200: avg200.to_f64().unwrap_or_default(),
            sma_percent: sma_percent(avg50, avg200),
        });
    }

    trends
}

/// (avg50 / avg200 - 1) * 100, zero when the long average is zero.
pub fn sma_percent(avg50: Decimal, avg200: Decimal) -> f64 {
    avg50
        .checked_div(avg200)
        .map(|ratio| (ratio - Decimal::ONE) * Decimal::ONE_HUNDRED)
        .and_then(|pct| pct.to_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2013, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                symbol: "MSFT".to_string(),
                date: start + Duration::days(i as i64),
                trade_day_index: i as i64 + 1,
                open: *close,
                close: *close,
                high: *close,
                low: *close,
                volume: 1_000,
            })
            .collect()
    }

    fn ramp(count: usize) -> Vec<Decimal> {
        (0..count)
            .map(|i| dec!(100.00) + dec!(0.10) * Decimal::from(i as i64))
            .collect()
    }

    #[test]
    fn test_ramp_of_201_closes() {
        let trends = compute_trends(&series(&ramp(201)));

        assert_eq!(trends.len(), 1);
        let last = &trends[0];
        assert_eq!(last.trade_day_index, 201);
        // closes 115.10 ..= 120.00
        assert!((last.avg50 - 117.55).abs() < 1e-9);
        // closes 100.10 ..= 120.00
        assert!((last.avg200 - 110.05).abs() < 1e-9);
        let expected = (117.55 / 110.05 - 1.0) * 100.0;
        assert!((last.sma_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_trends_until_index_201() {
        assert!(compute_trends(&series(&ramp(200))).is_empty());
        assert!(compute_trends(&[]).is_empty());
    }

    #[test]
    fn test_sliding_windows_match_direct_average() {
        let closes = ramp(260);
        let trends = compute_trends(&series(&closes));
        assert_eq!(trends.len(), 60);

        for trend in &trends {
            let end = trend.trade_day_index as usize;
            let direct50: Decimal = closes[end - 50..end].iter().sum::<Decimal>() / dec!(50);
            let direct200: Decimal = closes[end - 200..end].iter().sum::<Decimal>() / dec!(200);
            assert!((trend.avg50 - direct50.to_f64().unwrap()).abs() < 1e-9);
            assert!((trend.avg200 - direct200.to_f64().unwrap()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sma_percent_guards_zero() {
        assert_eq!(sma_percent(dec!(10), Decimal::ZERO), 0.0);
        assert!((sma_percent(dec!(110), dec!(100)) - 10.0).abs() < 1e-12);
    }
}
