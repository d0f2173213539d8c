//! Time-series extraction and feature engineering.

use std::f64::consts::PI;

use medstock_core::{ProductClass, ProductRecord};

/// Lagged values carried per observation.
pub const MAX_LAGS: usize = 6;
/// Window of the trailing moving-average feature.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// value, time index, 4 seasonal terms, 3 class flags, price, AAMC,
/// wastage, lags, moving average.
pub const FULL_FEATURE_WIDTH: usize = 1 + 1 + 4 + ProductClass::ALL.len() + 3 + MAX_LAGS + 1;

/// Consumption values of periods with strictly positive consumption, in
/// period order.
pub fn extract_time_series(product: &ProductRecord) -> Vec<f64> {
    product
        .periods
        .iter()
        .map(|p| p.consumption)
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect()
}

/// Trailing moving average over at most `window` points ending at `i`.
pub(crate) fn trailing_mean(values: &[f64], i: usize, window: usize) -> f64 {
    let start = (i + 1).saturating_sub(window);
    let slice = &values[start..=i];
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// One fixed-width feature vector per observation.
///
/// Missing lags (early observations) are zero-filled so every row has the
/// same width; rows are truncated to `max_width`.
pub fn engineer_features(
    product: &ProductRecord,
    series: &[f64],
    max_width: usize,
) -> Vec<Vec<f64>> {
    series
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let t = i as f64;
            let mut row = Vec::with_capacity(FULL_FEATURE_WIDTH);

            row.push(value);
            row.push(t);

            // Annual (12-period) and quarterly (3-period) cycles.
            row.push((2.0 * PI * t / 12.0).sin());
            row.push((2.0 * PI * t / 12.0).cos());
            row.push((2.0 * PI * t / 3.0).sin());
            row.push((2.0 * PI * t / 3.0).cos());

            for class in ProductClass::ALL {
                row.push(if class == product.class { 1.0 } else { 0.0 });
            }

            row.push(product.unit_price);
            row.push(product.annual.aamc);
            row.push(product.annual.wastage_rate);

            for lag in 1..=MAX_LAGS {
                row.push(if i >= lag { series[i - lag] } else { 0.0 });
            }

            row.push(trailing_mean(series, i, MOVING_AVERAGE_WINDOW));

            row.truncate(max_width);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::{FacilityId, PeriodRecord};

    fn product(consumption: &[f64]) -> ProductRecord {
        let periods = consumption
            .iter()
            .enumerate()
            .map(|(i, c)| PeriodRecord::new(format!("2024-{:02}", i + 1), *c))
            .collect();
        ProductRecord::new("Oxytocin", ProductClass::Essential, 0.8, FacilityId::new("F1"))
            .with_periods(periods)
            .unwrap()
    }

    #[test]
    fn extraction_drops_non_positive_periods() {
        let p = product(&[5.0, 0.0, 7.0, 0.0, 9.0]);
        assert_eq!(extract_time_series(&p), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn rows_have_fixed_width() {
        let p = product(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let series = extract_time_series(&p);
        let rows = engineer_features(&p, &series, 50);

        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|r| r.len() == FULL_FEATURE_WIDTH));
        assert_eq!(FULL_FEATURE_WIDTH, 19);

        let last = &rows[7];
        assert_eq!(last[0], 8.0);
        assert_eq!(last[1], 7.0);
        // one-hot: essential
        assert_eq!(&last[6..9], &[0.0, 1.0, 0.0]);
        // lags 1..=6
        assert_eq!(&last[12..18], &[7.0, 6.0, 5.0, 4.0, 3.0, 2.0]);
        // moving average of 6, 7, 8
        assert_eq!(last[18], 7.0);
    }

    #[test]
    fn early_rows_zero_fill_lags() {
        let p = product(&[4.0, 6.0]);
        let series = extract_time_series(&p);
        let rows = engineer_features(&p, &series, 50);
        assert_eq!(&rows[1][12..18], &[4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(rows[1][18], 5.0);
    }

    #[test]
    fn width_is_truncated() {
        let p = product(&[1.0, 2.0]);
        let rows = engineer_features(&p, &extract_time_series(&p), 5);
        assert!(rows.iter().all(|r| r.len() == 5));
    }
}
