//! Summary statistics over a set of product records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use medstock_core::ProductRecord;

/// Stock-out penalty per percentage point.
pub const STOCK_OUT_PENALTY: f64 = 4.0;
/// Wastage penalty per percentage point (1.5x the stock-out penalty).
pub const WASTAGE_PENALTY: f64 = 6.0;

/// Roll-up of a record set at one aggregation level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub total_consumption: f64,
    pub total_products: usize,
    pub average_aamc: f64,
    /// Percent of products with at least one stock-out period.
    pub stock_out_rate: f64,
    /// Mean product wastage rate, in percent.
    pub wastage_rate: f64,
    pub facility_count: usize,
    /// 0-100, higher is better.
    pub performance_score: f64,
}

/// Pure record-set → metrics computation.
///
/// A trait so the aggregation engine can be driven by an instrumented
/// implementation in tests.
pub trait MetricsCompute: Send + Sync {
    fn compute_metrics(&self, records: &[ProductRecord]) -> AggregatedMetrics;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsCalculator;

impl MetricsCompute for MetricsCalculator {
    fn compute_metrics(&self, records: &[ProductRecord]) -> AggregatedMetrics {
        if records.is_empty() {
            return AggregatedMetrics::default();
        }

        let count = records.len() as f64;

        let total_consumption = records.iter().map(|r| r.annual.annual_consumption).sum();
        let average_aamc = records.iter().map(|r| r.annual.aamc).sum::<f64>() / count;

        let stocked_out = records.iter().filter(|r| r.has_stock_out()).count() as f64;
        let stock_out_rate = stocked_out / count * 100.0;

        let wastage_rate = records.iter().map(|r| r.annual.wastage_rate).sum::<f64>() / count;

        let facility_count = records
            .iter()
            .map(|r| &r.facility_id)
            .collect::<HashSet<_>>()
            .len();

        AggregatedMetrics {
            total_consumption,
            total_products: records.len(),
            average_aamc,
            stock_out_rate,
            wastage_rate,
            facility_count,
            performance_score: performance_score(stock_out_rate, wastage_rate),
        }
    }
}

/// `round((max(0, 100 - 4·stockOut) + max(0, 100 - 6·wastage)) / 2)`.
pub fn performance_score(stock_out_rate: f64, wastage_rate: f64) -> f64 {
    let availability = (100.0 - stock_out_rate * STOCK_OUT_PENALTY).max(0.0);
    let efficiency = (100.0 - wastage_rate * WASTAGE_PENALTY).max(0.0);
    ((availability + efficiency) / 2.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medstock_core::{AnnualAverages, FacilityId, PeriodRecord, ProductClass};
    use proptest::prelude::*;

    fn product(facility: &str, stock_out_days: u32, wastage_rate: f64) -> ProductRecord {
        ProductRecord {
            periods: vec![PeriodRecord::new("2024-01", 10.0).with_stock_out_days(stock_out_days)],
            ..ProductRecord::new("Paracetamol", ProductClass::Essential, 0.1, FacilityId::new(facility))
        }
        .with_annual(AnnualAverages {
            annual_consumption: 120.0,
            aamc: 10.0,
            wastage_rate,
        })
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(MetricsCalculator.compute_metrics(&[]), AggregatedMetrics::default());
    }

    #[test]
    fn one_of_three_stocked_out() {
        let records = vec![product("F1", 5, 10.0), product("F1", 0, 0.0), product("F1", 0, 0.0)];

        let m = MetricsCalculator.compute_metrics(&records);

        assert!((m.stock_out_rate - 100.0 / 3.0).abs() < 0.01);
        assert!((m.wastage_rate - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.total_products, 3);
        assert_eq!(m.facility_count, 1);
        assert_eq!(m.total_consumption, 360.0);
        assert_eq!(m.average_aamc, 10.0);
        // availability clamps to 0, efficiency = 100 - 20 = 80
        assert_eq!(m.performance_score, 40.0);
    }

    #[test]
    fn metrics_serialize_with_field_names() {
        let metrics = MetricsCalculator.compute_metrics(&[product("F1", 5, 10.0)]);
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(json["total_products"], 1);
        assert_eq!(json["stock_out_rate"], 100.0);
        let back: AggregatedMetrics = serde_json::from_value(json).unwrap();
        assert_eq!(back, metrics);
    }

    #[test]
    fn facility_count_is_distinct() {
        let records = vec![product("F1", 0, 0.0), product("F2", 0, 0.0), product("F2", 0, 0.0)];
        assert_eq!(MetricsCalculator.compute_metrics(&records).facility_count, 2);
    }

    #[test]
    fn perfect_records_score_full_marks() {
        assert_eq!(performance_score(0.0, 0.0), 100.0);
        assert_eq!(performance_score(100.0, 100.0), 0.0);
        assert_eq!(performance_score(10.0, 5.0), 65.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: the score stays in [0, 100] and never improves when
        /// either rate gets worse.
        #[test]
        fn score_is_bounded_and_monotone(
            stock_out in 0.0f64..=100.0,
            wastage in 0.0f64..=100.0,
            bump in 0.0f64..50.0,
        ) {
            let base = performance_score(stock_out, wastage);
            prop_assert!((0.0..=100.0).contains(&base));
            prop_assert!(performance_score(stock_out + bump, wastage) <= base);
            prop_assert!(performance_score(stock_out, wastage + bump) <= base);
        }

        /// Property: arbitrary record sets never produce NaN or infinities.
        #[test]
        fn metrics_are_always_finite(
            rows in prop::collection::vec((0u32..=30, 0.0f64..100.0, 0.0f64..10_000.0), 0..40)
        ) {
            let records: Vec<ProductRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, (stock_out, wastage, consumption))| {
                    product(&format!("F{}", i % 4), *stock_out, *wastage).with_annual(AnnualAverages {
                        annual_consumption: *consumption,
                        aamc: consumption / 12.0,
                        wastage_rate: *wastage,
                    })
                })
                .collect();

            let m = MetricsCalculator.compute_metrics(&records);
            prop_assert!(m.total_consumption.is_finite());
            prop_assert!(m.average_aamc.is_finite());
            prop_assert!((0.0..=100.0).contains(&m.stock_out_rate));
            prop_assert!((0.0..=100.0).contains(&m.performance_score));
        }
    }
}
