//! Imported consumption records.
//!
//! These are read-only inputs to the analytics layers. Derived fields are
//! produced by pure transformations (`PeriodRecord::derive`,
//! `ProductRecord::with_periods`) that return new values; nothing here
//! mutates a record in place.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{FacilityId, ProductId};

/// Default length of a reporting period, in days.
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

/// Priority class of a product (VEN classification).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductClass {
    Vital,
    Essential,
    #[serde(rename = "non_essential")]
    NonEssential,
}

impl ProductClass {
    pub const ALL: [ProductClass; 3] = [
        ProductClass::Vital,
        ProductClass::Essential,
        ProductClass::NonEssential,
    ];

    /// Position in the one-hot encoding used by feature engineering.
    pub fn ordinal(&self) -> usize {
        match self {
            ProductClass::Vital => 0,
            ProductClass::Essential => 1,
            ProductClass::NonEssential => 2,
        }
    }
}

impl FromStr for ProductClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v" | "vital" => Ok(ProductClass::Vital),
            "e" | "essential" => Ok(ProductClass::Essential),
            "n" | "non_essential" | "non-essential" | "nonessential" => {
                Ok(ProductClass::NonEssential)
            }
            other => Err(DomainError::unknown_tag("product class", other)),
        }
    }
}

/// One reporting interval for a product at a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Reporting period label (e.g. `"2024-03"`). Ordering comes from the
    /// position in `ProductRecord::periods`.
    pub period: String,
    pub days: u32,
    pub beginning_balance: f64,
    pub received: f64,
    pub positive_adjustment: f64,
    pub negative_adjustment: f64,
    pub stock_out_days: u32,
    pub expired_damaged: f64,
    pub consumption: f64,

    // Derived by `derive()`.
    pub aamc: f64,
    pub wastage_rate: f64,
    pub ending_balance: f64,
}

impl PeriodRecord {
    pub fn new(period: impl Into<String>, consumption: f64) -> Self {
        Self {
            period: period.into(),
            days: DEFAULT_PERIOD_DAYS,
            beginning_balance: 0.0,
            received: 0.0,
            positive_adjustment: 0.0,
            negative_adjustment: 0.0,
            stock_out_days: 0,
            expired_damaged: 0.0,
            consumption,
            aamc: 0.0,
            wastage_rate: 0.0,
            ending_balance: 0.0,
        }
    }

    pub fn with_balances(mut self, beginning: f64, received: f64) -> Self {
        self.beginning_balance = beginning;
        self.received = received;
        self
    }

    pub fn with_adjustments(mut self, positive: f64, negative: f64) -> Self {
        self.positive_adjustment = positive;
        self.negative_adjustment = negative;
        self
    }

    pub fn with_stock_out_days(mut self, days: u32) -> Self {
        self.stock_out_days = days;
        self
    }

    pub fn with_expired_damaged(mut self, qty: f64) -> Self {
        self.expired_damaged = qty;
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        let quantities = [
            ("beginning_balance", self.beginning_balance),
            ("received", self.received),
            ("positive_adjustment", self.positive_adjustment),
            ("negative_adjustment", self.negative_adjustment),
            ("expired_damaged", self.expired_damaged),
            ("consumption", self.consumption),
        ];
        for (field, value) in quantities {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::validation(format!(
                    "period {}: {field} must be a finite non-negative quantity (got {value})",
                    self.period
                )));
            }
        }
        if self.days == 0 {
            return Err(DomainError::validation(format!(
                "period {}: days must be positive",
                self.period
            )));
        }
        if self.stock_out_days > self.days {
            return Err(DomainError::validation(format!(
                "period {}: stock_out_days ({}) exceeds period length ({})",
                self.period, self.stock_out_days, self.days
            )));
        }
        Ok(())
    }

    /// Compute ending balance, stock-out adjusted consumption and wastage
    /// rate, returning a new record.
    pub fn derive(&self) -> PeriodRecord {
        let available = self.beginning_balance + self.received;
        let ending = available + self.positive_adjustment
            - self.negative_adjustment
            - self.consumption
            - self.expired_damaged;

        let stocked_days = self.days.saturating_sub(self.stock_out_days).max(1);
        let aamc = self.consumption * f64::from(self.days) / f64::from(stocked_days);

        let wastage_rate = if available > 0.0 {
            self.expired_damaged / available * 100.0
        } else {
            0.0
        };

        PeriodRecord {
            aamc,
            wastage_rate,
            ending_balance: ending.max(0.0),
            ..self.clone()
        }
    }

    pub fn had_stock_out(&self) -> bool {
        self.stock_out_days > 0
    }
}

/// Annual roll-up of a product's periods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnualAverages {
    pub annual_consumption: f64,
    /// Average monthly consumption across the year.
    pub aamc: f64,
    /// Percent of available stock lost to expiry or damage.
    pub wastage_rate: f64,
}

impl AnnualAverages {
    /// Summarise already-derived periods.
    pub fn from_periods(periods: &[PeriodRecord]) -> Self {
        if periods.is_empty() {
            return Self::default();
        }

        let annual_consumption: f64 = periods.iter().map(|p| p.consumption).sum();
        let aamc = periods.iter().map(|p| p.aamc).sum::<f64>() / periods.len() as f64;

        let wasted: f64 = periods.iter().map(|p| p.expired_damaged).sum();
        let available: f64 = periods
            .iter()
            .map(|p| p.beginning_balance + p.received)
            .sum();
        let wastage_rate = if available > 0.0 {
            wasted / available * 100.0
        } else {
            0.0
        };

        Self {
            annual_consumption,
            aamc,
            wastage_rate,
        }
    }
}

/// A product as imported for one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub class: ProductClass,
    pub unit_price: f64,
    pub facility_id: FacilityId,
    pub periods: Vec<PeriodRecord>,
    pub annual: AnnualAverages,
}

impl ProductRecord {
    pub fn new(
        name: impl Into<String>,
        class: ProductClass,
        unit_price: f64,
        facility_id: FacilityId,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            class,
            unit_price,
            facility_id,
            periods: Vec::new(),
            annual: AnnualAverages::default(),
        }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    /// Validate and derive every period, then recompute annual averages.
    pub fn with_periods(self, periods: Vec<PeriodRecord>) -> DomainResult<Self> {
        let derived = periods
            .iter()
            .map(|p| p.validate().map(|()| p.derive()))
            .collect::<DomainResult<Vec<_>>>()?;
        let annual = AnnualAverages::from_periods(&derived);

        Ok(Self {
            periods: derived,
            annual,
            ..self
        })
    }

    /// Override the annual roll-up (e.g. values supplied by the importer).
    pub fn with_annual(mut self, annual: AnnualAverages) -> Self {
        self.annual = annual;
        self
    }

    pub fn has_stock_out(&self) -> bool {
        self.periods.iter().any(PeriodRecord::had_stock_out)
    }
}
