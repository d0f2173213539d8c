//! `medstock-core`: domain foundation for the analytics subsystem.
//!
//! This crate contains **pure domain** values (no IO, no async, no logging):
//! imported consumption records, identifiers and the organizational tiers
//! that aggregation is keyed on.

pub mod error;
pub mod id;
pub mod level;
pub mod records;

pub use error::{DomainError, DomainResult};
pub use id::{FacilityId, ProductId, RegionId, ZoneId};
pub use level::{ALL_FACILITIES, AggregationLevel, LevelType};
pub use records::{AnnualAverages, DEFAULT_PERIOD_DAYS, PeriodRecord, ProductClass, ProductRecord};
