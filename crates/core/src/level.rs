//! Organizational tiers and aggregation level descriptors.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Tier of the supply-chain hierarchy.
///
/// Ordered `Facility < Zonal < Regional < National`; a scope at a higher tier
/// contains every lower tier beneath it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Facility,
    Zonal,
    Regional,
    National,
}

impl LevelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelType::Facility => "facility",
            LevelType::Zonal => "zonal",
            LevelType::Regional => "regional",
            LevelType::National => "national",
        }
    }
}

impl core::fmt::Display for LevelType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facility" => Ok(LevelType::Facility),
            "zonal" | "zone" => Ok(LevelType::Zonal),
            "regional" | "region" => Ok(LevelType::Regional),
            "national" => Ok(LevelType::National),
            other => Err(DomainError::unknown_tag("level type", other)),
        }
    }
}

/// Level id that selects every facility when used with `LevelType::Facility`.
pub const ALL_FACILITIES: &str = "all";

/// A caller-supplied aggregation target (e.g. "Zone North", zonal).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationLevel {
    pub id: String,
    pub name: String,
    pub level_type: LevelType,
}

impl AggregationLevel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level_type: LevelType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level_type,
        }
    }

    pub fn facility(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, LevelType::Facility)
    }

    pub fn national() -> Self {
        Self::new("national", "National", LevelType::National)
    }

    /// Cache key component: `"{id}:{type}"`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.id, self.level_type)
    }

    /// True for the facility-tier wildcard level.
    pub fn is_all_facilities(&self) -> bool {
        self.level_type == LevelType::Facility && self.id == ALL_FACILITIES
    }
}
