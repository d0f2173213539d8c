//! Role-scoped partitioning of records by aggregation level.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use medstock_auth::{AccessError, Caller, Role, authorize_level, can_access_level};
use medstock_core::{AggregationLevel, LevelType, ProductRecord};

use crate::directory::FacilityDirectory;

/// Splits a record set into per-level subsets.
///
/// Two passes, in order:
/// 1. role scope: what the caller is entitled to see at all;
/// 2. level type: the records belonging to each requested level, taken from
///    the already-scoped set.
///
/// Zone and region membership come from the facility directory; a facility
/// the directory does not know belongs to no zone or region.
#[derive(Clone)]
pub struct HierarchyManager {
    directory: Arc<dyn FacilityDirectory>,
}

impl core::fmt::Debug for HierarchyManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HierarchyManager").finish_non_exhaustive()
    }
}

impl HierarchyManager {
    pub fn new(directory: Arc<dyn FacilityDirectory>) -> Self {
        Self { directory }
    }

    /// Group `records` by level id after applying the caller's scope.
    ///
    /// Every requested level gets an entry, possibly empty.
    pub fn group_by_level(
        &self,
        records: &[ProductRecord],
        levels: &[AggregationLevel],
        caller: &Caller,
    ) -> HashMap<String, Vec<ProductRecord>> {
        let scoped = self.scope_records(records, caller);

        levels
            .iter()
            .map(|level| {
                if let Err(AccessError::AboveScope { tier, .. }) = authorize_level(caller, level) {
                    debug!(
                        level = %level.id,
                        requested = %level.level_type,
                        caller_tier = %tier,
                        "level above caller scope; result limited to caller scope"
                    );
                }

                let subset: Vec<ProductRecord> = scoped
                    .iter()
                    .filter(|record| self.belongs_to(record, level))
                    .map(|record| (*record).clone())
                    .collect();

                (level.id.clone(), subset)
            })
            .collect()
    }

    /// Records the caller may see, in input order.
    pub fn scope_records<'a>(
        &self,
        records: &'a [ProductRecord],
        caller: &Caller,
    ) -> Vec<&'a ProductRecord> {
        let tier = caller.tier();
        let scope = &caller.scope;

        let visible: Vec<&ProductRecord> = match tier {
            LevelType::National => records.iter().collect(),
            LevelType::Facility => match &scope.facility_id {
                Some(facility) => records
                    .iter()
                    .filter(|r| &r.facility_id == facility)
                    .collect(),
                None => Vec::new(),
            },
            LevelType::Zonal => match &scope.zone_id {
                Some(zone) => records
                    .iter()
                    .filter(|r| self.directory.zone_of(&r.facility_id).as_ref() == Some(zone))
                    .collect(),
                None => Vec::new(),
            },
            LevelType::Regional => match &scope.region_id {
                Some(region) => records
                    .iter()
                    .filter(|r| self.directory.region_of(&r.facility_id).as_ref() == Some(region))
                    .collect(),
                None => Vec::new(),
            },
        };

        if visible.is_empty() && !records.is_empty() && tier != LevelType::National {
            let assigned = match tier {
                LevelType::Facility => scope.facility_id.is_some(),
                LevelType::Zonal => scope.zone_id.is_some(),
                LevelType::Regional => scope.region_id.is_some(),
                LevelType::National => true,
            };
            if !assigned {
                warn!(role = %caller.role, tier = %tier, "caller has no assignment for its tier; scope is empty");
            }
        }

        visible
    }

    fn belongs_to(&self, record: &ProductRecord, level: &AggregationLevel) -> bool {
        match level.level_type {
            LevelType::Facility => {
                level.is_all_facilities() || record.facility_id.as_str() == level.id
            }
            LevelType::Zonal => self
                .directory
                .zone_of(&record.facility_id)
                .is_some_and(|zone| zone.as_str() == level.id),
            LevelType::Regional => self
                .directory
                .region_of(&record.facility_id)
                .is_some_and(|region| region.as_str() == level.id),
            LevelType::National => true,
        }
    }

    /// Whether `role`'s scope is at or above `level_type`.
    pub fn can_access_level(&self, role: &Role, level_type: LevelType) -> bool {
        can_access_level(role, level_type)
    }
}
