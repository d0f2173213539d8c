//! Facility → zone → region lookup.

use std::collections::HashMap;

use medstock_core::{FacilityId, RegionId, ZoneId};

/// Read-only view of the external facility directory.
pub trait FacilityDirectory: Send + Sync {
    fn zone_of(&self, facility: &FacilityId) -> Option<ZoneId>;

    fn region_of(&self, facility: &FacilityId) -> Option<RegionId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    zone: ZoneId,
    region: RegionId,
}

/// Directory snapshot held in memory (loaded by the caller from the
/// facility registry).
#[derive(Debug, Clone, Default)]
pub struct InMemoryFacilityDirectory {
    facilities: HashMap<FacilityId, Placement>,
}

impl InMemoryFacilityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facility(
        mut self,
        facility: impl Into<FacilityId>,
        zone: impl Into<ZoneId>,
        region: impl Into<RegionId>,
    ) -> Self {
        self.insert(facility, zone, region);
        self
    }

    pub fn insert(
        &mut self,
        facility: impl Into<FacilityId>,
        zone: impl Into<ZoneId>,
        region: impl Into<RegionId>,
    ) {
        self.facilities.insert(
            facility.into(),
            Placement {
                zone: zone.into(),
                region: region.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

impl FacilityDirectory for InMemoryFacilityDirectory {
    fn zone_of(&self, facility: &FacilityId) -> Option<ZoneId> {
        self.facilities.get(facility).map(|p| p.zone.clone())
    }

    fn region_of(&self, facility: &FacilityId) -> Option<RegionId> {
        self.facilities.get(facility).map(|p| p.region.clone())
    }
}
