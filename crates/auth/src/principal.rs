use serde::{Deserialize, Serialize};

use medstock_core::{FacilityId, LevelType, RegionId, ZoneId};

use crate::Role;

/// The organizational unit a caller is attached to.
///
/// Populated by the external auth collaborator; which field matters depends
/// on the caller's role tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerScope {
    pub facility_id: Option<FacilityId>,
    pub zone_id: Option<ZoneId>,
    pub region_id: Option<RegionId>,
}

impl CallerScope {
    pub fn facility(id: impl Into<FacilityId>) -> Self {
        Self {
            facility_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn zone(id: impl Into<ZoneId>) -> Self {
        Self {
            zone_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn region(id: impl Into<RegionId>) -> Self {
        Self {
            region_id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// A resolved caller for analytics requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub role: Role,
    pub scope: CallerScope,
}

impl Caller {
    pub fn new(role: Role, scope: CallerScope) -> Self {
        Self { role, scope }
    }

    /// A national-tier caller (sees every record).
    pub fn national() -> Self {
        Self::new(Role::NATIONAL_ADMIN, CallerScope::default())
    }

    pub fn tier(&self) -> LevelType {
        self.role.scope_tier()
    }
}
