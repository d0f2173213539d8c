use thiserror::Error;

use medstock_core::{AggregationLevel, LevelType};

use crate::{Caller, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("role '{role}' cannot view {requested} level data (scoped to {tier})")]
    AboveScope {
        role: String,
        tier: LevelType,
        requested: LevelType,
    },

    #[error("caller with role '{role}' has no {tier} assignment")]
    MissingAssignment { role: String, tier: LevelType },
}

/// Whether `role`'s scope is at or above `level_type` in the ordered
/// hierarchy facility < zonal < regional < national.
///
/// - No IO
/// - No panics
pub fn can_access_level(role: &Role, level_type: LevelType) -> bool {
    role.scope_tier() >= level_type
}

/// Check that a caller may request aggregation at `level`.
///
/// Besides the tier check, a caller below national tier must carry the
/// assignment for its own tier; otherwise its scope is empty.
pub fn authorize_level(caller: &Caller, level: &AggregationLevel) -> Result<(), AccessError> {
    let tier = caller.tier();

    if !can_access_level(&caller.role, level.level_type) {
        return Err(AccessError::AboveScope {
            role: caller.role.to_string(),
            tier,
            requested: level.level_type,
        });
    }

    let assigned = match tier {
        LevelType::Facility => caller.scope.facility_id.is_some(),
        LevelType::Zonal => caller.scope.zone_id.is_some(),
        LevelType::Regional => caller.scope.region_id.is_some(),
        LevelType::National => true,
    };

    if assigned {
        Ok(())
    } else {
        Err(AccessError::MissingAssignment {
            role: caller.role.to_string(),
            tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallerScope;

    #[test]
    fn access_follows_tier_order() {
        assert!(can_access_level(&Role::FACILITY_USER, LevelType::Facility));
        assert!(!can_access_level(&Role::FACILITY_USER, LevelType::Zonal));
        assert!(can_access_level(&Role::ZONAL_MANAGER, LevelType::Facility));
        assert!(can_access_level(&Role::ZONAL_MANAGER, LevelType::Zonal));
        assert!(!can_access_level(&Role::ZONAL_MANAGER, LevelType::Regional));
        assert!(can_access_level(&Role::REGIONAL_MANAGER, LevelType::Regional));
        assert!(!can_access_level(&Role::REGIONAL_MANAGER, LevelType::National));
        assert!(can_access_level(&Role::ADMIN, LevelType::National));
    }

    #[test]
    fn unknown_role_only_reaches_facility() {
        let role = Role::new("visitor");
        assert!(can_access_level(&role, LevelType::Facility));
        assert!(!can_access_level(&role, LevelType::Zonal));
    }

    #[test]
    fn authorize_level_reports_tier_violation() {
        let caller = Caller::new(Role::FACILITY_MANAGER, CallerScope::facility("F1"));
        let err = authorize_level(&caller, &AggregationLevel::national()).unwrap_err();
        assert!(matches!(
            err,
            AccessError::AboveScope {
                requested: LevelType::National,
                ..
            }
        ));
        assert!(authorize_level(&caller, &AggregationLevel::facility("F1")).is_ok());
    }

    #[test]
    fn authorize_level_requires_assignment() {
        let caller = Caller::new(Role::ZONAL_MANAGER, CallerScope::default());
        let level = AggregationLevel::new("Z1", "Zone 1", LevelType::Zonal);
        assert_eq!(
            authorize_level(&caller, &level),
            Err(AccessError::MissingAssignment {
                role: "zonal_manager".to_string(),
                tier: LevelType::Zonal,
            })
        );
        assert!(authorize_level(&Caller::national(), &level).is_ok());
    }
}
