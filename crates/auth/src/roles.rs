use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use medstock_core::LevelType;

/// Role identifier supplied by the external auth collaborator.
///
/// Roles stay opaque strings at this layer; only the tier a role is scoped
/// to matters for analytics. Unrecognised roles are scoped to a single
/// facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const FACILITY_USER: Role = Role(Cow::Borrowed("facility_user"));
    pub const FACILITY_MANAGER: Role = Role(Cow::Borrowed("facility_manager"));
    pub const PHARMACIST: Role = Role(Cow::Borrowed("pharmacist"));
    pub const ZONAL_MANAGER: Role = Role(Cow::Borrowed("zonal_manager"));
    pub const REGIONAL_MANAGER: Role = Role(Cow::Borrowed("regional_manager"));
    pub const NATIONAL_ADMIN: Role = Role(Cow::Borrowed("national_admin"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("super_admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Highest tier of the hierarchy this role may see.
    pub fn scope_tier(&self) -> LevelType {
        match self.as_str() {
            "facility_user" | "facility_manager" | "pharmacist" => LevelType::Facility,
            "zonal_manager" => LevelType::Zonal,
            "regional_manager" => LevelType::Regional,
            "national_admin" | "admin" | "super_admin" => LevelType::National,
            other => {
                tracing::debug!(role = %other, "unrecognised role scoped to facility");
                LevelType::Facility
            }
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
