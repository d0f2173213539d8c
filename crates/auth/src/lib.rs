//! `medstock-auth`: caller identity and tier scoping for analytics.
//!
//! This crate is intentionally decoupled from authentication and storage:
//! callers arrive already resolved by an external collaborator.

pub mod authorize;
pub mod principal;
pub mod roles;

pub use authorize::{AccessError, authorize_level, can_access_level};
pub use principal::{Caller, CallerScope};
pub use roles::Role;
