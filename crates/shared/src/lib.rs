//! TenantGate Shared Types and Utilities
//!
//! This crate contains the tenant domain types, validation rules and errors
//! shared across the TenantGate platform.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
pub use validation::{
    is_valid_icon, sanitize_subdomain, validate_new_subdomain, IconValidator,
    MAX_ICON_LENGTH, MAX_SUBDOMAIN_LENGTH, RESERVED_SUBDOMAINS,
};
