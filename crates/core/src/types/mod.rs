//! Core types for the Floricultura client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod id;
pub mod price;
pub mod role;

pub use credential::{RoleClaim, decode_role_claim};
pub use id::*;
pub use price::Price;
pub use role::UserRole;
