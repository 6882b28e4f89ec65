//! Floricultura Core - Shared types library.
//!
//! This crate provides the types and pure logic used across all Floricultura
//! components:
//! - `storefront` - REST client, cart reconciliation and checkout
//! - `admin` - Admin console over the same backend
//! - `cli` - The `flora` command-line front-end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, roles and advisory token decoding
//! - [`models`] - Products, carts and users as the backend serves them
//! - [`metrics`] - Admin metrics aggregation over cart listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod metrics;
pub mod models;
pub mod types;

pub use metrics::{AdminMetricsSnapshot, RANKING_LIMIT, RankedItem, compute_metrics};
pub use models::*;
pub use types::*;
