//! Admin dashboard metrics over all carts.
//!
//! [`compute_metrics`] is a pure function: no I/O, no clock. The admin console
//! fetches the cart listing and hands it here.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::Cart;
use crate::types::Price;

/// Maximum number of entries in [`AdminMetricsSnapshot::ranking`].
pub const RANKING_LIMIT: usize = 10;

/// One entry of the best-selling items ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    /// Display name (the product id when no name is known).
    pub name: String,
    /// Units across all carts.
    pub quantity: u64,
}

/// Aggregated view of every cart in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminMetricsSnapshot {
    /// Distinct cart owners.
    pub active_users: usize,
    /// Sum of every cart's backend-computed total.
    pub total_sum: Price,
    /// Items by quantity, descending, at most [`RANKING_LIMIT`] long.
    pub ranking: Vec<RankedItem>,
}

/// Compute the admin metrics for a cart listing.
///
/// Ranking ties keep the order in which products were first seen while
/// walking `carts` and their items.
#[must_use]
pub fn compute_metrics(carts: &[Cart]) -> AdminMetricsSnapshot {
    let active_users = carts
        .iter()
        .map(|cart| &cart.user_id)
        .collect::<HashSet<_>>()
        .len();

    let total_sum = carts.iter().map(|cart| cart.total).sum();

    let mut ranking: Vec<RankedItem> = Vec::new();
    let mut slots = HashMap::new();
    for item in carts.iter().flat_map(|cart| &cart.items) {
        let slot = *slots.entry(&item.product_id).or_insert_with(|| {
            ranking.push(RankedItem {
                name: item
                    .name
                    .clone()
                    .unwrap_or_else(|| item.product_id.to_string()),
                quantity: 0,
            });
            ranking.len() - 1
        });
        if let Some(entry) = ranking.get_mut(slot) {
            entry.quantity += u64::from(item.quantity);
        }
    }

    // stable: equal quantities stay in first-seen order
    ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranking.truncate(RANKING_LIMIT);

    AdminMetricsSnapshot {
        active_users,
        total_sum,
        ranking,
    }
}
