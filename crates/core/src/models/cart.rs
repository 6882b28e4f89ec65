//! Shopping carts as held by the backend.
//!
//! The backend is the source of truth: the client never patches a cart
//! locally, it replaces its snapshot with a freshly fetched one after every
//! write. `total` is therefore read as-is; [`Cart::recompute_total`] exists to
//! check it against a catalog snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::product::{Product, find_product};
use crate::types::{CartId, Price, ProductId, UserId};

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product referenced by this line.
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    /// Units of the product, at least 1 while the line exists.
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    /// Product name, when the backend populates it (admin listings).
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartItem {
    /// Create a line without a display name.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            name: None,
        }
    }
}

/// A user's cart (`/carrinho`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id", default)]
    pub id: CartId,
    #[serde(rename = "usuarioId", default)]
    pub user_id: UserId,
    #[serde(rename = "itens", default)]
    pub items: Vec<CartItem>,
    #[serde(rename = "dataAtualizacao", default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Total computed by the backend.
    #[serde(default)]
    pub total: Price,
}

impl Cart {
    /// The empty-state placeholder shown after the cart has been cleared.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: CartId::default(),
            user_id: UserId::default(),
            items: Vec::new(),
            updated_at: Some(Utc::now()),
            total: Price::ZERO,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Recompute the total from a catalog snapshot.
    ///
    /// Lines whose product is not in `catalog` contribute nothing.
    #[must_use]
    pub fn recompute_total(&self, catalog: &[Product]) -> Price {
        self.items
            .iter()
            .filter_map(|item| {
                find_product(catalog, &item.product_id).map(|p| p.price * item.quantity)
            })
            .sum()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}
