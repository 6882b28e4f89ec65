//! Catalog products.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// A product in the catalog (`/produtos`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend document id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,
    /// Unit price in reais.
    #[serde(rename = "preco")]
    pub price: Price,
    /// Free-text description.
    #[serde(rename = "descricao", default)]
    pub description: String,
    /// Photo URL.
    #[serde(rename = "urlfoto", default)]
    pub photo_url: String,
}

/// Errors raised when validating a [`NewProduct`] before sending it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// A required text field is blank.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    /// The price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,
}

/// Payload for registering a product (`POST /produtos`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco")]
    pub price: Price,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "urlfoto")]
    pub photo_url: String,
}

impl NewProduct {
    /// Build a new product, trimming text fields.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] if a text field is blank or the price is negative.
    pub fn new(
        name: &str,
        price: Price,
        description: &str,
        photo_url: &str,
    ) -> Result<Self, ProductError> {
        let product = Self {
            name: name.trim().to_owned(),
            price,
            description: description.trim().to_owned(),
            photo_url: photo_url.trim().to_owned(),
        };
        product.validate()?;
        Ok(product)
    }

    /// Check the required-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyField("name"));
        }
        if self.description.trim().is_empty() {
            return Err(ProductError::EmptyField("description"));
        }
        if self.photo_url.trim().is_empty() {
            return Err(ProductError::EmptyField("photo url"));
        }
        if self.price.is_negative() {
            return Err(ProductError::NegativePrice);
        }
        Ok(())
    }
}

/// Filter products by a search term.
///
/// Matches case-insensitively against name or description. A blank term
/// returns every product.
#[must_use]
pub fn search_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    products
        .iter()
        .filter(|p| {
            term.is_empty()
                || p.name.to_lowercase().contains(&term)
                || p.description.to_lowercase().contains(&term)
        })
        .collect()
}

/// Find a product by id.
#[must_use]
pub fn find_product<'a>(products: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    products.iter().find(|p| &p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(id: &str, name: &str, description: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            price: Price::new(Decimal::TEN),
            description: description.to_owned(),
            photo_url: String::new(),
        }
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let json = r#"{"_id":"p1","nome":"Rosa","preco":10.5,"descricao":"Vermelha","urlfoto":"http://x/rosa.png","__v":0}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.id.as_str(), "p1");
        assert_eq!(p.name, "Rosa");
        assert_eq!(p.price.display(), "R$ 10.50");
    }

    #[test]
    fn test_search_matches_name_or_description() {
        let products = vec![
            product("1", "Rosa Vermelha", "Buquê"),
            product("2", "Orquídea", "Vaso com rosas"),
            product("3", "Girassol", "Amarelo"),
        ];
        let found: Vec<_> = search_products(&products, "ROSA")
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(found, vec!["1", "2"]);
        assert_eq!(search_products(&products, "  ").len(), 3);
        assert!(search_products(&products, "tulipa").is_empty());
    }

    #[test]
    fn test_new_product_validation() {
        let price = Price::new(Decimal::ONE);
        assert!(NewProduct::new("Rosa", price, "Linda", "http://x").is_ok());
        assert_eq!(
            NewProduct::new(" ", price, "Linda", "http://x"),
            Err(ProductError::EmptyField("name"))
        );
        assert_eq!(
            NewProduct::new("Rosa", Price::new(Decimal::NEGATIVE_ONE), "Linda", "http://x"),
            Err(ProductError::NegativePrice)
        );
    }

    #[test]
    fn test_new_product_wire_names() {
        let p = NewProduct::new("Rosa", Price::new(Decimal::TEN), "Linda", "http://x").unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["nome"], "Rosa");
        assert_eq!(json["preco"], 10.0);
        assert_eq!(json["urlfoto"], "http://x");
    }
}
