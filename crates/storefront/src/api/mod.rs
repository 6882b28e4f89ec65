//! Remote store API.
//!
//! [`StoreApi`] is the seam between the cart/admin/checkout logic and the
//! backend. [`HttpStore`] implements it over `reqwest`; tests substitute
//! in-memory fakes.
//!
//! # Endpoints
//!
//! | method | path | |
//! |--------|------|-|
//! | GET | `/produtos` | product list |
//! | POST | `/produtos` | register product (admin) |
//! | GET | `/carrinho` | caller's cart |
//! | POST | `/adicionarItem` | add units of a product |
//! | POST | `/removerItem` | drop a product line |
//! | PUT | `/carrinho/quantidade` | set a line's quantity |
//! | DELETE | `/carrinho` | clear caller's cart |
//! | DELETE | `/carrinho/{usuarioId}` | clear a user's cart (admin) |
//! | GET | `/usuarios` | user list (admin) |
//! | GET | `/listarCarrinhos` | every cart (admin; legacy `/carrinhos`) |
//! | POST | `/login` | obtain a token |
//! | POST | `/pagamento` | create a payment intent |

mod cache;
mod http;

use std::fmt;
use std::future::Future;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use floricultura_core::{Cart, NewProduct, Product, ProductId, User, UserId};

use crate::error::StoreError;

pub use http::HttpStore;

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Operations offered by the store backend.
pub trait StoreApi: Send + Sync {
    /// List the catalog.
    fn list_products(&self) -> impl Future<Output = StoreResult<Vec<Product>>> + Send;

    /// Register a product (admin).
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = StoreResult<Product>> + Send;

    /// Fetch the caller's cart.
    fn get_cart(&self) -> impl Future<Output = StoreResult<Cart>> + Send;

    /// Add `quantity` units of a product; the backend creates the line if absent.
    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Drop a product line.
    fn remove_item(&self, product_id: &ProductId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Set a line's quantity.
    fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete every line of the caller's cart.
    fn clear_cart(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete every line of another user's cart (admin).
    fn clear_user_cart(&self, user_id: &UserId) -> impl Future<Output = StoreResult<()>> + Send;

    /// List registered users (admin).
    fn list_users(&self) -> impl Future<Output = StoreResult<Vec<User>>> + Send;

    /// List every cart in the store (admin).
    fn list_carts(&self) -> impl Future<Output = StoreResult<Vec<Cart>>> + Send;

    /// Exchange credentials for a session token.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = StoreResult<SecretString>> + Send;

    /// Ask the backend for a payment intent covering the caller's cart.
    fn create_payment_intent(&self) -> impl Future<Output = StoreResult<PaymentIntent>> + Send;
}

/// Shared clients delegate to the inner implementation.
impl<T: StoreApi> StoreApi for std::sync::Arc<T> {
    fn list_products(&self) -> impl Future<Output = StoreResult<Vec<Product>>> + Send {
        (**self).list_products()
    }
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = StoreResult<Product>> + Send {
        (**self).create_product(product)
    }
    fn get_cart(&self) -> impl Future<Output = StoreResult<Cart>> + Send {
        (**self).get_cart()
    }
    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).add_item(product_id, quantity)
    }
    fn remove_item(&self, product_id: &ProductId) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).remove_item(product_id)
    }
    fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).set_quantity(product_id, quantity)
    }
    fn clear_cart(&self) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).clear_cart()
    }
    fn clear_user_cart(&self, user_id: &UserId) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).clear_user_cart(user_id)
    }
    fn list_users(&self) -> impl Future<Output = StoreResult<Vec<User>>> + Send {
        (**self).list_users()
    }
    fn list_carts(&self) -> impl Future<Output = StoreResult<Vec<Cart>>> + Send {
        (**self).list_carts()
    }
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = StoreResult<SecretString>> + Send {
        (**self).login(credentials)
    }
    fn create_payment_intent(&self) -> impl Future<Output = StoreResult<PaymentIntent>> + Send {
        (**self).create_payment_intent()
    }
}

/// Login form (`POST /login`).
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(rename = "senha", serialize_with = "expose")]
    pub password: SecretString,
}

impl Credentials {
    /// Bundle an email and password.
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn expose<S: serde::Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    use secrecy::ExposeSecret;
    serializer.serialize_str(secret.expose_secret())
}

/// Successful login response.
#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

/// Payment intent created by the backend (`POST /pagamento`).
#[derive(Clone, Deserialize)]
pub struct PaymentIntent {
    /// Secret the payment provider needs to confirm the card payment.
    #[serde(rename = "clientSecret", deserialize_with = "secret_from_str")]
    pub client_secret: SecretString,
    /// Amount to be charged, in centavos.
    #[serde(default)]
    pub amount: Option<i64>,
}

impl fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("client_secret", &"[REDACTED]")
            .field("amount", &self.amount)
            .finish()
    }
}

fn secret_from_str<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Body of `POST /adicionarItem` and `PUT /carrinho/quantidade`.
#[derive(Debug, Serialize)]
pub(crate) struct ItemQuantity<'a> {
    #[serde(rename = "produtoId")]
    pub product_id: &'a ProductId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

/// Body of `POST /removerItem`.
#[derive(Debug, Serialize)]
pub(crate) struct ItemRef<'a> {
    #[serde(rename = "produtoId")]
    pub product_id: &'a ProductId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_credentials_wire_format() {
        let creds = Credentials::new("ana@flora.test", SecretString::from("s3nha"));
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["email"], "ana@flora.test");
        assert_eq!(json["senha"], "s3nha");
        assert!(!format!("{creds:?}").contains("s3nha"));
    }

    #[test]
    fn test_payment_intent_parse() {
        let intent: PaymentIntent =
            serde_json::from_str(r#"{"clientSecret":"pi_1_secret_2","amount":2500}"#).unwrap();
        assert_eq!(intent.client_secret.expose_secret(), "pi_1_secret_2");
        assert_eq!(intent.amount, Some(2500));
        assert!(!format!("{intent:?}").contains("pi_1_secret_2"));
    }

    #[test]
    fn test_item_bodies() {
        let id = ProductId::new("p1");
        let body = serde_json::to_value(ItemQuantity {
            product_id: &id,
            quantity: 1,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"produtoId": "p1", "quantidade": 1}));

        let body = serde_json::to_value(ItemRef { product_id: &id }).unwrap();
        assert_eq!(body, serde_json::json!({"produtoId": "p1"}));
    }
}
