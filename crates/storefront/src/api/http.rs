//! `reqwest` implementation of [`StoreApi`].
//!
//! Caches the product list using `moka` (TTL from configuration).

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use floricultura_core::{Cart, NewProduct, Product, ProductId, User, UserId};

use super::cache::{CacheKey, CacheValue};
use super::{
    Credentials, ItemQuantity, ItemRef, LoginResponse, PaymentIntent, StoreApi, StoreResult,
};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::session::Session;

/// Path of the admin cart listing.
const CARTS_PATH: &str = "/listarCarrinhos";

/// Path served by backends that predate `/listarCarrinhos`.
const LEGACY_CARTS_PATH: &str = "/carrinhos";

/// Whether a request needs the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// No token sent; a 401 is a rejected credential, not an expired session.
    Anonymous,
    /// Token attached when held.
    Public,
    /// Token required; fail before sending when absent.
    Admin,
}

/// A request under construction, with the access it was built for.
struct Pending {
    builder: RequestBuilder,
    access: Access,
}

impl Pending {
    fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        Self {
            builder: self.builder.json(body),
            access: self.access,
        }
    }
}

// =============================================================================
// HttpStore
// =============================================================================

/// HTTP client for the store backend.
///
/// Cheap to clone; clones share the connection pool, session and cache.
#[derive(Clone)]
pub struct HttpStore {
    inner: Arc<HttpStoreInner>,
}

struct HttpStoreInner {
    client: reqwest::Client,
    config: StoreConfig,
    session: Session,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl HttpStore {
    /// Create a client for the backend at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the underlying HTTP client cannot
    /// be built (TLS backend initialisation failure).
    pub fn new(config: &StoreConfig, session: Session) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;

        let cache = (!config.catalog_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(config.catalog_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpStoreInner {
                client,
                config: config.clone(),
                session,
                cache,
            }),
        })
    }

    /// The session whose token this client sends.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Drop the cached product list.
    pub async fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate(&CacheKey::Products).await;
        }
    }

    /// Start a request, attaching the bearer token according to `access`.
    async fn request(&self, method: Method, path: &str, access: Access) -> StoreResult<Pending> {
        let builder = self
            .inner
            .client
            .request(method, self.inner.config.endpoint(path));

        let builder = match (access, self.inner.session.token().await) {
            (Access::Anonymous, _) | (Access::Public, None) => builder,
            (_, Some(token)) => builder.bearer_auth(token.expose_secret()),
            (Access::Admin, None) => return Err(StoreError::NotAuthenticated),
        };
        Ok(Pending { builder, access })
    }

    /// Send a request and return the body of a successful response.
    ///
    /// A 401 on a credentialed request means the token expired and clears
    /// the session.
    async fn send(&self, pending: Pending) -> StoreResult<String> {
        let response = pending.builder.send().await.map_err(|e| {
            error!(error = %e, "Store backend did not respond");
            StoreError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read store backend response");
            StoreError::from(e)
        })?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Store backend returned non-success status"
            );
            if status == StatusCode::UNAUTHORIZED
                && pending.access != Access::Anonymous
                && self.inner.session.is_authenticated().await
            {
                info!("Token rejected by backend, clearing session");
                if let Err(e) = self.inner.session.clear().await {
                    warn!(error = %e, "Failed to clear rejected token");
                }
            }
            return Err(StoreError::from_response(status, &body));
        }

        Ok(body)
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, pending: Pending) -> StoreResult<T> {
        let body = self.send(pending).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse store backend response"
            );
            StoreError::from(e)
        })
    }

    /// Send a request whose response body carries nothing we need.
    async fn send_ack(&self, pending: Pending) -> StoreResult<()> {
        self.send(pending).await.map(drop)
    }
}

impl StoreApi for HttpStore {
    #[instrument(skip(self))]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Products(products)) = cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send_json(self.request(Method::GET, "/produtos", Access::Public).await?)
            .await?;

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(CacheKey::Products, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: &NewProduct) -> StoreResult<Product> {
        let created: Product = self
            .send_json(
                self.request(Method::POST, "/produtos", Access::Admin)
                    .await?
                    .json(product),
            )
            .await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_cart(&self) -> StoreResult<Cart> {
        self.send_json(self.request(Method::GET, "/carrinho", Access::Public).await?)
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> StoreResult<()> {
        self.send_ack(
            self.request(Method::POST, "/adicionarItem", Access::Public)
                .await?
                .json(&ItemQuantity {
                    product_id,
                    quantity,
                }),
        )
        .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_item(&self, product_id: &ProductId) -> StoreResult<()> {
        self.send_ack(
            self.request(Method::POST, "/removerItem", Access::Public)
                .await?
                .json(&ItemRef { product_id }),
        )
        .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> StoreResult<()> {
        self.send_ack(
            self.request(Method::PUT, "/carrinho/quantidade", Access::Public)
                .await?
                .json(&ItemQuantity {
                    product_id,
                    quantity,
                }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> StoreResult<()> {
        self.send_ack(self.request(Method::DELETE, "/carrinho", Access::Public).await?)
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn clear_user_cart(&self, user_id: &UserId) -> StoreResult<()> {
        let path = format!("/carrinho/{user_id}");
        self.send_ack(self.request(Method::DELETE, &path, Access::Admin).await?)
            .await
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.send_json(self.request(Method::GET, "/usuarios", Access::Admin).await?)
            .await
    }

    #[instrument(skip(self))]
    async fn list_carts(&self) -> StoreResult<Vec<Cart>> {
        let result = self
            .send_json(self.request(Method::GET, CARTS_PATH, Access::Admin).await?)
            .await;

        match result {
            Err(StoreError::Backend {
                status: StatusCode::NOT_FOUND,
                ..
            }) => {
                debug!("{CARTS_PATH} not found, trying {LEGACY_CARTS_PATH}");
                self.send_json(
                    self.request(Method::GET, LEGACY_CARTS_PATH, Access::Admin)
                        .await?,
                )
                .await
            }
            other => other,
        }
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> StoreResult<SecretString> {
        let response: LoginResponse = self
            .send_json(
                self.request(Method::POST, "/login", Access::Anonymous)
                    .await?
                    .json(credentials),
            )
            .await?;

        if response.token.trim().is_empty() {
            return Err(StoreError::Decode("login response has an empty token".to_string()));
        }
        Ok(SecretString::from(response.token))
    }

    #[instrument(skip(self))]
    async fn create_payment_intent(&self) -> StoreResult<PaymentIntent> {
        self.send_json(self.request(Method::POST, "/pagamento", Access::Public).await?)
            .await
    }
}
