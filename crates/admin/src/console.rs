//! Admin console operations.
//!
//! Product registration, user and cart listings, the metrics snapshot, and
//! clearing a user's cart. Every failure is logged, turned into a notice for
//! the operator, and returned; the console's local product list is only
//! touched on success.

use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use floricultura_core::{
    AdminMetricsSnapshot, Cart, NewProduct, Product, User, UserId, compute_metrics, find_product,
};
use floricultura_storefront::{Confirmer, Notice, Notifier, StoreApi};

use crate::error::AdminError;

const PRODUCTS_FAILED: &str = "Erro ao buscar produtos.";
const CREATE_FAILED: &str = "Erro ao cadastrar produto. Verifique as permissões.";
const USERS_DENIED: &str = "Acesso negado: apenas administradores podem listar usuários.";
const USERS_FAILED: &str = "Erro ao buscar usuários. Veja o console.";
const CARTS_DENIED: &str = "Acesso negado: apenas administradores podem listar carrinhos.";
const CARTS_FAILED: &str = "Erro ao buscar carrinhos. Veja o console.";
const CLEAR_DENIED: &str = "Acesso negado: apenas administradores podem esvaziar carrinhos.";
const CLEAR_FAILED: &str = "Erro ao esvaziar carrinho. Veja o console.";
const CLEARED: &str = "Carrinho do usuário esvaziado com sucesso!";

/// Question asked before clearing another user's cart.
pub const CLEAR_USER_PROMPT: &str = "Tem certeza que deseja esvaziar o carrinho deste usuário?";

/// Admin console over a [`StoreApi`].
pub struct AdminConsole<A, N, C> {
    api: A,
    notifier: N,
    confirmer: C,
    products: RwLock<Vec<Product>>,
}

impl<A, N, C> AdminConsole<A, N, C>
where
    A: StoreApi,
    N: Notifier,
    C: Confirmer,
{
    pub fn new(api: A, notifier: N, confirmer: C) -> Self {
        Self {
            api,
            notifier,
            confirmer,
            products: RwLock::new(Vec::new()),
        }
    }

    /// Products currently shown in the console.
    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Fetch the catalog into the console.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if the catalog cannot be fetched; the
    /// previous list is kept.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> Result<Vec<Product>, AdminError> {
        let products = self.api.list_products().await.map_err(|e| {
            error!(error = %e, "Failed to load products");
            self.notifier
                .notify(Notice::error(e.user_message(PRODUCTS_FAILED)));
            e
        })?;
        *self.products.write().await = products.clone();
        Ok(products)
    }

    /// Register a product and append it to the local list.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidProduct` before sending anything if the
    /// form is invalid, or `AdminError::Store` if the backend refuses.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, AdminError> {
        if let Err(e) = product.validate() {
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }

        let created = self.api.create_product(product).await.map_err(|e| {
            error!(error = %e, "Failed to register product");
            self.notifier
                .notify(Notice::error(e.user_message(CREATE_FAILED)));
            e
        })?;

        info!(product_id = %created.id, "Product registered");
        self.products.write().await.push(created.clone());
        Ok(created)
    }

    /// List registered users.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store`; a refusal is reported as access denied.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, AdminError> {
        self.api.list_users().await.map_err(|e| {
            error!(error = %e, "Failed to list users");
            let fallback = if e.is_access_denied() {
                USERS_DENIED
            } else {
                USERS_FAILED
            };
            self.notifier.notify(Notice::error(e.user_message(fallback)));
            e.into()
        })
    }

    /// List every cart in the store.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store`; a refusal is reported as access denied.
    #[instrument(skip(self))]
    pub async fn list_carts(&self) -> Result<Vec<Cart>, AdminError> {
        self.api.list_carts().await.map_err(|e| {
            error!(error = %e, "Failed to list carts");
            let fallback = if e.is_access_denied() {
                CARTS_DENIED
            } else {
                CARTS_FAILED
            };
            self.notifier.notify(Notice::error(e.user_message(fallback)));
            e.into()
        })
    }

    /// Metrics over the current cart listing.
    ///
    /// Items without a name are labelled from the catalog, loading it first
    /// if the console has none yet.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if the carts cannot be listed.
    #[instrument(skip(self))]
    pub async fn metrics(&self) -> Result<AdminMetricsSnapshot, AdminError> {
        let carts = self.list_carts().await?;

        let mut catalog = self.products().await;
        if catalog.is_empty() && carts.iter().any(|c| c.items.iter().any(|i| i.name.is_none())) {
            // unlabelled items fall back to their product id
            catalog = self.load_products().await.unwrap_or_default();
        }

        let snapshot = compute_metrics(&label_items(carts, &catalog));
        info!(
            active_users = snapshot.active_users,
            total_sum = %snapshot.total_sum,
            ranked = snapshot.ranking.len(),
            "Metrics computed"
        );
        Ok(snapshot)
    }

    /// Empty another user's cart after the operator confirms.
    ///
    /// Returns `Ok(false)` without contacting the backend when declined.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if the backend refuses.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_user_cart(&self, user_id: &UserId) -> Result<bool, AdminError> {
        if !self.confirmer.confirm(CLEAR_USER_PROMPT) {
            return Ok(false);
        }

        self.api.clear_user_cart(user_id).await.map_err(|e| {
            error!(error = %e, "Failed to clear user cart");
            let fallback = if e.is_access_denied() {
                CLEAR_DENIED
            } else {
                CLEAR_FAILED
            };
            self.notifier.notify(Notice::error(e.user_message(fallback)));
            AdminError::from(e)
        })?;

        self.notifier.notify(Notice::info(CLEARED));
        Ok(true)
    }
}

/// Fill missing item names from the catalog.
fn label_items(mut carts: Vec<Cart>, catalog: &[Product]) -> Vec<Cart> {
    for item in carts.iter_mut().flat_map(|cart| cart.items.iter_mut()) {
        if item.name.is_none() {
            item.name = find_product(catalog, &item.product_id).map(|p| p.name.clone());
        }
    }
    carts
}
