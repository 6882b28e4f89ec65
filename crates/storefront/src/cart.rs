//! Cart reconciliation against the backend.
//!
//! Every write follows the same chain: send the mutation, re-fetch the whole
//! cart, replace the local snapshot. Nothing is patched locally, so the view
//! can never drift from the server. A failure anywhere in the chain leaves the
//! previous snapshot untouched and is reported through the [`Notifier`].
//!
//! The snapshot lock is held for the whole chain, so two overlapping
//! mutations (a double click) run one after the other.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use floricultura_core::{Cart, Price, Product, ProductId, find_product};

use crate::api::StoreApi;
use crate::error::StoreError;
use crate::notify::{Confirmer, Notice, Notifier};

/// Question asked before clearing the cart.
pub const CLEAR_PROMPT: &str = "Tem certeza que deseja esvaziar todo o carrinho?";

const ADDED: &str = "Produto adicionado com sucesso!";
const CLEARED: &str = "Carrinho esvaziado com sucesso!";

/// Which step of a reconciliation failed.
#[derive(Debug, Error)]
pub enum CartError {
    /// The write itself was rejected or never answered.
    #[error("cart update failed: {0}")]
    Mutation(#[source] StoreError),

    /// The write went through but the cart could not be re-fetched.
    #[error("cart refresh failed: {0}")]
    Refresh(#[source] StoreError),
}

impl CartError {
    /// The underlying store error.
    #[must_use]
    pub const fn store_error(&self) -> &StoreError {
        match self {
            Self::Mutation(e) | Self::Refresh(e) => e,
        }
    }
}

/// Cart operations, for logging and user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CartOp {
    Load,
    Add,
    Remove,
    SetQuantity,
    Clear,
}

impl CartOp {
    /// Prefix used when the backend sent its own message, and the text used
    /// when it did not.
    const fn wording(self) -> (&'static str, &'static str) {
        match self {
            Self::Load => ("Erro ao buscar carrinho", "Erro ao buscar carrinho. Veja o console."),
            Self::Add => ("Erro", "Erro: Veja o console"),
            Self::Remove => ("Erro ao remover item", "Erro ao remover item: Veja o console"),
            Self::SetQuantity => (
                "Erro ao atualizar quantidade",
                "Erro ao atualizar quantidade. Veja o console.",
            ),
            Self::Clear => (
                "Erro ao esvaziar carrinho",
                "Erro ao esvaziar carrinho. Veja o console.",
            ),
        }
    }

    fn failure_message(self, err: &StoreError) -> String {
        let (prefix, fallback) = self.wording();
        if err.is_transport() {
            return err.user_message(fallback);
        }
        err.backend_message()
            .map_or_else(|| fallback.to_owned(), |msg| format!("{prefix}: {msg}"))
    }
}

// =============================================================================
// CartReconciler
// =============================================================================

/// Keeps a local cart snapshot consistent with the backend.
pub struct CartReconciler<A, N, C> {
    api: A,
    notifier: N,
    confirmer: C,
    cart: Mutex<Option<Cart>>,
}

impl<A, N, C> CartReconciler<A, N, C>
where
    A: StoreApi,
    N: Notifier,
    C: Confirmer,
{
    /// Create a reconciler with no snapshot yet; call [`Self::load`] first.
    pub fn new(api: A, notifier: N, confirmer: C) -> Self {
        Self {
            api,
            notifier,
            confirmer,
            cart: Mutex::new(None),
        }
    }

    /// The store client.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The current snapshot, `None` until the first successful load.
    pub async fn snapshot(&self) -> Option<Cart> {
        self.cart.lock().await.clone()
    }

    /// Fetch the cart and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Refresh` if the cart cannot be fetched; the
    /// previous snapshot is kept.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Cart, CartError> {
        let mut snapshot = self.cart.lock().await;
        let cart = self.refresh(CartOp::Load).await?;
        *snapshot = Some(cart.clone());
        Ok(cart)
    }

    /// Add one unit of a product, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `CartError` naming the failed step; the snapshot is unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId) -> Result<Cart, CartError> {
        let mut snapshot = self.cart.lock().await;
        self.mutate(CartOp::Add, self.api.add_item(product_id, 1))
            .await?;
        self.notifier.notify(Notice::info(ADDED));
        let cart = self.refresh(CartOp::Add).await?;
        *snapshot = Some(cart.clone());
        Ok(cart)
    }

    /// Remove a product line, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `CartError` naming the failed step; the snapshot is unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<Cart, CartError> {
        let mut snapshot = self.cart.lock().await;
        self.mutate(CartOp::Remove, self.api.remove_item(product_id))
            .await?;
        let cart = self.refresh(CartOp::Remove).await?;
        *snapshot = Some(cart.clone());
        Ok(cart)
    }

    /// Set a line's quantity, then re-fetch.
    ///
    /// A quantity of zero or less removes the line instead.
    ///
    /// # Errors
    ///
    /// Returns `CartError` naming the failed step; the snapshot is unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut snapshot = self.cart.lock().await;
        self.mutate(
            CartOp::SetQuantity,
            self.api.set_quantity(product_id, quantity),
        )
        .await?;
        let cart = self.refresh(CartOp::SetQuantity).await?;
        *snapshot = Some(cart.clone());
        Ok(cart)
    }

    /// Empty the cart after the user confirms.
    ///
    /// Returns `Ok(false)` without contacting the backend when the user
    /// declines. On success the snapshot becomes [`Cart::empty`] without a
    /// re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Mutation` if the backend refuses; the snapshot is
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<bool, CartError> {
        if !self.confirmer.confirm(CLEAR_PROMPT) {
            info!("Cart clear declined");
            return Ok(false);
        }

        let mut snapshot = self.cart.lock().await;
        self.mutate(CartOp::Clear, self.api.clear_cart()).await?;
        self.notifier.notify(Notice::info(CLEARED));
        *snapshot = Some(Cart::empty());
        Ok(true)
    }

    async fn mutate(
        &self,
        op: CartOp,
        request: impl Future<Output = Result<(), StoreError>>,
    ) -> Result<(), CartError> {
        request.await.map_err(|e| {
            error!(?op, error = %e, "Cart mutation failed");
            self.notifier.notify(Notice::error(op.failure_message(&e)));
            CartError::Mutation(e)
        })
    }

    async fn refresh(&self, after: CartOp) -> Result<Cart, CartError> {
        self.api.get_cart().await.map_err(|e| {
            error!(?after, error = %e, "Cart refresh failed");
            self.notifier
                .notify(Notice::error(CartOp::Load.failure_message(&e)));
            CartError::Refresh(e)
        })
    }
}

// =============================================================================
// CartView
// =============================================================================

/// One displayed cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartLineView {
    /// Product found in the catalog.
    Product {
        product_id: ProductId,
        name: String,
        photo_url: String,
        unit_price: Price,
        quantity: u32,
        /// `unit_price × quantity`.
        line_total: Price,
    },
    /// The cart references a product the catalog no longer lists.
    Missing { product_id: ProductId, quantity: u32 },
}

/// Display model for a cart joined with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    /// Backend total; zero before the cart is loaded.
    pub total: Price,
}

impl CartView {
    /// Join `cart` with `catalog`. `None` renders as an empty cart.
    #[must_use]
    pub fn build(cart: Option<&Cart>, catalog: &[Product]) -> Self {
        let Some(cart) = cart else {
            return Self::empty();
        };

        let lines = cart
            .items
            .iter()
            .map(|item| match find_product(catalog, &item.product_id) {
                Some(product) => CartLineView::Product {
                    product_id: item.product_id.clone(),
                    name: product.name.clone(),
                    photo_url: product.photo_url.clone(),
                    unit_price: product.price,
                    quantity: item.quantity,
                    line_total: product.price * item.quantity,
                },
                None => CartLineView::Missing {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                },
            })
            .collect();

        Self {
            lines,
            total: cart.total,
        }
    }

    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total: Price::ZERO,
        }
    }

    /// Number of lines, as shown in the cart header.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
