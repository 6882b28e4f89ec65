//! Admin console error types.

use thiserror::Error;

use floricultura_core::ProductError;
use floricultura_storefront::StoreError;

/// Errors returned by [`crate::AdminConsole`] operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Product form failed validation; nothing was sent.
    #[error("invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// The backend refused or never answered.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Whether the backend (or the missing token) denied access.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        match self {
            Self::Store(e) => e.is_access_denied(),
            Self::InvalidProduct(_) => false,
        }
    }
}
