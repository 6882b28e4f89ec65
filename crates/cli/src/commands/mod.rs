//! Subcommand implementations.

#![allow(clippy::print_stdout)]

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use std::sync::Arc;

use floricultura_storefront::{
    FileCredentialStore, HttpStore, Session, SessionError, StoreConfig, StoreError,
};
use thiserror::Error;

/// Errors raised while setting up a command.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not open session file: {0}")]
    Session(#[from] SessionError),

    #[error("could not create HTTP client: {0}")]
    Client(#[from] StoreError),
}

/// What every command needs: the client and the session it carries.
pub struct Context {
    pub session: Session,
    pub store: HttpStore,
}

impl Context {
    /// Restore the saved session and build the client.
    ///
    /// # Errors
    ///
    /// Returns `ContextError` if the session file is unreadable or the HTTP
    /// client cannot be built.
    pub fn open(config: &StoreConfig) -> Result<Self, ContextError> {
        let credentials = Arc::new(FileCredentialStore::new(&config.session_file));
        let session = Session::restore(credentials)?;
        let store = HttpStore::new(config, session.clone())?;
        tracing::debug!(api_url = %config.api_url, "Client ready");
        Ok(Self { session, store })
    }
}
