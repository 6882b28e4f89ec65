//! Floricultura storefront library.
//!
//! Client side of the Floricultura store: the REST client, the session that
//! carries its credential, and the logic the storefront views run on top of it.
//!
//! # Modules
//!
//! - [`api`] - [`StoreApi`] trait and its `reqwest` implementation
//! - [`cart`] - Cart reconciliation and the cart display model
//! - [`checkout`] - Payment intent amount check and provider hand-off
//! - [`login`] - Login/logout and landing selection
//! - [`session`] - Token storage
//! - [`notify`] - Notice and confirmation seams for front-ends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod login;
pub mod notify;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{Credentials, HttpStore, PaymentIntent, StoreApi, StoreResult};
pub use cart::{CartError, CartLineView, CartReconciler, CartView};
pub use checkout::{
    AmountMismatch, CheckoutBridge, CheckoutError, PaymentHandle, PaymentOutcome,
    PaymentProvider, PaymentStatus, PreparedPayment, ProviderError,
};
pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use login::{Landing, LoginError, login, logout};
pub use notify::{Confirmer, FixedAnswer, Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{CredentialStore, FileCredentialStore, MemoryCredentialStore, Session, SessionError};
