//! Floricultura admin console.
//!
//! Operator-side operations over the same backend the storefront talks to:
//! product registration, user and cart listings, store metrics and clearing a
//! user's cart.
//!
//! # Access
//!
//! [`AdminGate`] reads the role from the session token to decide whether the
//! console is offered. That check is advisory. The backend enforces access on
//! every call and its 401/403 answers surface as "Acesso negado" notices.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod console;
pub mod error;
pub mod gate;

pub use console::{AdminConsole, CLEAR_USER_PROMPT};
pub use error::AdminError;
pub use gate::AdminGate;
