//! Domain models exchanged with the store backend.
//!
//! Field names follow the backend's JSON (`nome`, `preco`, `itens`, ...) via
//! `serde(rename)`; the Rust side uses English names.

pub mod cart;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use product::{NewProduct, Product, ProductError, find_product, search_products};
pub use user::User;
