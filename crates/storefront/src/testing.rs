//! In-memory [`StoreApi`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Mutex;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::SecretString;

use floricultura_core::{Cart, CartItem, NewProduct, Price, Product, ProductId, User, UserId};

use crate::api::{Credentials, PaymentIntent, StoreApi, StoreResult};
use crate::error::StoreError;

/// Scripted failure for the next matching call.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transport,
    Backend(Option<&'static str>),
    Unauthorized(Option<&'static str>),
}

impl Failure {
    fn into_error(self) -> StoreError {
        match self {
            Self::Transport => StoreError::Transport("connection reset".to_string()),
            Self::Backend(message) => StoreError::Backend {
                status: StatusCode::BAD_REQUEST,
                message: message.map(str::to_owned),
            },
            Self::Unauthorized(message) => StoreError::Unauthorized {
                message: message.map(str::to_owned),
            },
        }
    }
}

/// One cart, a price list, a payment intent and a login token.
#[derive(Default)]
pub struct FakeStore {
    items: Mutex<Vec<CartItem>>,
    prices: Vec<(ProductId, Price)>,
    intent_amount: Mutex<Option<i64>>,
    token: Mutex<String>,
    failures: Mutex<VecDeque<(&'static str, Failure)>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeStore {
    pub fn with_prices(prices: &[(&str, &str)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(id, p)| (ProductId::new(*id), Price::new(Decimal::from_str(p).unwrap())))
                .collect(),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, call: &'static str, failure: Failure) {
        self.failures.lock().unwrap().push_back((call, failure));
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_intent_amount(&self, amount: Option<i64>) {
        *self.intent_amount.lock().unwrap() = amount;
    }

    pub fn set_login_token(&self, token: &str) {
        *self.token.lock().unwrap() = token.to_owned();
    }

    pub fn put_item(&self, product_id: &str, quantity: u32) {
        self.items
            .lock()
            .unwrap()
            .push(CartItem::new(product_id, quantity));
    }

    async fn enter(&self, call: &'static str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        tokio::task::yield_now().await;
        let mut failures = self.failures.lock().unwrap();
        if failures.front().is_some_and(|(c, _)| *c == call) {
            let (_, failure) = failures.pop_front().unwrap();
            return Err(failure.into_error());
        }
        Ok(())
    }

    fn price_of(&self, id: &ProductId) -> Price {
        self.prices
            .iter()
            .find(|(p, _)| p == id)
            .map_or(Price::ZERO, |(_, price)| *price)
    }
}

impl StoreApi for FakeStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.enter("list_products").await?;
        Ok(Vec::new())
    }

    async fn create_product(&self, _product: &NewProduct) -> StoreResult<Product> {
        Err(StoreError::NotAuthenticated)
    }

    async fn get_cart(&self) -> StoreResult<Cart> {
        self.enter("get_cart").await?;
        let items = self.items.lock().unwrap().clone();
        let total = items
            .iter()
            .map(|i| self.price_of(&i.product_id) * i.quantity)
            .sum();
        Ok(Cart {
            id: "c1".into(),
            user_id: "u1".into(),
            items,
            updated_at: None,
            total,
        })
    }

    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> StoreResult<()> {
        self.enter("add_item").await?;
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) => item.quantity += quantity,
            None => items.push(CartItem::new(product_id.clone(), quantity)),
        }
        Ok(())
    }

    async fn remove_item(&self, product_id: &ProductId) -> StoreResult<()> {
        self.enter("remove_item").await?;
        self.items
            .lock()
            .unwrap()
            .retain(|i| &i.product_id != product_id);
        Ok(())
    }

    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> StoreResult<()> {
        self.enter("set_quantity").await?;
        if let Some(item) = self
            .items
            .lock()
            .unwrap()
            .iter_mut()
            .find(|i| &i.product_id == product_id)
        {
            item.quantity = quantity;
        }
        Ok(())
    }

    async fn clear_cart(&self) -> StoreResult<()> {
        self.enter("clear_cart").await?;
        self.items.lock().unwrap().clear();
        Ok(())
    }

    async fn clear_user_cart(&self, _user_id: &UserId) -> StoreResult<()> {
        self.enter("clear_user_cart").await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.enter("list_users").await?;
        Ok(Vec::new())
    }

    async fn list_carts(&self) -> StoreResult<Vec<Cart>> {
        self.enter("list_carts").await?;
        Ok(Vec::new())
    }

    async fn login(&self, _credentials: &Credentials) -> StoreResult<SecretString> {
        self.enter("login").await?;
        Ok(SecretString::from(self.token.lock().unwrap().clone()))
    }

    async fn create_payment_intent(&self) -> StoreResult<PaymentIntent> {
        self.enter("create_payment_intent").await?;
        Ok(PaymentIntent {
            client_secret: SecretString::from("pi_test_secret"),
            amount: *self.intent_amount.lock().unwrap(),
        })
    }
}
