//! Integration tests for Floricultura.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p floricultura-integration-tests
//! ```
//!
//! The tests need no external services: [`MockBackend`] serves the store's
//! REST API from an in-process axum router on an ephemeral port, and the real
//! [`HttpStore`] talks to it over loopback.
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart reconciliation over HTTP
//! - `auth` - Login, session persistence and token expiry
//! - `admin_console` - Admin listings, access denial and metrics
//! - `checkout` - Payment intent amount check

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use floricultura_core::{
    Cart, CartId, CartItem, NewProduct, Price, Product, ProductId, User, UserId, UserRole,
};
use floricultura_storefront::{HttpStore, Session, StoreConfig};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// Everything the fake backend knows.
#[derive(Debug, Default)]
pub struct BackendState {
    products: Vec<Product>,
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    /// Carts in creation order.
    carts: Vec<(UserId, Vec<CartItem>)>,
    next_id: u64,
    legacy_carts_only: bool,
    intent_amount: Option<Option<i64>>,
    failures: HashMap<String, (StatusCode, Option<String>)>,
    requests: Vec<String>,
}

impl BackendState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn issue_token(&mut self, user: &User) -> String {
        let nonce = self.next_id("t");
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({"id": user.id, "tipo": user.role.as_str(), "n": nonce}).to_string(),
        );
        let token = format!("{header}.{payload}.fake");
        self.tokens.insert(token.clone(), user.id.clone());
        token
    }

    fn caller(&self, headers: &HeaderMap) -> Option<User> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let id = self.tokens.get(token)?;
        self.accounts
            .iter()
            .find(|a| &a.user.id == id)
            .map(|a| a.user.clone())
    }

    fn require_user(&self, headers: &HeaderMap) -> Result<User, Response> {
        self.caller(headers)
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, Some("Token inválido ou ausente")))
    }

    /// Non-admins get a bare 403 so the client's own wording shows.
    fn require_admin(&self, headers: &HeaderMap) -> Result<User, Response> {
        let user = self.require_user(headers)?;
        if user.role.is_admin() {
            Ok(user)
        } else {
            Err(error(StatusCode::FORBIDDEN, None))
        }
    }

    fn items_mut(&mut self, user: &UserId) -> &mut Vec<CartItem> {
        if !self.carts.iter().any(|(u, _)| u == user) {
            self.carts.push((user.clone(), Vec::new()));
        }
        self.carts
            .iter_mut()
            .find(|(u, _)| u == user)
            .map(|(_, items)| items)
            .expect("cart was just created")
    }

    fn price_of(&self, id: &ProductId) -> Price {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .map_or(Price::ZERO, |p| p.price)
    }

    fn cart_of(&self, user: &UserId, with_names: bool) -> Cart {
        let mut items = self
            .carts
            .iter()
            .find(|(u, _)| u == user)
            .map(|(_, items)| items.clone())
            .unwrap_or_default();
        if with_names {
            for item in &mut items {
                item.name = self
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|p| p.name.clone());
            }
        }
        let total = items
            .iter()
            .map(|i| self.price_of(&i.product_id) * i.quantity)
            .sum();
        Cart {
            id: CartId::new(format!("c-{user}")),
            user_id: user.clone(),
            items,
            updated_at: Some(chrono::Utc::now()),
            total,
        }
    }

    fn all_carts(&self, with_names: bool) -> Vec<Cart> {
        self.carts
            .iter()
            .map(|(user, _)| self.cart_of(user, with_names))
            .collect()
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error(status: StatusCode, mensagem: Option<&str>) -> Response {
    match mensagem {
        Some(m) => (status, Json(json!({ "mensagem": m }))).into_response(),
        None => status.into_response(),
    }
}

fn ok_message(message: &str) -> Response {
    Json(json!({ "mensagem": message })).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct ItemBody {
    #[serde(rename = "produtoId")]
    product_id: ProductId,
    #[serde(rename = "quantidade", default)]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    senha: String,
}

/// Log every request, and answer with an injected failure when one is queued.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let failure = {
        let mut st = lock(&state);
        st.requests.push(format!("{} {path}", request.method()));
        st.failures.remove(&path)
    };
    match failure {
        Some((status, message)) => error(status, message.as_deref()),
        None => next.run(request).await,
    }
}

async fn list_products(State(state): State<Shared>) -> Response {
    Json(lock(&state).products.clone()).into_response()
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(new): Json<NewProduct>,
) -> Response {
    let mut st = lock(&state);
    if let Err(denied) = st.require_admin(&headers) {
        return denied;
    }
    let product = Product {
        id: ProductId::new(st.next_id("p")),
        name: new.name,
        price: new.price,
        description: new.description,
        photo_url: new.photo_url,
    };
    st.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    match st.require_user(&headers) {
        Ok(user) => Json(st.cart_of(&user.id, false)).into_response(),
        Err(denied) => denied,
    }
}

async fn add_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ItemBody>,
) -> Response {
    let mut st = lock(&state);
    let user = match st.require_user(&headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    if !st.products.iter().any(|p| p.id == body.product_id) {
        return error(StatusCode::NOT_FOUND, Some("Produto não encontrado"));
    }
    let quantity = body.quantity.unwrap_or(1);
    let items = st.items_mut(&user.id);
    match items.iter_mut().find(|i| i.product_id == body.product_id) {
        Some(item) => item.quantity += quantity,
        None => items.push(CartItem::new(body.product_id, quantity)),
    }
    ok_message("Item adicionado")
}

async fn remove_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ItemBody>,
) -> Response {
    let mut st = lock(&state);
    let user = match st.require_user(&headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    let items = st.items_mut(&user.id);
    let before = items.len();
    items.retain(|i| i.product_id != body.product_id);
    if items.len() == before {
        return error(StatusCode::NOT_FOUND, Some("Item não encontrado no carrinho"));
    }
    ok_message("Item removido")
}

async fn set_quantity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ItemBody>,
) -> Response {
    let mut st = lock(&state);
    let user = match st.require_user(&headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    let Some(quantity) = body.quantity.filter(|q| *q > 0) else {
        return error(StatusCode::BAD_REQUEST, Some("Quantidade inválida"));
    };
    match st
        .items_mut(&user.id)
        .iter_mut()
        .find(|i| i.product_id == body.product_id)
    {
        Some(item) => {
            item.quantity = quantity;
            ok_message("Quantidade atualizada")
        }
        None => error(StatusCode::NOT_FOUND, Some("Item não encontrado no carrinho")),
    }
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = lock(&state);
    let user = match st.require_user(&headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    st.carts.retain(|(u, _)| u != &user.id);
    ok_message("Carrinho esvaziado")
}

async fn clear_user_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let mut st = lock(&state);
    if let Err(denied) = st.require_admin(&headers) {
        return denied;
    }
    let user_id = UserId::new(user_id);
    st.carts.retain(|(u, _)| u != &user_id);
    ok_message("Carrinho esvaziado")
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    if let Err(denied) = st.require_admin(&headers) {
        return denied;
    }
    let users: Vec<User> = st.accounts.iter().map(|a| a.user.clone()).collect();
    Json(users).into_response()
}

async fn list_carts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    if st.legacy_carts_only {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Err(denied) = st.require_admin(&headers) {
        return denied;
    }
    Json(st.all_carts(true)).into_response()
}

/// Older backends: same listing, without item names.
async fn list_carts_legacy(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let st = lock(&state);
    if let Err(denied) = st.require_admin(&headers) {
        return denied;
    }
    Json(st.all_carts(false)).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut st = lock(&state);
    let user = st
        .accounts
        .iter()
        .find(|a| a.user.email == body.email && a.password == body.senha)
        .map(|a| a.user.clone());
    match user {
        Some(user) => {
            let token = st.issue_token(&user);
            Json(json!({ "token": token })).into_response()
        }
        None => error(StatusCode::UNAUTHORIZED, Some("Email ou senha inválidos")),
    }
}

async fn create_payment_intent(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = lock(&state);
    let user = match st.require_user(&headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    let amount = st.intent_amount.unwrap_or_else(|| {
        let total = st.cart_of(&user.id, false).total.amount();
        (total * Decimal::ONE_HUNDRED).round().to_i64()
    });
    let secret = format!("pi_{}_secret", st.next_id(""));
    Json(json!({ "clientSecret": secret, "amount": amount })).into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/produtos", get(list_products).post(create_product))
        .route("/carrinho", get(get_cart).delete(clear_cart))
        .route("/carrinho/quantidade", put(set_quantity))
        .route("/carrinho/{usuario_id}", delete(clear_user_cart))
        .route("/adicionarItem", post(add_item))
        .route("/removerItem", post(remove_item))
        .route("/usuarios", get(list_users))
        .route("/listarCarrinhos", get(list_carts))
        .route("/carrinhos", get(list_carts_legacy))
        .route("/login", post(login))
        .route("/pagamento", post(create_payment_intent))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// MockBackend
// =============================================================================

/// Fake store backend running on `127.0.0.1` for the life of the value.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Shared::default();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL of the fake backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend, with a short timeout.
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        let mut config = StoreConfig::for_api_url(&self.url()).expect("Invalid fake backend URL");
        config.timeout = Duration::from_secs(5);
        config
    }

    /// HTTP client over `session`.
    #[must_use]
    pub fn client(&self, session: Session) -> HttpStore {
        HttpStore::new(&self.config(), session).expect("Failed to build HTTP client")
    }

    /// HTTP client already holding a token for `email`.
    pub async fn client_for(&self, email: &str) -> HttpStore {
        let session = Session::in_memory();
        session
            .set_token(self.token_for(email).into())
            .await
            .expect("Failed to store token");
        self.client(session)
    }

    /// Add a catalog product; `price` is a decimal string such as `"10.00"`.
    pub fn add_product(&self, name: &str, price: &str) -> ProductId {
        let mut st = lock(&self.state);
        let id = ProductId::new(st.next_id("p"));
        st.products.push(Product {
            id: id.clone(),
            name: name.to_owned(),
            price: Price::new(Decimal::from_str(price).expect("Invalid price")),
            description: format!("{name} fresca"),
            photo_url: format!("https://img.floricultura.test/{id}.png"),
        });
        id
    }

    /// Register an account; `role` is the raw `tipo` (`"admin"`, `"cliente"`).
    pub fn add_account(&self, name: &str, email: &str, password: &str, role: &str) -> UserId {
        let mut st = lock(&self.state);
        let id = UserId::new(st.next_id("u"));
        st.accounts.push(Account {
            user: User {
                id: id.clone(),
                name: name.to_owned(),
                email: email.to_owned(),
                role: UserRole::from(role),
            },
            password: password.to_owned(),
        });
        id
    }

    /// Issue a token for an existing account without going through `/login`.
    pub fn token_for(&self, email: &str) -> String {
        let mut st = lock(&self.state);
        let user = st
            .accounts
            .iter()
            .find(|a| a.user.email == email)
            .map(|a| a.user.clone())
            .expect("Unknown account");
        st.issue_token(&user)
    }

    /// Invalidate every issued token, as if they had expired.
    pub fn expire_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    /// Put units of a product straight into a user's cart.
    pub fn put_cart_item(&self, user: &UserId, product: &ProductId, quantity: u32) {
        let mut st = lock(&self.state);
        let items = st.items_mut(user);
        match items.iter_mut().find(|i| &i.product_id == product) {
            Some(item) => item.quantity += quantity,
            None => items.push(CartItem::new(product.clone(), quantity)),
        }
    }

    /// Lines of a user's cart as the backend holds them.
    #[must_use]
    pub fn cart_items(&self, user: &UserId) -> Vec<CartItem> {
        lock(&self.state).cart_of(user, false).items
    }

    /// Answer the next request to `path` with `status` (and a `mensagem`).
    pub fn fail_next(&self, path: &str, status: StatusCode, mensagem: Option<&str>) {
        lock(&self.state)
            .failures
            .insert(path.to_owned(), (status, mensagem.map(str::to_owned)));
    }

    /// Serve carts only on the legacy `/carrinhos` path.
    pub fn legacy_carts_only(&self) {
        lock(&self.state).legacy_carts_only = true;
    }

    /// Override the amount `/pagamento` declares (centavos; `None` omits it).
    pub fn set_intent_amount(&self, amount: Option<i64>) {
        lock(&self.state).intent_amount = Some(amount);
    }

    /// Requests received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// How many times `"METHOD /path"` was requested.
    #[must_use]
    pub fn request_count(&self, request: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.as_str() == request)
            .count()
    }
}

/// Parse a decimal price, for assertions.
#[must_use]
pub fn price(s: &str) -> Price {
    Price::new(Decimal::from_str(s).expect("Invalid price"))
}
