//! Admin console against the fake backend.

use std::sync::Arc;

use floricultura_admin::{AdminConsole, AdminError, AdminGate};
use floricultura_core::{NewProduct, UserId};
use floricultura_integration_tests::{MockBackend, price};
use floricultura_storefront::{
    FixedAnswer, HttpStore, Notice, RecordingNotifier, Session, StoreConfig,
};
use secrecy::SecretString;

type Console = AdminConsole<HttpStore, Arc<RecordingNotifier>, FixedAnswer>;

async fn console_for(backend: &MockBackend, email: &str) -> (Console, Arc<RecordingNotifier>) {
    let store = backend.client_for(email).await;
    let notifier = Arc::new(RecordingNotifier::new());
    (
        AdminConsole::new(store, notifier.clone(), FixedAnswer(true)),
        notifier,
    )
}

/// Two customers: Bia with 3 Rosa + 1 Lírio, Caio with 2 Rosa. Returns Bia.
fn seed(backend: &MockBackend) -> UserId {
    backend.add_account("Ana", "ana@flora.test", "senha", "admin");
    let bia = backend.add_account("Bia", "bia@flora.test", "senha", "cliente");
    let caio = backend.add_account("Caio", "caio@flora.test", "senha", "cliente");
    let rosa = backend.add_product("Rosa", "10.00");
    let lirio = backend.add_product("Lírio", "5.00");
    backend.put_cart_item(&bia, &rosa, 3);
    backend.put_cart_item(&bia, &lirio, 1);
    backend.put_cart_item(&caio, &rosa, 2);
    bia
}

#[tokio::test]
async fn test_metrics_over_named_listing() {
    let backend = MockBackend::start().await;
    seed(&backend);
    let (console, _) = console_for(&backend, "ana@flora.test").await;

    let metrics = console.metrics().await.unwrap();

    assert_eq!(metrics.active_users, 2);
    assert_eq!(metrics.total_sum, price("55.00"));
    assert_eq!(metrics.ranking[0].name, "Rosa");
    assert_eq!(metrics.ranking[0].quantity, 5);
    assert_eq!(metrics.ranking[1].name, "Lírio");
    assert_eq!(backend.request_count("GET /carrinhos"), 0);
}

#[tokio::test]
async fn test_metrics_fall_back_to_legacy_listing() {
    let backend = MockBackend::start().await;
    seed(&backend);
    backend.legacy_carts_only();
    let (console, _) = console_for(&backend, "ana@flora.test").await;

    let metrics = console.metrics().await.unwrap();

    assert_eq!(backend.request_count("GET /listarCarrinhos"), 1);
    assert_eq!(backend.request_count("GET /carrinhos"), 1);
    // legacy listing has no names; the catalog supplies them
    assert_eq!(metrics.ranking[0].name, "Rosa");
    assert_eq!(metrics.ranking[1].name, "Lírio");
}

#[tokio::test]
async fn test_unreachable_backend_is_reported_as_such() {
    // nothing listens on the discard port
    let config = StoreConfig::for_api_url("http://127.0.0.1:9").unwrap();
    let session = Session::in_memory();
    session.set_token(SecretString::from("t")).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let console = AdminConsole::new(
        HttpStore::new(&config, session).unwrap(),
        notifier.clone(),
        FixedAnswer(true),
    );

    assert!(!console.list_users().await.unwrap_err().is_access_denied());
    let shown = notifier.last().unwrap().message;
    assert!(shown.starts_with("Servidor não respondeu. Erro:"), "{shown}");

    let new = NewProduct::new("Tulipa", price("12.50"), "Holandesa", "http://img/t").unwrap();
    console.create_product(&new).await.unwrap_err();
    let shown = notifier.last().unwrap().message;
    assert!(shown.starts_with("Servidor não respondeu. Erro:"), "{shown}");
}

#[tokio::test]
async fn test_customer_is_denied_with_fallback_messages() {
    let backend = MockBackend::start().await;
    seed(&backend);
    let (console, notifier) = console_for(&backend, "bia@flora.test").await;

    let err = console.list_users().await.unwrap_err();
    assert!(err.is_access_denied());
    assert_eq!(
        notifier.last(),
        Some(Notice::error(
            "Acesso negado: apenas administradores podem listar usuários."
        ))
    );

    let new = NewProduct::new("Tulipa", price("12.50"), "Holandesa", "http://img/t").unwrap();
    console.create_product(&new).await.unwrap_err();
    assert_eq!(
        notifier.last(),
        Some(Notice::error(
            "Erro ao cadastrar produto. Verifique as permissões."
        ))
    );

    assert!(matches!(console.metrics().await, Err(AdminError::Store(_))));
}

#[tokio::test]
async fn test_gate_follows_token_role() {
    let backend = MockBackend::start().await;
    seed(&backend);

    let admin = backend.client_for("ana@flora.test").await;
    assert!(AdminGate::new(admin.session().clone()).allows_admin().await);

    let customer = backend.client_for("bia@flora.test").await;
    assert!(!AdminGate::new(customer.session().clone()).allows_admin().await);
}

#[tokio::test]
async fn test_create_product_and_list_users() {
    let backend = MockBackend::start().await;
    seed(&backend);
    let (console, _) = console_for(&backend, "ana@flora.test").await;
    console.load_products().await.unwrap();

    let new = NewProduct::new("Tulipa", price("12.50"), "Holandesa", "http://img/t").unwrap();
    let created = console.create_product(&new).await.unwrap();

    let products = console.products().await;
    assert_eq!(products.len(), 3);
    assert_eq!(products.last(), Some(&created));

    let users = console.list_users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users.iter().filter(|u| u.role.is_admin()).count(), 1);
}

#[tokio::test]
async fn test_clear_user_cart() {
    let backend = MockBackend::start().await;
    let bia = seed(&backend);
    assert_eq!(backend.cart_items(&bia).len(), 2);
    let (console, _) = console_for(&backend, "ana@flora.test").await;

    assert!(console.clear_user_cart(&bia).await.unwrap());

    assert!(backend.cart_items(&bia).is_empty());
    assert_eq!(console.metrics().await.unwrap().active_users, 1);
}
