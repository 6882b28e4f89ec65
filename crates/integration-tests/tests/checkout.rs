//! Checkout bridge against the fake backend.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use floricultura_integration_tests::{MockBackend, price};
use floricultura_storefront::{
    CheckoutBridge, HttpStore, NoticeLevel, PaymentOutcome, PaymentProvider, PaymentStatus,
    ProviderError, RecordingNotifier,
};

/// Approves any intent whose secret looks like one.
struct ApprovingProvider;

impl PaymentProvider for ApprovingProvider {
    async fn confirm_card_payment(
        &self,
        client_secret: &SecretString,
    ) -> Result<PaymentStatus, ProviderError> {
        if client_secret.expose_secret().ends_with("_secret") {
            Ok(PaymentStatus::Succeeded)
        } else {
            Err(ProviderError::new("client secret inválido"))
        }
    }
}

async fn bridge_with_cart(
    backend: &MockBackend,
) -> (CheckoutBridge<HttpStore, Arc<RecordingNotifier>>, Arc<RecordingNotifier>) {
    let bia = backend.add_account("Bia", "bia@flora.test", "senha", "cliente");
    let rosa = backend.add_product("Rosa", "10.00");
    let lirio = backend.add_product("Lírio", "5.00");
    backend.put_cart_item(&bia, &rosa, 2);
    backend.put_cart_item(&bia, &lirio, 1);

    let store = backend.client_for("bia@flora.test").await;
    let notifier = Arc::new(RecordingNotifier::new());
    (CheckoutBridge::new(store, notifier.clone()), notifier)
}

#[tokio::test]
async fn test_matching_amount_pays_without_warning() {
    let backend = MockBackend::start().await;
    let (bridge, notifier) = bridge_with_cart(&backend).await;

    let total = bridge.cart_total().await;
    assert_eq!(total, Some(price("25.00")));

    let handle = bridge
        .initiate_checkout(total, &ApprovingProvider)
        .await
        .unwrap();

    assert_eq!(handle.charged, Some(price("25.00")));
    assert!(handle.mismatch.is_none());
    assert_eq!(handle.outcome, PaymentOutcome::Approved);
    assert_eq!(notifier.last().unwrap().message, "Pagamento aprovado!");
}

#[tokio::test]
async fn test_mismatch_warns_and_still_pays() {
    let backend = MockBackend::start().await;
    let (bridge, notifier) = bridge_with_cart(&backend).await;
    backend.set_intent_amount(Some(3000));

    let total = bridge.cart_total().await;
    let handle = bridge
        .initiate_checkout(total, &ApprovingProvider)
        .await
        .unwrap();

    assert!(handle.outcome.is_approved());
    let warning = notifier
        .notices()
        .into_iter()
        .find(|n| n.level == NoticeLevel::Warning)
        .unwrap();
    assert_eq!(
        warning.message,
        "Atenção: o valor de pagamento (30.00) difere do total do carrinho (25.00)."
    );
}

#[tokio::test]
async fn test_missing_amount_skips_check() {
    let backend = MockBackend::start().await;
    let (bridge, notifier) = bridge_with_cart(&backend).await;
    backend.set_intent_amount(None);

    let prepared = bridge.prepare(bridge.cart_total().await).await.unwrap();

    assert!(prepared.charged().is_none());
    assert!(prepared.mismatch.is_none());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn test_intent_requires_login() {
    let backend = MockBackend::start().await;
    let store = backend.client(floricultura_storefront::Session::in_memory());
    let notifier = Arc::new(RecordingNotifier::new());
    let bridge = CheckoutBridge::new(store, notifier.clone());

    assert!(bridge.cart_total().await.is_none());
    assert!(bridge.prepare(None).await.is_err());
    assert_eq!(notifier.last().unwrap().message, "Token inválido ou ausente");
}
