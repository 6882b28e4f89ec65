//! Checkout bridge.
//!
//! Requests a payment intent from the backend, checks the amount it declares
//! against the cart total the user was shown, and hands the card confirmation
//! to an external [`PaymentProvider`]. The backend's intent is authoritative:
//! a mismatch is reported but never blocks the payment.

use secrecy::SecretString;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use floricultura_core::Price;

use crate::api::{PaymentIntent, StoreApi};
use crate::error::StoreError;
use crate::notify::{Notice, Notifier};

const APPROVED: &str = "Pagamento aprovado!";
const INTENT_FAILED: &str = "Erro ao iniciar pagamento. Veja o console.";

// =============================================================================
// Payment provider seam
// =============================================================================

/// Terminal status reported by the provider for a confirmed intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded,
    /// Any other provider status (`processing`, `requires_action`, ...).
    Other(String),
}

/// Provider-side failure (card declined, invalid details).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External service that tokenizes the card and confirms the intent.
pub trait PaymentProvider: Send + Sync {
    fn confirm_card_payment(
        &self,
        client_secret: &SecretString,
    ) -> impl Future<Output = Result<PaymentStatus, ProviderError>> + Send;
}

// =============================================================================
// Types
// =============================================================================

/// Checkout could not start.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("failed to create payment intent: {0}")]
    Intent(#[source] StoreError),
}

/// The declared charge differs from the displayed cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountMismatch {
    /// Amount the backend will charge.
    pub charged: Price,
    /// Total the user was shown.
    pub expected: Price,
}

impl AmountMismatch {
    /// Warning text for the user.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Atenção: o valor de pagamento ({}) difere do total do carrinho ({}).",
            self.charged, self.expected
        )
    }
}

/// Intent obtained and checked, ready for the provider.
#[derive(Debug)]
pub struct PreparedPayment {
    pub intent: PaymentIntent,
    pub mismatch: Option<AmountMismatch>,
}

impl PreparedPayment {
    /// Declared charge in reais, when the backend sent one.
    #[must_use]
    pub fn charged(&self) -> Option<Price> {
        self.intent.amount.map(Price::from_minor_units)
    }
}

/// How the provider settled the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved,
    /// Provider error, with its message.
    Failed(String),
    /// Provider returned a non-terminal status.
    Incomplete(String),
}

impl PaymentOutcome {
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Result of a full checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHandle {
    pub charged: Option<Price>,
    pub mismatch: Option<AmountMismatch>,
    pub outcome: PaymentOutcome,
}

/// Compare the declared charge (centavos) with the displayed total.
///
/// Skipped when either side is unknown or the declared amount is zero.
#[must_use]
pub fn check_amount(amount: Option<i64>, expected: Option<Price>) -> Option<AmountMismatch> {
    let amount = amount.filter(|a| *a != 0)?;
    let expected = expected?.rounded();
    let charged = Price::from_minor_units(amount).rounded();
    (charged != expected).then_some(AmountMismatch { charged, expected })
}

// =============================================================================
// CheckoutBridge
// =============================================================================

/// Drives a checkout against the store backend.
pub struct CheckoutBridge<A, N> {
    api: A,
    notifier: N,
}

impl<A, N> CheckoutBridge<A, N>
where
    A: StoreApi,
    N: Notifier,
{
    pub const fn new(api: A, notifier: N) -> Self {
        Self { api, notifier }
    }

    /// The cart total to show next to the pay button.
    ///
    /// `None` when the cart cannot be fetched; the check is then skipped.
    #[instrument(skip(self))]
    pub async fn cart_total(&self) -> Option<Price> {
        match self.api.get_cart().await {
            Ok(cart) => Some(cart.total),
            Err(e) => {
                warn!(error = %e, "Could not load cart total for checkout");
                None
            }
        }
    }

    /// Request a payment intent and check its amount.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Intent` if the backend will not create one.
    #[instrument(skip(self))]
    pub async fn prepare(
        &self,
        expected_total: Option<Price>,
    ) -> Result<PreparedPayment, CheckoutError> {
        let intent = self.api.create_payment_intent().await.map_err(|e| {
            error!(error = %e, "Payment intent request failed");
            self.notifier
                .notify(Notice::error(e.user_message(INTENT_FAILED)));
            CheckoutError::Intent(e)
        })?;

        let mismatch = check_amount(intent.amount, expected_total);
        if let Some(m) = &mismatch {
            warn!(charged = %m.charged, expected = %m.expected, "Payment amount differs from cart total");
            self.notifier.notify(Notice::warning(m.message()));
        }

        Ok(PreparedPayment { intent, mismatch })
    }

    /// Hand the intent to the provider and relay its answer.
    #[instrument(skip_all)]
    pub async fn confirm<P: PaymentProvider>(
        &self,
        prepared: &PreparedPayment,
        provider: &P,
    ) -> PaymentOutcome {
        match provider
            .confirm_card_payment(&prepared.intent.client_secret)
            .await
        {
            Ok(PaymentStatus::Succeeded) => {
                info!("Payment approved");
                self.notifier.notify(Notice::info(APPROVED));
                PaymentOutcome::Approved
            }
            Ok(PaymentStatus::Other(status)) => {
                info!(%status, "Payment not settled");
                PaymentOutcome::Incomplete(status)
            }
            Err(e) => {
                warn!(error = %e, "Payment provider refused the payment");
                self.notifier.notify(Notice::error(format!("Erro: {e}")));
                PaymentOutcome::Failed(e.message)
            }
        }
    }

    /// Prepare and confirm in one go.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Intent` if no intent could be created; the
    /// provider is not contacted then.
    pub async fn initiate_checkout<P: PaymentProvider>(
        &self,
        expected_total: Option<Price>,
        provider: &P,
    ) -> Result<PaymentHandle, CheckoutError> {
        let prepared = self.prepare(expected_total).await?;
        let outcome = self.confirm(&prepared, provider).await;
        Ok(PaymentHandle {
            charged: prepared.charged(),
            mismatch: prepared.mismatch,
            outcome,
        })
    }
}
