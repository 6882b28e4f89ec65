//! `checkout`: prepares the payment and reports the amount check.
//!
//! Card entry and confirmation belong to the payment provider's own UI, so
//! the terminal stops once the intent is ready.

use floricultura_storefront::{CheckoutBridge, CheckoutError};

use super::Context;
use crate::terminal::TerminalNotifier;

/// Request a payment intent and compare it with the cart total.
///
/// # Errors
///
/// Returns `CheckoutError::Intent` if the backend will not create one.
pub async fn prepare(ctx: &Context) -> Result<(), CheckoutError> {
    let bridge = CheckoutBridge::new(ctx.store.clone(), TerminalNotifier);

    let total = bridge.cart_total().await;
    match total {
        Some(total) => println!("Valor a pagar: {}", total.display()),
        None => println!("Valor a pagar: -"),
    }

    let prepared = bridge.prepare(total).await?;
    match prepared.charged() {
        Some(charged) => println!("Valor da cobrança: {}", charged.display()),
        None => println!("O servidor não informou o valor da cobrança."),
    }
    // a mismatch was already reported; the backend amount is what gets charged
    println!("Pagamento pronto para confirmação no provedor.");
    Ok(())
}
