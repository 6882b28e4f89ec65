//! `cart show|add|remove|set|clear`.

use floricultura_core::{Cart, ProductId};
use floricultura_storefront::{
    CartError, CartLineView, CartReconciler, CartView, HttpStore,
};

use super::Context;
use super::products::fetch_catalog;
use crate::terminal::{TerminalConfirmer, TerminalNotifier};

type Reconciler = CartReconciler<HttpStore, TerminalNotifier, TerminalConfirmer>;

fn reconciler(ctx: &Context, assume_yes: bool) -> Reconciler {
    CartReconciler::new(
        ctx.store.clone(),
        TerminalNotifier,
        TerminalConfirmer::new(assume_yes),
    )
}

/// Print the cart joined with the catalog.
///
/// # Errors
///
/// Returns `CartError::Refresh` if the cart cannot be fetched.
pub async fn show(ctx: &Context) -> Result<(), CartError> {
    let cart = reconciler(ctx, false).load().await?;
    print_cart(ctx, &cart).await;
    Ok(())
}

/// Add one unit and print the refreshed cart.
///
/// # Errors
///
/// Returns `CartError` naming the step that failed.
pub async fn add(ctx: &Context, product_id: &str) -> Result<(), CartError> {
    let cart = reconciler(ctx, false)
        .add_item(&ProductId::new(product_id))
        .await?;
    print_cart(ctx, &cart).await;
    Ok(())
}

/// Remove a line and print the refreshed cart.
///
/// # Errors
///
/// Returns `CartError` naming the step that failed.
pub async fn remove(ctx: &Context, product_id: &str) -> Result<(), CartError> {
    let cart = reconciler(ctx, false)
        .remove_item(&ProductId::new(product_id))
        .await?;
    print_cart(ctx, &cart).await;
    Ok(())
}

/// Set a quantity and print the refreshed cart.
///
/// # Errors
///
/// Returns `CartError` naming the step that failed.
pub async fn set(ctx: &Context, product_id: &str, quantity: i64) -> Result<(), CartError> {
    let cart = reconciler(ctx, false)
        .set_quantity(&ProductId::new(product_id), quantity)
        .await?;
    print_cart(ctx, &cart).await;
    Ok(())
}

/// Empty the cart after confirmation.
///
/// # Errors
///
/// Returns `CartError::Mutation` if the backend refuses.
pub async fn clear(ctx: &Context, assume_yes: bool) -> Result<(), CartError> {
    if !reconciler(ctx, assume_yes).clear().await? {
        println!("Nada foi alterado.");
    }
    Ok(())
}

async fn print_cart(ctx: &Context, cart: &Cart) {
    // a failed catalog fetch leaves every line as "not found"
    let catalog = fetch_catalog(ctx, &TerminalNotifier)
        .await
        .unwrap_or_default();
    let view = CartView::build(Some(cart), &catalog);

    println!("Seu Carrinho ({})", view.line_count());
    if view.is_empty() {
        println!("  Seu carrinho está vazio");
    }
    for line in &view.lines {
        match line {
            CartLineView::Product {
                product_id,
                name,
                unit_price,
                quantity,
                line_total,
                ..
            } => println!(
                "  {name} ({product_id})  {quantity} x {} = {}",
                unit_price.display(),
                line_total.display()
            ),
            CartLineView::Missing {
                product_id,
                quantity,
            } => println!("  Produto não encontrado. ({product_id}, {quantity} un.)"),
        }
    }
    println!("Total: {}", view.total.display());
}
