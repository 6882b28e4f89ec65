//! `admin` subcommands.

use rust_decimal::Decimal;

use floricultura_admin::{AdminConsole, AdminError, AdminGate};
use floricultura_core::{NewProduct, Price, UserId};
use floricultura_storefront::HttpStore;

use super::Context;
use crate::terminal::{TerminalConfirmer, TerminalNotifier};

type Console = AdminConsole<HttpStore, TerminalNotifier, TerminalConfirmer>;

/// Build the console, warning when the token does not claim the admin role.
async fn console(ctx: &Context, assume_yes: bool) -> Console {
    if !AdminGate::new(ctx.session.clone()).allows_admin().await {
        tracing::warn!("Session token does not claim the admin role; the backend may refuse");
    }
    AdminConsole::new(
        ctx.store.clone(),
        TerminalNotifier,
        TerminalConfirmer::new(assume_yes),
    )
}

/// # Errors
///
/// Returns `AdminError` if the catalog cannot be fetched.
pub async fn products(ctx: &Context) -> Result<(), AdminError> {
    for product in console(ctx, false).await.load_products().await? {
        println!(
            "{}  {}  {}  {}",
            product.id,
            product.name,
            product.price.display(),
            product.photo_url
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns `AdminError` if the form is invalid or the backend refuses.
pub async fn create_product(
    ctx: &Context,
    name: &str,
    price: Decimal,
    description: &str,
    photo_url: &str,
) -> Result<(), AdminError> {
    let product = NewProduct::new(name, Price::new(price), description, photo_url)?;
    let created = console(ctx, false).await.create_product(&product).await?;
    println!("Produto cadastrado: {} ({})", created.name, created.id);
    Ok(())
}

/// # Errors
///
/// Returns `AdminError` if the backend refuses.
pub async fn users(ctx: &Context) -> Result<(), AdminError> {
    for user in console(ctx, false).await.list_users().await? {
        println!("{}  {}  {}  {}", user.id, user.name, user.email, user.role);
    }
    Ok(())
}

/// # Errors
///
/// Returns `AdminError` if the backend refuses.
pub async fn carts(ctx: &Context) -> Result<(), AdminError> {
    let carts = console(ctx, false).await.list_carts().await?;
    if carts.is_empty() {
        println!("Nenhum carrinho.");
    }
    for cart in carts {
        println!(
            "{}  usuário {}  {} itens  {}",
            cart.id,
            cart.user_id,
            cart.line_count(),
            cart.total.display()
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns `AdminError` if the carts cannot be listed.
pub async fn metrics(ctx: &Context) -> Result<(), AdminError> {
    let snapshot = console(ctx, false).await.metrics().await?;
    println!("Usuários ativos: {}", snapshot.active_users);
    println!("Soma dos carrinhos: {}", snapshot.total_sum.display());
    println!("Mais vendidos:");
    for (rank, item) in snapshot.ranking.iter().enumerate() {
        println!("  {:>2}. {}  {}", rank + 1, item.name, item.quantity);
    }
    Ok(())
}

/// # Errors
///
/// Returns `AdminError` if the backend refuses.
pub async fn clear_cart(ctx: &Context, user_id: &str, assume_yes: bool) -> Result<(), AdminError> {
    let cleared = console(ctx, assume_yes)
        .await
        .clear_user_cart(&UserId::new(user_id))
        .await?;
    if !cleared {
        println!("Nada foi alterado.");
    }
    Ok(())
}
