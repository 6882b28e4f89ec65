//! `products`.

use floricultura_core::{Product, search_products};
use floricultura_storefront::{Notice, Notifier, StoreApi, StoreError};
use tracing::error;

use super::Context;
use crate::terminal::TerminalNotifier;

const CATALOG_FAILED: &str = "Erro ao buscar produtos. Veja o console.";

/// Print the catalog, optionally filtered.
///
/// # Errors
///
/// Returns `StoreError` if the catalog cannot be fetched.
pub async fn list(ctx: &Context, search: Option<&str>) -> Result<(), StoreError> {
    let products = fetch_catalog(ctx, &TerminalNotifier).await?;
    let shown = search_products(&products, search.unwrap_or_default());

    if shown.is_empty() {
        println!("Nenhum produto encontrado.");
        return Ok(());
    }
    for product in shown {
        println!("{}  {}  {}", product.id, product.name, product.price.display());
        if !product.description.is_empty() {
            println!("    {}", product.description);
        }
    }
    Ok(())
}

/// Fetch the catalog, telling the user when it cannot be loaded.
pub(crate) async fn fetch_catalog<N: Notifier>(
    ctx: &Context,
    notifier: &N,
) -> Result<Vec<Product>, StoreError> {
    ctx.store.list_products().await.inspect_err(|e| {
        error!(error = %e, "Failed to fetch catalog");
        report_catalog_failure(notifier, e);
    })
}

fn report_catalog_failure<N: Notifier>(notifier: &N, err: &StoreError) {
    notifier.notify(Notice::error(err.user_message(CATALOG_FAILED)));
}

#[cfg(test)]
mod tests {
    use floricultura_storefront::RecordingNotifier;

    use super::*;

    #[test]
    fn test_catalog_failure_notice() {
        let notifier = RecordingNotifier::new();

        report_catalog_failure(&notifier, &StoreError::Forbidden { message: None });
        assert_eq!(notifier.last(), Some(Notice::error(CATALOG_FAILED)));

        report_catalog_failure(&notifier, &StoreError::Transport("timed out".to_owned()));
        assert_eq!(
            notifier.last(),
            Some(Notice::error("Servidor não respondeu. Erro: timed out"))
        );
    }
}
