//! Stock listing.

use std::collections::HashMap;

use rocketshoes_core::{CatalogProduct, ProductId, StockRecord};

use super::{CliError, connect};

/// Render stock records alongside catalog titles, in stock order.
///
/// Records without a catalog entry are still listed.
pub fn render(stock: &[StockRecord], catalog: &[CatalogProduct]) -> Vec<String> {
    let titles: HashMap<ProductId, &str> = catalog
        .iter()
        .map(|product| (product.id, product.title.as_str()))
        .collect();

    stock
        .iter()
        .map(|record| {
            let title = titles.get(&record.id).copied().unwrap_or("(not in catalog)");
            let state = if record.is_available() {
                format!("{} in stock", record.amount)
            } else {
                "sold out".to_string()
            };
            format!("#{:<6} {title:<40} {state}", record.id.to_string())
        })
        .collect()
}

/// List backend stock.
pub async fn list() -> Result<(), CliError> {
    let (_, api) = connect()?;
    let (stock, catalog) = tokio::try_join!(api.stock_list(), api.products())?;

    if stock.is_empty() {
        tracing::info!("No stock records");
        return Ok(());
    }
    for line in render(&stock, &catalog) {
        tracing::info!("{line}");
    }
    Ok(())
}
