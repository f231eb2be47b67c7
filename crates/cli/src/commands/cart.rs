//! Cart commands.
//!
//! Each command hydrates the saved cart, runs one operation and prints the
//! resulting cart. The operation persists through the store itself.

use rocketshoes_core::ProductId;
use rocketshoes_storefront::cart::Cart;
use rocketshoes_storefront::state::open_cart;

use super::{CliError, connect};

/// Render a cart as display lines.
pub fn render(cart: &Cart) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Cart is empty".to_string()];
    }

    let mut lines: Vec<String> = cart
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "#{:<6} {:<40} {:>3} x {:>12} = {:>12}",
                entry.id.to_string(),
                entry.title,
                entry.amount,
                entry.price.display(),
                entry.line_total().display()
            )
        })
        .collect();
    lines.push(format!(
        "{} item(s), subtotal {}",
        cart.item_count(),
        cart.subtotal().display()
    ));
    lines
}

fn print(cart: &Cart) {
    for line in render(cart) {
        tracing::info!("{line}");
    }
}

/// Show the saved cart.
pub async fn show() -> Result<(), CliError> {
    let (config, api) = connect()?;
    let cart = open_cart(&config, api).await;
    print(&cart.cart());
    Ok(())
}

/// Add one unit of `id`.
pub async fn add(id: ProductId) -> Result<(), CliError> {
    let (config, api) = connect()?;
    let cart = open_cart(&config, api).await;
    cart.add_product(id).await?;
    print(&cart.cart());
    Ok(())
}

/// Remove `id` from the cart.
pub async fn remove(id: ProductId) -> Result<(), CliError> {
    let (config, api) = connect()?;
    let cart = open_cart(&config, api).await;
    cart.remove_product(id).await?;
    print(&cart.cart());
    Ok(())
}

/// Set the amount of `id`.
pub async fn update(id: ProductId, amount: i64) -> Result<(), CliError> {
    let (config, api) = connect()?;
    let cart = open_cart(&config, api).await;
    cart.update_product_amount(id, amount).await?;
    print(&cart.cart());
    Ok(())
}
