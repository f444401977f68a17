use shrine_client::{CartContext, Mode};
use shrine_core::cart::{subtotal, total_quantity};

use crate::display;

pub(crate) async fn counts(ctx: &CartContext) -> anyhow::Result<()> {
    let counts = ctx.refresh_counts().await;
    println!("cart: {}  wishlist: {}", counts.cart, counts.wishlist);
    Ok(())
}

pub(crate) async fn show(ctx: &CartContext) -> anyhow::Result<()> {
    let lines = ctx.cart_lines().await?;
    if lines.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }
    for line in &lines {
        println!(
            "{:<40} x{:<4} {:>12}",
            line.product.title,
            line.effective_quantity(),
            display::price(line.line_total())
        );
    }
    println!(
        "{} item(s), subtotal {}",
        total_quantity(&lines),
        display::price(subtotal(&lines))
    );
    if ctx.mode() == Mode::Guest {
        println!("(guest cart: sign in to save it to your account)");
    }
    Ok(())
}

pub(crate) async fn add(ctx: &CartContext, product_id: &str, quantity: u32) -> anyhow::Result<()> {
    let product = ctx.api().get_product(product_id).await?;
    let outcome = ctx.add_to_cart(&product.to_ref(), quantity).await?;
    let counts = ctx.counts();
    if outcome.is_server_confirmed() {
        println!("Added {} x{} to your cart", product.title, quantity);
    } else {
        println!("Added {} x{} to your guest cart", product.title, quantity);
    }
    println!("cart: {}", counts.cart);
    Ok(())
}

pub(crate) async fn wishlist(ctx: &CartContext) -> anyhow::Result<()> {
    if ctx.mode() == Mode::Guest {
        println!("Sign in to use a wishlist");
        return Ok(());
    }
    let items = ctx.wishlist().await?;
    if items.is_empty() {
        println!("Your wishlist is empty");
    }
    for item in &items {
        println!("{:<24} {:<40} {:>12}", item.id, item.title, display::price(item.price));
    }
    Ok(())
}

pub(crate) async fn add_to_wishlist(ctx: &CartContext, product_id: &str) -> anyhow::Result<()> {
    ctx.add_to_wishlist(product_id).await?;
    println!("Saved to wishlist (wishlist: {})", ctx.counts().wishlist);
    Ok(())
}
