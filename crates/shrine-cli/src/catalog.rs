use chrono::Utc;
use shrine_client::CartContext;
use shrine_core::{best_match, Coupon};

use crate::display;

/// Coupons live right now. A failed fetch just means no discounts are shown.
async fn live_coupons(ctx: &CartContext) -> Vec<Coupon> {
    match ctx.api().active_coupons().await {
        Ok(coupons) => {
            let now = Utc::now();
            coupons.into_iter().filter(|c| c.is_live_at(now)).collect()
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not load coupons");
            Vec::new()
        }
    }
}

pub(crate) async fn list(ctx: &CartContext, category: Option<&str>) -> anyhow::Result<()> {
    let (products, coupons) = tokio::join!(ctx.api().list_products(), live_coupons(ctx));
    let products = products?;

    let wanted = category.map(str::to_lowercase);
    let mut shown = 0usize;
    for product in products.iter().filter(|p| match &wanted {
        Some(w) => p.category.as_deref().is_some_and(|c| c.to_lowercase() == *w),
        None => true,
    }) {
        let best = best_match(Some(product), &coupons);
        println!("{}", display::product_row(product, best.as_ref()));
        shown += 1;
    }
    if shown == 0 {
        println!("No products found");
    }
    Ok(())
}

pub(crate) async fn show(ctx: &CartContext, product_id: &str) -> anyhow::Result<()> {
    let (product, coupons) = tokio::join!(ctx.api().get_product(product_id), live_coupons(ctx));
    let product = product?;
    let best = best_match(Some(&product), &coupons);

    println!("{}", product.title);
    println!("price: {}", display::price(product.price));
    if let Some(category) = &product.category {
        match &product.subcategory {
            Some(sub) => println!("category: {category} / {sub}"),
            None => println!("category: {category}"),
        }
    }
    if let Some(image) = product.primary_image() {
        println!("image: {image}");
    }
    if let Some(description) = &product.description {
        println!("\n{description}");
    }
    if let Some(best) = best {
        println!(
            "\nbest coupon: {} (save {})",
            best.coupon.code,
            display::price(best.discount)
        );
    }
    Ok(())
}
