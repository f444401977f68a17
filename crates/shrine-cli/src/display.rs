use rust_decimal::Decimal;
use shrine_core::{BestCoupon, Product};

pub(crate) fn price(amount: Decimal) -> String {
    format!("₹{:.2}", amount.round_dp(2))
}

/// One catalog row: title, price, and the best coupon if any applies.
pub(crate) fn product_row(product: &Product, best: Option<&BestCoupon<'_>>) -> String {
    let mut row = format!("{:<24} {:<40} {:>12}", product.id, product.title, price(product.price));
    if let Some(best) = best {
        row.push_str(&format!(
            "  {} saves {} -> {}",
            best.coupon.code,
            price(best.discount),
            price(product.price.saturating_sub(best.discount).max(Decimal::ZERO))
        ));
    }
    row
}
