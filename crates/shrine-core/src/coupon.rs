//! Coupons and best-match selection for product display.
//!
//! Selection is pure and recomputed from its inputs on every call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{de, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[serde(alias = "percent")]
    Percentage,
    /// Fixed amount off. Any unrecognised type is treated as flat.
    #[serde(other)]
    Flat,
}

/// A discount coupon as served by `GET /api/coupons/active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CouponWire")]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Upper bound for percentage discounts. Absent or zero means uncapped.
    pub max_discount: Option<Decimal>,
    /// Restricts the coupon to one category. Absent or blank means global.
    pub category: Option<String>,
    /// Further restricts a category coupon to one subcategory.
    pub subcategory: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Coupon documents in either the current or the legacy field naming. When
/// both spellings are present the current one wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponWire {
    code: String,
    discount_type: DiscountType,
    #[serde(deserialize_with = "de::decimal")]
    discount_value: Decimal,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    max_discount: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    max_discount_amount: Option<Decimal>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    applicable_category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    applicable_subcategory: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expiry_date: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    is_active: bool,
}

impl From<CouponWire> for Coupon {
    fn from(wire: CouponWire) -> Self {
        Self {
            code: wire.code,
            discount_type: wire.discount_type,
            discount_value: wire.discount_value,
            max_discount: wire.max_discount.or(wire.max_discount_amount),
            category: wire.category.or(wire.applicable_category),
            subcategory: wire.subcategory.or(wire.applicable_subcategory),
            expires_at: wire.expires_at.or(wire.expiry_date),
            is_active: wire.is_active,
        }
    }
}

fn default_active() -> bool {
    true
}

fn restriction(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn matches_ignore_case(wanted: &str, actual: Option<&String>) -> bool {
    actual.is_some_and(|a| a.trim().to_lowercase() == wanted.to_lowercase())
}

impl Coupon {
    /// `true` when the coupon has no category restriction.
    #[must_use]
    pub fn is_global(&self) -> bool {
        restriction(self.category.as_ref()).is_none()
    }

    /// Whether this coupon may be applied to `product`.
    ///
    /// Category and subcategory comparisons ignore case. A subcategory
    /// restriction only takes effect together with a category restriction.
    #[must_use]
    pub fn applies_to(&self, product: &Product) -> bool {
        let Some(category) = restriction(self.category.as_ref()) else {
            return true;
        };
        if !matches_ignore_case(category, product.category.as_ref()) {
            return false;
        }
        match restriction(self.subcategory.as_ref()) {
            Some(sub) => matches_ignore_case(sub, product.subcategory.as_ref()),
            None => true,
        }
    }

    /// Discount this coupon yields on an item priced `price`.
    ///
    /// A percentage that overflows the decimal range yields its cap, or
    /// nothing when uncapped.
    #[must_use]
    pub fn discount_for(&self, price: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => {
                let cap = self.max_discount.filter(|cap| *cap > Decimal::ZERO);
                let raw = price
                    .checked_mul(self.discount_value)
                    .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED));
                match (raw, cap) {
                    (Some(raw), Some(cap)) if raw > cap => cap,
                    (Some(raw), _) => raw,
                    (None, cap) => cap.unwrap_or(Decimal::ZERO),
                }
            }
            DiscountType::Flat => self.discount_value,
        }
    }

    /// Active and not yet expired at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// The winning coupon for a product and the amount it takes off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestCoupon<'a> {
    pub coupon: &'a Coupon,
    pub discount: Decimal,
}

/// Picks the applicable coupon with the strictly largest discount.
///
/// Ties keep the first coupon seen. Coupons yielding zero (or less) are never
/// selected. Returns `None` for an absent product or when nothing applies.
#[must_use]
pub fn best_match<'a>(product: Option<&Product>, coupons: &'a [Coupon]) -> Option<BestCoupon<'a>> {
    let product = product?;
    let mut best: Option<BestCoupon<'a>> = None;
    let mut max = Decimal::ZERO;

    for coupon in coupons.iter().filter(|c| c.applies_to(product)) {
        let discount = coupon.discount_for(product.price);
        if discount > max {
            max = discount;
            best = Some(BestCoupon { coupon, discount });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn product(category: Option<&str>, subcategory: Option<&str>, price: i64) -> Product {
        Product {
            id: "p1".to_owned(),
            title: "Panchmukhi Rudraksha".to_owned(),
            description: None,
            price: Decimal::from(price),
            image: None,
            images: Vec::new(),
            category: category.map(str::to_owned),
            subcategory: subcategory.map(str::to_owned),
            stock: None,
        }
    }

    fn coupon(
        code: &str,
        discount_type: DiscountType,
        value: i64,
        max: Option<i64>,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Coupon {
        Coupon {
            code: code.to_owned(),
            discount_type,
            discount_value: Decimal::from(value),
            max_discount: max.map(Decimal::from),
            category: category.map(str::to_owned),
            subcategory: subcategory.map(str::to_owned),
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn capped_global_percentage_beats_category_flat() {
        let coupons = vec![
            coupon("GLOBAL10", DiscountType::Percentage, 10, Some(50), None, None),
            coupon("MALA40", DiscountType::Flat, 40, None, Some("X"), None),
        ];
        let p = product(Some("X"), None, 1000);

        assert_eq!(coupons[0].discount_for(p.price), Decimal::from(50));
        assert_eq!(coupons[1].discount_for(p.price), Decimal::from(40));

        let best = best_match(Some(&p), &coupons).expect("a coupon should apply");
        assert_eq!(best.coupon.code, "GLOBAL10");
        assert_eq!(best.discount, Decimal::from(50));
    }

    #[test]
    fn subcategory_mismatch_excludes_coupon() {
        let c = coupon(
            "LAMPS",
            DiscountType::Flat,
            100,
            None,
            Some("Pooja"),
            Some("Lamps"),
        );
        let p = product(Some("Pooja"), Some("Bells"), 500);
        assert!(!c.applies_to(&p));
        assert!(best_match(Some(&p), std::slice::from_ref(&c)).is_none());
    }

    #[test]
    fn category_and_subcategory_match_ignores_case() {
        let c = coupon(
            "LAMPS",
            DiscountType::Flat,
            100,
            None,
            Some("pooja"),
            Some("LAMPS"),
        );
        assert!(c.applies_to(&product(Some("Pooja"), Some("lamps"), 500)));
    }

    #[test]
    fn category_coupon_excludes_other_categories_and_uncategorised() {
        let c = coupon("X", DiscountType::Flat, 10, None, Some("Idols"), None);
        assert!(!c.applies_to(&product(Some("Incense"), None, 100)));
        assert!(!c.applies_to(&product(None, None, 100)));
    }

    #[test]
    fn blank_category_is_global() {
        let c = coupon("ALL", DiscountType::Flat, 10, None, Some("  "), None);
        assert!(c.is_global());
        assert!(c.applies_to(&product(Some("Anything"), None, 100)));
    }

    #[test]
    fn percentage_without_cap_is_uncapped() {
        let c = coupon("P20", DiscountType::Percentage, 20, None, None, None);
        assert_eq!(c.discount_for(Decimal::from(1000)), Decimal::from(200));
        let zero_cap = coupon("P20", DiscountType::Percentage, 20, Some(0), None, None);
        assert_eq!(zero_cap.discount_for(Decimal::from(1000)), Decimal::from(200));
    }

    #[test]
    fn flat_ignores_price() {
        let c = coupon("F75", DiscountType::Flat, 75, Some(10), None, None);
        assert_eq!(c.discount_for(Decimal::from(5)), Decimal::from(75));
    }

    #[test]
    fn ties_keep_first_seen() {
        let coupons = vec![
            coupon("FIRST", DiscountType::Flat, 30, None, None, None),
            coupon("SECOND", DiscountType::Percentage, 10, None, None, None),
        ];
        let best = best_match(Some(&product(None, None, 300)), &coupons).unwrap();
        assert_eq!(best.coupon.code, "FIRST");
    }

    #[test]
    fn zero_discounts_are_never_selected() {
        let coupons = vec![coupon("ZERO", DiscountType::Flat, 0, None, None, None)];
        assert!(best_match(Some(&product(None, None, 100)), &coupons).is_none());
    }

    #[test]
    fn absent_product_yields_none() {
        let coupons = vec![coupon("ALL", DiscountType::Flat, 10, None, None, None)];
        assert!(best_match(None, &coupons).is_none());
    }

    #[test]
    fn decodes_backend_coupon_shape() {
        let c: Coupon = serde_json::from_value(json!({
            "code": "DIWALI",
            "discountType": "percentage",
            "discountValue": 15,
            "maxDiscountAmount": "200",
            "applicableCategory": "Idols",
            "expiryDate": "2026-11-30T00:00:00Z"
        }))
        .expect("should decode");
        assert_eq!(c.discount_type, DiscountType::Percentage);
        assert_eq!(c.max_discount, Some(Decimal::from(200)));
        assert_eq!(c.category.as_deref(), Some("Idols"));
        assert!(c.is_active);
    }

    #[test]
    fn current_field_names_win_over_legacy_ones() {
        let c: Coupon = serde_json::from_value(json!({
            "code": "BOTH",
            "discountType": "percent",
            "discountValue": "10",
            "maxDiscount": 30,
            "maxDiscountAmount": 90,
            "category": "Idols",
            "applicableCategory": "Incense",
            "expiresAt": "2026-12-01T00:00:00Z",
            "expiryDate": "2026-01-01T00:00:00Z"
        }))
        .expect("both spellings should decode");
        assert_eq!(c.max_discount, Some(Decimal::from(30)));
        assert_eq!(c.category.as_deref(), Some("Idols"));
        assert_eq!(
            c.expires_at,
            Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn overflowing_percentage_does_not_panic() {
        let mut p = product(None, None, 0);
        p.price = Decimal::MAX;
        let uncapped = coupon("ALL100", DiscountType::Percentage, 100, None, None, None);
        assert_eq!(uncapped.discount_for(p.price), Decimal::ZERO);
        assert!(best_match(Some(&p), std::slice::from_ref(&uncapped)).is_none());

        let coupons = vec![
            uncapped,
            coupon("CAP50", DiscountType::Percentage, 100, Some(50), None, None),
        ];
        let best = best_match(Some(&p), &coupons).expect("the capped coupon applies");
        assert_eq!(best.coupon.code, "CAP50");
        assert_eq!(best.discount, Decimal::from(50));
    }

    #[test]
    fn unknown_discount_type_is_flat() {
        let c: Coupon = serde_json::from_value(json!({
            "code": "X",
            "discountType": "fixed",
            "discountValue": 25
        }))
        .unwrap();
        assert_eq!(c.discount_type, DiscountType::Flat);
    }

    #[test]
    fn is_live_checks_flag_and_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let mut c = coupon("X", DiscountType::Flat, 10, None, None, None);
        assert!(c.is_live_at(now));

        c.expires_at = Some(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap());
        assert!(!c.is_live_at(now));

        c.expires_at = None;
        c.is_active = false;
        assert!(!c.is_live_at(now));
    }
}
