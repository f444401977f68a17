//! Cart lines, the guest cart, and normalisation of server cart payloads.
//!
//! A line whose product reference is missing, null, or has no id is never
//! valid. [`sanitize_lines`] is the single place such lines are purged, and
//! both the guest cart reader and the server response decoder go through it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::product::{de, ProductRef};

/// One product and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductRef,
    /// Requested quantity. `0` marks a legacy entry with no usable quantity.
    #[serde(default, deserialize_with = "de::quantity")]
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn new(product: ProductRef, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Quantity used for counting: an unset (`0`) quantity counts as one.
    #[must_use]
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.max(1)
    }

    /// Price times effective quantity, saturating at the decimal range.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .price
            .saturating_mul(Decimal::from(self.effective_quantity()))
    }
}

/// Drops every entry that does not decode into a [`CartLine`] with a
/// resolvable product, keeping the order of the rest.
///
/// Returns the surviving lines and how many entries were dropped.
#[must_use]
pub fn sanitize_lines(values: Vec<Value>) -> (Vec<CartLine>, usize) {
    let total = values.len();
    let lines: Vec<CartLine> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<CartLine>(v).ok())
        .collect();
    let dropped = total - lines.len();
    (lines, dropped)
}

/// Sum of effective quantities across `lines`.
#[must_use]
pub fn total_quantity(lines: &[CartLine]) -> u32 {
    lines
        .iter()
        .fold(0u32, |acc, line| acc.saturating_add(line.effective_quantity()))
}

/// Sum of line totals across `lines`, saturating at the decimal range.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()))
}

/// The cart kept in local storage while nobody is signed in.
///
/// Lines are keyed by product id; adding a product that is already present
/// bumps its quantity rather than appending a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart {
    lines: Vec<CartLine>,
}

impl GuestCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Adds `quantity` of `product`, returning the line's new quantity.
    ///
    /// A requested quantity of `0` is treated as `1`. An existing legacy line
    /// with no quantity is counted as one before the increment.
    pub fn add(&mut self, product: ProductRef, quantity: u32) -> u32 {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.effective_quantity().saturating_add(quantity);
            return line.quantity;
        }
        self.lines.push(CartLine::new(product, quantity));
        quantity
    }

    /// Total item count shown on the cart badge.
    #[must_use]
    pub fn count(&self) -> u32 {
        total_quantity(&self.lines)
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.lines)
    }
}

/// Body of `GET /api/cart`: either a bare array of lines or an object with
/// an `items` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CartPayload {
    Lines(Vec<Value>),
    Wrapped { items: Vec<Value> },
}

impl CartPayload {
    /// Normalises either shape into sanitised lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        let raw = match self {
            CartPayload::Lines(items) | CartPayload::Wrapped { items } => items,
        };
        let (lines, dropped) = sanitize_lines(raw);
        if dropped > 0 {
            tracing::debug!(dropped, "dropped server cart lines without a product");
        }
        lines
    }
}

/// How an add-to-cart request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Written to the local guest cart only.
    LocalOnly,
    /// Accepted by the server cart.
    ServerConfirmed,
}

impl AddOutcome {
    #[must_use]
    pub fn is_server_confirmed(self) -> bool {
        matches!(self, AddOutcome::ServerConfirmed)
    }
}

/// Badge counts for the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartCounts {
    pub cart: u32,
    pub wishlist: u32,
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;
