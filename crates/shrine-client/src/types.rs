//! Request bodies and loosely-shaped response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddToCartRequest<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WishlistRequest<'a> {
    pub product_id: &'a str,
}

/// `GET /api/products` answers with a bare array or a paged object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductListPayload {
    Bare(Vec<Value>),
    Paged { products: Vec<Value> },
}

impl ProductListPayload {
    pub(crate) fn into_values(self) -> Vec<Value> {
        match self {
            ProductListPayload::Bare(values) | ProductListPayload::Paged { products: values } => {
                values
            }
        }
    }
}

/// Error bodies look like `{ "message": "..." }`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_cart_body_uses_camel_case() {
        let body = serde_json::to_value(AddToCartRequest {
            product_id: "p-1",
            quantity: 2,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"productId": "p-1", "quantity": 2}));
    }

    #[test]
    fn product_list_accepts_both_shapes() {
        let bare: ProductListPayload = serde_json::from_str(r#"[{"_id":"a"}]"#).unwrap();
        assert_eq!(bare.into_values().len(), 1);
        let paged: ProductListPayload =
            serde_json::from_str(r#"{"products":[{"_id":"a"},{"_id":"b"}],"page":1}"#).unwrap();
        assert_eq!(paged.into_values().len(), 2);
    }

    #[test]
    fn error_message_reads_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Product not found"}"#).as_deref(),
            Some("Product not found")
        );
        assert!(error_message("<html>oops</html>").is_none());
    }
}
