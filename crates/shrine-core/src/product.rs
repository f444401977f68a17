use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A catalog product as returned by `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductWire")]
pub struct Product {
    /// Backend document id (`_id` on the wire).
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub stock: Option<i64>,
}

/// Product documents as the backend serialises them.
///
/// Mongoose emits the `id` virtual next to `_id`, and older documents use
/// `name`/`countInStock` where newer ones use `title`/`stock`. Every spelling
/// is read separately and the canonical one wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductWire {
    #[serde(rename = "_id", default)]
    mongo_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    price: Decimal,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default)]
    count_in_stock: Option<i64>,
}

impl TryFrom<ProductWire> for Product {
    type Error = String;

    fn try_from(wire: ProductWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: de::require_id(wire.mongo_id.as_ref(), wire.id.as_ref())?,
            title: wire.title.or(wire.name).unwrap_or_default(),
            description: wire.description,
            price: wire.price,
            image: wire.image,
            images: wire.images.unwrap_or_default(),
            category: wire.category,
            subcategory: wire.subcategory,
            stock: wire.stock.or(wire.count_in_stock),
        })
    }
}

impl Product {
    /// The image shown on cards: the explicit `image`, else the first gallery entry.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }

    #[must_use]
    pub fn to_ref(&self) -> ProductRef {
        ProductRef::from(self)
    }
}

/// The product snapshot carried by a cart line.
///
/// Only `id` is authoritative; the display fields let guest-mode views
/// render without a server round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductRefWire")]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

#[derive(Deserialize)]
struct ProductRefWire {
    #[serde(rename = "_id", default)]
    mongo_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    price: Decimal,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
}

impl TryFrom<ProductRefWire> for ProductRef {
    type Error = String;

    fn try_from(wire: ProductRefWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: de::require_id(wire.mongo_id.as_ref(), wire.id.as_ref())?,
            title: wire.title.or(wire.name).unwrap_or_default(),
            price: wire.price,
            image: wire.image,
            category: wire.category,
            subcategory: wire.subcategory,
        })
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image: product.primary_image().map(str::to_owned),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
        }
    }
}

/// Lenient decoders for loosely-typed backend JSON.
pub(crate) mod de {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// A usable id: a non-blank string or a number.
    fn id_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Resolves a document id, preferring `_id` over the `id` virtual.
    pub(crate) fn pick_id(mongo_id: Option<&Value>, id: Option<&Value>) -> Option<String> {
        mongo_id.and_then(id_text).or_else(|| id.and_then(id_text))
    }

    /// Like [`pick_id`], but a product without an id is rejected so that a
    /// product reference is always resolvable.
    pub(crate) fn require_id(
        mongo_id: Option<&Value>,
        id: Option<&Value>,
    ) -> Result<String, String> {
        pick_id(mongo_id, id).ok_or_else(|| "missing or empty product id".to_owned())
    }

    /// Accepts numbers and numeric strings; anything else decodes to zero.
    pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(decimal_from_value(&Value::deserialize(deserializer)?).unwrap_or_default())
    }

    /// Like [`decimal`] but keeps "absent" distinct from zero.
    pub(crate) fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(decimal_from_value(&Value::deserialize(deserializer)?))
    }

    fn decimal_from_value(value: &Value) -> Option<Decimal> {
        match value {
            // `Number::to_string` keeps the literal digits, so 99.99 stays exact.
            Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Quantity as stored by older clients: numbers, numeric strings, or
    /// junk. Junk and negatives decode to 0, which callers treat as "unset".
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let qty = match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f.trunc() as u64)
                })
                .unwrap_or(0),
            Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        };
        Ok(u32::try_from(qty).unwrap_or(u32::MAX))
    }
}
