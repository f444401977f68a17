//! REST client and cart/session reconciliation for the shrine storefront.

pub mod client;
pub mod context;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use context::{CartContext, MergeReport, Mode};
pub use error::ClientError;
