//! Domain types and local-state rules for the shrine storefront client.
//!
//! Everything here is synchronous and network-free: product and cart
//! models, guest cart sanitisation, coupon selection, the persisted
//! session, and environment configuration.

pub mod app_config;
pub mod cart;
pub mod config;
pub mod coupon;
pub mod error;
pub mod product;
pub mod session;
pub mod storage;

pub use app_config::{AppConfig, Environment};
pub use cart::{sanitize_lines, AddOutcome, CartCounts, CartLine, CartPayload, GuestCart};
pub use config::{load_app_config, load_app_config_from_env};
pub use coupon::{best_match, BestCoupon, Coupon, DiscountType};
pub use error::{ConfigError, StorageError};
pub use product::{Product, ProductRef};
pub use session::{Role, Session};
pub use storage::{FileStore, KeyValueStore, LocalState, MemoryStore, GUEST_CART_KEY, SESSION_KEY};
