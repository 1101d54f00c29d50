//! Shopping cart.
//!
//! The cart is one JSON list stored under a single key of a [`KvStore`]. [`CartStore`] is
//! its only writer: each mutation rewrites the whole list and then publishes one
//! [`CartEvent`], so independent views (badge, cart page, checkout) re-read on change.
//! Consistency is last-write-wins; there are no transactions.

mod item;
mod store;
mod events;
mod state;

pub use item::{asset_base_from_api, resolve_image_url, CartItem, CartTotals, MealSummary, DEFAULT_PROVIDER_NAME, DELIVERY_FEE, PLACEHOLDER_IMAGE};
pub use store::{FileStore, KvStore, MemoryStore};
pub use events::CartEvent;
pub use state::{AddOutcome, CartError, CartStore, CART_KEY};
