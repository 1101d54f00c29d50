use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::warn;

use crate::tprintln;

use super::events::CartEvent;
use super::item::{resolve_image_url, CartItem, CartTotals, MealSummary, DEFAULT_PROVIDER_NAME};
use super::store::KvStore;

/// Storage key of the cart list.
pub const CART_KEY: &str = "cart";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("cart storage failed: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("cart encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The meal already has a line; nothing changed.
    AlreadyInCart,
}

/// Single writer for the stored cart list.
pub struct CartStore {
    kv: Arc<dyn KvStore>,
    key: String,
    asset_base: String,
    write_lock: Mutex<()>,
    events: broadcast::Sender<CartEvent>,
}

impl CartStore {
    /// `asset_base` is where relative meal image paths are served from.
    pub fn new(kv: Arc<dyn KvStore>, asset_base: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { kv, key: CART_KEY.to_string(), asset_base: asset_base.to_string(), write_lock: Mutex::new(()), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> { self.events.subscribe() }

    /// True if a cart list has been stored at all (an empty list counts).
    pub fn exists(&self) -> Result<bool, CartError> { Ok(self.kv.get(&self.key)?.is_some()) }

    /// Current lines. A value that does not parse as a cart reads as empty.
    pub fn items(&self) -> Result<Vec<CartItem>, CartError> {
        let Some(raw) = self.kv.get(&self.key)? else { return Ok(Vec::new()); };
        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(target: "cart", error = %e, "stored cart is unreadable; treating as empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn totals(&self) -> Result<CartTotals, CartError> { Ok(CartTotals::of(&self.items()?)) }

    /// Navbar badge: number of lines. Storage problems show as an empty badge.
    pub fn badge_count(&self) -> usize { self.items().map(|i| i.len()).unwrap_or(0) }

    fn write(&self, items: &[CartItem]) -> Result<(), CartError> {
        let raw = serde_json::to_string(items)?;
        self.kv.set(&self.key, &raw)?;
        // No receivers is fine.
        let _ = self.events.send(CartEvent::updated(items.len()));
        tprintln!("cart.write lines={}", items.len());
        Ok(())
    }

    pub fn add_meal(&self, meal: &MealSummary) -> Result<AddOutcome, CartError> {
        let _guard = self.write_lock.lock();
        let mut items = self.items()?;
        if items.iter().any(|i| i.id == meal.id) {
            return Ok(AddOutcome::AlreadyInCart);
        }
        items.push(CartItem {
            id: meal.id.clone(),
            name: meal.name.clone(),
            price: meal.price,
            quantity: 1,
            image: resolve_image_url(&self.asset_base, meal.image_url.as_deref()),
            provider_name: meal.provider_name.clone().filter(|n| !n.is_empty()).unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
        });
        self.write(&items)?;
        Ok(AddOutcome::Added)
    }

    /// Change a line's quantity by `delta`, never below 1. Returns false if no such line.
    pub fn update_quantity(&self, id: &str, delta: i64) -> Result<bool, CartError> {
        let _guard = self.write_lock.lock();
        let mut items = self.items()?;
        let Some(line) = items.iter_mut().find(|i| i.id == id) else { return Ok(false); };
        let next = (line.quantity as i64).saturating_add(delta).clamp(1, u32::MAX as i64);
        line.quantity = next as u32;
        self.write(&items)?;
        Ok(true)
    }

    /// Drop a line. Returns false if no such line.
    pub fn remove(&self, id: &str) -> Result<bool, CartError> {
        let _guard = self.write_lock.lock();
        let mut items = self.items()?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(&items)?;
        Ok(true)
    }

    /// Drop the lines that were just ordered, leaving anything added meanwhile.
    /// When nothing is left the stored list is removed, as after [`CartStore::clear`].
    /// Returns the number of lines kept.
    pub fn settle(&self, ordered: &[String]) -> Result<usize, CartError> {
        let _guard = self.write_lock.lock();
        let mut items = self.items()?;
        items.retain(|i| !ordered.contains(&i.id));
        if items.is_empty() {
            self.kv.remove(&self.key)?;
            let _ = self.events.send(CartEvent::cleared());
            return Ok(0);
        }
        self.write(&items)?;
        Ok(items.len())
    }

    /// Remove the stored list entirely.
    pub fn clear(&self) -> Result<(), CartError> {
        let _guard = self.write_lock.lock();
        self.kv.remove(&self.key)?;
        let _ = self.events.send(CartEvent::cleared());
        Ok(())
    }
}
