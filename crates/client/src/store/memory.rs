//! In-process cart store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cartsync_core::CartModel;

use super::{LocalCartStore, LocalStoreError, decode_record, encode_record};

/// A cart store that keeps the encoded record in memory.
///
/// Holds the same serialized record the file store writes, so a raw record
/// can be injected with [`MemoryCartStore::with_raw`] to exercise corrupt
/// data handling.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be encoded.
    pub fn with_cart(cart: &CartModel) -> Result<Self, LocalStoreError> {
        let store = Self::new();
        store.write(cart)?;
        Ok(store)
    }

    /// A store holding an arbitrary raw record.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// Whether a record is present.
    #[must_use]
    pub fn has_record(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalCartStore for MemoryCartStore {
    fn read(&self) -> Result<Option<CartModel>, LocalStoreError> {
        self.slot().as_deref().map(decode_record).transpose()
    }

    fn write(&self, cart: &CartModel) -> Result<(), LocalStoreError> {
        let raw = encode_record(cart)?;
        *self.slot() = Some(raw);
        Ok(())
    }

    fn erase(&self) -> Result<(), LocalStoreError> {
        *self.slot() = None;
        Ok(())
    }
}
