//! Local cart persistence.
//!
//! The local store is a single durable slot holding the last committed cart.
//! It is written only by the synchronization engine and read on load when the
//! remote service cannot be reached.
//!
//! Both implementations persist the same JSON record:
//!
//! ```json
//! {"version": 1, "saved_at": "2026-01-01T00:00:00Z", "items": [...]}
//! ```
//!
//! A bare item array (the unversioned format older clients wrote) is still
//! accepted on read.

mod file;
mod memory;

use std::sync::Arc;

use cartsync_core::CartModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use file::FileCartStore;
pub use memory::MemoryCartStore;

/// Current record format version.
pub const RECORD_VERSION: u32 = 1;

/// Errors from a local cart store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalStoreError {
    /// The stored record could not be decoded into a valid cart.
    #[error("corrupt cart record: {0}")]
    Corrupt(String),

    /// The underlying storage failed.
    #[error("storage I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LocalStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A durable, synchronous slot holding the last known cart.
///
/// Writes are last-write-wins. An absent record is `Ok(None)`; a record that
/// exists but cannot be decoded is [`LocalStoreError::Corrupt`].
pub trait LocalCartStore: Send + Sync {
    /// Read the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for undecodable records and `Io` for storage failures.
    fn read(&self) -> Result<Option<CartModel>, LocalStoreError>;

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the record cannot be written.
    fn write(&self, cart: &CartModel) -> Result<(), LocalStoreError>;

    /// Remove the stored cart. Erasing an absent record succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the record exists but cannot be removed.
    fn erase(&self) -> Result<(), LocalStoreError>;
}

impl<S: LocalCartStore + ?Sized> LocalCartStore for Arc<S> {
    fn read(&self) -> Result<Option<CartModel>, LocalStoreError> {
        (**self).read()
    }

    fn write(&self, cart: &CartModel) -> Result<(), LocalStoreError> {
        (**self).write(cart)
    }

    fn erase(&self) -> Result<(), LocalStoreError> {
        (**self).erase()
    }
}

// =============================================================================
// Record Format
// =============================================================================

#[derive(Serialize)]
struct RecordRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    items: &'a CartModel,
}

/// Versioned envelope; `items` is decoded only once the version is known.
#[derive(Deserialize)]
struct Envelope {
    version: u32,
    items: Value,
}

/// Encode a cart as a versioned record.
pub(crate) fn encode_record(cart: &CartModel) -> Result<String, LocalStoreError> {
    let record = RecordRef {
        version: RECORD_VERSION,
        saved_at: Utc::now(),
        items: cart,
    };
    serde_json::to_string(&record).map_err(|e| LocalStoreError::Io(e.to_string()))
}

/// Decode a record, validating the cart invariants.
///
/// A top-level array is the unversioned format; anything else must be a
/// versioned envelope.
pub(crate) fn decode_record(raw: &str) -> Result<CartModel, LocalStoreError> {
    let value: Value = serde_json::from_str(raw).map_err(corrupt)?;
    let items = if value.is_array() {
        value
    } else {
        let envelope: Envelope = serde_json::from_value(value).map_err(corrupt)?;
        if envelope.version != RECORD_VERSION {
            return Err(LocalStoreError::Corrupt(format!(
                "unsupported record version {}",
                envelope.version
            )));
        }
        envelope.items
    };
    serde_json::from_value(items).map_err(corrupt)
}

fn corrupt(err: serde_json::Error) -> LocalStoreError {
    LocalStoreError::Corrupt(err.to_string())
}
