//! cartsync - Cart synchronization engine.
//!
//! Keeps a shopper's cart consistent across a local durable store and a remote
//! cart service. The local cart is always authoritative for display; remote
//! calls are best-effort and their failures never undo a local change.
//!
//! # Example
//!
//! ```no_run
//! use cartsync::{CartSyncConfig, CartSyncEngine, FileCartStore, HttpCartClient};
//! use cartsync_core::ProductSnapshot;
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartSyncConfig::from_env()?;
//! let engine = CartSyncEngine::new(
//!     HttpCartClient::new(&config.remote)?,
//!     FileCartStore::new(&config.store_path),
//! );
//!
//! let loaded = engine.load().await;
//! if loaded.used_fallback {
//!     eprintln!("offline: showing saved cart");
//! }
//! engine
//!     .add_item(ProductSnapshot::new("p1", "Widget", Decimal::from(10)))
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`engine`] - The synchronization engine and its outcomes
//! - [`error`] - Non-fatal degradation taxonomy
//! - [`remote`] - Remote cart service contract and REST client
//! - [`store`] - Local cart persistence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod remote;
pub mod store;

pub use config::{CartSyncConfig, ConfigError, RemoteCartConfig};
pub use engine::{CartSyncEngine, LoadOutcome, MutationOutcome};
pub use error::SyncError;
pub use remote::{HttpCartClient, RemoteCartService, RemoteError};
pub use store::{FileCartStore, LocalCartStore, LocalStoreError, MemoryCartStore};
