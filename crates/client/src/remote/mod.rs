//! Remote cart service contract.
//!
//! The engine talks to the authoritative cart through [`RemoteCartService`]
//! and never depends on a transport. [`HttpCartClient`] is the REST
//! implementation:
//!
//! | Operation | Request |
//! |---|---|
//! | `fetch_cart` | `GET /cart` |
//! | `add_item` | `POST /cart/items` `{"productId", "quantity"}` |
//! | `update_quantity` | `PUT /cart/items/{itemId}` `{"quantity"}` |
//! | `remove_item` | `DELETE /cart/items/{itemId}` |
//! | `clear_cart` | `DELETE /cart` |
//!
//! Any 2xx response is success. The engine treats every failure the same way,
//! so the error type only distinguishes what is useful in logs.

mod http;

use std::future::Future;
use std::sync::Arc;

use cartsync_core::{CartModel, ItemId};
use thiserror::Error;

pub use http::HttpCartClient;

/// Errors from the remote cart service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network or transport failure (connect, timeout, reset).
    #[error("transport error: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded as a cart.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The client could not be constructed from its configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Capability to read and mutate the authoritative cart.
///
/// All operations are asynchronous and may fail. Implementations must not
/// retry; the engine decides what a failure means.
pub trait RemoteCartService: Send + Sync {
    /// Fetch the full cart.
    fn fetch_cart(&self) -> impl Future<Output = Result<CartModel, RemoteError>> + Send;

    /// Add `quantity` units of a product (creating the line if needed).
    fn add_item(
        &self,
        product_id: &ItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Set the absolute quantity of a line.
    fn update_quantity(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove a line.
    fn remove_item(&self, item_id: &ItemId) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove every line.
    fn clear_cart(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

impl<R: RemoteCartService> RemoteCartService for Arc<R> {
    fn fetch_cart(&self) -> impl Future<Output = Result<CartModel, RemoteError>> + Send {
        (**self).fetch_cart()
    }

    fn add_item(
        &self,
        product_id: &ItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).add_item(product_id, quantity)
    }

    fn update_quantity(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).update_quantity(item_id, quantity)
    }

    fn remove_item(
        &self,
        item_id: &ItemId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).remove_item(item_id)
    }

    fn clear_cart(&self) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).clear_cart()
    }
}
