//! Degradation taxonomy for cart synchronization.
//!
//! Nothing in this crate treats a [`SyncError`] as fatal. The engine logs each
//! one and hands it back on the operation's outcome so presentation code can
//! decide whether to show a warning.

use thiserror::Error;

use cartsync_core::CartModelError;

use crate::remote::RemoteError;
use crate::store::LocalStoreError;

/// A non-fatal problem encountered while synchronizing the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The remote cart service could not be reached.
    #[error("Remote cart service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote cart service answered with a non-success status or a
    /// payload that could not be decoded.
    #[error("Remote cart service rejected the request: {}", format_rejection(.status, .message))]
    RemoteRejected {
        /// HTTP status, when there was one.
        status: Option<u16>,
        message: String,
    },

    /// The local cart record exists but could not be read as a cart.
    #[error("Local cart record is corrupt: {0}")]
    LocalStoreCorrupt(String),

    /// The local cart record could not be written or erased.
    #[error("Local cart store unavailable: {0}")]
    LocalStoreUnavailable(String),

    /// A product could not be added because it would break the cart
    /// invariants. The cart is unchanged and no remote call was made.
    #[error("Invalid cart item: {0}")]
    InvalidItem(String),

    /// The cart changed locally while a load was in flight; the local cart
    /// was kept instead of the loaded one.
    #[error("Cart changed locally during load; keeping local cart")]
    LoadSuperseded,
}

impl SyncError {
    /// Whether this degradation came from the remote side.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::RemoteRejected { .. })
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable(message) | RemoteError::Config(message) => {
                Self::RemoteUnavailable(message)
            }
            RemoteError::Rejected { status, message } => Self::RemoteRejected {
                status: Some(status),
                message,
            },
            RemoteError::Malformed(message) => Self::RemoteRejected {
                status: None,
                message: format!("malformed payload: {message}"),
            },
        }
    }
}

impl From<LocalStoreError> for SyncError {
    fn from(err: LocalStoreError) -> Self {
        match err {
            LocalStoreError::Corrupt(message) => Self::LocalStoreCorrupt(message),
            LocalStoreError::Io(message) => Self::LocalStoreUnavailable(message),
        }
    }
}

impl From<CartModelError> for SyncError {
    fn from(err: CartModelError) -> Self {
        Self::InvalidItem(err.to_string())
    }
}

fn format_rejection(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}: {message}"),
        None => message.to_string(),
    }
}
