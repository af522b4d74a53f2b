//! Core types for cartsync.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;

pub use cart::{CartItem, CartModel, CartModelError, ProductSnapshot};
pub use id::ItemId;
pub use price::{CurrencyCode, Price};
