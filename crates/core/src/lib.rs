//! cartsync Core - Cart domain types.
//!
//! This crate provides the types shared by every cartsync component:
//! - `cartsync` - Synchronization engine, local stores and the remote client
//! - `cartsync-cli` - Command-line front end driving the engine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. Every cart mutation the engine performs is
//! expressed here as a plain method on [`CartModel`], so the engine only has
//! to decide *when* to apply it.
//!
//! # Modules
//!
//! - [`types`] - Item identity, prices, cart items and the cart model
//! - [`view`] - Read-only projections (totals, formatted lines) for presentation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod view;

pub use types::*;
pub use view::{CartLineView, CartView, format_price, total_items, total_price};
