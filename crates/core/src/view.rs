//! Read-only cart projections for presentation layers.
//!
//! [`total_items`] and [`total_price`] are the raw projections: total
//! functions over any valid cart, returning zero for the empty cart.
//! [`CartView`] is the display form; it is the only place prices are
//! rounded.

use rust_decimal::Decimal;

use crate::types::{CartItem, CartModel, CurrencyCode, Price};

/// `Σ item.quantity`.
#[must_use]
pub fn total_items(model: &CartModel) -> u64 {
    model.total_items()
}

/// `Σ item.price × item.quantity`, unrounded.
#[must_use]
pub fn total_price(model: &CartModel) -> Decimal {
    model.total_price()
}

/// Format an amount as a display price string.
#[must_use]
pub fn format_price(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            subtotal: format_price(Decimal::ZERO, currency),
            item_count: 0,
        }
    }

    /// Project a cart model for display in the given currency.
    #[must_use]
    pub fn from_model(model: &CartModel, currency: CurrencyCode) -> Self {
        Self {
            items: model
                .items()
                .iter()
                .map(|item| CartLineView::from_item(item, currency))
                .collect(),
            subtotal: format_price(total_price(model), currency),
            item_count: total_items(model),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartModel> for CartView {
    fn from(model: &CartModel) -> Self {
        Self::from_model(model, CurrencyCode::default())
    }
}

impl CartLineView {
    fn from_item(item: &CartItem, currency: CurrencyCode) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            quantity: item.quantity,
            price: format_price(item.price, currency),
            line_price: format_price(item.line_total(), currency),
            image: item.image.clone(),
        }
    }
}
