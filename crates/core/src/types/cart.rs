//! Cart items and the cart model.
//!
//! A [`CartModel`] is an ordered sequence of [`CartItem`]s keyed by
//! [`ItemId`]. Every constructor and mutation keeps three invariants:
//!
//! - no two items share an id
//! - every quantity is at least 1
//! - no price is negative
//!
//! Deserializing a model goes through the same validation, so a payload from
//! the remote service or the local store that breaks an invariant is rejected
//! instead of being half-applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ItemId;

/// Errors raised when a list of items does not form a valid cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartModelError {
    /// The same item id appears more than once.
    #[error("duplicate cart item: {0}")]
    DuplicateItem(ItemId),
    /// An item has a quantity of zero.
    #[error("cart item {0} has zero quantity")]
    ZeroQuantity(ItemId),
    /// An item has a negative price.
    #[error("cart item {0} has a negative price")]
    NegativePrice(ItemId),
}

/// The catalog data needed to put a product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog product id; becomes the cart item id.
    pub id: ItemId,
    /// Product title shown in the cart.
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    /// Optional image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductSnapshot {
    /// Create a snapshot without an image.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            image: None,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Check that this snapshot can become a cart line.
    ///
    /// # Errors
    ///
    /// Returns `NegativePrice` if the price is below zero.
    pub fn validate(&self) -> Result<(), CartModelError> {
        if self.price < Decimal::ZERO {
            return Err(CartModelError::NegativePrice(self.id.clone()));
        }
        Ok(())
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// A new line with quantity 1.
    #[must_use]
    pub fn from_snapshot(snapshot: ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            title: snapshot.title,
            price: snapshot.price,
            quantity: 1,
            image: snapshot.image,
        }
    }

    /// Unrounded `price × quantity`, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// The locally held cart.
///
/// Serializes as a bare JSON array of items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct CartModel {
    items: Vec<CartItem>,
}

impl CartModel {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from an item list, validating every invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if an id repeats, a quantity is zero, or a price is
    /// negative.
    pub fn try_from_items(items: Vec<CartItem>) -> Result<Self, CartModelError> {
        for (index, item) in items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(CartModelError::ZeroQuantity(item.id.clone()));
            }
            if item.price < Decimal::ZERO {
                return Err(CartModelError::NegativePrice(item.id.clone()));
            }
            if items.iter().take(index).any(|seen| seen.id == item.id) {
                return Err(CartModelError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// `Σ price × quantity`, unrounded, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line or appends a new line with quantity 1.
    /// Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns `NegativePrice` (leaving the cart unchanged) if the snapshot
    /// price is below zero.
    pub fn add_one(&mut self, snapshot: ProductSnapshot) -> Result<u32, CartModelError> {
        snapshot.validate()?;
        if let Some(item) = self.items.iter_mut().find(|item| item.id == snapshot.id) {
            item.quantity = item.quantity.saturating_add(1);
            return Ok(item.quantity);
        }
        self.items.push(CartItem::from_snapshot(snapshot));
        Ok(1)
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero removes the line. Returns `false` when no line has
    /// this id (the cart is left unchanged).
    pub fn set_quantity(&mut self, id: &ItemId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id).is_some();
        }
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl TryFrom<Vec<CartItem>> for CartModel {
    type Error = CartModelError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::try_from_items(items)
    }
}

impl From<CartModel> for Vec<CartItem> {
    fn from(model: CartModel) -> Self {
        model.items
    }
}

impl<'a> IntoIterator for &'a CartModel {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn widget() -> ProductSnapshot {
        ProductSnapshot::new("p1", "Widget", Decimal::from(10))
    }

    fn gadget() -> ProductSnapshot {
        ProductSnapshot::new("p2", "Gadget", Decimal::new(250, 2))
    }

    #[test]
    fn test_add_one_is_cumulative() {
        let mut cart = CartModel::new();
        for expected in 1..=5 {
            assert_eq!(cart.add_one(widget()).unwrap(), expected);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ItemId::new("p1")).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_one_preserves_insertion_order() {
        let mut cart = CartModel::new();
        cart.add_one(widget()).unwrap();
        cart.add_one(gadget()).unwrap();
        cart.add_one(widget()).unwrap();

        let ids: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);
    }

    #[test]
    fn test_set_quantity_zero_matches_remove() {
        let mut base = CartModel::new();
        base.add_one(widget()).unwrap();
        base.add_one(gadget()).unwrap();

        let mut via_zero = base.clone();
        via_zero.set_quantity(&ItemId::new("p1"), 0);
        let mut via_remove = base;
        via_remove.remove(&ItemId::new("p1"));

        assert_eq!(via_zero, via_remove);
    }

    #[test]
    fn test_set_quantity_missing_is_noop() {
        let mut cart = CartModel::new();
        cart.add_one(widget()).unwrap();
        let before = cart.clone();
        assert!(!cart.set_quantity(&ItemId::new("nope"), 3));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut cart = CartModel::new();
        cart.add_one(widget()).unwrap();
        cart.add_one(gadget()).unwrap();

        cart.remove(&ItemId::new("p2"));
        let once = cart.clone();
        assert!(cart.remove(&ItemId::new("p2")).is_none());
        assert_eq!(cart, once);
    }

    #[test]
    fn test_totals() {
        let mut cart = CartModel::new();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);

        cart.add_one(widget()).unwrap();
        cart.add_one(widget()).unwrap();
        cart.add_one(gadget()).unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Decimal::new(2250, 2));
    }

    #[test]
    fn test_try_from_items_rejects_duplicates() {
        let items = vec![
            CartItem::from_snapshot(widget()),
            CartItem::from_snapshot(widget()),
        ];
        assert_eq!(
            CartModel::try_from_items(items),
            Err(CartModelError::DuplicateItem(ItemId::new("p1")))
        );
    }

    #[test]
    fn test_try_from_items_rejects_zero_quantity_and_negative_price() {
        let mut zero = CartItem::from_snapshot(widget());
        zero.quantity = 0;
        assert!(matches!(
            CartModel::try_from_items(vec![zero]),
            Err(CartModelError::ZeroQuantity(_))
        ));

        let refund = ProductSnapshot::new("p3", "Refund", Decimal::from(-1));
        let negative = CartItem::from_snapshot(refund);
        assert!(matches!(
            CartModel::try_from_items(vec![negative]),
            Err(CartModelError::NegativePrice(_))
        ));
    }

    #[test]
    fn test_add_one_rejects_negative_price() {
        let mut cart = CartModel::new();
        cart.add_one(widget()).unwrap();
        let before = cart.clone();

        let refund = ProductSnapshot::new("p3", "Refund", Decimal::from(-1));
        assert_eq!(
            cart.add_one(refund),
            Err(CartModelError::NegativePrice(ItemId::new("p3")))
        );
        assert_eq!(cart, before);
        assert!(ProductSnapshot::new("free", "Sticker", Decimal::ZERO).validate().is_ok());
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let mut cart = CartModel::new();
        cart.add_one(ProductSnapshot::new("big", "Yacht", Decimal::MAX)).unwrap();
        cart.add_one(widget()).unwrap();
        cart.set_quantity(&ItemId::new("big"), u32::MAX);

        assert_eq!(cart.get(&ItemId::new("big")).unwrap().line_total(), Decimal::MAX);
        assert_eq!(cart.total_price(), Decimal::MAX);
    }

    #[test]
    fn test_deserialize_numeric_price_and_id() {
        let json =
            r#"[{"id": 1, "title": "Widget", "price": 10, "quantity": 2, "category": "tools"}]"#;
        let cart: CartModel = serde_json::from_str(json).unwrap();
        let item = cart.get(&ItemId::new("1")).unwrap();
        assert_eq!(item.price, Decimal::from(10));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"id": "p1", "title": "A", "price": 1, "quantity": 1},
                       {"id": "p1", "title": "B", "price": 2, "quantity": 1}]"#;
        assert!(serde_json::from_str::<CartModel>(json).is_err());
    }

    #[test]
    fn test_serializes_as_array() {
        let mut cart = CartModel::new();
        cart.add_one(widget().with_image("https://cdn.example/w.png")).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["image"], "https://cdn.example/w.png");
        assert_eq!(value[0]["quantity"], 1);
    }
}
