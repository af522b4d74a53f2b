//! Cart commands.
//!
//! Each invocation is a short-lived session: the cart is loaded (remote first,
//! saved cart as fallback) before any mutation so the mutation applies to the
//! shopper's current cart rather than an empty one.

use std::fmt::Write as _;

use cartsync::{
    CartSyncConfig, CartSyncEngine, ConfigError, FileCartStore, HttpCartClient, LocalCartStore,
    RemoteError, SyncError,
};
use cartsync_core::{CartModel, CartView, CurrencyCode, ItemId, ProductSnapshot};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that stop a command before it reaches the engine.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The remote client could not be built.
    #[error("Cannot create cart API client: {0}")]
    Client(#[from] RemoteError),
}

/// An engine bound to the configured remote service and local record.
pub struct Session {
    engine: CartSyncEngine<HttpCartClient, FileCartStore>,
    currency: CurrencyCode,
}

#[allow(clippy::print_stdout)]
impl Session {
    pub fn from_env() -> Result<Self, CliError> {
        let config = CartSyncConfig::from_env()?;
        tracing::debug!(?config, "Loaded configuration");

        let remote = HttpCartClient::new(&config.remote)?;
        let store = FileCartStore::new(&config.store_path);
        Ok(Self {
            engine: CartSyncEngine::new(remote, store),
            currency: config.currency,
        })
    }

    /// Print the saved cart. An unreadable record prints as empty with a warning.
    pub fn show(&self) {
        let (cart, issues) = match self.engine.store().read() {
            Ok(cart) => (cart.unwrap_or_default(), Vec::new()),
            Err(e) => (CartModel::new(), vec![SyncError::from(e)]),
        };
        print!("{}", render(&cart, self.currency, &issues));
    }

    pub async fn load(&self) {
        let outcome = self.engine.load().await;
        if outcome.used_fallback {
            println!("warning: cart service unreachable, showing saved cart");
        }
        print!("{}", render(&outcome.cart, self.currency, &outcome.issues));
    }

    pub async fn add(&self, id: String, title: String, price: Decimal, image: Option<String>) {
        let mut snapshot = ProductSnapshot::new(id, title, price);
        snapshot.image = image;

        let issues = self.prepare().await;
        let outcome = self.engine.add_item(snapshot).await;
        self.report(&outcome.cart, outcome.remote_sync_failed, issues, outcome.issues);
    }

    pub async fn set(&self, id: String, quantity: i64) {
        let issues = self.prepare().await;
        let outcome = self.engine.set_quantity(&ItemId::new(id), quantity).await;
        self.report(&outcome.cart, outcome.remote_sync_failed, issues, outcome.issues);
    }

    pub async fn remove(&self, id: String) {
        let issues = self.prepare().await;
        let outcome = self.engine.remove_item(&ItemId::new(id)).await;
        self.report(&outcome.cart, outcome.remote_sync_failed, issues, outcome.issues);
    }

    pub async fn clear(&self) {
        let outcome = self.engine.clear().await;
        self.report(&outcome.cart, outcome.remote_sync_failed, Vec::new(), outcome.issues);
    }

    pub fn reset(&self) {
        let outcome = self.engine.reset();
        self.report(&outcome.cart, false, Vec::new(), outcome.issues);
    }

    /// Load the current cart before mutating it, returning load issues.
    async fn prepare(&self) -> Vec<SyncError> {
        self.engine.load().await.issues
    }

    fn report(
        &self,
        cart: &CartModel,
        remote_sync_failed: bool,
        mut issues: Vec<SyncError>,
        more: Vec<SyncError>,
    ) {
        issues.extend(more);
        if remote_sync_failed {
            println!("warning: change saved locally but not synced to the cart service");
        }
        print!("{}", render(cart, self.currency, &issues));
    }
}

/// Render a cart view followed by any issues.
fn render(cart: &CartModel, currency: CurrencyCode, issues: &[SyncError]) -> String {
    let view = CartView::from_model(cart, currency);
    let mut out = String::new();

    if view.is_empty() {
        out.push_str("Cart is empty\n");
    } else {
        let id_width = view.items.iter().map(|l| l.id.len()).max().unwrap_or(0);
        let title_width = view.items.iter().map(|l| l.title.len()).max().unwrap_or(0);
        for line in &view.items {
            let _ = writeln!(
                out,
                "{:<id_width$}  {:<title_width$}  {:>4} x {:>10}  {:>10}",
                line.id, line.title, line.quantity, line.price, line.line_price
            );
        }
    }
    let _ = writeln!(out, "Items: {}", view.item_count);
    let _ = writeln!(out, "Subtotal: {}", view.subtotal);

    for issue in issues {
        let _ = writeln!(out, "note: {issue}");
    }
    out
}
