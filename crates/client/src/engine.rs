//! Cart synchronization engine.
//!
//! Every cart load and mutation goes through [`CartSyncEngine`]. Mutations are
//! optimistic-local and fire-and-forget-remote:
//!
//! 1. The mutation is applied to the in-memory cart and persisted to the
//!    local store in one critical section.
//! 2. The equivalent remote call is awaited outside that critical section.
//! 3. A remote failure is logged and reported on the outcome; the local
//!    effect stands.
//!
//! There is no retry, no queue of failed calls, and no later reconciliation
//! with the server. The engine never returns an error: the worst case is an
//! empty cart with its degradations listed.
//!
//! # Concurrency
//!
//! The cart lives in a `tokio::sync::watch` channel. Local commits take the
//! channel's write lock, so concurrent intents are linearized and none of them
//! can observe a pre-mutation cart of another. Remote calls run after the
//! commit without holding the lock, so a slow call only delays its own
//! outcome.
//!
//! Every commit bumps a generation counter. A load that finds the counter
//! moved while its fetch was in flight keeps the local cart and reports
//! [`SyncError::LoadSuperseded`], so a committed mutation is never rolled
//! back.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use cartsync_core::{CartModel, ItemId, ProductSnapshot};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::SyncError;
use crate::remote::{RemoteCartService, RemoteError};
use crate::store::LocalCartStore;

/// Result of [`CartSyncEngine::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// The cart now held by the engine.
    pub cart: CartModel,
    /// `true` when the remote fetch failed and the cart came from the local
    /// store (or is empty because nothing usable was stored).
    pub used_fallback: bool,
    /// Every degradation encountered, in order.
    pub issues: Vec<SyncError>,
}

/// Result of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// The cart now held by the engine.
    pub cart: CartModel,
    /// `true` when the remote call for this mutation failed.
    pub remote_sync_failed: bool,
    /// Every degradation encountered, in order.
    pub issues: Vec<SyncError>,
}

impl MutationOutcome {
    /// Whether anything went wrong (remote or local).
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Single owner of the cart for one client session.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct CartSyncEngine<R, S> {
    remote: R,
    store: S,
    state: watch::Sender<CartModel>,
    generation: AtomicU64,
    loaded: AtomicBool,
}

impl<R, S> CartSyncEngine<R, S>
where
    R: RemoteCartService,
    S: LocalCartStore,
{
    /// Create an engine holding an empty, not yet loaded cart.
    #[must_use]
    pub fn new(remote: R, store: S) -> Self {
        Self {
            remote,
            store,
            state: watch::Sender::new(CartModel::new()),
            generation: AtomicU64::new(0),
            loaded: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> CartModel {
        self.state.borrow().clone()
    }

    /// Observe every committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartModel> {
        self.state.subscribe()
    }

    /// Whether [`load`](Self::load) has completed at least once.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// The local store backing this engine.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The remote service backing this engine.
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Load the cart, preferring the remote service.
    ///
    /// On success the fetched cart replaces the local one and is persisted.
    /// On any remote failure the stored cart is used instead; an absent or
    /// corrupt record yields an empty cart. If a mutation commits while the
    /// fetch is in flight, the local cart is kept in either case.
    #[instrument(skip(self))]
    pub async fn load(&self) -> LoadOutcome {
        let started = self.generation.load(Ordering::Acquire);
        let fetched = self.remote.fetch_cart().await;

        let outcome = match fetched {
            Ok(remote_cart) => {
                let (cart, local_issue) = self.commit(|model, store| {
                    if self.superseded(started) {
                        return Some(report_superseded());
                    }
                    *model = remote_cart;
                    persist(store, model)
                });
                debug!(items = cart.len(), "Loaded cart from remote");
                LoadOutcome {
                    cart,
                    used_fallback: false,
                    issues: local_issue.into_iter().collect(),
                }
            }
            Err(err) => {
                let remote_issue = report("load", err);
                let (cart, local_issue) = self.commit(|model, store| {
                    if self.superseded(started) {
                        return Some(report_superseded());
                    }
                    let (stored, issue) = read_fallback(store);
                    *model = stored;
                    issue
                });
                debug!(items = cart.len(), "Loaded cart from local store");
                LoadOutcome {
                    cart,
                    used_fallback: true,
                    issues: std::iter::once(remote_issue).chain(local_issue).collect(),
                }
            }
        };

        self.loaded.store(true, Ordering::Release);
        outcome
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line or appends a new line with quantity 1,
    /// whatever the remote outcome. A snapshot that cannot become a cart line
    /// (negative price) is refused: the cart is unchanged, nothing is sent to
    /// the remote service and the outcome carries [`SyncError::InvalidItem`].
    #[instrument(skip(self, snapshot), fields(item_id = %snapshot.id))]
    pub async fn add_item(&self, snapshot: ProductSnapshot) -> MutationOutcome {
        if let Err(err) = snapshot.validate() {
            let issue = SyncError::from(err);
            warn!(error = %issue, "Refusing to add invalid product");
            return MutationOutcome {
                cart: self.cart(),
                remote_sync_failed: false,
                issues: vec![issue],
            };
        }

        let id = snapshot.id.clone();
        let (cart, local_issue) = self.commit(|model, store| match model.add_one(snapshot) {
            Ok(_) => persist(store, model),
            Err(err) => Some(err.into()),
        });

        let remote = self.remote.add_item(&id, 1).await;
        finish("add_item", cart, local_issue, remote)
    }

    /// Set the quantity of a line.
    ///
    /// A quantity of zero or less is exactly [`remove_item`](Self::remove_item).
    /// Setting the quantity of an absent line leaves the cart unchanged (the
    /// remote call is still attempted). Quantities beyond `u32::MAX` saturate.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn set_quantity(&self, id: &ItemId, new_quantity: i64) -> MutationOutcome {
        if new_quantity <= 0 {
            return self.remove_item(id).await;
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let (cart, local_issue) = self.commit(|model, store| {
            model.set_quantity(id, quantity);
            persist(store, model)
        });

        let remote = self.remote.update_quantity(id, quantity).await;
        finish("set_quantity", cart, local_issue, remote)
    }

    /// Remove a line. Removing an absent line leaves the cart unchanged.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove_item(&self, id: &ItemId) -> MutationOutcome {
        let (cart, local_issue) = self.commit(|model, store| {
            model.remove(id);
            persist(store, model)
        });

        let remote = self.remote.remove_item(id).await;
        finish("remove_item", cart, local_issue, remote)
    }

    /// Empty the cart and erase the local record.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> MutationOutcome {
        let (cart, local_issue) = self.commit(|model, store| {
            model.clear();
            erase(store)
        });

        let remote = self.remote.clear_cart().await;
        finish("clear", cart, local_issue, remote)
    }

    /// Drop the local cart without touching the remote service.
    ///
    /// Intended for logout: the session's cart disappears from this device
    /// while the server keeps the shopper's cart.
    #[instrument(skip(self))]
    pub fn reset(&self) -> MutationOutcome {
        let (cart, local_issue) = self.commit(|model, store| {
            model.clear();
            erase(store)
        });
        debug!("Cart reset");
        finish("reset", cart, local_issue, Ok(()))
    }

    /// Apply a local change and its persistence as one linearized step.
    ///
    /// Subscribers are notified after the store has been updated.
    fn commit(
        &self,
        apply: impl FnOnce(&mut CartModel, &S) -> Option<SyncError>,
    ) -> (CartModel, Option<SyncError>) {
        let mut snapshot = CartModel::new();
        let mut issue = None;
        self.state.send_modify(|model| {
            issue = apply(model, &self.store);
            self.generation.fetch_add(1, Ordering::AcqRel);
            snapshot.clone_from(model);
        });
        (snapshot, issue)
    }

    /// Whether any commit happened since `started` was read.
    ///
    /// Only meaningful inside `commit`, where the generation cannot move.
    fn superseded(&self, started: u64) -> bool {
        self.generation.load(Ordering::Acquire) != started
    }
}

fn persist<S: LocalCartStore>(store: &S, model: &CartModel) -> Option<SyncError> {
    store
        .write(model)
        .err()
        .map(|err| report_local("persist", err.into()))
}

fn erase<S: LocalCartStore>(store: &S) -> Option<SyncError> {
    store
        .erase()
        .err()
        .map(|err| report_local("erase", err.into()))
}

/// Read the stored cart for a fallback load, treating corrupt data as absent.
fn read_fallback<S: LocalCartStore>(store: &S) -> (CartModel, Option<SyncError>) {
    match store.read() {
        Ok(Some(cart)) => (cart, None),
        Ok(None) => (CartModel::new(), None),
        Err(err) => (CartModel::new(), Some(report_local("read", err.into()))),
    }
}

fn report(operation: &'static str, err: RemoteError) -> SyncError {
    let issue = SyncError::from(err);
    warn!(operation, error = %issue, "Remote cart sync failed; keeping local cart");
    issue
}

fn report_superseded() -> SyncError {
    warn!("Cart changed locally during load; keeping local cart");
    SyncError::LoadSuperseded
}

fn report_local(operation: &'static str, issue: SyncError) -> SyncError {
    warn!(operation, error = %issue, "Local cart store degraded");
    issue
}

fn finish(
    operation: &'static str,
    cart: CartModel,
    local_issue: Option<SyncError>,
    remote: Result<(), RemoteError>,
) -> MutationOutcome {
    let remote_issue = remote.err().map(|err| report(operation, err));
    let remote_sync_failed = remote_issue.is_some();
    if !remote_sync_failed {
        debug!(operation, items = cart.len(), "Cart change synced");
    }
    MutationOutcome {
        cart,
        remote_sync_failed,
        issues: remote_issue.into_iter().chain(local_issue).collect(),
    }
}
