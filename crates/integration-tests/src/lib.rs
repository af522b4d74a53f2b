//! Integration test harness for cartsync.
//!
//! [`FakeCartApi`] is an in-process implementation of the cart REST API,
//! served by `axum` on an ephemeral local port. Tests point the real
//! `HttpCartClient` at it and inspect both the engine's outcome and what the
//! server saw.
//!
//! ```rust,ignore
//! let api = FakeCartApi::spawn().await?;
//! api.add_product(ProductSnapshot::new("p1", "Widget", Decimal::from(10)));
//! let engine = CartSyncEngine::new(HttpCartClient::new(&api.config())?, store);
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cartsync::RemoteCartConfig;
use cartsync_core::{CartModel, ItemId, ProductSnapshot};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// A request as seen by the fake API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    /// Raw (still percent-encoded) request path.
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct ApiState {
    cart: CartModel,
    catalog: HashMap<ItemId, ProductSnapshot>,
    requests: Vec<RecordedRequest>,
    forced_status: Option<StatusCode>,
    fetch_body: Option<String>,
}

#[derive(Clone, Default)]
struct SharedState(Arc<Mutex<ApiState>>);

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the request and return the forced failure, if one is set.
    fn intercept(
        &self,
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<Value>,
    ) -> Option<Response> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            method,
            path: uri.path().to_string(),
            authorization: headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        state
            .forced_status
            .map(|status| (status, "forced failure").into_response())
    }
}

/// In-process fake of the remote cart API.
pub struct FakeCartApi {
    base_url: Url,
    state: SharedState,
    server: JoinHandle<()>,
}

impl FakeCartApi {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let state = SharedState::default();
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = api_url(listener.local_addr()?)?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    /// Base URL of the API, with a path prefix to exercise URL joining.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn config(&self) -> RemoteCartConfig {
        RemoteCartConfig::new(self.base_url())
    }

    /// Make a product addable through `POST /cart/items`.
    pub fn add_product(&self, product: ProductSnapshot) {
        self.state.lock().catalog.insert(product.id.clone(), product);
    }

    /// Replace the server-side cart.
    pub fn set_cart(&self, cart: CartModel) {
        self.state.lock().cart = cart;
    }

    /// Current server-side cart.
    #[must_use]
    pub fn cart(&self) -> CartModel {
        self.state.lock().cart.clone()
    }

    /// Answer every request with `status` (or resume normal service with `None`).
    pub fn force_status(&self, status: Option<StatusCode>) {
        self.state.lock().forced_status = status;
    }

    /// Serve `body` verbatim for `GET /cart`.
    pub fn set_fetch_body(&self, body: impl Into<String>) {
        self.state.lock().fetch_body = Some(body.into());
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }
}

impl Drop for FakeCartApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A base URL on which nothing is listening.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub async fn unreachable_base_url() -> std::io::Result<Url> {
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    api_url(addr)
}

fn api_url(addr: SocketAddr) -> std::io::Result<Url> {
    Url::parse(&format!("http://{addr}/api"))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/cart", get(fetch_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{id}", put(update_item).delete(remove_item))
        .with_state(state)
}

async fn fetch_cart(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = state.intercept(method, &uri, &headers, None) {
        return failure;
    }
    let api = state.lock();
    match &api.fetch_body {
        Some(raw) => (
            [(header::CONTENT_TYPE, "application/json")],
            raw.clone(),
        )
            .into_response(),
        None => Json(json!({ "items": api.cart })).into_response(),
    }
}

async fn add_item(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.intercept(method, &uri, &headers, Some(body.clone())) {
        return failure;
    }
    let (Some(id), Some(quantity)) = (
        body.get("productId").and_then(Value::as_str),
        body.get("quantity").and_then(Value::as_u64),
    ) else {
        return (StatusCode::BAD_REQUEST, "productId and quantity required").into_response();
    };

    let mut api = state.lock();
    let Some(product) = api.catalog.get(&ItemId::new(id)).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown product").into_response();
    };
    for _ in 0..quantity {
        if let Err(e) = api.cart.add_one(product.clone()) {
            return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
        }
    }
    StatusCode::CREATED.into_response()
}

async fn update_item(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.intercept(method, &uri, &headers, Some(body.clone())) {
        return failure;
    }
    let Some(quantity) = body
        .get("quantity")
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok())
    else {
        return (StatusCode::BAD_REQUEST, "quantity required").into_response();
    };

    if state.lock().cart.set_quantity(&ItemId::new(id), quantity) {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::NOT_FOUND, "no such item").into_response()
    }
}

async fn remove_item(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = state.intercept(method, &uri, &headers, None) {
        return failure;
    }
    state.lock().cart.remove(&ItemId::new(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn clear_cart(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = state.intercept(method, &uri, &headers, None) {
        return failure;
    }
    state.lock().cart.clear();
    StatusCode::NO_CONTENT.into_response()
}
