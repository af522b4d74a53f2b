//! REST client for the remote cart service.
//!
//! Uses `reqwest` with JSON bodies. Requests carry an optional bearer token and
//! share one connection pool through a cheaply cloneable handle.

use std::sync::Arc;

use cartsync_core::{CartModel, ItemId};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{RemoteCartService, RemoteError};
use crate::config::RemoteCartConfig;

/// Maximum number of body characters kept in error messages and logs.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the remote cart REST API.
#[derive(Clone)]
pub struct HttpCartClient {
    inner: Arc<HttpCartClientInner>,
}

struct HttpCartClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// `GET /cart` response body.
#[derive(Deserialize)]
struct CartPayload {
    #[serde(default)]
    items: Option<CartModel>,
}

/// `POST /cart/items` request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a ItemId,
    quantity: u32,
}

/// `PUT /cart/items/{itemId}` request body.
#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

impl HttpCartClient {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Config` if the base URL cannot carry path
    /// segments, the token is not a valid header value, or the HTTP client
    /// fails to build.
    pub fn new(config: &RemoteCartConfig) -> Result<Self, RemoteError> {
        if config.base_url.cannot_be_a_base() {
            return Err(RemoteError::Config(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| RemoteError::Config(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(HttpCartClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL all cart endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve `segments` below the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.inner.client.request(method, self.endpoint(segments))
    }

    /// Send a request and require a 2xx status.
    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Body is only used for diagnostics; a failed read leaves it empty
        let body = response.text().await.unwrap_or_default();
        let message = truncate(&body);
        tracing::warn!(
            status = %status,
            body = %message,
            "Cart API returned non-success status"
        );
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl RemoteCartService for HttpCartClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<CartModel, RemoteError> {
        let response = self.send(self.request(Method::GET, &["cart"])).await?;

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let payload: CartPayload = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse cart response"
            );
            RemoteError::Malformed(e.to_string())
        })?;

        let cart = payload.items.unwrap_or_default();
        debug!(items = cart.len(), "Fetched remote cart");
        Ok(cart)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: &ItemId, quantity: u32) -> Result<(), RemoteError> {
        let body = AddItemBody {
            product_id,
            quantity,
        };
        self.send(self.request(Method::POST, &["cart", "items"]).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn update_quantity(&self, item_id: &ItemId, quantity: u32) -> Result<(), RemoteError> {
        self.send(
            self.request(Method::PUT, &["cart", "items", item_id.as_str()])
                .json(&QuantityBody { quantity }),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_item(&self, item_id: &ItemId) -> Result<(), RemoteError> {
        self.send(self.request(Method::DELETE, &["cart", "items", item_id.as_str()]))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), RemoteError> {
        self.send(self.request(Method::DELETE, &["cart"])).await?;
        Ok(())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(base: &str) -> HttpCartClient {
        HttpCartClient::new(&RemoteCartConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_with_and_without_trailing_slash() {
        assert_eq!(
            client("https://shop.example/api").endpoint(&["cart"]).as_str(),
            "https://shop.example/api/cart"
        );
        assert_eq!(
            client("https://shop.example/api/")
                .endpoint(&["cart", "items"])
                .as_str(),
            "https://shop.example/api/cart/items"
        );
        assert_eq!(
            client("http://127.0.0.1:9000").endpoint(&["cart"]).as_str(),
            "http://127.0.0.1:9000/cart"
        );
    }

    #[test]
    fn test_endpoint_encodes_item_ids() {
        let url = client("https://shop.example/api").endpoint(&["cart", "items", "a/b c"]);
        assert_eq!(url.as_str(), "https://shop.example/api/cart/items/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_non_hierarchical_base() {
        let config = RemoteCartConfig::new(Url::parse("mailto:cart@example.com").unwrap());
        assert!(matches!(
            HttpCartClient::new(&config),
            Err(RemoteError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let mut config = RemoteCartConfig::new(Url::parse("https://shop.example").unwrap());
        config.api_token = Some(SecretString::from("abc\ndef"));
        assert!(matches!(
            HttpCartClient::new(&config),
            Err(RemoteError::Config(_))
        ));
    }

    #[test]
    fn test_add_item_body_shape() {
        let id = ItemId::new("p1");
        let body = serde_json::to_value(AddItemBody {
            product_id: &id,
            quantity: 1,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"productId": "p1", "quantity": 1}));
    }

    #[test]
    fn test_cart_payload_missing_items_is_empty() {
        let payload: CartPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.items.unwrap_or_default().is_empty());

        let payload: CartPayload = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(payload.items.is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(&"x".repeat(500)).len(), ERROR_BODY_LIMIT);
        assert_eq!(truncate("short"), "short");
    }
}
