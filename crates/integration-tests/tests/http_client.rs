//! Integration tests for the REST cart client against the fake cart API.

use axum::http::{Method, StatusCode};
use cartsync::{HttpCartClient, RemoteCartConfig, RemoteCartService, RemoteError};
use cartsync_core::{CartModel, ItemId, ProductSnapshot};
use cartsync_integration_tests::{FakeCartApi, unreachable_base_url};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;

fn widget() -> ProductSnapshot {
    ProductSnapshot::new("p1", "Widget", Decimal::from(10))
}

async fn setup() -> (FakeCartApi, HttpCartClient) {
    let api = FakeCartApi::spawn().await.unwrap();
    api.add_product(widget());
    let client = HttpCartClient::new(&api.config()).unwrap();
    (api, client)
}

// =============================================================================
// Request Shape
// =============================================================================

#[tokio::test]
async fn test_fetch_empty_cart() {
    let (api, client) = setup().await;

    let cart = client.fetch_cart().await.unwrap();
    assert!(cart.is_empty());

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/api/cart");
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let api = FakeCartApi::spawn().await.unwrap();
    let mut config = api.config();
    config.api_token = Some(SecretString::from("tok-123"));
    let client = HttpCartClient::new(&config).unwrap();

    client.clear_cart().await.unwrap();

    let requests = api.requests();
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_add_item_posts_product_and_quantity() {
    let (api, client) = setup().await;

    client.add_item(&ItemId::new("p1"), 1).await.unwrap();

    let request = &api.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/cart/items");
    assert_eq!(request.body, Some(json!({"productId": "p1", "quantity": 1})));
    assert_eq!(api.cart().get(&ItemId::new("p1")).unwrap().quantity, 1);
}

#[tokio::test]
async fn test_item_ids_are_path_encoded() {
    let (api, client) = setup().await;
    let odd = ProductSnapshot::new("a/b c", "Odd", Decimal::ONE);
    let mut cart = CartModel::new();
    cart.add_one(odd).unwrap();
    api.set_cart(cart);

    let id = ItemId::new("a/b c");
    client.update_quantity(&id, 3).await.unwrap();

    let request = &api.requests()[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.path, "/api/cart/items/a%2Fb%20c");
    assert_eq!(request.body, Some(json!({"quantity": 3})));
    assert_eq!(api.cart().get(&id).unwrap().quantity, 3);

    client.remove_item(&id).await.unwrap();
    assert_eq!(api.requests()[1].method, Method::DELETE);
    assert!(api.cart().is_empty());
}

// =============================================================================
// Response Decoding
// =============================================================================

#[tokio::test]
async fn test_fetch_decodes_numeric_ids() {
    let (api, client) = setup().await;
    api.set_fetch_body(
        r#"{"items":[{"id":42,"title":"Mug","price":"8.50","quantity":2,"image":"mug.png"}]}"#,
    );

    let cart = client.fetch_cart().await.unwrap();
    let mug = cart.get(&ItemId::new("42")).unwrap();
    assert_eq!(mug.quantity, 2);
    assert_eq!(mug.price, Decimal::new(850, 2));
    assert_eq!(mug.image.as_deref(), Some("mug.png"));
}

#[tokio::test]
async fn test_fetch_missing_items_is_empty() {
    let (api, client) = setup().await;
    api.set_fetch_body("{}");

    assert!(client.fetch_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_garbage_is_malformed() {
    let (api, client) = setup().await;
    api.set_fetch_body("<html>maintenance</html>");

    assert!(matches!(
        client.fetch_cart().await,
        Err(RemoteError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_fetch_invalid_items_is_malformed() {
    let (api, client) = setup().await;
    api.set_fetch_body(
        r#"{"items":[
            {"id":"p1","title":"Widget","price":"10","quantity":1},
            {"id":"p1","title":"Widget","price":"10","quantity":2}
        ]}"#,
    );

    assert!(matches!(
        client.fetch_cart().await,
        Err(RemoteError::Malformed(_))
    ));
}

// =============================================================================
// Failure Mapping
// =============================================================================

#[tokio::test]
async fn test_non_success_status_is_rejected() {
    let (api, client) = setup().await;
    api.force_status(Some(StatusCode::SERVICE_UNAVAILABLE));

    let err = client.fetch_cart().await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Rejected {
            status: 503,
            message: "forced failure".to_string(),
        }
    );

    api.force_status(None);
    assert!(client.fetch_cart().await.is_ok());
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let (_api, client) = setup().await;

    let err = client.add_item(&ItemId::new("nope"), 1).await.unwrap_err();
    assert!(matches!(err, RemoteError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let config = RemoteCartConfig::new(unreachable_base_url().await.unwrap());
    let client = HttpCartClient::new(&config).unwrap();

    assert!(matches!(
        client.fetch_cart().await,
        Err(RemoteError::Unavailable(_))
    ));
    assert!(matches!(
        client.clear_cart().await,
        Err(RemoteError::Unavailable(_))
    ));
}
