//! Tests for page-view and conversion tracking.

use serde_json::json;

mod common;
use common::*;

/// Initialize with a last-touch config and attribute `code` through a link.
async fn referred_client(code: &str, remove_tracking_after_order: bool) -> TestClient {
    let client = test_client();
    let config = Config {
        remove_tracking_after_order,
        ..Default::default()
    };
    client
        .goaffpro
        .init(TOKEN, Some(config), None)
        .await
        .expect("init should succeed");
    client
        .goaffpro
        .handle_url(Some(&format!("myapp://shop?ref={}", code)))
        .await;
    client
}

// ==================== Page views ====================

#[tokio::test]
async fn test_page_view_without_referral_makes_no_request() {
    let client = test_client();
    client
        .goaffpro
        .init(TOKEN, Some(Config::default()), None)
        .await
        .unwrap();

    let result = client.goaffpro.track_page_view().await.unwrap();

    assert_eq!(result, None);
    assert!(client.transport.requests().is_empty());
}

#[tokio::test]
async fn test_page_view_without_referral_before_init_is_noop() {
    let client = test_client();

    let result = client.goaffpro.track_page_view().await.unwrap();

    assert_eq!(result, None);
    assert!(client.transport.requests().is_empty());
}

#[tokio::test]
async fn test_page_view_with_referral_before_init_is_not_initialized() {
    let client = test_client();
    client.goaffpro.set_referral_code("abc123").await;

    let err = client.goaffpro.track_page_view().await.unwrap_err();

    assert_eq!(err.code, GoaffproErrorCode::NotInitialized);
    assert!(client.transport.requests().is_empty());
}

#[tokio::test]
async fn test_page_view_reports_visit_and_stores_ids() {
    let client = referred_client("abc123", false).await;
    client
        .transport
        .respond(paths::TRACK_VISIT, visit_response("visit-1", "42"));

    let result = client.goaffpro.track_page_view().await.unwrap().unwrap();

    assert_eq!(result.id.as_deref(), Some("visit-1"));
    assert_eq!(result.affiliate_id.as_deref(), Some("42"));
    assert_eq!(client.goaffpro.visit_id().await.as_deref(), Some("visit-1"));
    assert_eq!(client.goaffpro.affiliate_id().await.as_deref(), Some("42"));

    let requests = client.transport.requests_to(paths::TRACK_VISIT);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].public_token, TOKEN);
    assert_eq!(requests[0].body, Some(json!({"ref": "abc123", "id": null})));
}

#[tokio::test]
async fn test_second_page_view_sends_stored_visit_id() {
    let client = referred_client("abc123", false).await;
    client
        .transport
        .respond(paths::TRACK_VISIT, visit_response("visit-1", "42"));

    client.goaffpro.track_page_view().await.unwrap();
    client.goaffpro.track_page_view().await.unwrap();

    let requests = client.transport.requests_to(paths::TRACK_VISIT);
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].body,
        Some(json!({"ref": "abc123", "id": "visit-1"}))
    );
}

#[tokio::test]
async fn test_page_view_without_ids_keeps_previous_visit() {
    let client = referred_client("abc123", false).await;
    client.storage.set(keys::VISIT_ID, "visit-0").await.unwrap();
    client.transport.respond(paths::TRACK_VISIT, json!({}));

    let result = client.goaffpro.track_page_view().await.unwrap().unwrap();

    assert_eq!(result.id, None);
    assert_eq!(client.goaffpro.visit_id().await.as_deref(), Some("visit-0"));
    assert_eq!(client.goaffpro.affiliate_id().await, None);
}

#[tokio::test]
async fn test_page_view_network_failure_is_returned() {
    let client = referred_client("abc123", false).await;
    client
        .transport
        .fail(paths::TRACK_VISIT, GoaffproError::network("connection refused"));

    let err = client.goaffpro.track_page_view().await.unwrap_err();

    assert_eq!(err.code, GoaffproErrorCode::NetworkError);
    assert_eq!(client.goaffpro.referral_code().await.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_page_view_after_expiry_makes_no_request() {
    let client = referred_client("abc123", false).await;
    client
        .clock
        .advance(Config::default().cookie_duration_ms as i64 + 1);

    let result = client.goaffpro.track_page_view().await.unwrap();

    assert_eq!(result, None);
    assert!(client.transport.requests().is_empty());
    assert_eq!(client.storage.get(keys::REF).await.unwrap(), None);
}

// ==================== Conversions ====================

#[tokio::test]
async fn test_conversion_before_init_is_not_initialized() {
    let client = test_client();
    client.goaffpro.set_referral_code("abc123").await;

    let err = client
        .goaffpro
        .track_conversion(Order::default())
        .await
        .unwrap_err();

    assert!(err.is_not_initialized());
    assert!(client.transport.requests().is_empty());
}

#[tokio::test]
async fn test_conversion_sends_order_ref_and_visit() {
    let client = referred_client("abc123", false).await;
    client.storage.set(keys::VISIT_ID, "visit-1").await.unwrap();
    client
        .transport
        .respond(paths::TRACK_CONVERSION, json!({"success": 1, "order_id": 9}));

    let order = Order {
        id: Some("1001".into()),
        total: Some(49.99),
        currency: Some("USD".into()),
        customer: Some(Customer {
            first_name: "Ada".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        }),
        line_items: Some(vec![LineItem {
            name: "Mug".into(),
            quantity: 1,
            price: 49.99,
            ..Default::default()
        }]),
        ..Default::default()
    };

    let response = client.goaffpro.track_conversion(order).await.unwrap();
    assert_eq!(response, json!({"success": 1, "order_id": 9}));

    let requests = client.transport.requests_to(paths::TRACK_CONVERSION);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].public_token, TOKEN);
    assert_eq!(
        requests[0].body,
        Some(json!({
            "data": {
                "id": "1001",
                "total": 49.99,
                "currency": "USD",
                "customer": {"first_name": "Ada", "email": "ada@example.com"},
                "line_items": [{"name": "Mug", "quantity": 1, "price": 49.99}]
            },
            "ref": "abc123",
            "visit_id": "visit-1"
        }))
    );
}

#[tokio::test]
async fn test_conversion_accepts_raw_order_id() {
    let client = referred_client("abc123", false).await;
    client.transport.respond(paths::TRACK_CONVERSION, json!({}));

    client.goaffpro.track_conversion("#1001").await.unwrap();

    let body = client.transport.requests_to(paths::TRACK_CONVERSION)[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["data"], json!("#1001"));
}

#[tokio::test]
async fn test_conversion_without_referral_sends_nulls() {
    let client = test_client();
    client
        .goaffpro
        .init(TOKEN, Some(Config::default()), None)
        .await
        .unwrap();
    client.storage.set(keys::VISIT_ID, "stale-visit").await.unwrap();
    client.transport.respond(paths::TRACK_CONVERSION, json!({}));

    client.goaffpro.track_conversion("1001").await.unwrap();

    let body = client.transport.requests_to(paths::TRACK_CONVERSION)[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["ref"], json!(null));
    assert_eq!(body["visit_id"], json!(null));
    assert_eq!(client.goaffpro.visit_id().await, None);
}

#[tokio::test]
async fn test_conversion_keeps_referral_by_default() {
    let client = referred_client("abc123", false).await;
    client.storage.set(keys::VISIT_ID, "visit-1").await.unwrap();
    client.storage.set(keys::AFFILIATE_ID, "42").await.unwrap();
    client.transport.respond(paths::TRACK_CONVERSION, json!({}));

    client.goaffpro.track_conversion("1001").await.unwrap();

    assert_eq!(client.goaffpro.referral_code().await.as_deref(), Some("abc123"));
    assert!(client.storage.get(keys::REF_TIME).await.unwrap().is_some());
    assert_eq!(client.goaffpro.affiliate_id().await.as_deref(), Some("42"));
    assert_eq!(client.goaffpro.visit_id().await, None);
}

#[tokio::test]
async fn test_conversion_removes_tracking_when_configured() {
    let client = referred_client("abc123", true).await;
    client.storage.set(keys::VISIT_ID, "visit-1").await.unwrap();
    client.storage.set(keys::AFFILIATE_ID, "42").await.unwrap();
    client.transport.respond(paths::TRACK_CONVERSION, json!({}));

    client.goaffpro.track_conversion("1001").await.unwrap();

    assert!(client.storage.is_empty().await);
}

#[tokio::test]
async fn test_conversion_failure_leaves_state() {
    let client = referred_client("abc123", true).await;
    client.storage.set(keys::VISIT_ID, "visit-1").await.unwrap();
    client.transport.fail(
        paths::TRACK_CONVERSION,
        GoaffproError::with_status(GoaffproErrorCode::ServerError, "boom", 502),
    );

    let err = client.goaffpro.track_conversion("1001").await.unwrap_err();

    assert_eq!(err.status, Some(502));
    assert_eq!(client.goaffpro.referral_code().await.as_deref(), Some("abc123"));
    assert_eq!(client.goaffpro.visit_id().await.as_deref(), Some("visit-1"));
}
