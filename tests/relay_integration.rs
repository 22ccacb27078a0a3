//! HTTP-level integration tests for the relay endpoint
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! push provider is replaced by a scripted one and subscribers are attached
//! straight to the connection manager.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use push_relay_service::config::Settings;
use push_relay_service::provider::{ProviderError, PushMessage, PushProvider};
use push_relay_service::server::{create_app, AppState};
use push_relay_service::websocket::OutboundMessage;

/// Push provider double that records calls and returns a fixed outcome
struct MockProvider {
    failure: Option<String>,
    calls: Mutex<Vec<PushMessage>>,
}

impl MockProvider {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PushProvider for MockProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(message.clone());
        match &self.failure {
            Some(message) => Err(ProviderError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok("projects/test/messages/42".to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct TestEnvironment {
    app: Router,
    state: AppState,
    provider: Arc<MockProvider>,
}

fn create_test_environment(provider: Arc<MockProvider>) -> TestEnvironment {
    let state = AppState::new(Settings::default(), provider.clone());
    TestEnvironment {
        app: create_app(state.clone()),
        state,
        provider,
    }
}

impl TestEnvironment {
    fn subscribe(&self) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(16);
        self.state.connection_manager.connect(tx);
        rx
    }

    async fn post_json(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/send-notification")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

fn received_events(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        match msg {
            OutboundMessage::Serialized(text) => events.push(serde_json::from_str(&text).unwrap()),
            OutboundMessage::Raw(m) => events.push(serde_json::to_value(m).unwrap()),
            OutboundMessage::Ping | OutboundMessage::Close => {}
        }
    }
    events
}

// =============================================================================
// Successful relay
// =============================================================================

mod success_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_notification_broadcasts_to_subscriber() {
        let env = create_test_environment(MockProvider::succeeding());
        let mut rx = env.subscribe();

        let (status, body) = env
            .post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Notification sent" }));
        assert_eq!(env.provider.call_count(), 1);
        assert_eq!(
            received_events(&mut rx),
            vec![json!({ "event": "new-notification", "data": { "title": "Hi", "body": "There" } })]
        );
    }

    #[tokio::test]
    async fn test_two_subscribers_each_receive_one_identical_event() {
        let env = create_test_environment(MockProvider::succeeding());
        let mut rx1 = env.subscribe();
        let mut rx2 = env.subscribe();

        let (status, _) = env
            .post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let events1 = received_events(&mut rx1);
        let events2 = received_events(&mut rx2);
        assert_eq!(events1.len(), 1);
        assert_eq!(events1, events2);
    }

    #[tokio::test]
    async fn test_success_without_subscribers() {
        let env = create_test_environment(MockProvider::succeeding());

        let (status, body) = env
            .post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_provider_receives_addressed_message() {
        let env = create_test_environment(MockProvider::succeeding());

        env.post_json(json!({ "token": "device-1", "title": "Hello", "body": "World" }))
            .await;

        let calls = env.provider.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![PushMessage::new("device-1", "Hello", "World")]);
    }
}

// =============================================================================
// Validation
// =============================================================================

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let env = create_test_environment(MockProvider::succeeding());
        let mut rx = env.subscribe();

        let (status, body) = env
            .post_json(json!({ "token": "", "title": "Hi", "body": "There" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
        assert_eq!(env.provider.call_count(), 0);
        assert!(received_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_each_missing_field_is_rejected() {
        let env = create_test_environment(MockProvider::succeeding());
        let mut rx = env.subscribe();

        for body in [
            json!({ "title": "Hi", "body": "There" }),
            json!({ "token": "abc", "body": "There" }),
            json!({ "token": "abc", "title": "Hi" }),
            json!({}),
        ] {
            let (status, response) = env.post_json(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], "Missing required fields");
        }

        assert_eq!(env.provider.call_count(), 0);
        assert!(received_events(&mut rx).is_empty());
        assert_eq!(env.state.relay.stats().rejected, 4);
    }

    #[tokio::test]
    async fn test_array_body_is_missing_fields() {
        let env = create_test_environment(MockProvider::succeeding());
        let mut rx = env.subscribe();

        let (status, body) = env.post_json(json!(["abc", "Hi", "There"])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
        assert_eq!(env.provider.call_count(), 0);
        assert!(received_events(&mut rx).is_empty());
        assert_eq!(env.state.relay.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_missing_fields() {
        let env = create_test_environment(MockProvider::succeeding());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/send-notification")
            .body(Body::from("token=abc&title=Hi&body=There"))
            .unwrap();
        let (status, body) = env.call(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
        assert_eq!(env.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let env = create_test_environment(MockProvider::succeeding());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/send-notification")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"token\": "))
            .unwrap();
        let (status, body) = env.call(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(env.provider.call_count(), 0);
    }
}

// =============================================================================
// Provider failure
// =============================================================================

mod provider_failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_provider_failure_returns_500_without_broadcast() {
        let env = create_test_environment(MockProvider::failing(
            "The registration token is not a valid FCM registration token",
        ));
        let mut rx = env.subscribe();

        let (status, body) = env
            .post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "The registration token is not a valid FCM registration token" })
        );
        assert_eq!(env.provider.call_count(), 1);
        assert!(received_events(&mut rx).is_empty());
        assert_eq!(env.state.relay.stats().provider_failed, 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let env = create_test_environment(MockProvider::failing("unavailable"));

        env.post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;

        assert_eq!(env.provider.call_count(), 1);
    }
}

// =============================================================================
// Subscriber membership
// =============================================================================

mod membership_tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnected_subscriber_gets_no_further_events() {
        let env = create_test_environment(MockProvider::succeeding());
        let (tx, mut rx) = mpsc::channel(16);
        let handle = env.state.connection_manager.connect(tx);

        env.post_json(json!({ "token": "abc", "title": "one", "body": "1" }))
            .await;
        env.state.connection_manager.disconnect(handle.id);
        env.post_json(json!({ "token": "abc", "title": "two", "body": "2" }))
            .await;

        let events = received_events(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data"]["title"], "one");
    }

    #[tokio::test]
    async fn test_late_subscriber_does_not_see_earlier_event() {
        let env = create_test_environment(MockProvider::succeeding());

        env.post_json(json!({ "token": "abc", "title": "early", "body": "1" }))
            .await;
        let mut rx = env.subscribe();

        assert!(received_events(&mut rx).is_empty());
    }
}

// =============================================================================
// Operational endpoints
// =============================================================================

mod operational_tests {
    use super::*;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let env = create_test_environment(MockProvider::succeeding());
        let (status, body) = env.call(get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_stats_reflect_activity() {
        let env = create_test_environment(MockProvider::succeeding());
        let _rx = env.subscribe();

        env.post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;
        env.post_json(json!({ "token": "", "title": "Hi", "body": "There" }))
            .await;

        let (status, body) = env.call(get("/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connections"]["total_connections"], 1);
        assert_eq!(body["notifications"]["sent"], 1);
        assert_eq!(body["notifications"]["rejected"], 1);
        assert_eq!(body["notifications"]["provider_failed"], 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_prometheus_text() {
        let env = create_test_environment(MockProvider::succeeding());
        env.post_json(json!({ "token": "abc", "title": "Hi", "body": "There" }))
            .await;

        let response = env.app.clone().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("relay_requests_total"));
    }

    #[tokio::test]
    async fn test_get_on_relay_route_is_not_allowed() {
        let env = create_test_environment(MockProvider::succeeding());
        let response = env
            .app
            .clone()
            .oneshot(get("/send-notification"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
