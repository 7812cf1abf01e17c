#![allow(clippy::unwrap_used)]
// Integration tests for `HassClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homeai_api::hass::ServiceData;
use homeai_api::transport::TransportConfig;
use homeai_api::{Error, HassClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HassClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token = secrecy::SecretString::from("hass-token");
    let client = HassClient::new(base_url, &token, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Ping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("authorization", "Bearer hass-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "API running." })))
        .expect(1)
        .mount(&server)
        .await;

    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_ping_rejected_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .mount(&server)
        .await;

    let result = client.ping().await;
    assert!(
        matches!(result, Err(Error::Authentication { status: 401 })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── States ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_states_skips_malformed_items() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "entity_id": "light.kitchen",
                "state": "on",
                "attributes": { "brightness": 204, "friendly_name": "Kitchen" }
            },
            { "state": "on" },
            { "entity_id": "lock.front_door", "state": "locked", "attributes": {} }
        ])))
        .mount(&server)
        .await;

    let states = client.list_states().await.unwrap();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].entity_id, "light.kitchen");
    assert_eq!(states[0].attr_i64("brightness"), Some(204));
    assert_eq!(states[1].domain(), "lock");
}

#[tokio::test]
async fn test_list_states_non_array_is_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let result = client.list_states().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_service_posts_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_json(json!({ "entity_id": "light.kitchen", "brightness": 128 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let data = ServiceData {
        entity_id: "light.kitchen".into(),
        brightness: Some(128),
        temperature: None,
    };
    client.call_service("light", "turn_on", &data).await.unwrap();
}

#[tokio::test]
async fn test_call_service_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/switch/turn_off"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let data = ServiceData {
        entity_id: "switch.fan".into(),
        ..ServiceData::default()
    };
    let err = client
        .call_service("switch", "turn_off", &data)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.is_transient());
}
