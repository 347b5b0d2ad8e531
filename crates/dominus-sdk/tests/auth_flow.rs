//! Auth flow tests: login, refresh-then-retry-once and failure semantics.

use std::sync::Arc;

use chrono::{Duration, Utc};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dominus_sdk::{
    ApiClient, AuthEvent, AuthSession, ClientConfig, ListParams, MemoryStore, TENANT_HEADER,
};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::with_store(
        ClientConfig::new(server.uri()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
}

fn session(access: &str, refresh: &str) -> AuthSession {
    AuthSession {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        token_type: "Bearer".to_string(),
        user: None,
    }
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
        "expires_in": 3600
    })
}

fn empty_page() -> serde_json::Value {
    serde_json::json!({ "items": [], "totalCount": 0 })
}

#[tokio::test]
async fn login_establishes_session_and_fetches_profile() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let mut events = client.subscribe();

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("scope=openid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", "ref-1")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/connect/userinfo"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sub": "u1",
            "preferred_username": "admin",
            "email": "admin@acme.com",
            "role": "admin"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.login("admin", "secret").await.unwrap();
    assert_eq!(session.access_token, "tok-1");
    let user = session.user.expect("profile should be hydrated");
    assert_eq!(user.id, "u1");
    assert_eq!(user.role, vec!["admin"]);
    assert!(matches!(events.try_recv(), Ok(AuthEvent::LoggedIn)));
}

#[tokio::test]
async fn login_sends_tenant_header_to_token_endpoint() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.tenant().set_override("acme");

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(header(TENANT_HEADER, "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", "ref-1")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/connect/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"sub": "u1"})))
        .mount(&server)
        .await;

    client.login("admin", "secret").await.unwrap();
}

#[tokio::test]
async fn bad_credentials_surface_as_api_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": "invalid_grant", "message": "Invalid username or password"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = client.login("admin", "wrong").await.unwrap_err();
    assert!(error.is_validation_error());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn expired_token_refreshes_and_replays_once() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.session().set(session("tok-old", "ref-old"));

    // The stale call and the replay are told apart by their bearer token.
    Mock::given(method("GET"))
        .and(path("/api/app/clients"))
        .and(header("Authorization", "Bearer tok-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/app/clients"))
        .and(header("Authorization", "Bearer tok-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-new", "ref-new")))
        .expect(1)
        .mount(&server)
        .await;

    client
        .resource::<serde_json::Value>("clients")
        .list(ListParams::default())
        .await
        .unwrap();

    // Both tokens rotated and persisted.
    let session = client.session().get().unwrap();
    assert_eq!(session.access_token, "tok-new");
    assert_eq!(session.refresh_token, "ref-new");
}

#[tokio::test]
async fn failed_refresh_clears_session_and_never_replays() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.session().set(session("tok-old", "ref-old"));
    let mut events = client.subscribe();

    Mock::given(method("GET"))
        .and(path("/api/app/clients"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": "invalid_grant", "message": "The refresh token is no longer valid"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = client
        .resource::<serde_json::Value>("clients")
        .list(ListParams::default())
        .await
        .unwrap_err();

    assert!(error.requires_login());
    assert!(!client.session().is_authenticated());
    assert!(matches!(
        events.try_recv(),
        Ok(AuthEvent::LoginRequired { .. })
    ));
}

#[tokio::test]
async fn second_401_after_refresh_is_surfaced_unmodified() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.session().set(session("tok-old", "ref-old"));

    Mock::given(method("GET"))
        .and(path("/api/app/clients"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-new", "ref-new")))
        .expect(1)
        .mount(&server)
        .await;

    let error = client
        .resource::<serde_json::Value>("clients")
        .list(ListParams::default())
        .await
        .unwrap_err();

    // No second refresh, no infinite retry: the 401 reaches the caller.
    assert!(error.is_authentication_error());
}

#[tokio::test]
async fn unauthenticated_401_requires_login_without_refresh() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let mut events = client.subscribe();

    Mock::given(method("GET"))
        .and(path("/api/app/clients"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": "Volo.Authorization", "message": "Session expired for tenant acme"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let error = client
        .resource::<serde_json::Value>("clients")
        .list(ListParams::default())
        .await
        .unwrap_err();

    // The server's normalized payload comes through, not a synthesized
    // error.
    assert!(error.is_authentication_error());
    assert!(error.requires_login());
    match &error {
        dominus_sdk::Error::Api { code, message, .. } => {
            assert_eq!(code, "Volo.Authorization");
            assert_eq!(message, "Session expired for tenant acme");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        events.try_recv(),
        Ok(AuthEvent::LoginRequired { .. })
    ));
}

#[tokio::test]
async fn concurrent_refreshes_collapse_into_one_token_call() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.session().set(session("tok-old", "ref-old"));

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-new", "ref-new")))
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(
        client.auth().refresh_if_stale(Some("tok-old")),
        client.auth().refresh_if_stale(Some("tok-old")),
    );

    assert_eq!(a.unwrap(), "tok-new");
    assert_eq!(b.unwrap(), "tok-new");
}

#[tokio::test]
async fn logout_clears_session_and_emits_event() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.session().set(session("tok-1", "ref-1"));
    let mut events = client.subscribe();

    client.logout();

    assert!(!client.session().is_authenticated());
    assert!(matches!(events.try_recv(), Ok(AuthEvent::LoggedOut)));
}
