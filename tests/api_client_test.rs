//! API client integration tests
//!
//! Exercises `ApiClient` against a `wiremock` server: bearer handling, the
//! global 401 path, and how backend failures are classified.

mod common;

use astravaani::api::types::{AskRequest, Tier};
use astravaani::api::AuthEvent;
use astravaani::error::{find_vaani_error, VaaniError};
use astravaani::storage::KeyValueStore;
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_path, client_for, free_usage_json, guidance_json, user_json};

#[tokio::test]
async fn test_requests_carry_stored_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("users/me")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("u1", "asha@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.set("token", "tok-123").unwrap();

    let user = client.me().await.expect("me should succeed");
    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "asha@example.com");
}

#[tokio::test]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("auth/login")))
        .and(body_json(json!({
            "email": "asha@example.com",
            "password": "correct-horse"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh-token", "token_type": "bearer"})),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    assert!(client.token().is_none());

    let token = client
        .login("asha@example.com", "correct-horse")
        .await
        .expect("login should succeed");

    assert_eq!(token.access_token, "fresh-token");
    assert_eq!(client.token().as_deref(), Some("fresh-token"));
    assert_eq!(store.get("token").unwrap().as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_broadcasts_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("guidance/check-usage")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token has expired"})),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.set("token", "stale").unwrap();
    let mut events = client.subscribe();

    let err = client.check_usage().await.unwrap_err();

    match find_vaani_error(&err) {
        Some(VaaniError::Unauthorized(message)) => assert_eq!(message, "Token has expired"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert!(client.token().is_none());
    assert_eq!(store.get("token").unwrap(), None);
    assert_eq!(events.try_recv(), Ok(AuthEvent::SessionExpired));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_every_clone_observes_session_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("users/me")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.set("token", "stale").unwrap();
    let other = client.clone();
    let mut events = other.subscribe();

    assert_err!(client.me().await);

    assert_eq!(events.try_recv(), Ok(AuthEvent::SessionExpired));
    assert!(other.token().is_none());
}

#[tokio::test]
async fn test_validation_detail_list_is_joined() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("auth/register")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address"},
                {"loc": ["body", "password"], "msg": "ensure this value has at least 8 characters"}
            ]
        })))
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let err = client.register("nope", "short", None).await.unwrap_err();

    match find_vaani_error(&err) {
        Some(VaaniError::Validation(message)) => assert_eq!(
            message,
            "value is not a valid email address, ensure this value has at least 8 characters"
        ),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_too_many_requests_is_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("guidance/ask")))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"detail": "Daily question limit reached"})),
        )
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let err = client.ask(&AskRequest::new("Will I travel?")).await.unwrap_err();

    assert!(matches!(
        find_vaani_error(&err),
        Some(VaaniError::QuotaExceeded(m)) if m == "Daily question limit reached"
    ));
}

#[tokio::test]
async fn test_profile_limit_bad_request_is_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("person-profiles")))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(
                json!({"detail": "Profile limit reached. Upgrade to add more profiles."}),
            ),
        )
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let request = astravaani::api::types::PersonProfileCreate {
        name: "Ravi".to_string(),
        nickname: None,
        relation_type: "sibling".to_string(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1995, 3, 2).unwrap(),
        time_of_birth: None,
        place_of_birth: "Pune".to_string(),
        notes: None,
        is_primary: false,
    };
    let err = client.create_person(&request).await.unwrap_err();

    assert!(matches!(
        find_vaani_error(&err),
        Some(VaaniError::QuotaExceeded(_))
    ));
}

#[tokio::test]
async fn test_missing_profile_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("users/profile")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Profile not found"})),
        )
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let err = client.get_profile().await.unwrap_err();

    assert!(matches!(
        find_vaani_error(&err),
        Some(VaaniError::NotFound(m)) if m == "Profile not found"
    ));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("subscriptions/plans")))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let err = client.plans().await.unwrap_err();

    match find_vaani_error(&err) {
        Some(VaaniError::Api { status, message }) => {
            assert_eq!(*status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_logout_clears_token_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("auth/logout")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.set("token", "tok").unwrap();

    assert_err!(client.logout().await);
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_ask_and_check_usage_parse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("guidance/ask")))
        .and(body_json(json!({
            "question": "Is this a good month to switch jobs?",
            "include_context": true
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(guidance_json("Yes, after the 20th.")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("guidance/check-usage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(free_usage_json(1, true)))
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);

    let answer = client
        .ask(&AskRequest::new("Is this a good month to switch jobs?"))
        .await
        .expect("ask should succeed");
    assert_eq!(answer.full_response, "Yes, after the 20th.");
    assert_eq!(answer.data_points_used, vec!["sun_sign", "current_dasha"]);
    assert!(answer.validation_passed());

    let usage = client.check_usage().await.expect("usage should parse");
    assert!(usage.allowed);
    assert_eq!(usage.usage.tier, Tier::Free);
    assert_eq!(usage.usage.lifetime_remaining, Some(1));
}

#[tokio::test]
async fn test_guidance_history_sends_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("guidance/history")))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "question": "Career?", "created_at": "2024-01-02T03:04:05Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let history = client.guidance_history(5, 10).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], "c1");
}

#[tokio::test]
async fn test_upgrade_to_free_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let err = client.upgrade(Tier::Free).await.unwrap_err();
    assert!(matches!(
        find_vaani_error(&err),
        Some(VaaniError::Validation(_))
    ));
}

#[tokio::test]
async fn test_upgrade_creates_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("subscriptions/upgrade/pro")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "order_id": "order_9",
            "amount": 49900,
            "currency": "INR",
            "key_id": "rzp_test",
            "tier": "pro"
        })))
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let order = assert_ok!(client.upgrade(Tier::Pro).await);
    assert_eq!(order.order_id, "order_9");
    assert_eq!(order.amount, 49900);
    assert_eq!(order.tier, Tier::Pro);
}

fn person_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Ravi",
        "relation_type": "sibling",
        "is_primary": true,
        "date_of_birth": "1995-03-02",
        "place_of_birth": "Pune",
        "created_at": "2025-01-05T10:00:00Z",
        "updated_at": "2025-01-05T10:00:00Z"
    })
}

#[tokio::test]
async fn test_person_id_stays_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("person-profiles/a%2Fb%3Fx")))
        .respond_with(ResponseTemplate::new(200).set_body_json(person_json("a/b?x")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("person-profiles/..%2Fusers%2Fme/set-primary")))
        .respond_with(ResponseTemplate::new(200).set_body_json(person_json("../users/me")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let person = assert_ok!(client.get_person("a/b?x").await);
    assert_eq!(person.id, "a/b?x");

    let person = assert_ok!(client.set_primary_person("../users/me").await);
    assert!(person.is_primary);
}

#[tokio::test]
async fn test_google_auth_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("auth/google")))
        .and(body_json(json!({"credential": "google-id-token"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "google-token", "token_type": "bearer"})),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    assert_ok!(client.google_auth("google-id-token").await);
    assert_eq!(store.get("token").unwrap().as_deref(), Some("google-token"));
}

#[tokio::test]
async fn test_usage_status_and_upgrade_options_parse() {
    let server = MockServer::start().await;
    let usage = free_usage_json(0, false);
    Mock::given(method("GET"))
        .and(path(api_path("subscriptions/usage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage["usage"].clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("subscriptions/can-ask")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "can_ask": false,
            "message": "You've used your free questions",
            "tier": "free",
            "should_upgrade": true,
            "upgrade_tiers": [
                {"tier": "starter", "price_display": "₹99/month"},
                {"tier": "pro", "price_display": "₹699/month"}
            ]
        })))
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);
    let snapshot = assert_ok!(client.usage_status().await);
    assert_eq!(snapshot.tier, Tier::Free);
    assert_eq!(snapshot.lifetime_limit, Some(2));
    assert_eq!(snapshot.lifetime_remaining, Some(0));
    assert!(!snapshot.can_ask_question);

    let answer = assert_ok!(client.can_ask().await);
    assert!(!answer.can_ask);
    assert!(answer.should_upgrade);
    assert_eq!(answer.upgrade_tiers.len(), 2);
    assert_eq!(answer.upgrade_tiers[0].tier, Tier::Starter);
}
