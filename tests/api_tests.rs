// HTTP surface tests

use actix_web::{body::MessageBody, http::StatusCode, test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use foundry_match::core::Ranker;
use foundry_match::models::{
    Availability, BriefProfile, Complexity, ExperienceTier, InteractionRecord, InteractionStats, ProjectRequest,
    RequestStatus, ServiceProvider, Urgency,
};
use foundry_match::routes::{self, auth::Claims, auth::TokenVerifier, AppState};
use foundry_match::services::{ConnectionRegistry, InMemoryDirectory, InMemoryLedger, InteractionLedger, LedgerError};
use futures_util::future::poll_fn;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

fn token(user: &str) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        iss: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn bearer(user: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(user)))
}

/// Ledger whose database is unreachable
struct UnavailableLedger;

fn pool_timeout() -> LedgerError {
    LedgerError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl InteractionLedger for UnavailableLedger {
    async fn record_interaction(&self, _: &str, _: &str, _: bool) -> Result<InteractionRecord, LedgerError> {
        Err(pool_timeout())
    }

    async fn find_interaction(&self, _: &str, _: &str) -> Result<Option<InteractionRecord>, LedgerError> {
        Err(pool_timeout())
    }

    async fn mark_mutual_match(&self, _: Uuid, _: Uuid) -> Result<bool, LedgerError> {
        Err(pool_timeout())
    }

    async fn matched_records(&self, _: &str) -> Result<Vec<InteractionRecord>, LedgerError> {
        Err(pool_timeout())
    }

    async fn stats(&self, _: &str) -> Result<InteractionStats, LedgerError> {
        Err(pool_timeout())
    }

    async fn health_check(&self) -> Result<bool, LedgerError> {
        Err(pool_timeout())
    }
}

fn state() -> AppState {
    state_with_ledger(Arc::new(InMemoryLedger::new()))
}

fn state_with_ledger(ledger: Arc<dyn InteractionLedger>) -> AppState {
    let directory = Arc::new(InMemoryDirectory::new());
    for user in ["alice", "bob"] {
        directory.insert_profile(BriefProfile {
            id: user.to_string(),
            name: user.to_uppercase(),
            title: None,
            image: None,
        });
    }
    directory.insert_request(ProjectRequest {
        id: "req-1".to_string(),
        owner_id: "alice".to_string(),
        title: "Landing page".to_string(),
        category: "design".to_string(),
        required_skills: vec!["figma".to_string()],
        complexity: Complexity::Medium,
        budget: Some(2000),
        urgency: Urgency::Soon,
        created_at: Utc::now(),
        applicant_count: 0,
        status: RequestStatus::Open,
    });
    for (id, user, category) in [("prov-1", "bob", "design"), ("prov-2", "carol", "writing")] {
        directory.insert_provider(ServiceProvider {
            id: id.to_string(),
            user_id: user.to_string(),
            name: user.to_string(),
            title: None,
            image: None,
            categories: vec![category.to_string()],
            skills: vec!["figma".to_string()],
            tier: ExperienceTier::Senior,
            hourly_rate: Some(50),
            availability: Availability::Available,
            completed_projects: 0,
        });
    }

    AppState::new(
        ledger,
        directory,
        Arc::new(ConnectionRegistry::new(8, 2)),
        Ranker::with_default_weights(),
        TokenVerifier::new(SECRET, None),
        Duration::from_secs(15),
    )
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .set_json(json!({"targetId": "bob", "liked": true}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[actix_web::test]
async fn test_like_like_reports_match_and_lists_it() {
    let app = app!(state());

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("alice"))
        .set_json(json!({"targetId": "bob", "liked": true}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matched"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("bob"))
        .set_json(json!({"targetId": "alice", "liked": true}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matched"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches")
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["matches"][0]["otherUser"]["id"], "bob");
    assert_eq!(body["matches"][0]["otherUser"]["name"], "BOB");
}

#[actix_web::test]
async fn test_duplicate_interaction_is_bad_request() {
    let app = app!(state());

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/api/v1/interactions")
            .insert_header(bearer("alice"))
            .set_json(json!({"targetId": "bob", "liked": false}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "DuplicateInteraction");
        }
    }
}

#[actix_web::test]
async fn test_unknown_target_is_not_found() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("alice"))
        .set_json(json!({"targetId": "nobody", "liked": true}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_self_interaction_is_bad_request() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("alice"))
        .set_json(json!({"targetId": "alice", "liked": true}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("alice"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"targetId\": 42}")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_candidates_ranked_for_request() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/api/v1/candidates?requestId=req-1&minScore=70")
        .insert_header(bearer("alice"))
        .to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["totalConsidered"], 2);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["subjectId"], "prov-1");
}

#[actix_web::test]
async fn test_requests_ranked_for_provider() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/api/v1/requests?candidateId=prov-1")
        .insert_header(bearer("bob"))
        .to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"][0]["subjectId"], "req-1");
}

#[actix_web::test]
async fn test_unknown_request_is_not_found() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/api/v1/candidates?requestId=missing")
        .insert_header(bearer("alice"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_reports_open_channels() {
    let app = app!(state());
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["openChannels"], 0);
}

/// Next SSE frame from a streaming body, as JSON
async fn next_event<B: MessageBody>(body: &mut std::pin::Pin<Box<B>>) -> Value {
    let chunk = tokio::time::timeout(Duration::from_secs(2), poll_fn(|cx| body.as_mut().poll_next(cx)))
        .await
        .expect("stream stalled");
    let bytes = match chunk {
        Some(Ok(bytes)) => bytes,
        _ => panic!("stream ended or failed"),
    };
    let text = std::str::from_utf8(&bytes).unwrap();
    let json = text.strip_prefix("data: ").and_then(|t| t.strip_suffix("\n\n")).unwrap();
    serde_json::from_str(json).unwrap()
}

#[actix_web::test]
async fn test_notification_stream_delivers_like_then_match() {
    let state = state();
    let registry = Arc::clone(&state.registry);
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/notifications?token={}", token("bob")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/event-stream");
    assert_eq!(registry.open_channels(), 1);
    let mut body = Box::pin(resp.into_body());

    for (from, to) in [("alice", "bob"), ("bob", "alice")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/interactions")
            .insert_header(bearer(from))
            .set_json(json!({"targetId": to, "liked": true}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let like = next_event(&mut body).await;
    assert_eq!(like["type"], "like");
    assert_eq!(like["recipientId"], "bob");
    assert_eq!(like["payload"]["id"], "alice");

    let matched = next_event(&mut body).await;
    assert_eq!(matched["type"], "match");
    assert_eq!(matched["payload"]["id"], "alice");

    drop(body);
    assert_eq!(registry.open_channels(), 0);
}

#[actix_web::test]
async fn test_notification_stream_requires_token() {
    let app = app!(state());
    let req = test::TestRequest::get().uri("/api/v1/notifications").to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_query_token_used_when_header_is_not_bearer() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches?token={}", token("alice")))
        .insert_header(("Authorization", "Basic xyz"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_ledger_failure_is_server_error_without_events() {
    let state = state_with_ledger(Arc::new(UnavailableLedger));
    let registry = Arc::clone(&state.registry);
    let detector = Arc::clone(&state.detector);
    let mut bob = registry.subscribe("bob");
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/interactions")
        .insert_header(bearer("alice"))
        .set_json(json!({"targetId": "bob", "liked": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "PersistenceFailure");
    assert_eq!(body["statusCode"], 500);

    assert!(tokio::time::timeout(Duration::from_millis(20), bob.recv()).await.is_err());
    assert_eq!(detector.pending_pairs(), 0);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "degraded");
}
