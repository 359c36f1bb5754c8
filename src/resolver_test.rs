use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;

use super::*;
use crate::config::Timeouts;
use crate::identity::Role;

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_identity_provider(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn resolver_for(base_url: &str) -> HttpSessionResolver {
    let config = GuardConfig::default().with_api_base_url(base_url).unwrap();
    HttpSessionResolver::new(&config).unwrap()
}

// =============================================================================
// parse_identity
// =============================================================================

#[test]
fn parse_profile_body() {
    let user = parse_identity(r#"{"id":3,"email":"u@quiz.local","role":"user"}"#).unwrap().unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.id, Some(3));
}

#[test]
fn parse_null_body_is_no_session() {
    assert_eq!(parse_identity("null").unwrap(), None);
}

#[test]
fn parse_invalid_json() {
    let err = parse_identity("<html>login</html>").unwrap_err();
    assert!(matches!(err, ResolveError::Parse(_)));
}

#[test]
fn parse_non_object_json() {
    assert!(parse_identity(r#""admin""#).is_err());
    assert!(parse_identity("[]").is_err());
}

// =============================================================================
// HttpSessionResolver
// =============================================================================

#[tokio::test]
async fn resolves_admin_session() {
    let app = Router::new().route(
        "/api/me",
        get(|| async { Json(serde_json::json!({ "id": 1, "email": "a@quiz.local", "role": "admin" })) }),
    );
    let base = spawn_identity_provider(app).await;

    let identity = resolver_for(&base).resolve().await;
    assert_eq!(identity.role(), Some(Role::Admin));
}

#[tokio::test]
async fn unauthorized_status_is_absent() {
    let app = Router::new().route("/api/me", get(|| async { StatusCode::UNAUTHORIZED }));
    let base = spawn_identity_provider(app).await;

    assert_eq!(resolver_for(&base).resolve().await, Identity::Absent);
}

#[tokio::test]
async fn server_error_is_absent() {
    let app = Router::new().route(
        "/api/me",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "role": "admin" }))) }),
    );
    let base = spawn_identity_provider(app).await;

    assert_eq!(resolver_for(&base).resolve().await, Identity::Absent);
}

#[tokio::test]
async fn malformed_body_is_absent() {
    let app = Router::new().route("/api/me", get(|| async { "definitely not json" }));
    let base = spawn_identity_provider(app).await;

    assert_eq!(resolver_for(&base).resolve().await, Identity::Absent);
}

#[tokio::test]
async fn missing_endpoint_is_absent() {
    let base = spawn_identity_provider(Router::new()).await;
    assert_eq!(resolver_for(&base).resolve().await, Identity::Absent);
}

#[tokio::test]
async fn unreachable_provider_is_absent() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let identity = resolver_for(&format!("http://{addr}")).resolve().await;
    assert_eq!(identity, Identity::Absent);
}

#[tokio::test]
async fn slow_provider_times_out_to_absent() {
    let app = Router::new().route(
        "/api/me",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(serde_json::json!({ "role": "admin" }))
        }),
    );
    let base = spawn_identity_provider(app).await;
    let config = GuardConfig {
        timeouts: Timeouts { request_secs: 1, connect_secs: 1 },
        ..GuardConfig::default().with_api_base_url(&base).unwrap()
    };

    let identity = HttpSessionResolver::new(&config).unwrap().resolve().await;
    assert_eq!(identity, Identity::Absent);
}

/// Provider that counts `/api/me` hits and answers with `status` after `delay`.
async fn spawn_counting_provider(status: StatusCode, delay: Duration) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/api/me",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                status
            }
        }),
    );
    (spawn_identity_provider(app).await, hits)
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let (base, hits) = spawn_counting_provider(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
    let resolver = resolver_for(&base);

    assert_eq!(resolver.resolve().await, Identity::Absent);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert_eq!(resolver.resolve().await, Identity::Absent);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn timeout_is_not_retried() {
    let (base, hits) = spawn_counting_provider(StatusCode::OK, Duration::from_secs(3)).await;
    let config = GuardConfig {
        timeouts: Timeouts { request_secs: 1, connect_secs: 1 },
        ..GuardConfig::default().with_api_base_url(&base).unwrap()
    };

    let identity = HttpSessionResolver::new(&config).unwrap().resolve().await;
    assert_eq!(identity, Identity::Absent);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

async fn me_with_cookie(headers: HeaderMap) -> axum::response::Response {
    let cookie = headers.get("cookie").and_then(|v| v.to_str().ok()).unwrap_or_default();
    if cookie.contains("session=valid") {
        Json(serde_json::json!({ "role": "user" })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

#[tokio::test]
async fn forwards_session_cookie() {
    let app = Router::new().route("/api/me", get(me_with_cookie));
    let base = spawn_identity_provider(app).await;

    let anonymous = resolver_for(&base);
    assert_eq!(anonymous.resolve().await, Identity::Absent);

    let config = GuardConfig {
        session_cookie: Some("session=valid".into()),
        ..GuardConfig::default().with_api_base_url(&base).unwrap()
    };
    let signed_in = HttpSessionResolver::new(&config).unwrap();
    assert_eq!(signed_in.resolve().await.role(), Some(Role::User));
}

#[test]
fn me_url_is_built_from_config() {
    let resolver = resolver_for("http://localhost:5001/");
    assert_eq!(resolver.me_url(), "http://localhost:5001/api/me");
}

// =============================================================================
// StaticResolver
// =============================================================================

#[tokio::test]
async fn static_resolver_returns_fixed_identity() {
    let resolver = StaticResolver::new(Identity::with_role(Role::Admin));
    assert!(resolver.resolve().await.is_admin());
    assert_eq!(StaticResolver::default().resolve().await, Identity::Absent);
}
