#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use precinct_api::auth::jwt::{generate_access_token, JwtConfig};
use precinct_api::config::ServerConfig;
use precinct_api::router::build_app_router;
use precinct_api::state::AppState;
use precinct_db::models::user::{CreateUser, User};
use precinct_db::repositories::UserRepo;

/// Device cap used by every test server.
pub const TEST_DEFAULT_MAX_DEVICES: i32 = 2;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        default_max_devices: TEST_DEFAULT_MAX_DEVICES,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Mint an access token for `user_id` with `role` using the test secret.
pub fn token_for(user_id: i64, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token generation should succeed")
}

/// Insert a user directly in the database.
pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            full_name: None,
            role: role.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// POST a review action as an admin and return `(status, body)`.
pub async fn review(
    app: Router,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = post_json_auth(app, "/api/v1/device-review", body, token).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// POST an admission check with a service token and return `(status, body)`.
pub async fn check_device(
    app: Router,
    user_id: i64,
    fingerprint: &str,
) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({
        "user_id": user_id,
        "fingerprint": fingerprint,
        "label": "Patrol tablet",
        "ip_address": "192.0.2.10",
        "user_agent": "Mozilla/5.0",
        "geo_location": "Basra, IQ",
    });
    let response =
        post_json_auth(app, "/api/v1/devices/check", body, &token_for(0, "service")).await;
    let status = response.status();
    (status, body_json(response).await)
}
