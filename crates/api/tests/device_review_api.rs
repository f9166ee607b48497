//! HTTP-level integration tests for the typed device review RPC.
//!
//! Tests cover both list actions, approve and blacklist resolution
//! (including repeat resolution), device deletion and reset, device cap
//! updates, validation, and RBAC enforcement.

mod common;

use axum::http::StatusCode;
use common::{check_device, post_json, review, token_for};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    app: axum::Router,
    admin_token: String,
    officer_id: i64,
    attempt_id: i64,
}

/// An admin, an officer with two registered devices (`fp-1`, `fp-2`, the
/// test cap), and one pending attempt for `fp-3`.
async fn fixture(pool: PgPool) -> Fixture {
    let admin = common::create_user(&pool, "duty_admin", "admin").await;
    let officer = common::create_user(&pool, "officer_one", "officer").await;
    let app = common::build_test_app(pool);

    check_device(app.clone(), officer.id, "fp-1").await;
    check_device(app.clone(), officer.id, "fp-2").await;
    let (_, blocked) = check_device(app.clone(), officer.id, "fp-3").await;
    let attempt_id = blocked["data"]["attempt_id"]
        .as_i64()
        .expect("third device should be blocked");

    Fixture {
        app,
        admin_token: token_for(admin.id, "admin"),
        officer_id: officer.id,
        attempt_id,
    }
}

async fn list_users(f: &Fixture) -> Value {
    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "list_users_with_devices" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["data"].clone()
}

async fn list_attempts(f: &Fixture) -> Vec<Value> {
    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "list_blocked_attempts" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["data"]["attempts"].as_array().cloned().unwrap_or_default()
}

fn officer_entry(users: &Value, officer_id: i64) -> Value {
    users["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["user_id"] == officer_id)
        .cloned()
        .expect("officer should be listed")
}

fn fingerprints(user: &Value) -> Vec<String> {
    user["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["fingerprint"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_users_with_devices_returns_users_and_stats(pool: PgPool) {
    let f = fixture(pool).await;

    let data = list_users(&f).await;
    assert_eq!(data["kind"], "users_with_devices");

    let officer = officer_entry(&data, f.officer_id);
    assert_eq!(officer["max_devices"], common::TEST_DEFAULT_MAX_DEVICES);
    assert_eq!(fingerprints(&officer).len(), 2);

    assert_eq!(data["stats"]["total_users"], 2);
    assert_eq!(data["stats"]["total_devices"], 2);
    assert_eq!(data["stats"]["active_devices"], 2);
    assert_eq!(data["stats"]["users_at_limit"], 1);
    assert_eq!(data["stats"]["pending_attempts"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_blocked_attempts_returns_pending(pool: PgPool) {
    let f = fixture(pool).await;

    let attempts = list_attempts(&f).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["id"], f.attempt_id);
    assert_eq!(attempts[0]["fingerprint"], "fp-3");
    assert_eq!(attempts[0]["reason"], "Device limit reached");
    assert_eq!(attempts[0]["geo_location"], "Basra, IQ");
}

// ---------------------------------------------------------------------------
// Approve / blacklist
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approve_moves_attempt_into_devices(pool: PgPool) {
    let f = fixture(pool).await;

    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "approve_attempt", "attempt_id": f.attempt_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["kind"], "attempt_approved");
    assert_eq!(json["data"]["device"]["fingerprint"], "fp-3");

    assert!(list_attempts(&f).await.is_empty());
    let officer = officer_entry(&list_users(&f).await, f.officer_id);
    assert!(fingerprints(&officer).contains(&"fp-3".to_string()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_approve_returns_404(pool: PgPool) {
    let f = fixture(pool).await;
    let body = json!({ "action": "approve_attempt", "attempt_id": f.attempt_id });

    let (first, _) = review(f.app.clone(), &f.admin_token, body.clone()).await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = review(f.app.clone(), &f.admin_token, body).await;
    assert_eq!(second, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blacklist_denies_future_logins(pool: PgPool) {
    let f = fixture(pool).await;

    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "blacklist_attempt", "attempt_id": f.attempt_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["kind"], "attempt_blacklisted");
    assert_eq!(json["data"]["fingerprint"], "fp-3");
    assert!(list_attempts(&f).await.is_empty());

    let (_, outcome) = check_device(f.app.clone(), f.officer_id, "fp-3").await;
    assert_eq!(outcome["data"]["outcome"], "blocked");
    assert_eq!(outcome["data"]["reason"], "fingerprint_blacklisted");
    assert!(outcome["data"]["attempt_id"].is_null());
    assert!(list_attempts(&f).await.is_empty());
}

// ---------------------------------------------------------------------------
// Device mutations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_device_removes_it_from_listing(pool: PgPool) {
    let f = fixture(pool).await;
    let officer = officer_entry(&list_users(&f).await, f.officer_id);
    let device_id = officer["devices"][0]["id"].as_i64().unwrap();

    let body = json!({ "action": "delete_device", "device_id": device_id });
    let (status, json) = review(f.app.clone(), &f.admin_token, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["device_id"], device_id);

    let officer = officer_entry(&list_users(&f).await, f.officer_id);
    let ids: Vec<i64> = officer["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&device_id));

    let (again, _) = review(f.app.clone(), &f.admin_token, body).await;
    assert_eq!(again, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_all_devices_clears_user(pool: PgPool) {
    let f = fixture(pool).await;

    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "reset_all_devices", "user_id": f.officer_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["removed"], 2);

    let officer = officer_entry(&list_users(&f).await, f.officer_id);
    assert!(fingerprints(&officer).is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_max_devices_is_idempotent(pool: PgPool) {
    let f = fixture(pool).await;
    let body = json!({ "action": "set_max_devices", "user_id": f.officer_id, "max_devices": 5 });

    for _ in 0..2 {
        let (status, json) = review(f.app.clone(), &f.admin_token, body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["max_devices"], 5);
        let officer = officer_entry(&list_users(&f).await, f.officer_id);
        assert_eq!(officer["max_devices"], 5);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_max_devices_validates_range_and_user(pool: PgPool) {
    let f = fixture(pool).await;

    let (status, json) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "set_max_devices", "user_id": f.officer_id, "max_devices": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, _) = review(
        f.app.clone(),
        &f.admin_token,
        json!({ "action": "set_max_devices", "user_id": 555_555, "max_devices": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Access control and payload shape
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_requires_admin(pool: PgPool) {
    let f = fixture(pool).await;
    let body = json!({ "action": "list_blocked_attempts" });

    let response = post_json(f.app.clone(), "/api/v1/device-review", body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = review(f.app.clone(), &token_for(f.officer_id, "officer"), body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = review(f.app.clone(), &token_for(0, "service"), body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_action_is_rejected(pool: PgPool) {
    let f = fixture(pool).await;

    let response = common::post_json_auth(
        f.app.clone(),
        "/api/v1/device-review",
        json!({ "action": "drop_all_devices" }),
        &f.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
