/// Integration tests for the billing flow
///
/// These tests verify reconciliation end-to-end against a real database:
/// - attendance is reduced to hours and priced with the job's rate
/// - consumed events are tagged and never billed twice
/// - the helper's receipt confirmation is one-way
mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

/// Full reconciliation: one 8-hour shift becomes one paid payment
#[tokio::test]
async fn test_attendance_reconciles_into_payment() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 150).await.unwrap();

    // One closed 8-hour shift
    let end = Utc::now() - Duration::minutes(5);
    let start = end - Duration::hours(8);
    common::insert_attendance_at(&ctx, job.id, "check-in", start)
        .await
        .unwrap();
    common::insert_attendance_at(&ctx, job.id, "check-out", end)
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
                "job_id": job.id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payment = common::body_json(response).await;
    assert_eq!(payment["hours_worked"], 8.0);
    assert_eq!(payment["rate"], 150);
    assert_eq!(payment["amount"], 1200);
    assert_eq!(payment["status"], "paid");

    // Both events were consumed
    let (untagged,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM attendance WHERE helper_id = $1 AND payment_id IS NULL",
    )
    .bind(ctx.helper.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(untagged, 0);

    // A second reconciliation finds nothing to bill (400, not 404)
    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
                "job_id": job.id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Receipt confirmation is helper-only and one-way
#[tokio::test]
async fn test_receive_transition_once_only() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 200).await.unwrap();

    let end = Utc::now() - Duration::minutes(1);
    common::insert_attendance_at(&ctx, job.id, "check-in", end - Duration::hours(2))
        .await
        .unwrap();
    common::insert_attendance_at(&ctx, job.id, "check-out", end)
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
                "job_id": job.id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payment = common::body_json(response).await;
    let payment_id = payment["id"].as_str().unwrap().to_string();

    // The family cannot confirm receipt
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/payments/{payment_id}/receive"))
        .header("authorization", ctx.family_auth())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The helper can, once
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/payments/{payment_id}/receive"))
        .header("authorization", ctx.helper_auth())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let received = common::body_json(response).await;
    assert_eq!(received["status"], "received");
    assert!(received["received_at"].is_string());

    // A second confirmation is rejected
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/payments/{payment_id}/receive"))
        .header("authorization", ctx.helper_auth())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// The family dashboard shows an open shift as pending before billing
#[tokio::test]
async fn test_dashboard_shows_pending_before_billing() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 100).await.unwrap();

    // An open shift, roughly half an hour so far
    common::insert_attendance_at(&ctx, job.id, "check-in", Utc::now() - Duration::minutes(30))
        .await
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/payments/family")
        .header("authorization", ctx.family_auth())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = common::body_json(response).await;
    let pending = dashboard["pending"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["status"], "pending");
    assert_eq!(pending[0]["rate"], 100);
    assert_eq!(pending[0]["hours_worked"], 0.5);
    assert!(dashboard["paid"].as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

/// Reconciliation without a job id resolves via the helper's assignment
#[tokio::test]
async fn test_job_context_resolved_from_assignment() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 120).await.unwrap();

    let end = Utc::now() - Duration::minutes(1);
    common::insert_attendance_at(&ctx, job.id, "check-in", end - Duration::hours(1))
        .await
        .unwrap();
    common::insert_attendance_at(&ctx, job.id, "check-out", end)
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payment = common::body_json(response).await;
    assert_eq!(payment["job_id"].as_str().unwrap(), job.id.to_string());
    assert_eq!(payment["rate"], 120);

    ctx.cleanup().await.unwrap();
}

/// A job id the family does not own is 404; a missing job id with no
/// assignment is 400
#[tokio::test]
async fn test_job_resolution_errors() {
    let ctx = TestContext::new().await.unwrap();

    // Explicit job id that is not the family's
    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
                "job_id": Uuid::new_v4(),
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Job not found for this family");

    // No job id, and the helper is not assigned to any of the family's jobs
    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "from_attendance",
                "helper_id": ctx.helper.id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// The legacy confirm path flips a seeded pending payment to paid
#[tokio::test]
async fn test_confirm_flips_seeded_pending_payment() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 100).await.unwrap();

    // A payment row seeded outside reconciliation
    let (payment_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO payments (family_id, helper_id, job_id, hours_worked, rate, amount, status) \
         VALUES ($1, $2, $3, 4.0, 100, 400, 'pending') RETURNING id",
    )
    .bind(ctx.family.id)
    .bind(ctx.helper.id)
    .bind(job.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "confirm",
                "payment_id": payment_id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payment = common::body_json(response).await;
    assert_eq!(payment["id"].as_str().unwrap(), payment_id.to_string());
    assert_eq!(payment["status"], "paid");
    assert_eq!(payment["amount"], 400);
    assert!(payment["received_at"].is_null());

    // Confirming a payment that does not exist for this family is a 404
    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "kind": "confirm",
                "payment_id": Uuid::new_v4(),
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}
