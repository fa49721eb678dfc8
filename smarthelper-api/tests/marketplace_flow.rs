/// Integration tests for the marketplace surface
///
/// Covers account registration and login, the job/application lifecycle
/// with exclusive assignment, and the face-gated attendance scan.
mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("newuser-{}@example.com", Uuid::new_v4());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "New Family",
                "email": email,
                "password": "sunshine42",
                "role": "family",
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["role"], "family");
    assert!(body["access_token"].is_string());
    let user_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

    // Wrong password rejected
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "wrong-pass1" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password succeeds
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "sunshine42" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["name"], "New Family");

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_accepting_application_assigns_job_and_rejects_others() {
    let ctx = TestContext::new().await.unwrap();

    // A second helper competing for the same job
    let rival = smarthelper_shared::models::user::User::create(
        &ctx.db,
        smarthelper_shared::models::user::CreateUser {
            name: "Rival Helper".to_string(),
            email: format!("rival-{}@example.com", Uuid::new_v4()),
            password_hash: "test_hash".to_string(),
            role: smarthelper_shared::models::user::UserRole::Helper,
        },
    )
    .await
    .unwrap();

    // Family posts a job
    let request = Request::builder()
        .method("POST")
        .uri("/v1/jobs")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "title": "Weekend childcare", "pay_per_hour": 180 }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let job = common::body_json(response).await;
    let job_id: Uuid = job["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(job["status"], "open");

    // Both helpers apply
    let request = Request::builder()
        .method("POST")
        .uri("/v1/applications")
        .header("authorization", ctx.helper_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "job_id": job_id, "phone": "91234567", "address": "Tampines" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let application = common::body_json(response).await;
    let application_id = application["id"].as_str().unwrap().to_string();

    smarthelper_shared::models::application::Application::create(
        &ctx.db,
        smarthelper_shared::models::application::CreateApplication {
            job_id,
            helper_id: rival.id,
            phone: "98765432".to_string(),
            address: "Jurong".to_string(),
            message: None,
        },
    )
    .await
    .unwrap()
    .unwrap();

    // Applying twice conflicts
    let request = Request::builder()
        .method("POST")
        .uri("/v1/applications")
        .header("authorization", ctx.helper_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "job_id": job_id, "phone": "91234567", "address": "Tampines" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Family accepts the first application
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/applications/{application_id}/accept"))
        .header("authorization", ctx.family_auth())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let decision = common::body_json(response).await;
    assert_eq!(decision["accepted"]["status"], "accepted");
    assert_eq!(decision["auto_rejected"], 1);

    // Job is now assigned to the accepted helper
    let job = smarthelper_shared::models::job::Job::find_by_id(&ctx.db, job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.assigned_helper_id, Some(ctx.helper.id));
    assert_eq!(job.status, smarthelper_shared::models::job::JobStatus::Assigned);

    // The rival's application was auto-rejected
    let (status,): (String,) = sqlx::query_as(
        "SELECT status::TEXT FROM applications WHERE job_id = $1 AND helper_id = $2",
    )
    .bind(job_id)
    .bind(rival.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(status, "rejected");

    sqlx::query("DELETE FROM applications WHERE helper_id = $1")
        .bind(rival.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(rival.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_scan_requires_face_registration() {
    let ctx = TestContext::new().await.unwrap();
    let job = common::create_assigned_job(&ctx, 150).await.unwrap();

    let scan_body = json!({
        "job_id": job.id,
        "action": "check-in",
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "lat": 1.3521,
        "lon": 103.8198,
    })
    .to_string();

    // No face template yet: scanning is blocked
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance/scan")
        .header("authorization", ctx.helper_auth())
        .header("content-type", "application/json")
        .body(Body::from(scan_body.clone()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    // Register a template
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance/face")
        .header("authorization", ctx.helper_auth())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "template": "v1:abcdef" }).to_string()))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Scan now succeeds and is attributed to the job's family
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance/scan")
        .header("authorization", ctx.helper_auth())
        .header("content-type", "application/json")
        .body(Body::from(scan_body))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let event = common::body_json(response).await;
    assert_eq!(event["action"], "check-in");
    assert_eq!(event["family_id"].as_str().unwrap(), ctx.family.id.to_string());
    assert!(event["payment_id"].is_null());

    // Families cannot scan
    let request = Request::builder()
        .method("POST")
        .uri("/v1/attendance/scan")
        .header("authorization", ctx.family_auth())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "job_id": job.id,
                "action": "check-in",
                "image": "data:image/png;base64,iVBORw0KGgo=",
            })
            .to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}
