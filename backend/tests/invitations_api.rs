use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use leavedesk_backend::{
    billing::DisabledBillingProvider,
    models::{
        invitation::{Invitation, InvitationStatus},
        user::{User, UserRole, UserStatus},
    },
    repositories::invitation as invitation_repo,
    types::InvitationId,
    utils::tokens::{generate_token, hash_token},
};

mod support;

use support::{
    json_request, response_json, seed_organization, seed_user, seed_users, send,
    set_user_status, test_pool, test_router,
};

/// Inserts an invitation directly so the test knows the plain token.
async fn seed_invitation(
    pool: &PgPool,
    inviter: &User,
    email: &str,
    expires_in: Duration,
) -> (Invitation, String) {
    let token = generate_token();
    let now = Utc::now();
    let invitation = Invitation {
        id: InvitationId::new(),
        organization_id: inviter.organization_id,
        email: email.to_string(),
        role: UserRole::Employee,
        team_id: None,
        token_hash: hash_token(&token),
        status: InvitationStatus::Pending,
        invited_by: Some(inviter.id),
        expires_at: now + expires_in,
        accepted_at: None,
        created_at: now,
    };
    invitation_repo::insert_invitation(pool, &invitation)
        .await
        .expect("insert invitation");
    (invitation, token)
}

#[tokio::test]
async fn accepted_invitation_becomes_active_member_with_balances() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    support::seed_leave_type(&pool, org.id, true).await;
    let email = format!("joiner_{}@example.com", Uuid::new_v4().simple());
    let (invitation, token) = seed_invitation(&pool, &admin, &email, Duration::days(7)).await;

    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations/accept",
            None,
            Some(json!({
                "token": token,
                "full_name": "Jo Iner",
                "password": "joiner-password-1"
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["role"], "employee");
    assert_eq!(body["status"], "active");

    let status: String = sqlx::query_scalar("SELECT status FROM invitations WHERE id = $1")
        .bind(invitation.id)
        .fetch_one(&pool)
        .await
        .expect("fetch invitation status");
    assert_eq!(status, "accepted");

    let balances: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_balances lb JOIN users u ON u.id = lb.user_id WHERE u.email = $1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .expect("count balances");
    assert_eq!(balances, 1);

    let response = send(
        &app,
        json_request(Method::GET, "/api/billing/seats", Some(&admin), None),
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["used_seats"], 2);
    assert_eq!(body["pending_invitations"], 0);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations/accept",
            None,
            Some(json!({
                "token": token,
                "full_name": "Jo Iner",
                "password": "joiner-password-1"
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_invitation_cannot_be_accepted_and_frees_its_seat() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    seed_users(&pool, org.id, UserRole::Employee, 1).await;
    let (_, token) =
        seed_invitation(&pool, &admin, "late@example.com", Duration::days(-1)).await;

    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations/accept",
            None,
            Some(json!({
                "token": token,
                "full_name": "Late Comer",
                "password": "late-password-1"
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(Method::GET, "/api/billing/seats", Some(&admin), None),
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["used_seats"], 2);
    assert_eq!(body["pending_invitations"], 0);
}

#[tokio::test]
async fn resending_expired_invitation_needs_a_free_seat() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    seed_users(&pool, org.id, UserRole::Employee, 1).await;
    let (expired, _) =
        seed_invitation(&pool, &admin, "expired@example.com", Duration::days(-2)).await;
    let (open, _) =
        seed_invitation(&pool, &admin, "open@example.com", Duration::days(5)).await;

    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));
    let uri = format!("/api/invitations/{}/resend", expired.id);
    let response = send(&app, json_request(Method::POST, &uri, Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let revoke = format!("/api/invitations/{}", open.id);
    let response = send(&app, json_request(Method::DELETE, &revoke, Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, json_request(Method::POST, &uri, Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "pending");

    let stored = invitation_repo::find_in_org(&pool, org.id, expired.id)
        .await
        .expect("load invitation")
        .expect("invitation exists");
    assert!(stored.expires_at > Utc::now() + Duration::days(6));
    assert_ne!(stored.token_hash, expired.token_hash);
}

#[tokio::test]
async fn invitation_conflicts_with_existing_members_and_open_invitations() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let archived = seed_user(&pool, org.id, UserRole::Employee).await;
    set_user_status(&pool, &archived, UserStatus::Archived).await;

    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations",
            Some(&admin),
            Some(json!({ "email": archived.email.to_uppercase() })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("reactivate"));

    let payload = json!({ "email": "twice@example.com" });
    let response = send(
        &app,
        json_request(Method::POST, "/api/invitations", Some(&admin), Some(payload.clone())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = send(
        &app,
        json_request(Method::POST, "/api/invitations", Some(&admin), Some(payload)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn managers_may_only_invite_employees() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let manager = seed_user(&pool, org.id, UserRole::Manager).await;
    let employee = seed_user(&pool, org.id, UserRole::Employee).await;

    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations",
            Some(&manager),
            Some(json!({ "email": "boss@example.com", "role": "admin" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/invitations",
            Some(&manager),
            Some(json!({ "email": "helper@example.com" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        json_request(Method::GET, "/api/invitations", Some(&employee), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(Method::GET, "/api/invitations", Some(&manager), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let emails: Vec<&str> = body
        .as_array()
        .expect("invitation list")
        .iter()
        .filter_map(|inv| inv["email"].as_str())
        .collect();
    assert_eq!(emails, vec!["helper@example.com"]);
}
