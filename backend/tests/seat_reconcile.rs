use std::sync::Arc;

use axum::http::{Method, StatusCode};

use leavedesk_backend::{
    models::user::UserRole,
    repositories::subscription as subscription_repo,
    seats::SeatPolicy,
    services::reconcile::{reconcile_organization, ReconcileOptions, ReconcileOutcome},
};

mod support;

use support::{
    json_request, provider_subscription, response_json, seed_organization, seed_subscription,
    seed_user, seed_users, send, test_pool, test_router, FakeBillingProvider,
};

#[tokio::test]
async fn provider_quantity_overwrites_stale_cache() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    seed_user(&pool, org.id, UserRole::Admin).await;
    let mut remote = seed_subscription(&pool, org.id, 2).await;
    remote.quantity = 5;
    let provider = FakeBillingProvider::new().with_subscription(remote);

    let report = reconcile_organization(
        &pool,
        &provider,
        SeatPolicy::default(),
        org.id,
        ReconcileOptions::default(),
    )
    .await
    .expect("reconcile");
    assert_eq!(report.outcome, ReconcileOutcome::UpdatedLocal);
    assert_eq!(report.local_quantity_before, Some(2));
    assert_eq!(report.provider_quantity, Some(5));
    assert_eq!(report.changed_fields, vec!["quantity".to_string()]);
    assert_eq!(report.summary.total_seats, 8);

    let cached = subscription_repo::find_by_organization(&pool, org.id)
        .await
        .expect("load subscription")
        .expect("subscription");
    assert_eq!(cached.quantity, 5);

    let again = reconcile_organization(
        &pool,
        &provider,
        SeatPolicy::default(),
        org.id,
        ReconcileOptions::default(),
    )
    .await
    .expect("reconcile again");
    assert_eq!(again.outcome, ReconcileOutcome::InSync);
    assert!(again.changed_fields.is_empty());
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let mut remote = seed_subscription(&pool, org.id, 1).await;
    remote.quantity = 3;
    let provider = FakeBillingProvider::new().with_subscription(remote);

    let app = test_router(pool.clone(), Arc::new(provider));
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/billing/reconcile?dry_run=true",
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["outcome"], "updated_local");
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["provider_quantity"], 3);

    let cached = subscription_repo::find_by_organization(&pool, org.id)
        .await
        .expect("load subscription")
        .expect("subscription");
    assert_eq!(cached.quantity, 1);
}

#[tokio::test]
async fn unreachable_provider_falls_back_to_cached_row() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    seed_user(&pool, org.id, UserRole::Admin).await;
    seed_users(&pool, org.id, UserRole::Employee, 4).await;
    seed_subscription(&pool, org.id, 2).await;
    let provider = FakeBillingProvider::new();
    provider.fail_with(503);

    let report = reconcile_organization(
        &pool,
        &provider,
        SeatPolicy::default(),
        org.id,
        ReconcileOptions::default(),
    )
    .await
    .expect("reconcile");
    assert_eq!(report.outcome, ReconcileOutcome::ProviderUnavailable);
    assert!(report.error.is_some());
    assert_eq!(report.summary.paid_seats, 2);
    assert_eq!(report.summary.used_seats, 5);
    assert!(!report.summary.over_capacity);
}

#[tokio::test]
async fn organization_without_subscription_is_reported_on_free_tier() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    seed_user(&pool, org.id, UserRole::Admin).await;
    let provider =
        FakeBillingProvider::new().with_subscription(provider_subscription("sub_unrelated", 9));

    let report = reconcile_organization(
        &pool,
        &provider,
        SeatPolicy::new(3),
        org.id,
        ReconcileOptions::default(),
    )
    .await
    .expect("reconcile");
    assert_eq!(report.outcome, ReconcileOutcome::NoSubscription);
    assert_eq!(report.summary.total_seats, 3);
    assert_eq!(report.summary.used_seats, 1);
}

#[tokio::test]
async fn over_capacity_is_reported_but_not_fixed() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    seed_user(&pool, org.id, UserRole::Admin).await;
    seed_users(&pool, org.id, UserRole::Employee, 5).await;
    let mut remote = seed_subscription(&pool, org.id, 3).await;
    remote.quantity = 1;
    let provider = FakeBillingProvider::new().with_subscription(remote);

    let report = reconcile_organization(
        &pool,
        &provider,
        SeatPolicy::default(),
        org.id,
        ReconcileOptions::default(),
    )
    .await
    .expect("reconcile");
    assert_eq!(report.summary.total_seats, 4);
    assert_eq!(report.summary.used_seats, 6);
    assert!(report.summary.over_capacity);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND status = 'active'",
    )
    .bind(org.id)
    .fetch_one(&pool)
    .await
    .expect("count active users");
    assert_eq!(active, 6);
}

#[tokio::test]
async fn only_subscribed_organizations_are_listed_for_reconcile() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let subscribed = seed_organization(&pool).await;
    seed_subscription(&pool, subscribed.id, 2).await;
    let free_only = seed_organization(&pool).await;

    let ids = subscription_repo::list_organization_ids(&pool)
        .await
        .expect("list subscribed organizations");
    assert!(ids.contains(&subscribed.id));
    assert!(!ids.contains(&free_only.id));
}
