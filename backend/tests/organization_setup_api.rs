use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use leavedesk_backend::{billing::DisabledBillingProvider, models::user::UserRole};

mod support;

use support::{
    json_request, response_json, seed_leave_type, seed_organization, seed_user, send, test_pool,
    test_router,
};

fn week(days: &[&str]) -> Value {
    let all = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    let mut body = serde_json::Map::new();
    for day in all {
        body.insert(day.to_string(), Value::Bool(days.contains(&day)));
    }
    Value::Object(body)
}

#[tokio::test]
async fn teams_scope_manager_balance_views() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let manager = seed_user(&pool, org.id, UserRole::Manager).await;
    let member = seed_user(&pool, org.id, UserRole::Employee).await;
    let outsider = seed_user(&pool, org.id, UserRole::Employee).await;
    seed_leave_type(&pool, org.id, true).await;
    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/teams",
            Some(&admin),
            Some(json!({ "name": "Support", "manager_id": outsider.id })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/teams",
            Some(&admin),
            Some(json!({ "name": "Support", "manager_id": manager.id })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let team_id = response_json(response).await["id"]
        .as_str()
        .expect("team id")
        .to_string();

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/users/{}", member.id),
            Some(&admin),
            Some(json!({ "team_id": team_id })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["team_id"], team_id.as_str());

    let response = send(
        &app,
        json_request(Method::GET, "/api/teams", Some(&member), None),
    )
    .await;
    let teams = response_json(response).await;
    assert_eq!(teams[0]["name"], "Support");
    assert_eq!(teams[0]["member_count"], 1);

    let response = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/users/{}/leave-balances", member.id),
            Some(&manager),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));

    let response = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/users/{}/leave-balances", outsider.id),
            Some(&manager),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/teams/{team_id}"),
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/users/{}", member.id),
            Some(&admin),
            None,
        ),
    )
    .await;
    assert!(response_json(response).await["team_id"].is_null());
}

#[tokio::test]
async fn schedules_fall_back_from_user_to_organization_to_builtin() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let employee = seed_user(&pool, org.id, UserRole::Employee).await;
    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));

    let response = send(
        &app,
        json_request(Method::GET, "/api/schedules/me", Some(&employee), None),
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["source"], "builtin");
    assert_eq!(body["friday"], true);
    assert_eq!(body["saturday"], false);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/schedules/default",
            Some(&admin),
            Some(week(&[])),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/schedules/default",
            Some(&admin),
            Some(week(&["monday", "tuesday", "wednesday", "thursday"])),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        json_request(Method::GET, "/api/schedules/me", Some(&employee), None),
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["source"], "organization");
    assert_eq!(body["friday"], false);

    let override_uri = format!("/api/schedules/users/{}", employee.id);
    let response = send(
        &app,
        json_request(
            Method::PUT,
            &override_uri,
            Some(&admin),
            Some(week(&["saturday", "sunday"])),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        json_request(Method::GET, "/api/schedules/me", Some(&employee), None),
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["source"], "user");
    assert_eq!(body["saturday"], true);
    assert_eq!(body["monday"], false);

    let response = send(
        &app,
        json_request(Method::DELETE, &override_uri, Some(&admin), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        json_request(Method::DELETE, &override_uri, Some(&admin), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_leave_types_are_hidden_from_members() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let employee = seed_user(&pool, org.id, UserRole::Employee).await;
    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/leave-types",
            Some(&admin),
            Some(json!({ "name": "Study", "color": "blue" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "VALIDATION_ERROR");

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/leave-types",
            Some(&admin),
            Some(json!({ "name": "Study", "color": "#1565c0" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["color"], "#1565C0");
    assert_eq!(created["deducts_balance"], true);
    let type_id = created["id"].as_str().expect("leave type id").to_string();

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/leave-types/{type_id}"),
            Some(&admin),
            Some(json!({ "is_active": false })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["is_active"], false);

    let response = send(
        &app,
        json_request(Method::GET, "/api/leave-types", Some(&employee), None),
    )
    .await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(0));

    let response = send(
        &app,
        json_request(Method::GET, "/api/leave-types", Some(&admin), None),
    )
    .await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn admins_adjust_balances_and_organization_settings() {
    let _guard = support::integration_guard().await;
    let pool = test_pool().await;
    let org = seed_organization(&pool).await;
    let admin = seed_user(&pool, org.id, UserRole::Admin).await;
    let employee = seed_user(&pool, org.id, UserRole::Employee).await;
    seed_leave_type(&pool, org.id, true).await;
    let app = test_router(pool.clone(), Arc::new(DisabledBillingProvider));

    let response = send(
        &app,
        json_request(Method::GET, "/api/leave-balances/me", Some(&employee), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let balances = response_json(response).await;
    assert_eq!(balances[0]["allocated_days"], 20.0);
    let balance_id = balances[0]["id"].as_str().expect("balance id").to_string();
    let adjust_uri = format!("/api/leave-balances/{balance_id}");

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &adjust_uri,
            Some(&employee),
            Some(json!({ "allocated_days": 99.0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &adjust_uri,
            Some(&admin),
            Some(json!({ "allocated_days": 25.0, "carried_over_days": 2.0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let adjusted = response_json(response).await;
    assert_eq!(adjusted["allocated_days"], 25.0);
    assert_eq!(adjusted["remaining_days"], 27.0);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/organization",
            Some(&admin),
            Some(json!({ "leave_year_start_month": 13 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/organization",
            Some(&admin),
            Some(json!({ "leave_year_start_month": 4, "default_annual_allowance": 22.5 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["leave_year_start_month"], 4);
    assert_eq!(updated["default_annual_allowance"], 22.5);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/organization",
            Some(&employee),
            Some(json!({ "name": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
