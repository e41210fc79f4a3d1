pub mod billing;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod seats;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Config, docs::ApiDoc, middleware as auth_middleware, state::AppState};

fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let layer = CorsLayer::new()
        .allow_methods(methods)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));
    if config.cors_allow_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any).allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
        .collect();
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(auth_middleware::REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}

/// Builds the full API router: public, member, manager and admin groups.
pub fn build_router(state: AppState) -> Router {
    use crate::handlers::{
        auth, billing, health, invitations, leave_balances, leave_requests, leave_types,
        organizations, schedules, teams, users,
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/invitations/accept", post(invitations::accept_invitation))
        .route("/api/billing/webhook", post(billing::webhook));

    let member_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/organization", get(organizations::get_current))
        .route("/api/teams", get(teams::list_teams))
        .route("/api/schedules/me", get(schedules::my_schedule))
        .route("/api/leave-types", get(leave_types::list_leave_types))
        .route("/api/leave-balances/me", get(leave_balances::my_balances))
        .route(
            "/api/leave-requests",
            post(leave_requests::create_leave_request).get(leave_requests::list_leave_requests),
        )
        .route(
            "/api/leave-requests/me",
            get(leave_requests::my_leave_requests),
        )
        .route(
            "/api/leave-requests/{id}",
            get(leave_requests::get_leave_request),
        )
        .route(
            "/api/leave-requests/{id}/cancel",
            post(leave_requests::cancel_leave_request),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    let manager_routes = Router::new()
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/{id}/leave-balances",
            get(users::user_leave_balances),
        )
        .route(
            "/api/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route(
            "/api/leave-requests/{id}/approve",
            post(leave_requests::approve_leave_request),
        )
        .route(
            "/api/leave-requests/{id}/reject",
            post(leave_requests::reject_leave_request),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_manager,
        ));

    let admin_routes = Router::new()
        .route("/api/organization", put(organizations::update_current))
        .route(
            "/api/users/{id}",
            get(users::get_user).put(users::update_user),
        )
        .route("/api/users/{id}/archive", post(users::archive_user))
        .route("/api/users/{id}/reactivate", post(users::reactivate_user))
        .route(
            "/api/users/{id}/schedule-removal",
            post(users::schedule_removal),
        )
        .route(
            "/api/users/{id}/cancel-removal",
            post(users::cancel_removal),
        )
        .route(
            "/api/invitations/{id}",
            axum::routing::delete(invitations::revoke_invitation),
        )
        .route(
            "/api/invitations/{id}/resend",
            post(invitations::resend_invitation),
        )
        .route("/api/teams", post(teams::create_team))
        .route(
            "/api/teams/{id}",
            put(teams::update_team).delete(teams::delete_team),
        )
        .route("/api/leave-types", post(leave_types::create_leave_type))
        .route(
            "/api/leave-types/{id}",
            put(leave_types::update_leave_type),
        )
        .route(
            "/api/leave-balances/{id}",
            put(leave_balances::adjust_balance),
        )
        .route(
            "/api/schedules/default",
            get(schedules::get_default_schedule).put(schedules::put_default_schedule),
        )
        .route(
            "/api/schedules/users/{id}",
            get(schedules::get_user_schedule)
                .put(schedules::put_user_schedule)
                .delete(schedules::delete_user_schedule),
        )
        .route(
            "/api/leave-requests/export",
            get(leave_requests::export_leave_requests),
        )
        .route(
            "/api/billing/seats",
            get(billing::get_seats).put(billing::update_seats),
        )
        .route("/api/billing/reconcile", post(billing::reconcile_seats))
        .route("/api/billing/cancel", post(billing::cancel_subscription))
        .route("/api/billing/resume", post(billing::resume_subscription))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_admin,
        ));

    let cors = cors_layer(&state.config);
    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(manager_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(auth_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(auth_middleware::log_error_responses))
                .layer(cors),
        )
        .with_state(state)
}
