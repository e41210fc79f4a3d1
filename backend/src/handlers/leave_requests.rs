use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        leave_request::{
            CreateLeaveRequest, DecisionPayload, ExportQuery, LeaveRequest, LeaveRequestListQuery,
        },
        user::User,
        PaginatedResponse, PaginationQuery,
    },
    repositories::{LeaveRequestRepository, LeaveRequestRepositoryTrait},
    services::leave::{self, Decision},
    state::AppState,
    types::LeaveRequestId,
    utils::{csv::to_csv, time},
};

const EXPORT_HEADER: [&str; 11] = [
    "Request ID",
    "Email",
    "Full Name",
    "Leave Type",
    "Start Date",
    "End Date",
    "Days",
    "Status",
    "Reason",
    "Decision Comment",
    "Requested At",
];

pub async fn create_leave_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateLeaveRequest>,
) -> AppResult<(StatusCode, Json<LeaveRequest>)> {
    payload.validate()?;
    let repo = LeaveRequestRepository;
    let created = leave::create_leave_request(&state.pool, &repo, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn my_leave_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<LeaveRequest>>> {
    let repo = LeaveRequestRepository;
    Ok(Json(repo.find_by_user(&state.pool, user.id).await?))
}

/// Organization-wide list for managers and admins.
pub async fn list_leave_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filters): Query<LeaveRequestListQuery>,
) -> AppResult<Json<PaginatedResponse<LeaveRequest>>> {
    if !user.is_manager_or_admin() {
        return Err(AppError::Forbidden("Manager or admin role required".into()));
    }
    if let (Some(from), Some(to)) = (filters.from, filters.to) {
        if from > to {
            return Err(AppError::BadRequest("`from` must be on or before `to`".into()));
        }
    }
    let page = PaginationQuery::new(filters.limit, filters.offset);
    let repo = LeaveRequestRepository;
    let (items, total) = repo
        .list_for_org(
            &state.pool,
            user.organization_id,
            &filters,
            page.limit(),
            page.offset(),
        )
        .await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        page.limit(),
        page.offset(),
    )))
}

pub async fn get_leave_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LeaveRequestId>,
) -> AppResult<Json<LeaveRequest>> {
    let repo = LeaveRequestRepository;
    Ok(Json(
        leave::fetch_visible_request(&repo, &state.pool, &user, id).await?,
    ))
}

async fn decide(
    state: AppState,
    user: User,
    id: LeaveRequestId,
    decision: Decision,
    payload: DecisionPayload,
) -> AppResult<Json<LeaveRequest>> {
    payload.validate()?;
    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let repo = LeaveRequestRepository;
    let decided =
        leave::decide_leave_request(&state.pool, &repo, &user, id, decision, comment).await?;
    Ok(Json(decided))
}

pub async fn approve_leave_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LeaveRequestId>,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<Json<LeaveRequest>> {
    decide(state, user, id, Decision::Approve, payload).await
}

pub async fn reject_leave_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LeaveRequestId>,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<Json<LeaveRequest>> {
    decide(state, user, id, Decision::Reject, payload).await
}

pub async fn cancel_leave_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LeaveRequestId>,
) -> AppResult<Json<LeaveRequest>> {
    let repo = LeaveRequestRepository;
    let today = time::today_local(&state.config.time_zone);
    Ok(Json(
        leave::cancel_leave_request(&state.pool, &repo, &user, id, today).await?,
    ))
}

pub async fn export_leave_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(q): Query<ExportQuery>,
) -> AppResult<Json<Value>> {
    if q.from > q.to {
        return Err(AppError::BadRequest("`from` must be on or before `to`".into()));
    }
    let repo = LeaveRequestRepository;
    let rows = repo
        .export_rows(&state.pool, user.organization_id, q.from, q.to)
        .await?;
    let row_count = rows.len();

    let csv_data = tokio::task::spawn_blocking(move || {
        to_csv(
            &EXPORT_HEADER,
            rows.into_iter().map(|row| {
                vec![
                    row.id.to_string(),
                    row.email,
                    row.full_name,
                    row.leave_type,
                    row.start_date.to_string(),
                    row.end_date.to_string(),
                    format!("{:.1}", row.days),
                    row.status.as_str().to_string(),
                    row.reason.unwrap_or_default(),
                    row.decision_comment.unwrap_or_default(),
                    row.created_at.to_rfc3339(),
                ]
            }),
        )
    })
    .await
    .map_err(|e| AppError::InternalServerError(e.into()))??;

    tracing::info!(
        organization_id = %user.organization_id,
        rows = row_count,
        "Leave requests exported"
    );
    Ok(Json(json!({
        "csv_data": csv_data,
        "filename": format!(
            "leave_requests_{}_{}.csv",
            q.from.format("%Y%m%d"),
            q.to.format("%Y%m%d")
        ),
    })))
}
