#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::billing::{ReconcileParams, UpdateSeatsRequest, WebhookAck},
    models::{
        invitation::{AcceptInvitation, CreateInvitation, InvitationResponse, InvitationStatus},
        leave_balance::{AdjustLeaveBalance, LeaveBalanceResponse},
        leave_request::{
            CreateLeaveRequest, DecisionPayload, ExportQuery, LeaveRequest, LeaveRequestListQuery,
            LeaveRequestStatus,
        },
        leave_type::{CreateLeaveType, LeaveType, UpdateLeaveType},
        organization::{Organization, RegisterOrganization, RegisterResponse, UpdateOrganization},
        subscription::{SubscriptionResponse, SubscriptionStatus},
        team::{Team, TeamPayload, TeamWithMembers},
        user::{
            ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest,
            ScheduleRemovalRequest, UpdateUser, UserListQuery, UserResponse, UserRole, UserStatus,
        },
        work_schedule::{ScheduleResponse, ScheduleSource, WorkWeek},
    },
    seats::{SeatSummary, SeatTier},
    services::{
        billing::{SeatOverview, WebhookOutcome},
        reconcile::{ReconcileOutcome, ReconcileReport},
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        login_doc,
        refresh_doc,
        me_doc,
        logout_doc,
        change_password_doc,
        get_organization_doc,
        update_organization_doc,
        list_users_doc,
        update_user_doc,
        schedule_removal_doc,
        cancel_removal_doc,
        archive_user_doc,
        reactivate_user_doc,
        user_balances_doc,
        list_invitations_doc,
        create_invitation_doc,
        revoke_invitation_doc,
        resend_invitation_doc,
        accept_invitation_doc,
        list_teams_doc,
        create_team_doc,
        my_schedule_doc,
        put_default_schedule_doc,
        put_user_schedule_doc,
        list_leave_types_doc,
        create_leave_type_doc,
        update_leave_type_doc,
        my_balances_doc,
        adjust_balance_doc,
        create_leave_request_doc,
        my_leave_requests_doc,
        list_leave_requests_doc,
        approve_leave_request_doc,
        reject_leave_request_doc,
        cancel_leave_request_doc,
        export_leave_requests_doc,
        get_seats_doc,
        update_seats_doc,
        reconcile_doc,
        cancel_subscription_doc,
        resume_subscription_doc,
        webhook_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            ChangePasswordRequest,
            // organizations & users
            Organization,
            RegisterOrganization,
            RegisterResponse,
            UpdateOrganization,
            UserResponse,
            UserRole,
            UserStatus,
            UpdateUser,
            ScheduleRemovalRequest,
            // invitations & teams
            CreateInvitation,
            AcceptInvitation,
            InvitationResponse,
            InvitationStatus,
            Team,
            TeamPayload,
            TeamWithMembers,
            // schedules & leave
            WorkWeek,
            ScheduleResponse,
            ScheduleSource,
            LeaveType,
            CreateLeaveType,
            UpdateLeaveType,
            LeaveBalanceResponse,
            AdjustLeaveBalance,
            LeaveRequest,
            LeaveRequestStatus,
            CreateLeaveRequest,
            DecisionPayload,
            // billing
            SeatSummary,
            SeatTier,
            SeatOverview,
            SubscriptionResponse,
            SubscriptionStatus,
            UpdateSeatsRequest,
            ReconcileReport,
            ReconcileOutcome,
            WebhookAck,
            WebhookOutcome
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Signup, login and sessions"),
        (name = "Organization", description = "Tenant settings and members"),
        (name = "Invitations", description = "Invitations that reserve seats"),
        (name = "Teams", description = "Teams and their managers"),
        (name = "Leave", description = "Schedules, leave types, balances and requests"),
        (name = "Billing", description = "Seats and the paid subscription")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterOrganization,
    responses(
        (status = 200, description = "Organization and first admin created", body = RegisterResponse),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials or archived account")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses((status = 200, description = "Rotated token pair", body = LoginResponse)),
    tag = "Auth",
    security(())
)]
fn refresh_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, body = UserResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Refresh tokens revoked", body = serde_json::Value)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses((status = 200, body = serde_json::Value)),
    tag = "Auth"
)]
fn change_password_doc() {}

#[utoipa::path(
    get,
    path = "/api/organization",
    responses((status = 200, body = Organization)),
    tag = "Organization"
)]
fn get_organization_doc() {}

#[utoipa::path(
    put,
    path = "/api/organization",
    request_body = UpdateOrganization,
    responses((status = 200, body = Organization)),
    tag = "Organization"
)]
fn update_organization_doc() {}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses((status = 200, body = [UserResponse])),
    tag = "Organization"
)]
fn list_users_doc() {}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, body = UserResponse),
        (status = 409, description = "Would leave the organization without an admin")
    ),
    tag = "Organization"
)]
fn update_user_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/{id}/schedule-removal",
    params(("id" = String, Path, description = "User ID")),
    request_body = ScheduleRemovalRequest,
    responses((status = 200, body = UserResponse)),
    tag = "Organization"
)]
fn schedule_removal_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/{id}/cancel-removal",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, body = UserResponse)),
    tag = "Organization"
)]
fn cancel_removal_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/{id}/archive",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, body = UserResponse)),
    tag = "Organization"
)]
fn archive_user_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/{id}/reactivate",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, body = UserResponse),
        (status = 402, description = "No free seat")
    ),
    tag = "Organization"
)]
fn reactivate_user_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/{id}/leave-balances",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, body = [LeaveBalanceResponse])),
    tag = "Leave"
)]
fn user_balances_doc() {}

#[utoipa::path(
    get,
    path = "/api/invitations",
    responses((status = 200, description = "Open invitations", body = [InvitationResponse])),
    tag = "Invitations"
)]
fn list_invitations_doc() {}

#[utoipa::path(
    post,
    path = "/api/invitations",
    request_body = CreateInvitation,
    responses(
        (status = 201, body = InvitationResponse),
        (status = 402, description = "No free seat"),
        (status = 409, description = "Email already a member or invited")
    ),
    tag = "Invitations"
)]
fn create_invitation_doc() {}

#[utoipa::path(
    delete,
    path = "/api/invitations/{id}",
    params(("id" = String, Path, description = "Invitation ID")),
    responses((status = 204, description = "Revoked")),
    tag = "Invitations"
)]
fn revoke_invitation_doc() {}

#[utoipa::path(
    post,
    path = "/api/invitations/{id}/resend",
    params(("id" = String, Path, description = "Invitation ID")),
    responses((status = 200, body = InvitationResponse)),
    tag = "Invitations"
)]
fn resend_invitation_doc() {}

#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    request_body = AcceptInvitation,
    responses((status = 201, body = UserResponse)),
    tag = "Invitations",
    security(())
)]
fn accept_invitation_doc() {}

#[utoipa::path(
    get,
    path = "/api/teams",
    responses((status = 200, body = [TeamWithMembers])),
    tag = "Teams"
)]
fn list_teams_doc() {}

#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = TeamPayload,
    responses((status = 201, body = Team)),
    tag = "Teams"
)]
fn create_team_doc() {}

#[utoipa::path(
    get,
    path = "/api/schedules/me",
    responses((status = 200, body = ScheduleResponse)),
    tag = "Leave"
)]
fn my_schedule_doc() {}

#[utoipa::path(
    put,
    path = "/api/schedules/default",
    request_body = WorkWeek,
    responses((status = 200, body = ScheduleResponse)),
    tag = "Leave"
)]
fn put_default_schedule_doc() {}

#[utoipa::path(
    put,
    path = "/api/schedules/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = WorkWeek,
    responses((status = 200, body = ScheduleResponse)),
    tag = "Leave"
)]
fn put_user_schedule_doc() {}

#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses((status = 200, body = [LeaveType])),
    tag = "Leave"
)]
fn list_leave_types_doc() {}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = CreateLeaveType,
    responses((status = 201, body = LeaveType)),
    tag = "Leave"
)]
fn create_leave_type_doc() {}

#[utoipa::path(
    put,
    path = "/api/leave-types/{id}",
    params(("id" = String, Path, description = "Leave type ID")),
    request_body = UpdateLeaveType,
    responses((status = 200, body = LeaveType)),
    tag = "Leave"
)]
fn update_leave_type_doc() {}

#[utoipa::path(
    get,
    path = "/api/leave-balances/me",
    responses((status = 200, body = [LeaveBalanceResponse])),
    tag = "Leave"
)]
fn my_balances_doc() {}

#[utoipa::path(
    put,
    path = "/api/leave-balances/{id}",
    params(("id" = String, Path, description = "Balance ID")),
    request_body = AdjustLeaveBalance,
    responses((status = 200, body = LeaveBalanceResponse)),
    tag = "Leave"
)]
fn adjust_balance_doc() {}

#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body = CreateLeaveRequest,
    responses(
        (status = 201, body = LeaveRequest),
        (status = 400, description = "Invalid range or insufficient balance"),
        (status = 409, description = "Overlaps an existing request")
    ),
    tag = "Leave"
)]
fn create_leave_request_doc() {}

#[utoipa::path(
    get,
    path = "/api/leave-requests/me",
    responses((status = 200, body = [LeaveRequest])),
    tag = "Leave"
)]
fn my_leave_requests_doc() {}

#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveRequestListQuery),
    responses((status = 200, description = "Paginated requests", body = serde_json::Value)),
    tag = "Leave"
)]
fn list_leave_requests_doc() {}

#[utoipa::path(
    post,
    path = "/api/leave-requests/{id}/approve",
    params(("id" = String, Path, description = "Leave request ID")),
    request_body = DecisionPayload,
    responses((status = 200, body = LeaveRequest)),
    tag = "Leave"
)]
fn approve_leave_request_doc() {}

#[utoipa::path(
    post,
    path = "/api/leave-requests/{id}/reject",
    params(("id" = String, Path, description = "Leave request ID")),
    request_body = DecisionPayload,
    responses((status = 200, body = LeaveRequest)),
    tag = "Leave"
)]
fn reject_leave_request_doc() {}

#[utoipa::path(
    post,
    path = "/api/leave-requests/{id}/cancel",
    params(("id" = String, Path, description = "Leave request ID")),
    responses((status = 200, body = LeaveRequest)),
    tag = "Leave"
)]
fn cancel_leave_request_doc() {}

#[utoipa::path(
    get,
    path = "/api/leave-requests/export",
    params(ExportQuery),
    responses((status = 200, description = "CSV data and file name", body = serde_json::Value)),
    tag = "Leave"
)]
fn export_leave_requests_doc() {}

#[utoipa::path(
    get,
    path = "/api/billing/seats",
    responses((status = 200, body = SeatOverview)),
    tag = "Billing"
)]
fn get_seats_doc() {}

#[utoipa::path(
    put,
    path = "/api/billing/seats",
    request_body = UpdateSeatsRequest,
    responses(
        (status = 200, body = SeatOverview),
        (status = 402, description = "Downgrade below current usage"),
        (status = 502, description = "Billing provider failed")
    ),
    tag = "Billing"
)]
fn update_seats_doc() {}

#[utoipa::path(
    post,
    path = "/api/billing/reconcile",
    params(ReconcileParams),
    responses((status = 200, body = ReconcileReport)),
    tag = "Billing"
)]
fn reconcile_doc() {}

#[utoipa::path(
    post,
    path = "/api/billing/cancel",
    responses((status = 200, body = SubscriptionResponse)),
    tag = "Billing"
)]
fn cancel_subscription_doc() {}

#[utoipa::path(
    post,
    path = "/api/billing/resume",
    responses((status = 200, body = SubscriptionResponse)),
    tag = "Billing"
)]
fn resume_subscription_doc() {}

#[utoipa::path(
    post,
    path = "/api/billing/webhook",
    request_body = serde_json::Value,
    responses(
        (status = 200, body = WebhookAck),
        (status = 401, description = "Bad signature")
    ),
    tag = "Billing",
    security(())
)]
fn webhook_doc() {}
