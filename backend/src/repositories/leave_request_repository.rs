//! Leave request repository trait for dependency injection and testing.
//!
//! This module defines the LeaveRequestRepositoryTrait which can be mocked
//! using mockall for testing purposes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::leave_request::{
    LeaveRequest, LeaveRequestExportRow, LeaveRequestListQuery, LeaveRequestStatus,
};
use crate::repositories::common::push_clause;
use crate::types::{LeaveRequestId, OrganizationId, UserId};

const LEAVE_REQUEST_COLUMNS: &str = "id, organization_id, user_id, leave_type_id, start_date, \
     end_date, half_day, days, reason, status, decided_by, decided_at, decision_comment, \
     cancelled_at, created_at, updated_at";

/// Repository trait for LeaveRequest operations.
///
/// Use `MockLeaveRequestRepositoryTrait` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveRequestRepositoryTrait: Send + Sync {
    /// Insert a new leave request
    async fn insert(&self, conn: &mut PgConnection, item: &LeaveRequest) -> Result<(), AppError>;

    /// Find a leave request within an organization
    async fn find_in_org(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, AppError>;

    /// Find and row-lock a leave request within an organization
    async fn lock_in_org(
        &self,
        conn: &mut PgConnection,
        organization_id: OrganizationId,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, AppError>;

    /// Whether the user already has pending or approved leave touching the range
    async fn has_overlap(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, AppError>;

    /// Find leave requests by user, newest first
    async fn find_by_user(&self, db: &PgPool, user_id: UserId) -> Result<Vec<LeaveRequest>, AppError>;

    /// Filtered, paginated list for an organization with the total count
    async fn list_for_org(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        filters: &LeaveRequestListQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<LeaveRequest>, i64), AppError>;

    /// Record an approval or rejection on a pending request
    async fn decide(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        status: LeaveRequestStatus,
        decided_by: UserId,
        comment: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// Cancel a pending or approved request
    async fn cancel(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// Rows for the CSV export, overlapping `[from, to]`
    async fn export_rows(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequestExportRow>, AppError>;
}

/// Concrete implementation of LeaveRequestRepositoryTrait
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveRequestRepository;

impl LeaveRequestRepository {
    pub fn new() -> Self {
        Self
    }
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    organization_id: OrganizationId,
    filters: &'a LeaveRequestListQuery,
) {
    let mut has_clause = false;
    push_clause(builder, &mut has_clause);
    builder.push("r.organization_id = ").push_bind(organization_id);
    if let Some(status) = filters.status {
        push_clause(builder, &mut has_clause);
        builder.push("r.status = ").push_bind(status);
    }
    if let Some(user_id) = filters.user_id {
        push_clause(builder, &mut has_clause);
        builder.push("r.user_id = ").push_bind(user_id);
    }
    if let Some(team_id) = filters.team_id {
        push_clause(builder, &mut has_clause);
        builder
            .push("r.user_id IN (SELECT id FROM users WHERE team_id = ")
            .push_bind(team_id)
            .push(")");
    }
    if let Some(from) = filters.from {
        push_clause(builder, &mut has_clause);
        builder.push("r.end_date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        push_clause(builder, &mut has_clause);
        builder.push("r.start_date <= ").push_bind(to);
    }
}

#[async_trait]
impl LeaveRequestRepositoryTrait for LeaveRequestRepository {
    async fn insert(&self, conn: &mut PgConnection, item: &LeaveRequest) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO leave_requests ({LEAVE_REQUEST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(item.id)
        .bind(item.organization_id)
        .bind(item.user_id)
        .bind(item.leave_type_id)
        .bind(item.start_date)
        .bind(item.end_date)
        .bind(item.half_day)
        .bind(item.days)
        .bind(&item.reason)
        .bind(item.status)
        .bind(item.decided_by)
        .bind(item.decided_at)
        .bind(&item.decision_comment)
        .bind(item.cancelled_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn find_in_org(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, AppError> {
        let row = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_REQUEST_COLUMNS} FROM leave_requests WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    async fn lock_in_org(
        &self,
        conn: &mut PgConnection,
        organization_id: OrganizationId,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, AppError> {
        let row = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_REQUEST_COLUMNS} FROM leave_requests \
             WHERE id = $1 AND organization_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    async fn has_overlap(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM leave_requests WHERE user_id = $1 \
             AND status IN ('pending', 'approved') AND start_date <= $3 AND end_date >= $2)",
        )
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    async fn find_by_user(&self, db: &PgPool, user_id: UserId) -> Result<Vec<LeaveRequest>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_REQUEST_COLUMNS} FROM leave_requests WHERE user_id = $1 \
             ORDER BY start_date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    async fn list_for_org(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        filters: &LeaveRequestListQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<LeaveRequest>, i64), AppError> {
        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM leave_requests r");
        push_filters(&mut count_builder, organization_id, filters);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM leave_requests r",
            LEAVE_REQUEST_COLUMNS
                .split(", ")
                .map(|column| format!("r.{}", column.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        push_filters(&mut builder, organization_id, filters);
        builder
            .push(" ORDER BY r.start_date DESC, r.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = builder
            .build_query_as::<LeaveRequest>()
            .fetch_all(db)
            .await?;
        Ok((rows, total))
    }

    async fn decide(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        status: LeaveRequestStatus,
        decided_by: UserId,
        comment: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE leave_requests SET status = $2, decided_by = $3, decided_at = $4, \
             decision_comment = $5, updated_at = $4 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(timestamp)
        .bind(comment)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    async fn cancel(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE leave_requests SET status = 'cancelled', cancelled_at = $2, updated_at = $2 \
             WHERE id = $1 AND status IN ('pending', 'approved')",
        )
        .bind(id)
        .bind(timestamp)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    async fn export_rows(
        &self,
        db: &PgPool,
        organization_id: OrganizationId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequestExportRow>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRequestExportRow>(
            "SELECT r.id, u.email, u.full_name, lt.name AS leave_type, r.start_date, r.end_date, \
             r.days, r.status, r.reason, r.decision_comment, r.created_at \
             FROM leave_requests r \
             JOIN users u ON u.id = r.user_id \
             JOIN leave_types lt ON lt.id = r.leave_type_id \
             WHERE r.organization_id = $1 AND r.start_date <= $3 AND r.end_date >= $2 \
             ORDER BY r.start_date, u.full_name",
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
