use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::user::UserResponse,
    types::OrganizationId,
    utils::password::validate_password_strength,
    validation::rules::validate_country_code,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub country_code: Option<String>,
    /// Month (1-12) in which the leave year begins.
    pub leave_year_start_month: i32,
    pub default_annual_allowance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn start_month(&self) -> u32 {
        self.leave_year_start_month.clamp(1, 12) as u32
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Public signup: creates the organization and its first admin.
pub struct RegisterOrganization {
    #[validate(length(min = 2, max = 120))]
    pub organization_name: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[validate(custom(function = "validate_country_code"))]
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganization {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_country_code"))]
    pub country_code: Option<String>,
    #[validate(range(min = 1, max = 12))]
    pub leave_year_start_month: Option<i32>,
    #[validate(range(min = 0.0, max = 365.0))]
    pub default_annual_allowance: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub organization: Organization,
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Lowercases `name` and collapses every run of non-alphanumerics into `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("org");
    }
    slug.truncate(48);
    slug.trim_end_matches('-').to_string()
}
