//! Weekly working-day patterns used to count leave days.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{OrganizationId, UserId, WorkScheduleId};

#[derive(Debug, Clone, FromRow)]
pub struct WorkSchedule {
    pub id: WorkScheduleId,
    pub organization_id: OrganizationId,
    /// `None` marks the organization default.
    pub user_id: Option<UserId>,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkSchedule {
    pub fn week(&self) -> WorkWeek {
        WorkWeek {
            monday: self.monday,
            tuesday: self.tuesday,
            wednesday: self.wednesday,
            thursday: self.thursday,
            friday: self.friday,
            saturday: self.saturday,
            sunday: self.sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkWeek {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Default for WorkWeek {
    /// Monday to Friday.
    fn default() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
        }
    }
}

impl WorkWeek {
    pub fn works_on(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.works_on(date.weekday())
    }

    pub fn has_working_day(&self) -> bool {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
        .contains(&true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    User,
    Organization,
    Builtin,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub source: ScheduleSource,
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub week: WorkWeek,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_is_monday_to_friday() {
        let week = WorkWeek::default();
        // 2024-06-03 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        for offset in 0..5 {
            assert!(week.is_working_day(monday + chrono::Duration::days(offset)));
        }
        assert!(!week.is_working_day(monday + chrono::Duration::days(5)));
        assert!(!week.is_working_day(monday + chrono::Duration::days(6)));
    }

    #[test]
    fn empty_week_has_no_working_day() {
        let week = WorkWeek {
            monday: false,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: false,
            saturday: false,
            sunday: false,
        };
        assert!(!week.has_working_day());
        assert!(WorkWeek::default().has_working_day());
    }
}
