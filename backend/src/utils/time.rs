use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Leave year label of `date`: the calendar year in which the leave year
/// containing `date` started. `start_month` is clamped to 1..=12.
pub fn leave_year_for(date: NaiveDate, start_month: u32) -> i32 {
    let start_month = start_month.clamp(1, 12);
    if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Inclusive first and last day of a leave year.
pub fn leave_year_bounds(year: i32, start_month: u32) -> (NaiveDate, NaiveDate) {
    let start_month = start_month.clamp(1, 12);
    let start = NaiveDate::from_ymd_opt(year, start_month, 1).unwrap_or(NaiveDate::MIN);
    let next = NaiveDate::from_ymd_opt(year + 1, start_month, 1).unwrap_or(NaiveDate::MAX);
    (start, next - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn today_local_matches_timezone_date() {
        let tz = chrono_tz::UTC;
        assert_eq!(today_local(&tz), Utc::now().date_naive());
    }

    #[test]
    fn calendar_leave_year_is_the_date_year() {
        assert_eq!(leave_year_for(d(2024, 1, 1), 1), 2024);
        assert_eq!(leave_year_for(d(2024, 12, 31), 1), 2024);
    }

    #[test]
    fn april_leave_year_rolls_over_in_april() {
        assert_eq!(leave_year_for(d(2024, 3, 31), 4), 2023);
        assert_eq!(leave_year_for(d(2024, 4, 1), 4), 2024);
    }

    #[test]
    fn out_of_range_start_month_is_clamped() {
        assert_eq!(leave_year_for(d(2024, 6, 1), 0), 2024);
        assert_eq!(leave_year_for(d(2024, 6, 1), 13), 2023);
    }

    #[test]
    fn leave_year_bounds_are_inclusive() {
        assert_eq!(leave_year_bounds(2024, 1), (d(2024, 1, 1), d(2024, 12, 31)));
        assert_eq!(leave_year_bounds(2023, 4), (d(2023, 4, 1), d(2024, 3, 31)));
        // leap day handled by date arithmetic
        assert_eq!(leave_year_bounds(2023, 3).1, d(2024, 2, 29));
    }
}
