//! Counting the working days a leave request consumes.

use chrono::NaiveDate;

use crate::models::work_schedule::WorkWeek;

/// Working days in `[start, end]` per `week`. A half-day request covers a
/// single date and counts 0.5 when that date is a working day.
pub fn count_leave_days(week: &WorkWeek, start: NaiveDate, end: NaiveDate, half_day: bool) -> f64 {
    if start > end {
        return 0.0;
    }
    if half_day {
        return if week.is_working_day(start) { 0.5 } else { 0.0 };
    }
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| week.is_working_day(*date))
        .count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_week_counts_five_weekdays() {
        // Monday 2024-06-03 to Sunday 2024-06-09.
        let days = count_leave_days(&WorkWeek::default(), date(2024, 6, 3), date(2024, 6, 9), false);
        assert_eq!(days, 5.0);
    }

    #[test]
    fn weekend_only_counts_zero() {
        let days = count_leave_days(&WorkWeek::default(), date(2024, 6, 8), date(2024, 6, 9), false);
        assert_eq!(days, 0.0);
    }

    #[test]
    fn custom_schedule_is_honoured() {
        let week = WorkWeek {
            monday: true,
            tuesday: false,
            wednesday: true,
            thursday: false,
            friday: false,
            saturday: true,
            sunday: false,
        };
        let days = count_leave_days(&week, date(2024, 6, 3), date(2024, 6, 16), false);
        assert_eq!(days, 6.0);
    }

    #[test]
    fn half_day_counts_half_on_working_days_only() {
        let week = WorkWeek::default();
        assert_eq!(count_leave_days(&week, date(2024, 6, 4), date(2024, 6, 4), true), 0.5);
        assert_eq!(count_leave_days(&week, date(2024, 6, 8), date(2024, 6, 8), true), 0.0);
    }

    #[test]
    fn inverted_range_is_zero() {
        assert_eq!(
            count_leave_days(&WorkWeek::default(), date(2024, 6, 5), date(2024, 6, 4), false),
            0.0
        );
    }
}
