//! Derived workout progress types.
//!
//! Nothing here is persisted; values are computed fresh from completion
//! records on every request.

use crate::models::DayBucket;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Streak and attendance statistics for one user at one reference instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressStats {
    /// Local days with at least one completion
    pub completed_date_keys: BTreeSet<DayBucket>,
    /// Consecutive days with a completion, walking back from today
    pub current_streak: u32,
    /// Completions in the reference month
    pub total_this_month: u32,
    /// Completions after the start of the reference week (Sunday)
    pub this_week_count: u32,
    /// Stored rows excluded because they were malformed
    pub skipped_records: u32,
}

/// Display class of a single calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayClass {
    CompletedToday,
    CompletedOtherDay,
    TodayIncomplete,
    Incomplete,
    OtherMonth,
    Future,
}

/// Raw facts about a calendar cell, before precedence is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayFlags {
    pub has_workout: bool,
    pub is_today: bool,
    pub is_current_month: bool,
    pub is_future: bool,
}

impl DayFlags {
    /// Collapse the flags into one class.
    ///
    /// Cells outside the displayed month are always `OtherMonth`. Within the
    /// month a completion wins over everything, and `Future` is checked
    /// before falling back to `Incomplete`.
    pub fn class(self) -> DayClass {
        if !self.is_current_month {
            return DayClass::OtherMonth;
        }
        match (self.has_workout, self.is_today) {
            (true, true) => DayClass::CompletedToday,
            (true, false) => DayClass::CompletedOtherDay,
            (false, true) => DayClass::TodayIncomplete,
            (false, false) if self.is_future => DayClass::Future,
            (false, false) => DayClass::Incomplete,
        }
    }
}

/// Years a displayed month may fall in.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// A calendar month being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    /// Returns `None` for an invalid month or a year outside 1..=9999.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !SUPPORTED_YEARS.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year.checked_add(1)?, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
    }
}

/// One cell of a rendered month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub class: DayClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(has_workout: bool, is_today: bool, is_current_month: bool, is_future: bool) -> DayFlags {
        DayFlags {
            has_workout,
            is_today,
            is_current_month,
            is_future,
        }
    }

    #[test]
    fn test_today_with_workout_wins() {
        assert_eq!(flags(true, true, true, false).class(), DayClass::CompletedToday);
    }

    #[test]
    fn test_future_does_not_override_workout() {
        assert_eq!(
            flags(true, false, true, true).class(),
            DayClass::CompletedOtherDay
        );
    }

    #[test]
    fn test_future_checked_before_incomplete() {
        assert_eq!(flags(false, false, true, true).class(), DayClass::Future);
        assert_eq!(flags(false, false, true, false).class(), DayClass::Incomplete);
        assert_eq!(flags(false, true, true, false).class(), DayClass::TodayIncomplete);
    }

    #[test]
    fn test_other_month_only_outside_display() {
        assert_eq!(flags(true, false, false, false).class(), DayClass::OtherMonth);
        assert_eq!(flags(false, false, false, true).class(), DayClass::OtherMonth);
    }

    #[test]
    fn test_day_class_serialization() {
        let json = serde_json::to_string(&DayClass::CompletedToday).unwrap();
        assert_eq!(json, "\"completed-today\"");
    }

    #[test]
    fn test_calendar_month_bounds() {
        let feb = CalendarMonth::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let dec = CalendarMonth::new(2023, 12).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31));

        assert!(CalendarMonth::new(2024, 13).is_none());
        assert!(CalendarMonth::new(2024, 0).is_none());
    }

    #[test]
    fn test_calendar_month_year_range() {
        assert!(CalendarMonth::new(1, 1).is_some());
        assert!(CalendarMonth::new(9999, 12).is_some());
        assert!(CalendarMonth::new(0, 12).is_none());
        assert!(CalendarMonth::new(10000, 1).is_none());
        assert!(CalendarMonth::new(NaiveDate::MIN.year(), 1).is_none());
        assert!(CalendarMonth::new(NaiveDate::MAX.year(), 12).is_none());
    }
}
