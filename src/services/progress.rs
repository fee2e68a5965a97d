// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout progress aggregation.
//!
//! Pure functions over completion records:
//! - Day buckets and the current consecutive-day streak
//! - Completions this month and this week
//! - Calendar cell classification for a displayed month
//!
//! The reference instant and timezone are always explicit so results do not
//! depend on the host locale.

use crate::models::{
    CalendarCell, CalendarMonth, CompletionRecord, DayBucket, DayClass, DayFlags, ProgressStats,
    WorkoutCompletion,
};
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;

const DAYS_PER_WEEK: usize = 7;

/// Compute streak and attendance statistics.
///
/// Completions dated after `now` are counted like any other.
pub fn compute_stats(completions: &[WorkoutCompletion], now: DateTime<Utc>, tz: Tz) -> ProgressStats {
    let completed_date_keys: BTreeSet<DayBucket> = completions
        .iter()
        .map(|c| DayBucket::from_instant(c.completed_at, tz))
        .collect();

    let today = DayBucket::from_instant(now, tz);
    let current_streak = streak_ending_at(&completed_date_keys, today);

    let total_this_month = completions
        .iter()
        .map(|c| DayBucket::from_instant(c.completed_at, tz))
        .filter(|day| day.year() == today.year() && day.month() == today.month())
        .count() as u32;

    let week_start = week_start(now, tz);
    let this_week_count = completions
        .iter()
        .filter(|c| c.completed_at > week_start)
        .count() as u32;

    ProgressStats {
        completed_date_keys,
        current_streak,
        total_this_month,
        this_week_count,
        skipped_records: 0,
    }
}

/// Compute statistics from stored rows, skipping malformed ones.
///
/// Skipped rows are logged and reported in `skipped_records`.
pub fn compute_stats_from_records(
    records: Vec<CompletionRecord>,
    now: DateTime<Utc>,
    tz: Tz,
) -> ProgressStats {
    let (completions, skipped) = partition_records(records);
    let mut stats = compute_stats(&completions, now, tz);
    stats.skipped_records = skipped;
    stats
}

/// Split stored rows into valid completions and a count of rejected rows.
pub fn partition_records(records: Vec<CompletionRecord>) -> (Vec<WorkoutCompletion>, u32) {
    let mut completions = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match WorkoutCompletion::try_from(record) {
            Ok(completion) => completions.push(completion),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed completion record");
                skipped += 1;
            }
        }
    }

    (completions, skipped)
}

/// Count consecutive days present in `days`, walking back from `today`.
fn streak_ending_at(days: &BTreeSet<DayBucket>, today: DayBucket) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);

    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.previous();
    }

    streak
}

/// Start of the week containing `now`: local midnight of the most recent
/// Sunday at or before it.
pub fn week_start(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(&tz).date_naive();
    let days_since_sunday = i64::from(local_date.weekday().num_days_from_sunday());
    local_midnight(local_date - Duration::days(days_since_sunday), tz)
}

/// First instant of `date` in `tz`.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    // Zones that spring forward at midnight have no 00:00; the day then
    // begins an hour later.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |dt| dt.with_timezone(&Utc),
        )
}

/// Classify a day against the month containing `now`.
pub fn classify_day(day: NaiveDate, stats: &ProgressStats, now: DateTime<Utc>, tz: Tz) -> DayClass {
    let today = DayBucket::from_instant(now, tz).date();
    classify_day_in(day, CalendarMonth::containing(today), stats, now, tz)
}

/// Classify a day as a cell of `displayed`.
pub fn classify_day_in(
    day: NaiveDate,
    displayed: CalendarMonth,
    stats: &ProgressStats,
    now: DateTime<Utc>,
    tz: Tz,
) -> DayClass {
    let today = DayBucket::from_instant(now, tz).date();

    DayFlags {
        has_workout: stats
            .completed_date_keys
            .contains(&DayBucket::from_date(day)),
        is_today: day == today,
        is_current_month: displayed.contains(day),
        is_future: day > today,
    }
    .class()
}

/// Render `displayed` as Sunday-first weeks, padded with neighbouring days.
pub fn month_calendar(
    displayed: CalendarMonth,
    stats: &ProgressStats,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<Vec<CalendarCell>> {
    let (Some(first), Some(last)) = (displayed.first_day(), displayed.last_day()) else {
        return Vec::new();
    };

    let lead = Days::new(u64::from(first.weekday().num_days_from_sunday()));
    let trail = Days::new(6 - u64::from(last.weekday().num_days_from_sunday()));
    let (Some(grid_start), Some(grid_end)) =
        (first.checked_sub_days(lead), last.checked_add_days(trail))
    else {
        return Vec::new();
    };

    let cells: Vec<CalendarCell> = grid_start
        .iter_days()
        .take_while(|date| *date <= grid_end)
        .map(|date| CalendarCell {
            date,
            class: classify_day_in(date, displayed, stats, now, tz),
        })
        .collect();

    cells
        .chunks(DAYS_PER_WEEK)
        .map(<[CalendarCell]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::parse_rfc3339_utc;
    use chrono_tz::UTC;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_rfc3339_utc(raw).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completions(times: &[&str]) -> Vec<WorkoutCompletion> {
        times
            .iter()
            .enumerate()
            .map(|(i, t)| WorkoutCompletion {
                id: format!("c{i}"),
                user_id: "user-1".to_string(),
                workout_id: "w1".to_string(),
                completed_at: at(t),
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let stats = compute_stats(&[], at("2024-03-14T12:00:00Z"), UTC);
        assert_eq!(stats, ProgressStats::default());
    }

    #[test]
    fn test_compute_stats_is_idempotent() {
        let input = completions(&[
            "2024-03-14T08:00:00Z",
            "2024-03-13T08:00:00Z",
            "2024-03-01T08:00:00Z",
        ]);
        let now = at("2024-03-14T12:00:00Z");

        assert_eq!(compute_stats(&input, now, UTC), compute_stats(&input, now, UTC));
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        // Thursday 14th back to Tuesday 12th, gap on Monday 11th.
        let input = completions(&[
            "2024-03-14T07:00:00Z",
            "2024-03-13T07:00:00Z",
            "2024-03-12T07:00:00Z",
            "2024-03-10T07:00:00Z",
        ]);

        let stats = compute_stats(&input, at("2024-03-14T20:00:00Z"), UTC);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn test_streak_has_no_grace_day() {
        let input = completions(&["2024-03-13T07:00:00Z", "2024-03-12T07:00:00Z"]);

        let stats = compute_stats(&input, at("2024-03-14T20:00:00Z"), UTC);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn test_same_day_completions_collapse() {
        let input = completions(&[
            "2024-03-14T07:00:00Z",
            "2024-03-14T18:00:00Z",
            "2024-03-13T07:00:00Z",
        ]);

        let stats = compute_stats(&input, at("2024-03-14T20:00:00Z"), UTC);
        assert_eq!(stats.completed_date_keys.len(), 2);
        assert_eq!(stats.current_streak, 2);
        // Counts are per completion, not per day.
        assert_eq!(stats.total_this_month, 3);
    }

    #[test]
    fn test_month_and_week_counts() {
        // Jan 31 2024 is a Wednesday; the week starts Sunday Jan 28.
        let input = completions(&[
            "2024-01-01T10:00:00Z",
            "2024-01-15T10:00:00Z",
            "2024-02-01T10:00:00Z",
        ]);

        let stats = compute_stats(&input, at("2024-01-31T12:00:00Z"), UTC);
        assert_eq!(stats.total_this_month, 2);
        // Only the (future-dated) Feb 1 completion falls after the week start.
        assert_eq!(stats.this_week_count, 1);
    }

    #[test]
    fn test_week_starts_at_local_sunday_midnight() {
        let tz = chrono_tz::America::New_York;
        // Tuesday Mar 12 2024; DST began Sunday Mar 10 at 02:00, so that
        // Sunday's midnight is still EST (UTC-5).
        let now = at("2024-03-12T15:00:00Z");
        assert_eq!(week_start(now, tz), at("2024-03-10T05:00:00Z"));

        let input = completions(&[
            "2024-03-10T04:30:00Z", // Saturday 23:30 local
            "2024-03-10T05:00:00Z", // exactly the week start, not after it
            "2024-03-10T05:30:00Z",
        ]);
        let stats = compute_stats(&input, now, tz);
        assert_eq!(stats.this_week_count, 1);
    }

    #[test]
    fn test_week_start_when_midnight_is_skipped() {
        // Sao Paulo sprang forward at 00:00 on Sunday Nov 4 2018, so that
        // day began at 01:00 local (UTC-2).
        let tz = chrono_tz::America::Sao_Paulo;
        let now = at("2018-11-06T15:00:00Z");
        assert_eq!(week_start(now, tz), at("2018-11-04T03:00:00Z"));

        let input = completions(&["2018-11-04T02:59:00Z", "2018-11-04T03:30:00Z"]);
        assert_eq!(compute_stats(&input, now, tz).this_week_count, 1);
    }

    #[test]
    fn test_week_start_on_sunday_is_same_day() {
        let now = at("2024-03-17T09:00:00Z");
        assert_eq!(week_start(now, UTC), at("2024-03-17T00:00:00Z"));
    }

    #[test]
    fn test_buckets_follow_reference_timezone() {
        // 23:30 UTC on the 13th is already the 14th in Tokyo.
        let input = completions(&["2024-03-13T23:30:00Z", "2024-03-13T01:00:00Z"]);
        let now = at("2024-03-14T03:00:00Z");

        let utc_stats = compute_stats(&input, now, UTC);
        let tokyo_stats = compute_stats(&input, now, chrono_tz::Asia::Tokyo);

        assert_eq!(utc_stats.current_streak, 0);
        assert_eq!(tokyo_stats.current_streak, 2);
    }

    #[test]
    fn test_future_completion_counts() {
        let input = completions(&["2024-03-20T10:00:00Z"]);
        let stats = compute_stats(&input, at("2024-03-14T10:00:00Z"), UTC);

        assert_eq!(stats.total_this_month, 1);
        assert_eq!(stats.this_week_count, 1);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let records = vec![
            CompletionRecord {
                id: "ok".to_string(),
                user_id: "user-1".to_string(),
                workout_id: Some("w1".to_string()),
                completed_at: Some("2024-03-14T08:00:00Z".to_string()),
            },
            CompletionRecord {
                id: "bad".to_string(),
                user_id: "user-1".to_string(),
                workout_id: Some("w1".to_string()),
                completed_at: Some("14/03/2024".to_string()),
            },
            CompletionRecord {
                id: "missing".to_string(),
                user_id: "user-1".to_string(),
                workout_id: Some("w1".to_string()),
                completed_at: None,
            },
        ];

        let stats = compute_stats_from_records(records, at("2024-03-14T12:00:00Z"), UTC);
        assert_eq!(stats.skipped_records, 2);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.total_this_month, 1);
    }

    #[test]
    fn test_classify_day() {
        let input = completions(&["2024-03-14T08:00:00Z", "2024-03-12T08:00:00Z"]);
        let now = at("2024-03-14T12:00:00Z");
        let stats = compute_stats(&input, now, UTC);

        assert_eq!(classify_day(date(2024, 3, 14), &stats, now, UTC), DayClass::CompletedToday);
        assert_eq!(
            classify_day(date(2024, 3, 12), &stats, now, UTC),
            DayClass::CompletedOtherDay
        );
        assert_eq!(classify_day(date(2024, 3, 13), &stats, now, UTC), DayClass::Incomplete);
        assert_eq!(classify_day(date(2024, 3, 20), &stats, now, UTC), DayClass::Future);
        assert_eq!(classify_day(date(2024, 2, 28), &stats, now, UTC), DayClass::OtherMonth);
    }

    #[test]
    fn test_classify_today_without_workout() {
        let input = completions(&["2024-03-13T08:00:00Z"]);
        let now = at("2024-03-14T12:00:00Z");
        let stats = compute_stats(&input, now, UTC);

        assert_eq!(
            classify_day(date(2024, 3, 14), &stats, now, UTC),
            DayClass::TodayIncomplete
        );
    }

    #[test]
    fn test_classify_in_other_displayed_months() {
        let now = at("2024-03-14T12:00:00Z");
        let stats = ProgressStats::default();

        let february = CalendarMonth::new(2024, 2).unwrap();
        assert_eq!(
            classify_day_in(date(2024, 2, 10), february, &stats, now, UTC),
            DayClass::Incomplete
        );

        let april = CalendarMonth::new(2024, 4).unwrap();
        assert_eq!(
            classify_day_in(date(2024, 4, 10), april, &stats, now, UTC),
            DayClass::Future
        );
        assert_eq!(
            classify_day_in(date(2024, 3, 31), april, &stats, now, UTC),
            DayClass::OtherMonth
        );
    }

    #[test]
    fn test_month_calendar_grid() {
        let input = completions(&["2024-03-14T08:00:00Z"]);
        let now = at("2024-03-14T12:00:00Z");
        let stats = compute_stats(&input, now, UTC);

        // March 2024 starts on a Friday and ends on a Sunday.
        let weeks = month_calendar(CalendarMonth::new(2024, 3).unwrap(), &stats, now, UTC);

        assert_eq!(weeks.len(), 6);
        assert!(weeks.iter().all(|w| w.len() == 7));
        assert_eq!(weeks[0][0].date, date(2024, 2, 25));
        assert_eq!(weeks[0][0].class, DayClass::OtherMonth);
        assert_eq!(weeks[0][5].date, date(2024, 3, 1));
        assert_eq!(weeks[5][6].date, date(2024, 4, 6));

        let today = weeks
            .iter()
            .flatten()
            .find(|cell| cell.date == date(2024, 3, 14))
            .unwrap();
        assert_eq!(today.class, DayClass::CompletedToday);
    }

    #[test]
    fn test_month_calendar_at_supported_range_ends() {
        let now = at("2024-03-14T12:00:00Z");
        let stats = ProgressStats::default();

        let first = month_calendar(CalendarMonth::new(1, 1).unwrap(), &stats, now, UTC);
        assert_eq!(first[0][0].date, date(0, 12, 31));
        assert!(first.iter().all(|w| w.len() == 7));

        let last = month_calendar(CalendarMonth::new(9999, 12).unwrap(), &stats, now, UTC);
        assert!(!last.is_empty());
        assert_eq!(last.last().unwrap().last().unwrap().date, date(10000, 1, 1));
    }

    #[test]
    fn test_month_calendar_at_chrono_limits_is_empty() {
        let now = at("2024-03-14T12:00:00Z");
        let stats = ProgressStats::default();

        // Built directly, bypassing the year bounds in CalendarMonth::new.
        let min = CalendarMonth {
            year: NaiveDate::MIN.year(),
            month: 1,
        };
        let max = CalendarMonth {
            year: NaiveDate::MAX.year(),
            month: 12,
        };

        assert!(month_calendar(min, &stats, now, UTC).is_empty());
        assert!(month_calendar(max, &stats, now, UTC).is_empty());
    }
}
