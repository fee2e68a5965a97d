// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout completion model for storage and aggregation.

use crate::time_utils::{format_utc_rfc3339, parse_rfc3339_utc};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Completion row as stored in Firestore.
///
/// Stored at: `workout_completions/{id}`
///
/// Rows written by older clients may be missing fields or carry timestamps
/// that do not parse, so everything past the ids stays loose until it is
/// converted into a [`WorkoutCompletion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Completion ID (also used as document ID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Workout that was completed
    #[serde(default)]
    pub workout_id: Option<String>,
    /// When the workout was finished (RFC 3339)
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// A completed workout with a checked timestamp.
///
/// Immutable once created; owned by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutCompletion {
    pub id: String,
    pub user_id: String,
    pub workout_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Reasons a stored row cannot take part in aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedCompletion {
    #[error("completion {0} has no completed_at")]
    MissingTimestamp(String),

    #[error("completion {id} has unparseable completed_at {value:?}")]
    InvalidTimestamp { id: String, value: String },

    #[error("completion {0} has no workout_id")]
    MissingWorkout(String),
}

impl TryFrom<CompletionRecord> for WorkoutCompletion {
    type Error = MalformedCompletion;

    fn try_from(record: CompletionRecord) -> Result<Self, Self::Error> {
        let raw = record
            .completed_at
            .ok_or_else(|| MalformedCompletion::MissingTimestamp(record.id.clone()))?;

        let completed_at =
            parse_rfc3339_utc(&raw).ok_or_else(|| MalformedCompletion::InvalidTimestamp {
                id: record.id.clone(),
                value: raw.clone(),
            })?;

        let workout_id = record
            .workout_id
            .filter(|w| !w.is_empty())
            .ok_or_else(|| MalformedCompletion::MissingWorkout(record.id.clone()))?;

        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            workout_id,
            completed_at,
        })
    }
}

impl From<&WorkoutCompletion> for CompletionRecord {
    fn from(completion: &WorkoutCompletion) -> Self {
        Self {
            id: completion.id.clone(),
            user_id: completion.user_id.clone(),
            workout_id: Some(completion.workout_id.clone()),
            completed_at: Some(format_utc_rfc3339(completion.completed_at)),
        }
    }
}

/// A local calendar day, used as a set key for streaks and attendance.
///
/// Two completions share a bucket iff they fall on the same day in the
/// timezone used for the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayBucket(NaiveDate);

impl DayBucket {
    /// Bucket for an instant as seen from `tz`.
    pub fn from_instant(at: DateTime<Utc>, tz: Tz) -> Self {
        Self(at.with_timezone(&tz).date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// The previous calendar day, if representable.
    pub fn previous(self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }
}
