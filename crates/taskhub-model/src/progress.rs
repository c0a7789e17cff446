// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TaskId, UserId, ValidationError};

/// Percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ProgressValue(u8);

impl ProgressValue {
    pub const ZERO: Self = Self(0);
    pub const COMPLETE: Self = Self(100);

    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&raw) {
            return Err(ValidationError(format!(
                "progress must be between 0 and 100, got {raw}"
            )));
        }
        Ok(Self(raw as u8))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.0 == 100
    }

    #[must_use]
    pub const fn is_started(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i64> for ProgressValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProgressValue> for u8 {
    fn from(value: ProgressValue) -> Self {
        value.0
    }
}

/// Personal progress, one per (task, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub progress: ProgressValue,
    pub notes: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskProgress {
    /// View returned when no row has been written yet.
    #[must_use]
    pub fn zero(task_id: TaskId, user_id: UserId) -> Self {
        Self {
            task_id,
            user_id,
            progress: ProgressValue::ZERO,
            notes: String::new(),
            is_completed: false,
            completed_at: None,
            updated_at: None,
        }
    }
}

/// Per-member progress on a group task. A row's existence is also the
/// member's assignment to the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTaskProgress {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub progress: ProgressValue,
    pub notes: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_by: UserId,
    pub approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl GroupTaskProgress {
    #[must_use]
    pub fn assigned(task_id: TaskId, user_id: UserId, assigned_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            user_id,
            progress: ProgressValue::ZERO,
            notes: String::new(),
            is_completed: false,
            completed_at: None,
            assigned_by,
            approved: false,
            approved_by: None,
            approved_at: None,
            updated_at: now,
        }
    }

    /// Boolean completion view kept for clients that expect a toggle.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.progress.is_complete()
    }
}
