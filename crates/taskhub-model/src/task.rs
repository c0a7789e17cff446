// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GroupId, UserId, ValidationError};

pub const DEFAULT_MAX_FILES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    /// Accepted from storage and personal updates but never assigned by any
    /// progress rule. Reserved for a time-based sweep that does not exist yet.
    Expired,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            other => Err(ValidationError(format!("unknown task status: {other}"))),
        }
    }
}

/// Upload rules attached to a task. `max_files == 0` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePolicy {
    pub require_files: bool,
    pub max_files: u32,
    pub allowed_types: Vec<String>,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self {
            require_files: false,
            max_files: DEFAULT_MAX_FILES,
            allowed_types: Vec::new(),
        }
    }
}

impl FilePolicy {
    /// Parses the comma separated storage form (`"pdf, image"`).
    #[must_use]
    pub fn parse_allowed_types(raw: &str) -> Vec<String> {
        let mut out: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    #[must_use]
    pub fn allowed_types_joined(&self) -> String {
        self.allowed_types.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: crate::TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub creator_id: UserId,
    pub group_id: Option<GroupId>,
    pub file_policy: FilePolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    #[must_use]
    pub fn is_group_task(&self) -> bool {
        self.group_id.is_some()
    }

    pub fn check_schedule(&self) -> Result<(), ValidationError> {
        check_schedule(self.start_time, self.end_time)
    }
}

fn check_schedule(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError(
                "end_time must not be before start_time".to_string(),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub creator_id: UserId,
    pub group_id: Option<GroupId>,
    pub file_policy: FilePolicy,
}

impl NewTask {
    pub fn check_schedule(&self) -> Result<(), ValidationError> {
        check_schedule(self.start_time, self.end_time)
    }
}

/// Partial task update. Outer `None` means "not provided"; for nullable
/// fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_time: Option<Option<DateTime<Utc>>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub require_files: Option<bool>,
    pub max_files: Option<u32>,
    pub allowed_types: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(start) = self.start_time {
            task.start_time = start;
        }
        if let Some(end) = self.end_time {
            task.end_time = end;
        }
        if let Some(require) = self.require_files {
            task.file_policy.require_files = require;
        }
        if let Some(max) = self.max_files {
            task.file_policy.max_files = max;
        }
        if let Some(types) = &self.allowed_types {
            task.file_policy.allowed_types.clone_from(types);
        }
        task.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Task {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        Task {
            id: crate::TaskId::new(1),
            title: "write report".to_string(),
            description: Some("draft".to_string()),
            status: TaskStatus::Pending,
            due_date: Some(at + Duration::days(3)),
            start_time: None,
            end_time: None,
            creator_id: UserId::new(1),
            group_id: None,
            file_policy: FilePolicy::default(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn patch_clears_nullable_fields_only_when_asked() {
        let mut task = sample();
        let patch = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        patch.apply(&mut task, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(task.due_date, None);
        assert_eq!(task.description.as_deref(), Some("draft"));
        assert_eq!(task.title, "write report");
    }

    #[test]
    fn allowed_types_are_normalized() {
        assert_eq!(
            FilePolicy::parse_allowed_types(" PDF, .png,,image ,pdf"),
            vec!["image", "pdf", "png"]
        );
        assert!(FilePolicy::parse_allowed_types("").is_empty());
    }

    #[test]
    fn schedule_rejects_inverted_window() {
        let mut task = sample();
        let at = DateTime::<Utc>::UNIX_EPOCH;
        task.start_time = Some(at + Duration::hours(2));
        task.end_time = Some(at);
        assert!(task.check_schedule().is_err());
        task.end_time = Some(at + Duration::hours(3));
        assert!(task.check_schedule().is_ok());
    }

    #[test]
    fn status_text_matches_storage_form() {
        assert_eq!(TaskStatus::parse("in_progress").expect("known"), TaskStatus::InProgress);
        assert!(TaskStatus::parse("done").is_err());
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
    }
}
