// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_model::{
    FileId, FilePolicy, FileRecord, Group, GroupTaskProgress, MemberRole, ProgressValue, Streak,
    Task, TaskId, TaskPatch, TaskStatus, User, UserId, DEFAULT_MAX_FILES,
};

use crate::patch::double_option;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub require_files: bool,
    #[serde(default)]
    pub max_files: Option<u32>,
    #[serde(default)]
    pub allowed_types: Option<String>,
}

impl CreateTaskRequest {
    #[must_use]
    pub fn file_policy(&self) -> FilePolicy {
        file_policy(self.require_files, self.max_files, self.allowed_types.as_deref())
    }
}

fn file_policy(require_files: bool, max_files: Option<u32>, allowed: Option<&str>) -> FilePolicy {
    FilePolicy {
        require_files,
        max_files: max_files.unwrap_or(DEFAULT_MAX_FILES),
        allowed_types: allowed
            .map(FilePolicy::parse_allowed_types)
            .unwrap_or_default(),
    }
}

/// Personal task update. Nullable fields distinguish an absent key from
/// an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub require_files: Option<bool>,
    #[serde(default)]
    pub max_files: Option<u32>,
    #[serde(default)]
    pub allowed_types: Option<String>,
}

impl UpdateTaskRequest {
    #[must_use]
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            status: self.status,
            due_date: self.due_date,
            start_time: self.start_time,
            end_time: self.end_time,
            require_files: self.require_files,
            max_files: self.max_files,
            allowed_types: self
                .allowed_types
                .as_deref()
                .map(FilePolicy::parse_allowed_types),
        }
    }
}

/// Group task update. There is no status field: group task status only
/// moves through member progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub require_files: Option<bool>,
    #[serde(default)]
    pub max_files: Option<u32>,
    #[serde(default)]
    pub allowed_types: Option<String>,
}

impl UpdateGroupTaskRequest {
    #[must_use]
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            status: None,
            due_date: self.due_date,
            start_time: self.start_time,
            end_time: self.end_time,
            require_files: self.require_files,
            max_files: self.max_files,
            allowed_types: self
                .allowed_types
                .as_deref()
                .map(FilePolicy::parse_allowed_types),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateGroupTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub require_files: bool,
    #[serde(default)]
    pub max_files: Option<u32>,
    #[serde(default)]
    pub allowed_types: Option<String>,
    /// Assignees; empty assigns every accepted member.
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

impl CreateGroupTaskRequest {
    #[must_use]
    pub fn file_policy(&self) -> FilePolicy {
        file_policy(self.require_files, self.max_files, self.allowed_types.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressRequest {
    pub progress: ProgressValue,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberProgressRequest {
    pub progress: ProgressValue,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddMembersRequest {
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FilesByUserQuery {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub is_group_task: bool,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            is_group_task: task.is_group_task(),
            task,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProgressView {
    #[serde(flatten)]
    pub row: GroupTaskProgress,
    /// Boolean view of `progress == 100`.
    pub completed: bool,
}

impl From<GroupTaskProgress> for GroupProgressView {
    fn from(row: GroupTaskProgress) -> Self {
        Self {
            completed: row.completed(),
            row,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTaskView {
    #[serde(flatten)]
    pub task: TaskView,
    pub assignments: Vec<GroupProgressView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: MemberRole,
    pub accepted: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub id: FileId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub sha256: String,
    pub approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileView {
    fn from(f: FileRecord) -> Self {
        Self {
            id: f.id,
            task_id: f.task_id,
            user_id: f.user_id,
            filename: f.filename,
            size: f.size,
            mime_type: f.mime_type,
            sha256: f.sha256,
            approved: f.approved,
            approved_by: f.approved_by,
            approved_at: f.approved_at,
            created_at: f.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakView {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl From<Streak> for StreakView {
    fn from(s: Streak) -> Self {
        Self {
            current_streak: s.current,
            longest_streak: s.longest,
            last_activity_at: s.last_activity_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub completion_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub group_count: u64,
    pub group_task_count: u64,
}
