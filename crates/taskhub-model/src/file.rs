// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FileId, TaskId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub filename: String,
    pub storage_key: String,
    pub size: u64,
    pub mime_type: String,
    pub sha256: String,
    pub approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub filename: String,
    pub storage_key: String,
    pub size: u64,
    pub mime_type: String,
    pub sha256: String,
}
