// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, UserId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GroupInvitation,
    TaskAssigned,
    FileUploaded,
    FileApproved,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroupInvitation => "group_invitation",
            Self::TaskAssigned => "task_assigned",
            Self::FileUploaded => "file_uploaded",
            Self::FileApproved => "file_approved",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "group_invitation" => Ok(Self::GroupInvitation),
            "task_assigned" => Ok(Self::TaskAssigned),
            "file_uploaded" => Ok(Self::FileUploaded),
            "file_approved" => Ok(Self::FileApproved),
            other => Err(ValidationError(format!("unknown notification kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
}
