// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use taskhub_core::Error;
use taskhub_model::{FileRecord, MemberRole, Membership, Task, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DenyReason {
    NotTaskOwner,
    NotGroupMember,
    InvitationPending,
    NotGroupAdmin,
    NotUploaderOrTaskCreator,
    TaskNotInGroup,
}

impl DenyReason {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotTaskOwner => "you do not own this task",
            Self::NotGroupMember => "you are not a member of this group",
            Self::InvitationPending => "group invitation has not been accepted",
            Self::NotGroupAdmin => "only group admins can perform this action",
            Self::NotUploaderOrTaskCreator => {
                "only the uploader or the task creator can perform this action"
            }
            Self::TaskNotInGroup => "task does not belong to this group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Terminal `Forbidden` for a denial.
    pub fn require(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(Error::forbidden(reason.message())),
        }
    }

    fn from_bool(allowed: bool, reason: DenyReason) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny(reason)
        }
    }
}

pub fn is_task_owner(user: UserId, task: &Task) -> AccessDecision {
    AccessDecision::from_bool(
        !task.is_group_task() && task.creator_id == user,
        DenyReason::NotTaskOwner,
    )
}

/// Role-independent membership. A pending invitation only counts when
/// `require_accepted` is false.
pub fn is_group_member(membership: Option<&Membership>, require_accepted: bool) -> AccessDecision {
    match membership {
        None => AccessDecision::Deny(DenyReason::NotGroupMember),
        Some(m) if require_accepted && !m.accepted => {
            AccessDecision::Deny(DenyReason::InvitationPending)
        }
        Some(_) => AccessDecision::Allow,
    }
}

/// Admin requires both the role and an accepted membership.
pub fn is_group_admin(membership: Option<&Membership>) -> AccessDecision {
    AccessDecision::from_bool(
        membership.is_some_and(|m| m.role == MemberRole::Admin && m.accepted),
        DenyReason::NotGroupAdmin,
    )
}

pub fn is_file_owner_or_task_creator(user: UserId, file: &FileRecord, task: &Task) -> AccessDecision {
    AccessDecision::from_bool(
        file.user_id == user || task.creator_id == user,
        DenyReason::NotUploaderOrTaskCreator,
    )
}

/// Read/write access to a task's contents: owner for personal tasks,
/// accepted member of the owning group for group tasks. `membership` must
/// be the actor's row in `task.group_id`.
pub fn task_access(user: UserId, task: &Task, membership: Option<&Membership>) -> AccessDecision {
    match task.group_id {
        None => is_task_owner(user, task),
        Some(group_id) => match membership {
            Some(m) if m.group_id != group_id || m.user_id != user => {
                AccessDecision::Deny(DenyReason::NotGroupMember)
            }
            other => is_group_member(other, true),
        },
    }
}
