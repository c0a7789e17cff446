// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GroupId, UserId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub creator_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GroupPatch {
    pub fn apply(&self, group: &mut Group, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            group.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            group.description.clone_from(description);
        }
        group.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError(format!("unknown member role: {other}"))),
        }
    }
}

/// One row per (group, user). `accepted == false` is a pending invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub accepted: bool,
    pub joined_at: DateTime<Utc>,
}
