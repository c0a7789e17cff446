// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Profile fields a user may change. `None` leaves the field untouched;
/// `Some(String::new())` clears the free-text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.full_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
    }

    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(v) = &self.username {
            user.username.clone_from(v);
        }
        if let Some(v) = &self.email {
            user.email.clone_from(v);
        }
        if let Some(v) = &self.full_name {
            user.full_name.clone_from(v);
        }
        if let Some(v) = &self.bio {
            user.bio.clone_from(v);
        }
        if let Some(v) = &self.avatar_url {
            user.avatar_url.clone_from(v);
        }
        user.updated_at = now;
    }
}
