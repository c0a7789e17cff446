// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod file;
mod group;
mod ids;
mod notification;
mod progress;
mod streak;
mod task;
mod user;
mod validation;

pub use file::{FileRecord, NewFileRecord};
pub use group::{Group, GroupPatch, MemberRole, Membership, NewGroup};
pub use ids::{FileId, GroupId, NotificationId, TaskId, UserId};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use progress::{GroupTaskProgress, ProgressValue, TaskProgress};
pub use streak::{Streak, STREAK_EXPIRY_HOURS};
pub use task::{FilePolicy, NewTask, Task, TaskPatch, TaskStatus, DEFAULT_MAX_FILES};
pub use user::{NewUser, ProfilePatch, User};
pub use validation::{
    parse_email, parse_non_empty, parse_username, ValidationError, USERNAME_MAX_LEN,
    USERNAME_MIN_LEN,
};

pub const CRATE_NAME: &str = "taskhub-model";
