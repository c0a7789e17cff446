// SPDX-License-Identifier: Apache-2.0

//! Pure authorization and progress rules. Callers load the rows, these
//! functions decide.

#![forbid(unsafe_code)]

mod access;
mod progress;
mod uploads;

pub use access::{
    is_file_owner_or_task_creator, is_group_admin, is_group_member, is_task_owner, task_access,
    AccessDecision, DenyReason,
};
pub use progress::{
    apply_group_progress, apply_personal_progress, derive_group_status, personal_status_after,
    GroupProgressUpdate,
};
pub use uploads::{
    check_upload_quota, display_filename, matches_allowed_types, sanitize_filename, storage_key,
};

pub const CRATE_NAME: &str = "taskhub-policies";
