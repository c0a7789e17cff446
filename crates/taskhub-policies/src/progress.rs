// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_model::{GroupTaskProgress, ProgressValue, TaskProgress, TaskStatus, UserId};

/// Task status after a personal progress write. Zero progress leaves the
/// status alone, so a started task never returns to `pending`.
#[must_use]
pub fn personal_status_after(current: TaskStatus, progress: ProgressValue) -> TaskStatus {
    if progress.is_complete() {
        TaskStatus::Completed
    } else if progress.is_started() {
        TaskStatus::InProgress
    } else {
        current
    }
}

/// `is_completed` is a ratchet: lowering progress after 100 keeps it set.
pub fn apply_personal_progress(
    row: &mut TaskProgress,
    progress: ProgressValue,
    notes: Option<String>,
    now: DateTime<Utc>,
) {
    row.progress = progress;
    if let Some(notes) = notes {
        row.notes = notes;
    }
    if progress.is_complete() {
        row.is_completed = true;
        row.completed_at = Some(now);
    }
    row.updated_at = Some(now);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProgressUpdate {
    pub progress: ProgressValue,
    pub notes: Option<String>,
    /// `Some(true)` approves an unapproved row. Nothing here can revoke
    /// an approval.
    pub approve: Option<bool>,
}

pub fn apply_group_progress(
    row: &mut GroupTaskProgress,
    update: &GroupProgressUpdate,
    actor: UserId,
    now: DateTime<Utc>,
) {
    let was_complete = row.progress.is_complete();
    row.progress = update.progress;
    if let Some(notes) = &update.notes {
        row.notes.clone_from(notes);
    }
    row.is_completed = update.progress.is_complete();
    if row.is_completed && !was_complete {
        row.completed_at = Some(now);
    } else if !row.is_completed {
        row.completed_at = None;
    }
    if update.approve == Some(true) && !row.approved {
        row.approved = true;
        row.approved_by = Some(actor);
        row.approved_at = Some(now);
    }
    row.updated_at = now;
}

/// Aggregate status of a group task from every member row.
///
/// Completed iff the set is non-empty and every row is at 100. A task that
/// was completed and no longer qualifies drops back to `in_progress`.
#[must_use]
pub fn derive_group_status(current: TaskStatus, rows: &[ProgressValue]) -> TaskStatus {
    if !rows.is_empty() && rows.iter().all(|p| p.is_complete()) {
        return TaskStatus::Completed;
    }
    if current == TaskStatus::Completed || rows.iter().any(|p| p.is_started()) {
        return TaskStatus::InProgress;
    }
    current
}
