// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::Error;
use taskhub_model::{
    GroupId, GroupTaskProgress, ProgressValue, Task, TaskId, TaskProgress, UserId,
};
use taskhub_policies::{
    apply_group_progress, apply_personal_progress, derive_group_status, personal_status_after,
    GroupProgressUpdate,
};
use taskhub_store::StoreTx;
use tracing::debug;

use super::access::{load_group_task, load_personal_task, require_admin, require_member};
use super::analytics::record_activity;

/// Re-derives a group task's status from all of its member rows.
pub(crate) fn recompute_group_task_status(
    tx: &StoreTx<'_>,
    task: TaskId,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let Some(row) = tx.task_by_id(task)? else {
        return Ok(());
    };
    let values: Vec<ProgressValue> = tx
        .group_progress_rows(task)?
        .iter()
        .map(|r| r.progress)
        .collect();
    let next = derive_group_status(row.status, &values);
    if next != row.status {
        tx.set_task_status(task, next, now)?;
        debug!(task_id = %task, from = row.status.as_str(), to = next.as_str(), "group task status changed");
    }
    Ok(())
}

pub(crate) fn personal(tx: &StoreTx<'_>, actor: UserId, task: TaskId) -> Result<TaskProgress, Error> {
    load_personal_task(tx, task, actor)?;
    Ok(tx
        .personal_progress(task, actor)?
        .unwrap_or_else(|| TaskProgress::zero(task, actor)))
}

pub(crate) fn set_personal(
    tx: &StoreTx<'_>,
    actor: UserId,
    task: TaskId,
    progress: ProgressValue,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<TaskProgress, Error> {
    let row_task = load_personal_task(tx, task, actor)?;
    let mut row = tx
        .personal_progress(task, actor)?
        .unwrap_or_else(|| TaskProgress::zero(task, actor));
    apply_personal_progress(&mut row, progress, notes, now);
    tx.upsert_personal_progress(&row)?;
    let next = personal_status_after(row_task.status, progress);
    if next != row_task.status {
        tx.set_task_status(task, next, now)?;
    }
    record_activity(tx, actor, now)?;
    Ok(row)
}

fn group_row(
    tx: &StoreTx<'_>,
    task: &Task,
    user: UserId,
    now: DateTime<Utc>,
) -> Result<GroupTaskProgress, Error> {
    Ok(tx
        .group_progress(task.id, user)?
        .unwrap_or_else(|| GroupTaskProgress::assigned(task.id, user, task.creator_id, now)))
}

/// Member's own progress on a group task.
pub(crate) fn set_own_group(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
    progress: ProgressValue,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<GroupTaskProgress, Error> {
    require_member(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    let mut row = group_row(tx, &task, actor, now)?;
    let update = GroupProgressUpdate {
        progress,
        notes,
        approve: None,
    };
    apply_group_progress(&mut row, &update, actor, now);
    tx.upsert_group_progress(&row)?;
    recompute_group_task_status(tx, task.id, now)?;
    record_activity(tx, actor, now)?;
    Ok(row)
}

/// Admin write to another member's progress, optionally approving it.
pub(crate) fn set_member_group(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
    member: UserId,
    update: &GroupProgressUpdate,
    now: DateTime<Utc>,
) -> Result<GroupTaskProgress, Error> {
    require_admin(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    if !tx.membership(group, member)?.is_some_and(|m| m.accepted) {
        return Err(Error::invalid_input(
            "user is not an accepted member of this group",
        ));
    }
    let mut row = match tx.group_progress(task.id, member)? {
        Some(row) => row,
        None => GroupTaskProgress::assigned(task.id, member, actor, now),
    };
    apply_group_progress(&mut row, update, actor, now);
    tx.upsert_group_progress(&row)?;
    recompute_group_task_status(tx, task.id, now)?;
    Ok(row)
}

pub(crate) fn group_rows(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
) -> Result<Vec<GroupTaskProgress>, Error> {
    require_member(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    Ok(tx.group_progress_rows(task.id)?)
}

pub(crate) fn own_group(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
) -> Result<GroupTaskProgress, Error> {
    require_member(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    tx.group_progress(task.id, actor)?
        .ok_or_else(|| Error::not_found("you are not assigned to this task"))
}
