// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use taskhub_api::dto::{GroupProgressView, GroupTaskView, TaskView};
use taskhub_core::Error;
use taskhub_model::{
    parse_non_empty, FilePolicy, GroupId, GroupTaskProgress, NewTask, NotificationKind, Task,
    TaskId, TaskPatch, TaskStatus, UserId,
};
use taskhub_store::StoreTx;
use tracing::info;

use super::access::{
    load_group_task, load_personal_task, load_task, require_admin, require_member,
};
use super::invalid;
use super::notifications::notify;

/// Fields shared by personal and group task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub file_policy: FilePolicy,
}

impl TaskDraft {
    fn into_new_task(self, creator: UserId, group: Option<GroupId>) -> Result<NewTask, Error> {
        let new = NewTask {
            title: parse_non_empty("title", &self.title).map_err(invalid)?,
            description: self.description,
            status: self.status.unwrap_or(TaskStatus::Pending),
            due_date: self.due_date,
            start_time: self.start_time,
            end_time: self.end_time,
            creator_id: creator,
            group_id: group,
            file_policy: self.file_policy,
        };
        new.check_schedule().map_err(invalid)?;
        Ok(new)
    }
}

fn apply_patch(task: &mut Task, mut patch: TaskPatch, now: DateTime<Utc>) -> Result<(), Error> {
    if let Some(title) = &patch.title {
        patch.title = Some(parse_non_empty("title", title).map_err(invalid)?);
    }
    patch.apply(task, now);
    task.check_schedule().map_err(invalid)
}

pub(crate) fn create_personal(
    tx: &StoreTx<'_>,
    actor: UserId,
    draft: TaskDraft,
    now: DateTime<Utc>,
) -> Result<Task, Error> {
    let task = tx.insert_task(&draft.into_new_task(actor, None)?, now)?;
    info!(task_id = %task.id, creator = %actor, "task created");
    Ok(task)
}

pub(crate) fn list_personal(tx: &StoreTx<'_>, actor: UserId) -> Result<Vec<Task>, Error> {
    Ok(tx.personal_tasks_of(actor)?)
}

/// Own personal task, or a group task of a group the actor has joined.
pub(crate) fn get(tx: &StoreTx<'_>, actor: UserId, id: TaskId) -> Result<Task, Error> {
    let task = load_task(tx, id)?;
    match task.group_id {
        None if task.creator_id == actor => Ok(task),
        None => Err(Error::not_found("task not found")),
        Some(group) => {
            require_member(tx, group, actor)?;
            Ok(task)
        }
    }
}

pub(crate) fn update_personal(
    tx: &StoreTx<'_>,
    actor: UserId,
    id: TaskId,
    patch: TaskPatch,
    now: DateTime<Utc>,
) -> Result<Task, Error> {
    let mut task = load_personal_task(tx, id, actor)?;
    apply_patch(&mut task, patch, now)?;
    tx.update_task(&task)?;
    Ok(task)
}

/// Returns the storage keys of the task's files.
pub(crate) fn delete_personal(tx: &StoreTx<'_>, actor: UserId, id: TaskId) -> Result<Vec<String>, Error> {
    load_personal_task(tx, id, actor)?;
    let keys = tx.storage_keys_of_task(id)?;
    tx.delete_task(id)?;
    Ok(keys)
}

/// Creates a group task and assigns it. An empty `assignees` list assigns
/// every accepted member; otherwise every listed user must be one.
pub(crate) fn create_group_task(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    mut draft: TaskDraft,
    assignees: &[UserId],
    now: DateTime<Utc>,
) -> Result<GroupTaskView, Error> {
    require_admin(tx, group, actor)?;
    let accepted: BTreeSet<UserId> = tx
        .memberships_of_group(group)?
        .into_iter()
        .filter(|m| m.accepted)
        .map(|m| m.user_id)
        .collect();
    let assignees: BTreeSet<UserId> = if assignees.is_empty() {
        accepted
    } else {
        let requested: BTreeSet<UserId> = assignees.iter().copied().collect();
        if let Some(outsider) = requested.iter().find(|u| !accepted.contains(u)) {
            return Err(Error::invalid_input(format!(
                "user {outsider} is not an accepted member of this group"
            )));
        }
        requested
    };

    draft.status = Some(TaskStatus::Pending);
    let task = tx.insert_task(&draft.into_new_task(actor, Some(group))?, now)?;
    let mut rows = Vec::with_capacity(assignees.len());
    for user in assignees {
        let row = GroupTaskProgress::assigned(task.id, user, actor, now);
        tx.upsert_group_progress(&row)?;
        if user != actor {
            notify(
                tx,
                user,
                NotificationKind::TaskAssigned,
                "New task assigned",
                format!("You have been assigned the task \"{}\"", task.title),
                task.id.get(),
                now,
            )?;
        }
        rows.push(GroupProgressView::from(row));
    }
    info!(task_id = %task.id, group_id = %group, assignees = rows.len(), "group task created");
    Ok(GroupTaskView {
        task: TaskView::from(task),
        assignments: rows,
    })
}

pub(crate) fn list_group_tasks(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
) -> Result<Vec<GroupTaskView>, Error> {
    require_member(tx, group, actor)?;
    let mut by_task: BTreeMap<TaskId, Vec<GroupProgressView>> = BTreeMap::new();
    for row in tx.group_progress_rows_for_group(group)? {
        by_task.entry(row.task_id).or_default().push(row.into());
    }
    Ok(tx
        .group_tasks_of(group)?
        .into_iter()
        .map(|task| GroupTaskView {
            assignments: by_task.remove(&task.id).unwrap_or_default(),
            task: TaskView::from(task),
        })
        .collect())
}

/// Group tasks are editable by an admin who also created the task.
fn require_group_task_editor(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
) -> Result<Task, Error> {
    require_admin(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    if task.creator_id != actor {
        return Err(Error::forbidden("only the task creator can modify this task"));
    }
    Ok(task)
}

pub(crate) fn update_group_task(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    id: TaskId,
    mut patch: TaskPatch,
    now: DateTime<Utc>,
) -> Result<Task, Error> {
    let mut task = require_group_task_editor(tx, actor, group, id)?;
    patch.status = None;
    apply_patch(&mut task, patch, now)?;
    tx.update_task(&task)?;
    Ok(task)
}

pub(crate) fn delete_group_task(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    id: TaskId,
) -> Result<Vec<String>, Error> {
    require_group_task_editor(tx, actor, group, id)?;
    let keys = tx.storage_keys_of_task(id)?;
    tx.delete_task(id)?;
    Ok(keys)
}
