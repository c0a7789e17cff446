// SPDX-License-Identifier: Apache-2.0

use taskhub_core::Error;
use taskhub_model::{FileId, FileRecord, Group, GroupId, Membership, Task, TaskId, UserId};
use taskhub_policies::{
    is_file_owner_or_task_creator, is_group_admin, is_group_member, task_access, AccessDecision,
    DenyReason,
};
use taskhub_store::StoreTx;

pub(crate) fn load_task(tx: &StoreTx<'_>, id: TaskId) -> Result<Task, Error> {
    tx.task_by_id(id)?
        .ok_or_else(|| Error::not_found("task not found"))
}

/// Personal task owned by `owner`. Someone else's task reads as absent.
pub(crate) fn load_personal_task(tx: &StoreTx<'_>, id: TaskId, owner: UserId) -> Result<Task, Error> {
    tx.personal_task(id, owner)?
        .ok_or_else(|| Error::not_found("task not found"))
}

pub(crate) fn load_group(tx: &StoreTx<'_>, id: GroupId) -> Result<Group, Error> {
    tx.group_by_id(id)?
        .ok_or_else(|| Error::not_found("group not found"))
}

pub(crate) fn load_file(tx: &StoreTx<'_>, id: FileId) -> Result<FileRecord, Error> {
    tx.file_by_id(id)?
        .ok_or_else(|| Error::not_found("file not found"))
}

/// Task that must belong to `group`; a task elsewhere reads as absent.
pub(crate) fn load_group_task(tx: &StoreTx<'_>, group: GroupId, task: TaskId) -> Result<Task, Error> {
    let task = load_task(tx, task)?;
    if task.group_id != Some(group) {
        return Err(Error::not_found("task not found in this group"));
    }
    Ok(task)
}

/// Accepted membership of `user` in an existing group.
pub(crate) fn require_member(tx: &StoreTx<'_>, group: GroupId, user: UserId) -> Result<Membership, Error> {
    load_group(tx, group)?;
    let membership = tx.membership(group, user)?;
    is_group_member(membership.as_ref(), true).require()?;
    membership.ok_or_else(|| Error::forbidden(DenyReason::NotGroupMember.message()))
}

pub(crate) fn require_admin(tx: &StoreTx<'_>, group: GroupId, user: UserId) -> Result<Membership, Error> {
    load_group(tx, group)?;
    let membership = tx.membership(group, user)?;
    is_group_admin(membership.as_ref()).require()?;
    membership.ok_or_else(|| Error::forbidden(DenyReason::NotGroupAdmin.message()))
}

/// Owner of a personal task, or accepted member of a group task's group.
/// A personal task the user cannot see reads as absent.
pub(crate) fn require_task_access(tx: &StoreTx<'_>, user: UserId, task: &Task) -> Result<(), Error> {
    let membership = match task.group_id {
        Some(group) => tx.membership(group, user)?,
        None => None,
    };
    hide_personal(task, task_access(user, task, membership.as_ref()), "task not found")
}

/// Uploader or task creator. On a personal task anyone else gets `NotFound`.
pub(crate) fn require_file_owner_or_task_creator(
    user: UserId,
    file: &FileRecord,
    task: &Task,
) -> Result<(), Error> {
    hide_personal(
        task,
        is_file_owner_or_task_creator(user, file, task),
        "file not found",
    )
}

fn hide_personal(task: &Task, decision: AccessDecision, absent: &str) -> Result<(), Error> {
    if task.is_group_task() || decision.is_allowed() {
        decision.require()
    } else {
        Err(Error::not_found(absent))
    }
}
