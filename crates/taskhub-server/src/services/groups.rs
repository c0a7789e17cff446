// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use taskhub_api::dto::{GroupView, MemberView};
use taskhub_core::Error;
use taskhub_model::{
    parse_non_empty, Group, GroupId, GroupPatch, MemberRole, Membership, NewGroup,
    NotificationKind, UserId,
};
use taskhub_store::StoreTx;
use tracing::info;

use super::access::{load_group, require_admin, require_member};
use super::notifications::notify;
use super::progress::recompute_group_task_status;
use super::invalid;

pub(crate) fn group_view(tx: &StoreTx<'_>, group: Group) -> Result<GroupView, Error> {
    let members = tx
        .group_members(group.id)?
        .into_iter()
        .map(|m| MemberView {
            user_id: m.membership.user_id,
            username: m.username,
            full_name: m.full_name,
            role: m.membership.role,
            accepted: m.membership.accepted,
            joined_at: m.membership.joined_at,
        })
        .collect();
    Ok(GroupView { group, members })
}

/// Pending invitations for existing users not yet in the group. Returns
/// the invited ids.
fn invite(
    tx: &StoreTx<'_>,
    group: &Group,
    inviter: UserId,
    candidates: &[UserId],
    now: DateTime<Utc>,
) -> Result<Vec<UserId>, Error> {
    let mut invited = Vec::new();
    let unique: BTreeSet<UserId> = candidates.iter().copied().collect();
    for user in unique {
        if user == inviter || tx.membership(group.id, user)?.is_some() {
            continue;
        }
        if tx.user_by_id(user)?.is_none() {
            continue;
        }
        tx.insert_membership(&Membership {
            group_id: group.id,
            user_id: user,
            role: MemberRole::Member,
            accepted: false,
            joined_at: now,
        })?;
        notify(
            tx,
            user,
            NotificationKind::GroupInvitation,
            "Group invitation",
            format!("You have been invited to join the group \"{}\"", group.name),
            group.id.get(),
            now,
        )?;
        invited.push(user);
    }
    Ok(invited)
}

pub(crate) fn create(
    tx: &StoreTx<'_>,
    actor: UserId,
    name: &str,
    description: &str,
    invitees: &[UserId],
    now: DateTime<Utc>,
) -> Result<GroupView, Error> {
    let name = parse_non_empty("name", name).map_err(invalid)?;
    let group = tx.insert_group(
        &NewGroup {
            name,
            description: description.trim().to_string(),
            creator_id: actor,
        },
        now,
    )?;
    tx.insert_membership(&Membership {
        group_id: group.id,
        user_id: actor,
        role: MemberRole::Admin,
        accepted: true,
        joined_at: now,
    })?;
    let invited = invite(tx, &group, actor, invitees, now)?;
    info!(group_id = %group.id, creator = %actor, invited = invited.len(), "group created");
    group_view(tx, group)
}

/// Groups where `user` has an accepted membership.
pub(crate) fn list_for(tx: &StoreTx<'_>, user: UserId) -> Result<Vec<GroupView>, Error> {
    tx.groups_of_user(user, true)?
        .into_iter()
        .map(|g| group_view(tx, g))
        .collect()
}

pub(crate) fn search(tx: &StoreTx<'_>, query: &str, limit: usize) -> Result<Vec<Group>, Error> {
    Ok(tx.search_groups(query, limit)?)
}

pub(crate) fn get(tx: &StoreTx<'_>, actor: UserId, group: GroupId) -> Result<GroupView, Error> {
    require_member(tx, group, actor)?;
    let group = load_group(tx, group)?;
    group_view(tx, group)
}

pub(crate) fn update(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    mut patch: GroupPatch,
    now: DateTime<Utc>,
) -> Result<GroupView, Error> {
    require_admin(tx, group, actor)?;
    let mut row = load_group(tx, group)?;
    if let Some(name) = &patch.name {
        patch.name = Some(parse_non_empty("name", name).map_err(invalid)?);
    }
    patch.apply(&mut row, now);
    tx.update_group(&row)?;
    group_view(tx, row)
}

/// Deletes the group with its memberships, tasks, progress and file
/// records. Returns the storage keys whose blobs are now orphaned.
pub(crate) fn delete(tx: &StoreTx<'_>, actor: UserId, group: GroupId) -> Result<Vec<String>, Error> {
    require_admin(tx, group, actor)?;
    let keys = tx.storage_keys_of_group(group)?;
    tx.delete_group(group)?;
    info!(group_id = %group, files = keys.len(), "group deleted");
    Ok(keys)
}

pub(crate) fn add_members(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    users: &[UserId],
    now: DateTime<Utc>,
) -> Result<Vec<UserId>, Error> {
    require_admin(tx, group, actor)?;
    let row = load_group(tx, group)?;
    invite(tx, &row, actor, users, now)
}

/// Removes a membership. The group creator cannot be removed. The
/// member's progress rows go with it and the affected task statuses are
/// recomputed.
pub(crate) fn remove_member(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    target: UserId,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    require_admin(tx, group, actor)?;
    let row = load_group(tx, group)?;
    if target == row.creator_id {
        return Err(Error::forbidden("the group creator cannot be removed"));
    }
    if !tx.delete_membership(group, target)? {
        return Err(Error::not_found("member not found"));
    }
    for task in tx.delete_member_group_progress(group, target)? {
        recompute_group_task_status(tx, task, now)?;
    }
    info!(group_id = %group, user_id = %target, "member removed");
    Ok(())
}

/// Only the invited user can accept their own invitation.
pub(crate) fn accept_invitation(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    target: UserId,
) -> Result<(), Error> {
    if actor != target {
        return Err(Error::forbidden("you can only accept your own invitation"));
    }
    load_group(tx, group)?;
    match tx.membership(group, target)? {
        None => Err(Error::not_found("invitation not found")),
        Some(m) if m.accepted => Ok(()),
        Some(_) => {
            tx.accept_membership(group, target)?;
            Ok(())
        }
    }
}
