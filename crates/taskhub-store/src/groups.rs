// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use taskhub_model::{Group, GroupId, MemberRole, Membership, NewGroup, UserId};

use crate::{invalid_column, like_pattern, to_u64, StoreError, StoreErrorCode, StoreTx};

const GROUP_COLUMNS: &str = "g.id, g.name, g.description, g.creator_id, g.created_at, g.updated_at";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: GroupId::new(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        creator_id: UserId::new(row.get(3)?),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let role: String = row.get("role")?;
    Ok(Membership {
        group_id: GroupId::new(row.get("group_id")?),
        user_id: UserId::new(row.get("user_id")?),
        role: MemberRole::parse(&role).map_err(|e| invalid_column(2, e))?,
        accepted: row.get("accepted")?,
        joined_at: row.get("joined_at")?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub membership: Membership,
    pub username: String,
    pub full_name: String,
}

impl StoreTx<'_> {
    pub fn insert_group(&self, new: &NewGroup, now: DateTime<Utc>) -> Result<Group, StoreError> {
        self.conn().execute(
            "INSERT INTO task_groups (name, description, creator_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![new.name, new.description, new.creator_id.get(), now],
        )?;
        let id = GroupId::new(self.conn().last_insert_rowid());
        self.group_by_id(id)?
            .ok_or_else(|| StoreError::new(StoreErrorCode::Internal, "inserted group vanished"))
    }

    pub fn group_by_id(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM task_groups g WHERE g.id = ?1"),
                params![id.get()],
                group_from_row,
            )
            .optional()?)
    }

    pub fn update_group(&self, group: &Group) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE task_groups SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
            params![group.id.get(), group.name, group.description, group.updated_at],
        )?;
        Ok(())
    }

    /// Removes the group; memberships, group tasks and their dependents go
    /// with it through foreign key cascades.
    pub fn delete_group(&self, id: GroupId) -> Result<bool, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM task_groups WHERE id = ?1", params![id.get()])?;
        Ok(n > 0)
    }

    /// Groups the user belongs to, newest first.
    pub fn groups_of_user(&self, user: UserId, accepted_only: bool) -> Result<Vec<Group>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM task_groups g
             JOIN memberships m ON m.group_id = g.id
             WHERE m.user_id = ?1 AND (?2 = 0 OR m.accepted = 1)
             ORDER BY g.created_at DESC, g.id DESC"
        ))?;
        let rows = stmt.query_map(params![user.get(), accepted_only], group_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn search_groups(&self, query: &str, limit: usize) -> Result<Vec<Group>, StoreError> {
        let limit = crate::to_i64(limit as u64);
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM task_groups g
             WHERE ?1 = '' OR g.name LIKE ?2 ESCAPE '\\' OR g.description LIKE ?2 ESCAPE '\\'
             ORDER BY g.name, g.id
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![query.trim(), like_pattern(query), limit],
            group_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn insert_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO memberships (group_id, user_id, role, accepted, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                membership.group_id.get(),
                membership.user_id.get(),
                membership.role.as_str(),
                membership.accepted,
                membership.joined_at
            ],
        )?;
        Ok(())
    }

    pub fn membership(&self, group: GroupId, user: UserId) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT group_id, user_id, role, accepted, joined_at
                 FROM memberships WHERE group_id = ?1 AND user_id = ?2",
                params![group.get(), user.get()],
                membership_from_row,
            )
            .optional()?)
    }

    pub fn memberships_of_group(&self, group: GroupId) -> Result<Vec<Membership>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT group_id, user_id, role, accepted, joined_at
             FROM memberships WHERE group_id = ?1
             ORDER BY joined_at, user_id",
        )?;
        let rows = stmt.query_map(params![group.get()], membership_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Memberships joined with the member's username and full name.
    pub fn group_members(&self, group: GroupId) -> Result<Vec<GroupMember>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT m.group_id, m.user_id, m.role, m.accepted, m.joined_at, u.username, u.full_name
             FROM memberships m JOIN users u ON u.id = m.user_id
             WHERE m.group_id = ?1
             ORDER BY m.joined_at, m.user_id",
        )?;
        let rows = stmt.query_map(params![group.get()], |row| {
            Ok(GroupMember {
                membership: membership_from_row(row)?,
                username: row.get("username")?,
                full_name: row.get("full_name")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn accept_membership(&self, group: GroupId, user: UserId) -> Result<bool, StoreError> {
        let n = self.conn().execute(
            "UPDATE memberships SET accepted = 1 WHERE group_id = ?1 AND user_id = ?2",
            params![group.get(), user.get()],
        )?;
        Ok(n > 0)
    }

    pub fn delete_membership(&self, group: GroupId, user: UserId) -> Result<bool, StoreError> {
        let n = self.conn().execute(
            "DELETE FROM memberships WHERE group_id = ?1 AND user_id = ?2",
            params![group.get(), user.get()],
        )?;
        Ok(n > 0)
    }

    pub fn count_group_admins(&self, group: GroupId) -> Result<u64, StoreError> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM memberships
             WHERE group_id = ?1 AND role = 'admin' AND accepted = 1",
            params![group.get()],
            |r| r.get(0),
        )?;
        Ok(to_u64(n))
    }

    pub fn count_accepted_memberships(&self, user: UserId) -> Result<u64, StoreError> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM memberships WHERE user_id = ?1 AND accepted = 1",
            params![user.get()],
            |r| r.get(0),
        )?;
        Ok(to_u64(n))
    }
}
