// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension, Row};
use taskhub_model::{GroupId, GroupTaskProgress, ProgressValue, TaskId, TaskProgress, UserId};

use crate::{invalid_column, to_u64, StoreError, StoreTx};

fn progress_value(idx: usize, raw: i64) -> rusqlite::Result<ProgressValue> {
    ProgressValue::new(raw).map_err(|e| invalid_column(idx, e))
}

fn personal_from_row(row: &Row<'_>) -> rusqlite::Result<TaskProgress> {
    Ok(TaskProgress {
        task_id: TaskId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        progress: progress_value(2, row.get(2)?)?,
        notes: row.get(3)?,
        is_completed: row.get(4)?,
        completed_at: row.get(5)?,
        updated_at: Some(row.get(6)?),
    })
}

const GROUP_PROGRESS_COLUMNS: &str = "p.task_id, p.user_id, p.progress, p.notes, p.is_completed, \
     p.completed_at, p.assigned_by, p.approved, p.approved_by, p.approved_at, p.updated_at";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupTaskProgress> {
    Ok(GroupTaskProgress {
        task_id: TaskId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        progress: progress_value(2, row.get(2)?)?,
        notes: row.get(3)?,
        is_completed: row.get(4)?,
        completed_at: row.get(5)?,
        assigned_by: UserId::new(row.get(6)?),
        approved: row.get(7)?,
        approved_by: row.get::<_, Option<i64>>(8)?.map(UserId::new),
        approved_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl StoreTx<'_> {
    pub fn personal_progress(
        &self,
        task: TaskId,
        user: UserId,
    ) -> Result<Option<TaskProgress>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT task_id, user_id, progress, notes, is_completed, completed_at, updated_at
                 FROM task_progress WHERE task_id = ?1 AND user_id = ?2",
                params![task.get(), user.get()],
                personal_from_row,
            )
            .optional()?)
    }

    pub fn upsert_personal_progress(&self, row: &TaskProgress) -> Result<(), StoreError> {
        let updated_at = row.updated_at.unwrap_or_else(chrono::Utc::now);
        self.conn().execute(
            "INSERT INTO task_progress
                 (task_id, user_id, progress, notes, is_completed, completed_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (task_id, user_id) DO UPDATE SET
                 progress = excluded.progress,
                 notes = excluded.notes,
                 is_completed = excluded.is_completed,
                 completed_at = excluded.completed_at,
                 updated_at = excluded.updated_at",
            params![
                row.task_id.get(),
                row.user_id.get(),
                row.progress.get(),
                row.notes,
                row.is_completed,
                row.completed_at,
                updated_at
            ],
        )?;
        Ok(())
    }

    pub fn group_progress(
        &self,
        task: TaskId,
        user: UserId,
    ) -> Result<Option<GroupTaskProgress>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {GROUP_PROGRESS_COLUMNS} FROM group_task_progress p
                     WHERE p.task_id = ?1 AND p.user_id = ?2"
                ),
                params![task.get(), user.get()],
                group_from_row,
            )
            .optional()?)
    }

    pub fn group_progress_rows(&self, task: TaskId) -> Result<Vec<GroupTaskProgress>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GROUP_PROGRESS_COLUMNS} FROM group_task_progress p
             WHERE p.task_id = ?1 ORDER BY p.user_id"
        ))?;
        let rows = stmt.query_map(params![task.get()], group_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every member row for the tasks of one group, in a single query.
    pub fn group_progress_rows_for_group(
        &self,
        group: GroupId,
    ) -> Result<Vec<GroupTaskProgress>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GROUP_PROGRESS_COLUMNS} FROM group_task_progress p
             JOIN tasks t ON t.id = p.task_id
             WHERE t.group_id = ?1 ORDER BY p.task_id, p.user_id"
        ))?;
        let rows = stmt.query_map(params![group.get()], group_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn upsert_group_progress(&self, row: &GroupTaskProgress) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO group_task_progress
                 (task_id, user_id, progress, notes, is_completed, completed_at, assigned_by,
                  approved, approved_by, approved_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT (task_id, user_id) DO UPDATE SET
                 progress = excluded.progress,
                 notes = excluded.notes,
                 is_completed = excluded.is_completed,
                 completed_at = excluded.completed_at,
                 approved = excluded.approved,
                 approved_by = excluded.approved_by,
                 approved_at = excluded.approved_at,
                 updated_at = excluded.updated_at",
            params![
                row.task_id.get(),
                row.user_id.get(),
                row.progress.get(),
                row.notes,
                row.is_completed,
                row.completed_at,
                row.assigned_by.get(),
                row.approved,
                row.approved_by.map(UserId::get),
                row.approved_at,
                row.updated_at
            ],
        )?;
        Ok(())
    }

    /// Drops a member's rows on every task of the group and returns the
    /// affected task ids.
    pub fn delete_member_group_progress(
        &self,
        group: GroupId,
        user: UserId,
    ) -> Result<Vec<TaskId>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT p.task_id FROM group_task_progress p
             JOIN tasks t ON t.id = p.task_id
             WHERE t.group_id = ?1 AND p.user_id = ?2",
        )?;
        let affected = stmt
            .query_map(params![group.get(), user.get()], |r| {
                Ok(TaskId::new(r.get(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        self.conn().execute(
            "DELETE FROM group_task_progress
             WHERE user_id = ?2 AND task_id IN (SELECT id FROM tasks WHERE group_id = ?1)",
            params![group.get(), user.get()],
        )?;
        Ok(affected)
    }

    /// Rows the user holds on group tasks, i.e. their assignments.
    pub fn count_group_assignments(&self, user: UserId) -> Result<u64, StoreError> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM group_task_progress p
             JOIN tasks t ON t.id = p.task_id
             WHERE p.user_id = ?1 AND t.group_id IS NOT NULL",
            params![user.get()],
            |r| r.get(0),
        )?;
        Ok(to_u64(n))
    }
}
