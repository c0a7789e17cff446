// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use taskhub_model::{FilePolicy, GroupId, NewTask, Task, TaskId, TaskStatus, UserId};

use crate::{invalid_column, to_u64, StoreError, StoreErrorCode, StoreTx};

const TASK_COLUMNS: &str = "id, title, description, status, due_date, start_time, end_time, \
     creator_id, group_id, require_files, max_files, allowed_types, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let allowed: String = row.get(11)?;
    Ok(Task {
        id: TaskId::new(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::parse(&status).map_err(|e| invalid_column(3, e))?,
        due_date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        creator_id: UserId::new(row.get(7)?),
        group_id: row.get::<_, Option<i64>>(8)?.map(GroupId::new),
        file_policy: FilePolicy {
            require_files: row.get(9)?,
            max_files: row.get(10)?,
            allowed_types: FilePolicy::parse_allowed_types(&allowed),
        },
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Personal task counts by status for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStatusCounts {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub expired: u64,
}

impl StoreTx<'_> {
    pub fn insert_task(&self, new: &NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        self.conn().execute(
            "INSERT INTO tasks (title, description, status, due_date, start_time, end_time,
                 creator_id, group_id, require_files, max_files, allowed_types, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                new.title,
                new.description,
                new.status.as_str(),
                new.due_date,
                new.start_time,
                new.end_time,
                new.creator_id.get(),
                new.group_id.map(GroupId::get),
                new.file_policy.require_files,
                new.file_policy.max_files,
                new.file_policy.allowed_types_joined(),
                now
            ],
        )?;
        let id = TaskId::new(self.conn().last_insert_rowid());
        self.task_by_id(id)?
            .ok_or_else(|| StoreError::new(StoreErrorCode::Internal, "inserted task vanished"))
    }

    pub fn task_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.get()],
                task_from_row,
            )
            .optional()?)
    }

    /// The task only if it is a personal task created by `owner`.
    pub fn personal_task(&self, id: TaskId, owner: UserId) -> Result<Option<Task>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE id = ?1 AND creator_id = ?2 AND group_id IS NULL"
                ),
                params![id.get(), owner.get()],
                task_from_row,
            )
            .optional()?)
    }

    pub fn personal_tasks_of(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE creator_id = ?1 AND group_id IS NULL
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![owner.get()], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn group_tasks_of(&self, group: GroupId) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE group_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![group.get()], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Writes every mutable column of `task`.
    pub fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE tasks SET title = ?2, description = ?3, status = ?4, due_date = ?5,
                 start_time = ?6, end_time = ?7, require_files = ?8, max_files = ?9,
                 allowed_types = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                task.id.get(),
                task.title,
                task.description,
                task.status.as_str(),
                task.due_date,
                task.start_time,
                task.end_time,
                task.file_policy.require_files,
                task.file_policy.max_files,
                task.file_policy.allowed_types_joined(),
                task.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn set_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.get(), status.as_str(), now],
        )?;
        Ok(())
    }

    /// Removes the task; progress rows and file records cascade.
    pub fn delete_task(&self, id: TaskId) -> Result<bool, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.get()])?;
        Ok(n > 0)
    }

    pub fn personal_task_counts(&self, owner: UserId) -> Result<TaskStatusCounts, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT status, COUNT(*) FROM tasks
             WHERE creator_id = ?1 AND group_id IS NULL
             GROUP BY status",
        )?;
        let mut rows = stmt.query(params![owner.get()])?;
        let mut counts = TaskStatusCounts::default();
        while let Some(row) = rows.next()? {
            let status: String = row.get(0)?;
            let n = to_u64(row.get(1)?);
            counts.total += n;
            match TaskStatus::parse(&status).map_err(|e| invalid_column(0, e))? {
                TaskStatus::Pending => counts.pending += n,
                TaskStatus::InProgress => counts.in_progress += n,
                TaskStatus::Completed => counts.completed += n,
                TaskStatus::Expired => counts.expired += n,
            }
        }
        Ok(counts)
    }
}
