// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use taskhub_model::{FileId, FileRecord, GroupId, NewFileRecord, TaskId, UserId};

use crate::{to_i64, to_u64, StoreError, StoreErrorCode, StoreTx};

const FILE_COLUMNS: &str = "f.id, f.task_id, f.user_id, f.filename, f.storage_key, f.size, \
     f.mime_type, f.sha256, f.approved, f.approved_by, f.approved_at, f.created_at";

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: FileId::new(row.get(0)?),
        task_id: TaskId::new(row.get(1)?),
        user_id: UserId::new(row.get(2)?),
        filename: row.get(3)?,
        storage_key: row.get(4)?,
        size: to_u64(row.get(5)?),
        mime_type: row.get(6)?,
        sha256: row.get(7)?,
        approved: row.get(8)?,
        approved_by: row.get::<_, Option<i64>>(9)?.map(UserId::new),
        approved_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl StoreTx<'_> {
    pub fn insert_file(&self, new: &NewFileRecord, now: DateTime<Utc>) -> Result<FileRecord, StoreError> {
        self.conn().execute(
            "INSERT INTO files (task_id, user_id, filename, storage_key, size, mime_type, sha256, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.task_id.get(),
                new.user_id.get(),
                new.filename,
                new.storage_key,
                to_i64(new.size),
                new.mime_type,
                new.sha256,
                now
            ],
        )?;
        let id = FileId::new(self.conn().last_insert_rowid());
        self.file_by_id(id)?
            .ok_or_else(|| StoreError::new(StoreErrorCode::Internal, "inserted file vanished"))
    }

    pub fn file_by_id(&self, id: FileId) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?1"),
                params![id.get()],
                file_from_row,
            )
            .optional()?)
    }

    pub fn files_of_task(&self, task: TaskId) -> Result<Vec<FileRecord>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files f WHERE f.task_id = ?1
             ORDER BY f.created_at, f.id"
        ))?;
        let rows = stmt.query_map(params![task.get()], file_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn files_of_task_by_user(
        &self,
        task: TaskId,
        user: UserId,
    ) -> Result<Vec<FileRecord>, StoreError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files f WHERE f.task_id = ?1 AND f.user_id = ?2
             ORDER BY f.created_at, f.id"
        ))?;
        let rows = stmt.query_map(params![task.get(), user.get()], file_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_files_of_task(&self, task: TaskId) -> Result<u64, StoreError> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM files WHERE task_id = ?1",
            params![task.get()],
            |r| r.get(0),
        )?;
        Ok(to_u64(n))
    }

    pub fn storage_key_in_use(&self, key: &str) -> Result<bool, StoreError> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM files WHERE storage_key = ?1",
            params![key],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn set_file_approval(&self, file: &FileRecord) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE files SET approved = ?2, approved_by = ?3, approved_at = ?4 WHERE id = ?1",
            params![
                file.id.get(),
                file.approved,
                file.approved_by.map(UserId::get),
                file.approved_at
            ],
        )?;
        Ok(())
    }

    pub fn delete_file(&self, id: FileId) -> Result<bool, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM files WHERE id = ?1", params![id.get()])?;
        Ok(n > 0)
    }

    pub fn storage_keys_of_task(&self, task: TaskId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT storage_key FROM files WHERE task_id = ?1")?;
        let rows = stmt.query_map(params![task.get()], |r| r.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn storage_keys_of_group(&self, group: GroupId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT f.storage_key FROM files f
             JOIN tasks t ON t.id = f.task_id WHERE t.group_id = ?1",
        )?;
        let rows = stmt.query_map(params![group.get()], |r| r.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
