// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use taskhub_model::{NewNotification, Notification, NotificationId, NotificationKind, UserId};

use crate::{invalid_column, StoreError, StoreErrorCode, StoreTx};

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    Ok(Notification {
        id: NotificationId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        kind: NotificationKind::parse(&kind).map_err(|e| invalid_column(2, e))?,
        title: row.get(3)?,
        message: row.get(4)?,
        related_id: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl StoreTx<'_> {
    pub fn insert_notification(
        &self,
        new: &NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, StoreError> {
        self.conn().execute(
            "INSERT INTO notifications (user_id, kind, title, message, related_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.user_id.get(),
                new.kind.as_str(),
                new.title,
                new.message,
                new.related_id,
                now
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.conn()
            .query_row(
                "SELECT id, user_id, kind, title, message, related_id, is_read, created_at
                 FROM notifications WHERE id = ?1",
                params![id],
                notification_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::new(StoreErrorCode::Internal, "inserted notification vanished")
                }
                other => other.into(),
            })
    }

    /// Newest first.
    pub fn notifications_of(&self, user: UserId) -> Result<Vec<Notification>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, kind, title, message, related_id, is_read, created_at
             FROM notifications WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user.get()], notification_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// False when the notification does not exist or belongs to someone else.
    pub fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<bool, StoreError> {
        let n = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id.get(), user.get()],
        )?;
        Ok(n > 0)
    }

    pub fn delete_notification(&self, id: NotificationId, user: UserId) -> Result<bool, StoreError> {
        let n = self.conn().execute(
            "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
            params![id.get(), user.get()],
        )?;
        Ok(n > 0)
    }
}
