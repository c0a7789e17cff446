// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use taskhub_model::{NewUser, User, UserId};

use crate::{like_pattern, StoreError, StoreTx};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, bio, avatar_url, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get("id")?),
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        full_name: row.get("full_name")?,
        bio: row.get("bio")?,
        avatar_url: row.get("avatar_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl StoreTx<'_> {
    pub fn insert_user(&self, new: &NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.conn().execute(
            "INSERT INTO users (username, email, password_hash, full_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![new.username, new.email, new.password_hash, new.full_name, now],
        )?;
        let id = UserId::new(self.conn().last_insert_rowid());
        self.user_by_id(id)?
            .ok_or_else(|| StoreError::new(crate::StoreErrorCode::Internal, "inserted user vanished"))
    }

    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.get()],
                user_from_row,
            )
            .optional()?)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    pub fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE users SET username = ?2, email = ?3, full_name = ?4, bio = ?5,
                 avatar_url = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                user.id.get(),
                user.username,
                user.email,
                user.full_name,
                user.bio,
                user.avatar_url,
                user.updated_at
            ],
        )?;
        Ok(())
    }

    /// Case-insensitive substring match on username, email and full name.
    /// An empty query lists the first `limit` users.
    pub fn search_users(&self, query: &str, limit: usize) -> Result<Vec<User>, StoreError> {
        let limit = crate::to_i64(limit as u64);
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ?1 = '' OR username LIKE ?2 ESCAPE '\\'
                OR email LIKE ?2 ESCAPE '\\' OR full_name LIKE ?2 ESCAPE '\\'
             ORDER BY username
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![query.trim(), like_pattern(query), limit],
            user_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
