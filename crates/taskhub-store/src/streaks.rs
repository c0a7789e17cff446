// SPDX-License-Identifier: Apache-2.0

use rusqlite::{params, OptionalExtension};
use taskhub_model::{Streak, UserId};

use crate::{StoreError, StoreTx};

impl StoreTx<'_> {
    pub fn streak(&self, user: UserId) -> Result<Option<Streak>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT user_id, current_streak, longest_streak, last_activity_at
                 FROM streaks WHERE user_id = ?1",
                params![user.get()],
                |row| {
                    Ok(Streak {
                        user_id: UserId::new(row.get(0)?),
                        current: row.get(1)?,
                        longest: row.get(2)?,
                        last_activity_at: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn upsert_streak(&self, streak: &Streak) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO streaks (user_id, current_streak, longest_streak, last_activity_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id) DO UPDATE SET
                 current_streak = excluded.current_streak,
                 longest_streak = excluded.longest_streak,
                 last_activity_at = excluded.last_activity_at",
            params![
                streak.user_id.get(),
                streak.current,
                streak.longest,
                streak.last_activity_at
            ],
        )?;
        Ok(())
    }
}
