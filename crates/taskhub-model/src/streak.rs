// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

pub const STREAK_EXPIRY_HOURS: i64 = 24;

/// Consecutive-day activity counter. Expiry is lazy: nothing sweeps stale
/// streaks, readers apply [`Streak::effective`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub user_id: UserId,
    pub current: u32,
    pub longest: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl Streak {
    #[must_use]
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            current: 0,
            longest: 0,
            last_activity_at: None,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.last_activity_at
            .is_some_and(|last| now - last > Duration::hours(STREAK_EXPIRY_HOURS))
    }

    /// The streak as a reader should see it at `now`.
    #[must_use]
    pub fn effective(&self, now: DateTime<Utc>) -> Self {
        let mut out = self.clone();
        if out.is_expired(now) {
            out.current = 0;
        }
        out
    }

    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        self.current = match self.last_activity_at {
            None => 1,
            Some(_) if self.is_expired(now) => 1,
            Some(last) if last.date_naive() == now.date_naive() => self.current.max(1),
            Some(_) => self.current + 1,
        };
        self.longest = self.longest.max(self.current);
        self.last_activity_at = Some(now);
    }
}
