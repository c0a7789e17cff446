// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_api::dto::{AnalyticsSummary, StreakView};
use taskhub_core::Error;
use taskhub_model::{Streak, UserId};
use taskhub_store::StoreTx;

/// Counts a progress write toward the user's daily streak.
pub(crate) fn record_activity(tx: &StoreTx<'_>, user: UserId, now: DateTime<Utc>) -> Result<Streak, Error> {
    let mut streak = tx.streak(user)?.unwrap_or_else(|| Streak::zero(user));
    streak.record_activity(now);
    tx.upsert_streak(&streak)?;
    Ok(streak)
}

/// Streak view. An expired streak is reset to zero and persisted.
pub(crate) fn streak(tx: &StoreTx<'_>, user: UserId, now: DateTime<Utc>) -> Result<StreakView, Error> {
    let Some(stored) = tx.streak(user)? else {
        return Ok(Streak::zero(user).into());
    };
    let effective = stored.effective(now);
    if effective != stored {
        tx.upsert_streak(&effective)?;
    }
    Ok(effective.into())
}

pub(crate) fn summary(tx: &StoreTx<'_>, user: UserId, now: DateTime<Utc>) -> Result<AnalyticsSummary, Error> {
    let counts = tx.personal_task_counts(user)?;
    let streak = tx
        .streak(user)?
        .map_or_else(|| Streak::zero(user), |s| s.effective(now));
    let completion_rate = if counts.total == 0 {
        0.0
    } else {
        counts.completed as f64 / counts.total as f64 * 100.0
    };
    Ok(AnalyticsSummary {
        total_tasks: counts.total,
        completed_tasks: counts.completed,
        pending_tasks: counts.pending,
        in_progress_tasks: counts.in_progress,
        completion_rate,
        current_streak: streak.current,
        longest_streak: streak.longest,
        group_count: tx.count_accepted_memberships(user)?,
        group_task_count: tx.count_group_assignments(user)?,
    })
}
