// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::Error;
use taskhub_model::{NewNotification, Notification, NotificationId, NotificationKind, UserId};
use taskhub_store::StoreTx;
use tracing::debug;

pub(crate) fn notify(
    tx: &StoreTx<'_>,
    recipient: UserId,
    kind: NotificationKind,
    title: &str,
    message: String,
    related_id: i64,
    now: DateTime<Utc>,
) -> Result<Notification, Error> {
    let row = tx.insert_notification(
        &NewNotification {
            user_id: recipient,
            kind,
            title: title.to_string(),
            message,
            related_id: Some(related_id),
        },
        now,
    )?;
    debug!(recipient = %recipient, kind = kind.as_str(), "notification queued");
    Ok(row)
}

pub(crate) fn list(tx: &StoreTx<'_>, user: UserId) -> Result<Vec<Notification>, Error> {
    Ok(tx.notifications_of(user)?)
}

pub(crate) fn mark_read(tx: &StoreTx<'_>, user: UserId, id: NotificationId) -> Result<(), Error> {
    if !tx.mark_notification_read(id, user)? {
        return Err(Error::not_found("notification not found"));
    }
    Ok(())
}

pub(crate) fn delete(tx: &StoreTx<'_>, user: UserId, id: NotificationId) -> Result<(), Error> {
    if !tx.delete_notification(id, user)? {
        return Err(Error::not_found("notification not found"));
    }
    Ok(())
}
