// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::Error;
use taskhub_model::{parse_email, parse_username, NewUser, ProfilePatch, Streak, User, UserId};
use taskhub_store::StoreTx;
use tracing::info;

use super::invalid;

/// Creates the account and its streak row. `password_hash` is already
/// hashed; username and email are normalized here.
pub(crate) fn register(tx: &StoreTx<'_>, mut new: NewUser, now: DateTime<Utc>) -> Result<User, Error> {
    new.username = parse_username(&new.username).map_err(invalid)?;
    new.email = parse_email(&new.email).map_err(invalid)?;
    new.full_name = new.full_name.trim().to_string();
    if tx.user_by_username(&new.username)?.is_some() {
        return Err(Error::conflict("username already taken"));
    }
    if tx.user_by_email(&new.email)?.is_some() {
        return Err(Error::conflict("email already registered"));
    }
    let user = tx.insert_user(&new, now)?;
    tx.upsert_streak(&Streak {
        last_activity_at: Some(now),
        ..Streak::zero(user.id)
    })?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub(crate) fn login_candidate(tx: &StoreTx<'_>, username: &str) -> Result<Option<User>, Error> {
    Ok(tx.user_by_username(username.trim())?)
}

pub(crate) fn current_user(tx: &StoreTx<'_>, user: UserId) -> Result<User, Error> {
    tx.user_by_id(user)?
        .ok_or_else(|| Error::not_found("user not found"))
}

pub(crate) fn search(tx: &StoreTx<'_>, query: &str, limit: usize) -> Result<Vec<User>, Error> {
    Ok(tx.search_users(query, limit)?)
}

pub(crate) fn update_profile(
    tx: &StoreTx<'_>,
    actor: UserId,
    mut patch: ProfilePatch,
    now: DateTime<Utc>,
) -> Result<User, Error> {
    let mut user = current_user(tx, actor)?;
    if patch.is_empty() {
        return Ok(user);
    }
    if let Some(username) = &patch.username {
        let username = parse_username(username).map_err(invalid)?;
        if tx
            .user_by_username(&username)?
            .is_some_and(|other| other.id != actor)
        {
            return Err(Error::conflict("username already taken"));
        }
        patch.username = Some(username);
    }
    if let Some(email) = &patch.email {
        let email = parse_email(email).map_err(invalid)?;
        if tx
            .user_by_email(&email)?
            .is_some_and(|other| other.id != actor)
        {
            return Err(Error::conflict("email already registered"));
        }
        patch.email = Some(email);
    }
    patch.apply(&mut user, now);
    tx.update_user(&user)?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{at, store, user};
    use taskhub_core::ErrorCode;

    #[test]
    fn register_creates_streak_and_rejects_duplicates() {
        let store = store();
        let alice = store.write(|tx| user(tx, "alice")).expect("register");
        let streak = store
            .read(|tx| tx.streak(alice.id).map_err(Error::from))
            .expect("read")
            .expect("streak row");
        assert_eq!(streak.current, 0);
        assert_eq!(streak.last_activity_at, Some(at(1, 9)));

        let err = store.write(|tx| user(tx, "alice")).expect_err("duplicate");
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "username already taken");

        let err = store
            .write(|tx| {
                register(
                    tx,
                    NewUser {
                        username: "alice2".to_string(),
                        email: "ALICE@example.com".to_string(),
                        password_hash: "h".to_string(),
                        full_name: String::new(),
                    },
                    at(1, 10),
                )
            })
            .expect_err("duplicate email");
        assert_eq!(err.message, "email already registered");
    }

    #[test]
    fn register_validates_identity_fields() {
        let store = store();
        let err = store
            .write(|tx| {
                register(
                    tx,
                    NewUser {
                        username: "al".to_string(),
                        email: "al@example.com".to_string(),
                        password_hash: "h".to_string(),
                        full_name: String::new(),
                    },
                    at(1, 9),
                )
            })
            .expect_err("short username");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn profile_update_keeps_usernames_unique() {
        let store = store();
        let (alice, _bob) = store
            .write(|tx| Ok::<_, Error>((user(tx, "alice")?, user(tx, "bob")?)))
            .expect("seed");
        let err = store
            .write(|tx| {
                update_profile(
                    tx,
                    alice.id,
                    ProfilePatch {
                        username: Some("bob".to_string()),
                        ..ProfilePatch::default()
                    },
                    at(2, 9),
                )
            })
            .expect_err("taken");
        assert_eq!(err.code, ErrorCode::Conflict);

        let updated = store
            .write(|tx| {
                update_profile(
                    tx,
                    alice.id,
                    ProfilePatch {
                        bio: Some("writes tests".to_string()),
                        username: Some("alice".to_string()),
                        ..ProfilePatch::default()
                    },
                    at(2, 9),
                )
            })
            .expect("update");
        assert_eq!(updated.bio, "writes tests");
        assert_eq!(updated.updated_at, at(2, 9));
    }

    #[test]
    fn search_matches_partial_names() {
        let store = store();
        store
            .write(|tx| {
                user(tx, "alice")?;
                user(tx, "alfred")?;
                user(tx, "bob")
            })
            .expect("seed");
        let found = store.read(|tx| search(tx, "al", 20)).expect("search");
        assert_eq!(found.len(), 2);
        let limited = store.read(|tx| search(tx, "", 1)).expect("search");
        assert_eq!(limited.len(), 1);
    }
}
