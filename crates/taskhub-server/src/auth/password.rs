// SPDX-License-Identifier: Apache-2.0

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use taskhub_core::Error;

pub const MAX_PASSWORD_CHARS: usize = 128;

/// Argon2id PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("password hashing failed: {e}")))
}

/// False for a mismatch and for an unparseable stored hash alike.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

pub(crate) fn check_password_strength(password: &str, min_chars: usize) -> Result<(), Error> {
    let len = password.chars().count();
    if len < min_chars {
        return Err(Error::invalid_input(format!(
            "password must be at least {min_chars} characters"
        )));
    }
    if len > MAX_PASSWORD_CHARS {
        return Err(Error::invalid_input(format!(
            "password must be at most {MAX_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
