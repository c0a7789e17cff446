// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;

pub fn parse_username(input: &str) -> Result<String, ValidationError> {
    let s = input.trim();
    let len = s.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ValidationError(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    if !s
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError(
            "username may contain letters, digits, '_', '-' and '.' only".to_string(),
        ));
    }
    Ok(s.to_string())
}

pub fn parse_email(input: &str) -> Result<String, ValidationError> {
    let s = input.trim();
    let Some((local, domain)) = s.split_once('@') else {
        return Err(ValidationError("email must contain '@'".to_string()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(ValidationError(format!("invalid email: {s}")));
    }
    if s.chars().any(char::is_whitespace) {
        return Err(ValidationError("email must not contain whitespace".to_string()));
    }
    Ok(s.to_ascii_lowercase())
}

pub fn parse_non_empty(field: &str, input: &str) -> Result<String, ValidationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(s.to_string())
}
