// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

macro_rules! row_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                let raw: i64 = input.trim().parse().map_err(|_| {
                    ValidationError(format!("{} must be a positive integer", $kind))
                })?;
                if raw <= 0 {
                    return Err(ValidationError(format!(
                        "{} must be a positive integer",
                        $kind
                    )));
                }
                Ok(Self(raw))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

row_id!(UserId, "user id");
row_id!(GroupId, "group id");
row_id!(TaskId, "task id");
row_id!(FileId, "file id");
row_id!(NotificationId, "notification id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_and_garbage() {
        assert_eq!(TaskId::parse(" 42 ").expect("valid").get(), 42);
        assert!(TaskId::parse("0").is_err());
        assert!(GroupId::parse("-3").is_err());
        let err = UserId::parse("abc").expect_err("not numeric");
        assert!(err.to_string().contains("user id"));
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&FileId::new(7)).expect("serialize");
        assert_eq!(json, "7");
    }
}
