// SPDX-License-Identifier: Apache-2.0

//! Serde helpers for partial updates.

use serde::{Deserialize, Deserializer};

/// Deserializes a nullable field so that an absent key (`None`, via
/// `#[serde(default)]`) differs from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
