// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

pub mod errors;
pub mod ports;

pub use errors::{Error, ErrorCode, Result};
pub use ports::{Clock, FixedClock, SystemClock};

pub const CRATE_NAME: &str = "taskhub-core";

pub const ENV_TASKHUB_LOG_JSON: &str = "TASKHUB_LOG_JSON";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
