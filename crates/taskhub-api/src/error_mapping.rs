// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    let status_code = match error.code {
        ApiErrorCode::ValidationFailed | ApiErrorCode::QuotaExceeded => 400,
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Conflict => 409,
        ApiErrorCode::PayloadTooLarge => 413,
        _ => 500,
    };
    ApiErrorMapping { status_code }
}
