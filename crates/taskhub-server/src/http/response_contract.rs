// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taskhub_api::{map_error, ApiEnvelope, ApiError};
use taskhub_core::ErrorCode;
use tracing::error;

#[must_use]
pub(crate) fn api_error_status(err: &ApiError) -> StatusCode {
    StatusCode::from_u16(map_error(err).status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[must_use]
pub(crate) fn api_error_response(status: StatusCode, err: &ApiError) -> Response {
    (status, Json(ApiEnvelope::<()>::failure(err))).into_response()
}

/// Handler error: renders the failure envelope with the mapped status.
#[derive(Debug)]
pub(crate) struct ApiFailure(pub ApiError);

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<taskhub_core::Error> for ApiFailure {
    fn from(err: taskhub_core::Error) -> Self {
        if err.is(ErrorCode::Internal) {
            error!(error = %err, "request failed");
        }
        Self(ApiError::from(err))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        api_error_response(api_error_status(&self.0), &self.0)
    }
}

pub(crate) type ApiResult = Result<Response, ApiFailure>;

pub(crate) fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok(Json(ApiEnvelope::ok(data)).into_response())
}

pub(crate) fn ok_with_message<T: Serialize>(message: &str, data: T) -> ApiResult {
    Ok(Json(ApiEnvelope::ok_with_message(message, data)).into_response())
}

pub(crate) fn created<T: Serialize>(message: &str, data: T) -> ApiResult {
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(message, data)),
    )
        .into_response())
}

pub(crate) fn message(message: &str) -> ApiResult {
    Ok(Json(ApiEnvelope::<()>::message_only(message)).into_response())
}
