// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
mod envelope;
mod error_mapping;
mod errors;
mod openapi;
pub mod patch;

pub use envelope::ApiEnvelope;
pub use error_mapping::{map_error, ApiErrorMapping};
pub use errors::{ApiError, ApiErrorCode};
pub use openapi::{openapi_v1_spec, ApiRoute, API_ROUTES};

pub const CRATE_NAME: &str = "taskhub-api";
