// SPDX-License-Identifier: Apache-2.0

use axum::Json;
use serde_json::{json, Value};
use taskhub_api::openapi_v1_spec;

use crate::http::response_contract::{ok, ApiResult};

pub(crate) async fn health_handler() -> ApiResult {
    ok(json!({
        "status": "ok",
        "service": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn openapi_handler() -> Json<Value> {
    Json(openapi_v1_spec())
}
