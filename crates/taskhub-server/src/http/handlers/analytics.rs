// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::response_contract::{ok, ApiResult};
use crate::services::analytics;
use crate::AppState;

pub(crate) async fn streak_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    ok(blocking::write(&state, move |tx, now| analytics::streak(tx, actor.user_id, now)).await?)
}

pub(crate) async fn summary_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, now| analytics::summary(tx, actor.user_id, now)).await?)
}
