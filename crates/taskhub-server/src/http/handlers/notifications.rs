// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;
use taskhub_model::NotificationId;

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::extract::ApiPath;
use crate::http::response_contract::{message, ok, ApiResult};
use crate::services::notifications;
use crate::AppState;

pub(crate) async fn list_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| notifications::list(tx, actor.user_id)).await?)
}

pub(crate) async fn mark_read_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult {
    blocking::write(&state, move |tx, _| notifications::mark_read(tx, actor.user_id, id)).await?;
    message("notification marked as read")
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult {
    blocking::write(&state, move |tx, _| notifications::delete(tx, actor.user_id, id)).await?;
    message("notification deleted")
}
