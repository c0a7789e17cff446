// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;
use taskhub_api::dto::{CreateTaskRequest, ProgressRequest, TaskView, UpdateTaskRequest};
use taskhub_model::TaskId;

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::extract::{ApiJson, ApiPath};
use crate::http::response_contract::{created, message, ok, ok_with_message, ApiResult};
use crate::services::tasks::TaskDraft;
use crate::services::{progress, remove_blobs_best_effort, tasks};
use crate::AppState;

pub(crate) async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    let rows = blocking::read(&state, move |tx, _| tasks::list_personal(tx, actor.user_id)).await?;
    ok(rows.into_iter().map(TaskView::from).collect::<Vec<_>>())
}

pub(crate) async fn create_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult {
    let draft = TaskDraft {
        file_policy: req.file_policy(),
        title: req.title,
        description: req.description,
        status: req.status,
        due_date: req.due_date,
        start_time: req.start_time,
        end_time: req.end_time,
    };
    let task = blocking::write(&state, move |tx, now| {
        tasks::create_personal(tx, actor.user_id, draft, now)
    })
    .await?;
    created("task created", TaskView::from(task))
}

pub(crate) async fn get_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult {
    let task = blocking::read(&state, move |tx, _| tasks::get(tx, actor.user_id, id)).await?;
    ok(TaskView::from(task))
}

pub(crate) async fn update_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult {
    let patch = req.into_patch();
    let task = blocking::write(&state, move |tx, now| {
        tasks::update_personal(tx, actor.user_id, id, patch, now)
    })
    .await?;
    ok_with_message("task updated", TaskView::from(task))
}

pub(crate) async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult {
    let keys =
        blocking::write(&state, move |tx, _| tasks::delete_personal(tx, actor.user_id, id)).await?;
    remove_blobs_best_effort(state.blobs.as_ref(), &keys);
    message("task deleted")
}

pub(crate) async fn get_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| progress::personal(tx, actor.user_id, id)).await?)
}

pub(crate) async fn set_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(req): ApiJson<ProgressRequest>,
) -> ApiResult {
    let row = blocking::write(&state, move |tx, now| {
        progress::set_personal(tx, actor.user_id, id, req.progress, req.notes, now)
    })
    .await?;
    ok_with_message("progress updated", row)
}
