// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;
use taskhub_api::dto::{
    CreateGroupTaskRequest, GroupProgressView, MemberProgressRequest, ProgressRequest, TaskView,
    UpdateGroupTaskRequest,
};
use taskhub_model::{GroupId, TaskId, UserId};
use taskhub_policies::GroupProgressUpdate;

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::extract::{ApiJson, ApiPath};
use crate::http::response_contract::{created, message, ok, ok_with_message, ApiResult};
use crate::services::tasks::TaskDraft;
use crate::services::{progress, remove_blobs_best_effort, tasks};
use crate::AppState;

pub(crate) async fn list_group_tasks_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(group): ApiPath<GroupId>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| {
        tasks::list_group_tasks(tx, actor.user_id, group)
    })
    .await?)
}

pub(crate) async fn create_group_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(group): ApiPath<GroupId>,
    ApiJson(req): ApiJson<CreateGroupTaskRequest>,
) -> ApiResult {
    let draft = TaskDraft {
        file_policy: req.file_policy(),
        title: req.title,
        description: req.description,
        status: None,
        due_date: req.due_date,
        start_time: req.start_time,
        end_time: req.end_time,
    };
    let assignees = req.user_ids;
    let view = blocking::write(&state, move |tx, now| {
        tasks::create_group_task(tx, actor.user_id, group, draft, &assignees, now)
    })
    .await?;
    created("group task created", view)
}

pub(crate) async fn update_group_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
    ApiJson(req): ApiJson<UpdateGroupTaskRequest>,
) -> ApiResult {
    let patch = req.into_patch();
    let task = blocking::write(&state, move |tx, now| {
        tasks::update_group_task(tx, actor.user_id, group, task, patch, now)
    })
    .await?;
    ok_with_message("group task updated", TaskView::from(task))
}

pub(crate) async fn delete_group_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
) -> ApiResult {
    let keys = blocking::write(&state, move |tx, _| {
        tasks::delete_group_task(tx, actor.user_id, group, task)
    })
    .await?;
    remove_blobs_best_effort(state.blobs.as_ref(), &keys);
    message("group task deleted")
}

pub(crate) async fn list_group_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
) -> ApiResult {
    let rows = blocking::read(&state, move |tx, _| {
        progress::group_rows(tx, actor.user_id, group, task)
    })
    .await?;
    ok(rows
        .into_iter()
        .map(GroupProgressView::from)
        .collect::<Vec<_>>())
}

pub(crate) async fn own_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
) -> ApiResult {
    let row = blocking::read(&state, move |tx, _| {
        progress::own_group(tx, actor.user_id, group, task)
    })
    .await?;
    ok(GroupProgressView::from(row))
}

pub(crate) async fn set_own_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
    ApiJson(req): ApiJson<ProgressRequest>,
) -> ApiResult {
    let row = blocking::write(&state, move |tx, now| {
        progress::set_own_group(tx, actor.user_id, group, task, req.progress, req.notes, now)
    })
    .await?;
    ok_with_message("progress updated", GroupProgressView::from(row))
}

pub(crate) async fn set_member_progress_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task, member)): ApiPath<(GroupId, TaskId, UserId)>,
    ApiJson(req): ApiJson<MemberProgressRequest>,
) -> ApiResult {
    let update = GroupProgressUpdate {
        progress: req.progress,
        notes: req.notes,
        approve: req.approved,
    };
    let row = blocking::write(&state, move |tx, now| {
        progress::set_member_group(tx, actor.user_id, group, task, member, &update, now)
    })
    .await?;
    ok_with_message("member progress updated", GroupProgressView::from(row))
}
