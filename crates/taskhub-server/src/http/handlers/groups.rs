// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;
use serde_json::json;
use taskhub_api::dto::{AddMembersRequest, CreateGroupRequest, SearchQuery, UpdateGroupRequest};
use taskhub_model::{GroupId, GroupPatch, UserId};

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::http::response_contract::{created, message, ok, ok_with_message, ApiResult};
use crate::services::{groups, remove_blobs_best_effort};
use crate::AppState;

pub(crate) async fn list_groups_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| groups::list_for(tx, actor.user_id)).await?)
}

pub(crate) async fn create_group_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> ApiResult {
    let view = blocking::write(&state, move |tx, now| {
        groups::create(tx, actor.user_id, &req.name, &req.description, &req.user_ids, now)
    })
    .await?;
    created("group created", view)
}

pub(crate) async fn search_groups_handler(
    State(state): State<AppState>,
    Extension(_actor): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult {
    let limit = state.api.search_limit;
    ok(blocking::read(&state, move |tx, _| groups::search(tx, &query.q, limit)).await?)
}

pub(crate) async fn get_group_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<GroupId>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| groups::get(tx, actor.user_id, id)).await?)
}

pub(crate) async fn update_group_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<GroupId>,
    ApiJson(req): ApiJson<UpdateGroupRequest>,
) -> ApiResult {
    let patch = GroupPatch {
        name: req.name,
        description: req.description,
    };
    let view = blocking::write(&state, move |tx, now| {
        groups::update(tx, actor.user_id, id, patch, now)
    })
    .await?;
    ok_with_message("group updated", view)
}

pub(crate) async fn delete_group_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<GroupId>,
) -> ApiResult {
    let keys = blocking::write(&state, move |tx, _| groups::delete(tx, actor.user_id, id)).await?;
    remove_blobs_best_effort(state.blobs.as_ref(), &keys);
    message("group deleted")
}

pub(crate) async fn add_members_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(id): ApiPath<GroupId>,
    ApiJson(req): ApiJson<AddMembersRequest>,
) -> ApiResult {
    let invited = blocking::write(&state, move |tx, now| {
        groups::add_members(tx, actor.user_id, id, &req.user_ids, now)
    })
    .await?;
    ok_with_message("invitations sent", json!({ "invited": invited }))
}

pub(crate) async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((id, user_id)): ApiPath<(GroupId, UserId)>,
) -> ApiResult {
    blocking::write(&state, move |tx, now| {
        groups::remove_member(tx, actor.user_id, id, user_id, now)
    })
    .await?;
    message("member removed")
}

pub(crate) async fn accept_invitation_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((id, user_id)): ApiPath<(GroupId, UserId)>,
) -> ApiResult {
    blocking::write(&state, move |tx, _| {
        groups::accept_invitation(tx, actor.user_id, id, user_id)
    })
    .await?;
    message("invitation accepted")
}
