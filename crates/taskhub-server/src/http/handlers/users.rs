// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::Extension;
use taskhub_api::dto::{AuthResponse, LoginRequest, RegisterRequest, SearchQuery, UpdateProfileRequest};
use taskhub_core::Error;
use taskhub_model::{NewUser, ProfilePatch};
use tracing::info;

use crate::auth::{check_password_strength, hash_password, verify_password, AuthUser};
use crate::http::blocking;
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::response_contract::{created, ok, ok_with_message, ApiFailure, ApiResult};
use crate::services::users;
use crate::AppState;

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult {
    check_password_strength(&req.password, state.api.auth.min_password_chars)?;
    let password = req.password;
    let password_hash = blocking::compute(move || hash_password(&password)).await?;
    let new = NewUser {
        username: req.username,
        email: req.email,
        password_hash,
        full_name: req.full_name,
    };
    let user = blocking::write(&state, move |tx, now| users::register(tx, new, now)).await?;
    let token = state.tokens.issue(&user, state.clock.now())?;
    created("registration successful", AuthResponse { token, user })
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult {
    let username = req.username.clone();
    let candidate =
        blocking::read(&state, move |tx, _| users::login_candidate(tx, &username)).await?;
    let password = req.password;
    let user = blocking::compute(move || {
        Ok(candidate.filter(|user| verify_password(&password, &user.password_hash)))
    })
    .await?
    .ok_or_else(|| ApiFailure::from(Error::unauthorized("invalid username or password")))?;
    let token = state.tokens.issue(&user, state.clock.now())?;
    info!(user_id = %user.id, "user logged in");
    ok_with_message("login successful", AuthResponse { token, user })
}

pub(crate) async fn me_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult {
    ok(blocking::read(&state, move |tx, _| users::current_user(tx, actor.user_id)).await?)
}

pub(crate) async fn search_users_handler(
    State(state): State<AppState>,
    Extension(_actor): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult {
    let limit = state.api.search_limit;
    ok(blocking::read(&state, move |tx, _| users::search(tx, &query.q, limit)).await?)
}

pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult {
    let patch = ProfilePatch {
        username: req.username,
        email: req.email,
        full_name: req.full_name,
        bio: req.bio,
        avatar_url: req.avatar_url,
    };
    let user = blocking::write(&state, move |tx, now| {
        users::update_profile(tx, actor.user_id, patch, now)
    })
    .await?;
    ok_with_message("profile updated", user)
}
