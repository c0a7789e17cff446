// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use taskhub_core::{Clock, SystemClock};
use taskhub_store::{BlobStore, SqliteStore};

mod auth;
mod config;
mod http;
mod middleware;
mod services;

pub use auth::{hash_password, verify_password, Claims, TokenService};
pub use config::{validate_startup_config_contract, ApiConfig, AuthConfig};

pub const CRATE_NAME: &str = "taskhub-server";

#[derive(Clone)]
pub struct AppState {
    pub api: ApiConfig,
    pub store: Arc<SqliteStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<TokenService>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(api: ApiConfig, store: Arc<SqliteStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_clock(api, store, blobs, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        api: ApiConfig,
        store: Arc<SqliteStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&api.auth));
        Self {
            api,
            store,
            blobs,
            clock,
            tokens,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    use http::handlers::{analytics, files, group_tasks, groups, health, notifications, tasks, users};

    let protected = Router::new()
        .route("/api/me", get(users::me_handler))
        .route("/api/users/search", get(users::search_users_handler))
        .route("/api/profile", put(users::update_profile_handler))
        .route(
            "/api/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route(
            "/api/tasks/:id",
            get(tasks::get_task_handler)
                .put(tasks::update_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .route(
            "/api/tasks/:id/progress",
            get(tasks::get_progress_handler).put(tasks::set_progress_handler),
        )
        .route(
            "/api/tasks/:id/files",
            get(files::list_task_files_handler).post(files::upload_file_handler).layer(
                DefaultBodyLimit::max(state.api.max_upload_bytes),
            ),
        )
        .route(
            "/api/files/:id",
            get(files::download_file_handler).delete(files::delete_file_handler),
        )
        .route(
            "/api/groups",
            get(groups::list_groups_handler).post(groups::create_group_handler),
        )
        .route("/api/groups/search", get(groups::search_groups_handler))
        .route(
            "/api/groups/:id",
            get(groups::get_group_handler)
                .put(groups::update_group_handler)
                .delete(groups::delete_group_handler),
        )
        .route("/api/groups/:id/members", post(groups::add_members_handler))
        .route(
            "/api/groups/:id/members/:user_id",
            delete(groups::remove_member_handler),
        )
        .route(
            "/api/groups/:id/members/:user_id/accept",
            post(groups::accept_invitation_handler),
        )
        .route(
            "/api/groups/:id/tasks",
            get(group_tasks::list_group_tasks_handler).post(group_tasks::create_group_task_handler),
        )
        .route(
            "/api/groups/:id/tasks/:task_id",
            put(group_tasks::update_group_task_handler)
                .delete(group_tasks::delete_group_task_handler),
        )
        .route(
            "/api/groups/:id/tasks/:task_id/progress",
            get(group_tasks::list_group_progress_handler)
                .put(group_tasks::set_own_progress_handler),
        )
        .route(
            "/api/groups/:id/tasks/:task_id/progress/me",
            get(group_tasks::own_progress_handler),
        )
        .route(
            "/api/groups/:id/tasks/:task_id/members/:user_id/progress",
            put(group_tasks::set_member_progress_handler),
        )
        .route(
            "/api/groups/:id/tasks/:task_id/files",
            get(files::member_files_handler),
        )
        .route(
            "/api/groups/:id/files/:file_id/approve",
            post(files::approve_file_handler),
        )
        .route("/api/notifications", get(notifications::list_handler))
        .route(
            "/api/notifications/:id/read",
            put(notifications::mark_read_handler),
        )
        .route("/api/notifications/:id", delete(notifications::delete_handler))
        .route("/api/analytics/streak", get(analytics::streak_handler))
        .route("/api/analytics/summary", get(analytics::summary_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            auth::require_bearer_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/openapi.json", get(health::openapi_handler))
        .route("/api/register", post(users::register_handler))
        .route("/api/login", post(users::login_handler))
        .merge(protected)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
