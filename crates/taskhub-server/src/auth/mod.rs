// SPDX-License-Identifier: Apache-2.0

mod password;
mod tokens;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use taskhub_api::ApiError;
use taskhub_model::UserId;
use tracing::debug;

use crate::http::response_contract::ApiFailure;
use crate::AppState;

pub(crate) use password::check_password_strength;
pub use password::{hash_password, verify_password};
pub use tokens::{Claims, TokenService};

/// Identity attached to a request once its bearer token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub user_id: UserId,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

pub(crate) async fn require_bearer_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ApiFailure(ApiError::unauthorized("missing bearer token")).into_response();
    };
    match state
        .tokens
        .verify(token, state.clock.now())
        .and_then(|claims| claims.user_id())
    {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        Err(err) => {
            debug!(error = %err, "bearer token rejected");
            ApiFailure(ApiError::unauthorized("invalid or expired token")).into_response()
        }
    }
}
