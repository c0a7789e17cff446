// SPDX-License-Identifier: Apache-2.0

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use taskhub_api::dto::{FileView, FilesByUserQuery};
use taskhub_api::{ApiError, ApiErrorCode};
use taskhub_model::{FileId, GroupId, TaskId};
use taskhub_policies::sanitize_filename;

use crate::auth::AuthUser;
use crate::http::blocking;
use crate::http::extract::{ApiPath, ApiQuery};
use crate::http::response_contract::{created, message, ok, ok_with_message, ApiFailure, ApiResult};
use crate::services::files::{self, Upload};
use crate::AppState;

const UPLOAD_FIELD: &str = "file";
const FALLBACK_MIME: &str = "application/octet-stream";

fn multipart_failure(err: &MultipartError) -> ApiFailure {
    let code = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiErrorCode::PayloadTooLarge
    } else {
        ApiErrorCode::ValidationFailed
    };
    ApiFailure(ApiError::new(code, err.body_text()))
}

/// Reads the `file` part; other parts are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiFailure> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(&e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MIME)
            .to_ascii_lowercase();
        let bytes = field.bytes().await.map_err(|e| multipart_failure(&e))?;
        return Ok(Upload {
            filename,
            mime_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiFailure(ApiError::validation_failed(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    ))))
}

pub(crate) async fn upload_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(task): ApiPath<TaskId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let mut multipart =
        multipart.map_err(|e| ApiFailure(ApiError::validation_failed(e.body_text())))?;
    let upload = read_upload(&mut multipart).await?;
    let record = blocking::write_with_blobs(&state, move |tx, blobs, staged, now| {
        files::upload(tx, blobs, actor.user_id, task, upload, now, staged)
    })
    .await?;
    created("file uploaded", FileView::from(record))
}

pub(crate) async fn list_task_files_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(task): ApiPath<TaskId>,
) -> ApiResult {
    let rows = blocking::read(&state, move |tx, _| files::list_for_task(tx, actor.user_id, task)).await?;
    ok(rows.into_iter().map(FileView::from).collect::<Vec<_>>())
}

pub(crate) async fn member_files_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, task)): ApiPath<(GroupId, TaskId)>,
    ApiQuery(query): ApiQuery<FilesByUserQuery>,
) -> ApiResult {
    let rows = blocking::read(&state, move |tx, _| {
        files::list_for_member(tx, actor.user_id, group, task, query.user_id)
    })
    .await?;
    ok(rows.into_iter().map(FileView::from).collect::<Vec<_>>())
}

pub(crate) async fn download_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(file): ApiPath<FileId>,
) -> ApiResult {
    let blobs = state.blobs.clone();
    let (record, bytes) = blocking::read(&state, move |tx, _| {
        files::download(tx, blobs.as_ref(), actor.user_id, file)
    })
    .await?;
    let content_type = HeaderValue::from_str(&record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&record.filename)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response())
}

pub(crate) async fn delete_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath(file): ApiPath<FileId>,
) -> ApiResult {
    let blobs = state.blobs.clone();
    blocking::write(&state, move |tx, _| {
        files::delete(tx, blobs.as_ref(), actor.user_id, file)
    })
    .await?;
    message("file deleted")
}

pub(crate) async fn approve_file_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    ApiPath((group, file)): ApiPath<(GroupId, FileId)>,
) -> ApiResult {
    let record = blocking::write(&state, move |tx, now| {
        files::approve(tx, actor.user_id, group, file, now)
    })
    .await?;
    ok_with_message("file approved", FileView::from(record))
}
