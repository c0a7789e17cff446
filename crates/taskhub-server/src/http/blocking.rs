// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::Error;
use taskhub_store::{BlobStore, StoreTx};

use super::response_contract::ApiFailure;
use crate::services::write_with_staged_blobs;
use crate::AppState;

async fn run_blocking<T, F>(f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))?
        .map_err(ApiFailure::from)
}

/// Runs `f` inside one immediate write transaction off the async runtime.
pub(crate) async fn write<T, F>(state: &AppState, f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce(&StoreTx<'_>, DateTime<Utc>) -> Result<T, Error> + Send + 'static,
{
    let store = state.store.clone();
    let now = state.clock.now();
    run_blocking(move || store.write(|tx| f(tx, now))).await
}

/// Like [`write`] for operations that save blobs before their records
/// commit. Staged blobs are removed again when the transaction fails.
pub(crate) async fn write_with_blobs<T, F>(state: &AppState, f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce(&StoreTx<'_>, &dyn BlobStore, &mut Vec<String>, DateTime<Utc>) -> Result<T, Error>
        + Send
        + 'static,
{
    let store = state.store.clone();
    let blobs = state.blobs.clone();
    let now = state.clock.now();
    run_blocking(move || {
        write_with_staged_blobs(&store, blobs.as_ref(), |tx, staged| {
            f(tx, blobs.as_ref(), staged, now)
        })
    })
    .await
}

pub(crate) async fn read<T, F>(state: &AppState, f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce(&StoreTx<'_>, DateTime<Utc>) -> Result<T, Error> + Send + 'static,
{
    let store = state.store.clone();
    let now = state.clock.now();
    run_blocking(move || store.read(|tx| f(tx, now))).await
}

/// CPU-bound work such as password hashing.
pub(crate) async fn compute<T, F>(f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    run_blocking(f).await
}
