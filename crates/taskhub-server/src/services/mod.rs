// SPDX-License-Identifier: Apache-2.0

//! Operations over one store transaction. Each function takes the
//! transaction, the acting user and `now` explicitly; nothing here reads
//! ambient state.

pub(crate) mod access;
pub(crate) mod analytics;
pub(crate) mod files;
pub(crate) mod groups;
pub(crate) mod notifications;
pub(crate) mod progress;
pub(crate) mod tasks;
pub(crate) mod users;

use taskhub_core::Error;
use taskhub_model::ValidationError;
use taskhub_store::{BlobStore, SqliteStore, StoreTx};
use tracing::warn;

pub(crate) fn invalid(err: ValidationError) -> Error {
    Error::invalid_input(err.0)
}

/// Removes blobs after their records are gone; failures are only logged.
pub(crate) fn remove_blobs_best_effort(blobs: &dyn BlobStore, keys: &[String]) {
    for key in keys {
        if let Err(err) = blobs.remove(key) {
            warn!(storage_key = %key, error = %err, "failed to remove stored file");
        }
    }
}

/// Runs `f` in one write transaction. Keys that `f` pushes onto the staged
/// list after saving their blobs are removed again unless the transaction
/// commits.
pub(crate) fn write_with_staged_blobs<T>(
    store: &SqliteStore,
    blobs: &dyn BlobStore,
    f: impl FnOnce(&StoreTx<'_>, &mut Vec<String>) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut staged = Vec::new();
    let result = store.write(|tx| f(tx, &mut staged));
    if result.is_err() {
        remove_blobs_best_effort(blobs, &staged);
    }
    result
}
