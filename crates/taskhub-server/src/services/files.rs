// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::{sha256_hex, Error};
use taskhub_model::{
    FileId, FileRecord, GroupId, GroupTaskProgress, NewFileRecord, NotificationKind, TaskId,
    UserId,
};
use taskhub_policies::{check_upload_quota, display_filename, matches_allowed_types, storage_key};
use taskhub_store::{BlobStore, StoreTx};
use tracing::{info, warn};

use super::access::{
    load_file, load_group_task, load_task, require_admin, require_file_owner_or_task_creator,
    require_member, require_task_access,
};
use super::notifications::notify;
use super::progress::recompute_group_task_status;

/// One uploaded part as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Upload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// First key not taken by a record or an existing blob.
fn unused_storage_key(tx: &StoreTx<'_>, blobs: &dyn BlobStore, base: String) -> Result<String, Error> {
    let mut candidate = base.clone();
    let mut n = 0u32;
    while tx.storage_key_in_use(&candidate)? || blobs.exists(&candidate)? {
        n += 1;
        candidate = format!("{base}.{n}");
    }
    Ok(candidate)
}

/// Saves the contents and records them. The saved key is pushed onto
/// `staged` so the caller can remove it if the transaction fails later.
pub(crate) fn upload(
    tx: &StoreTx<'_>,
    blobs: &dyn BlobStore,
    actor: UserId,
    task: TaskId,
    upload: Upload,
    now: DateTime<Utc>,
    staged: &mut Vec<String>,
) -> Result<FileRecord, Error> {
    let task = load_task(tx, task)?;
    require_task_access(tx, actor, &task)?;
    if upload.bytes.is_empty() {
        return Err(Error::invalid_input("uploaded file is empty"));
    }
    let filename = display_filename(&upload.filename);
    if !matches_allowed_types(&task.file_policy, &filename, &upload.mime_type) {
        return Err(Error::invalid_input(format!(
            "file type not allowed; allowed types: {}",
            task.file_policy.allowed_types_joined()
        )));
    }
    check_upload_quota(&task.file_policy, tx.count_files_of_task(task.id)?)?;

    let key = unused_storage_key(tx, blobs, storage_key(task.id, actor, now, &filename))?;
    blobs.save(&key, &upload.bytes)?;
    staged.push(key.clone());
    let record = tx.insert_file(
        &NewFileRecord {
            task_id: task.id,
            user_id: actor,
            filename: filename.clone(),
            storage_key: key,
            size: upload.bytes.len() as u64,
            mime_type: upload.mime_type,
            sha256: sha256_hex(&upload.bytes),
        },
        now,
    )?;

    if task.is_group_task() {
        let mut row = tx
            .group_progress(task.id, actor)?
            .unwrap_or_else(|| GroupTaskProgress::assigned(task.id, actor, task.creator_id, now));
        row.notes = format!("Uploaded file: {filename}");
        row.updated_at = now;
        tx.upsert_group_progress(&row)?;
        recompute_group_task_status(tx, task.id, now)?;
    }
    if actor != task.creator_id {
        notify(
            tx,
            task.creator_id,
            NotificationKind::FileUploaded,
            "New file uploaded",
            format!("A file \"{filename}\" was uploaded to \"{}\"", task.title),
            record.id.get(),
            now,
        )?;
    }
    info!(file_id = %record.id, task_id = %task.id, size = record.size, "file uploaded");
    Ok(record)
}

pub(crate) fn list_for_task(tx: &StoreTx<'_>, actor: UserId, task: TaskId) -> Result<Vec<FileRecord>, Error> {
    let task = load_task(tx, task)?;
    require_task_access(tx, actor, &task)?;
    Ok(tx.files_of_task(task.id)?)
}

/// Files on a group task, optionally narrowed to one uploader.
pub(crate) fn list_for_member(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    task: TaskId,
    uploader: Option<UserId>,
) -> Result<Vec<FileRecord>, Error> {
    require_member(tx, group, actor)?;
    let task = load_group_task(tx, group, task)?;
    Ok(match uploader {
        Some(user) => tx.files_of_task_by_user(task.id, user)?,
        None => tx.files_of_task(task.id)?,
    })
}

/// Record and contents. Personal task files are readable by the task
/// creator and the uploader; group task files by accepted members.
pub(crate) fn download(
    tx: &StoreTx<'_>,
    blobs: &dyn BlobStore,
    actor: UserId,
    file: FileId,
) -> Result<(FileRecord, Vec<u8>), Error> {
    let file = load_file(tx, file)?;
    let task = load_task(tx, file.task_id)?;
    match task.group_id {
        Some(group) => {
            require_member(tx, group, actor)?;
        }
        None => require_file_owner_or_task_creator(actor, &file, &task)?,
    }
    if !blobs.exists(&file.storage_key)? {
        return Err(Error::not_found("file contents are missing from storage"));
    }
    let bytes = blobs.open_for_read(&file.storage_key)?;
    Ok((file, bytes))
}

/// Removes the stored contents (best effort) and then the record.
pub(crate) fn delete(tx: &StoreTx<'_>, blobs: &dyn BlobStore, actor: UserId, file: FileId) -> Result<(), Error> {
    let file = load_file(tx, file)?;
    let task = load_task(tx, file.task_id)?;
    require_file_owner_or_task_creator(actor, &file, &task)?;
    if let Err(err) = blobs.remove(&file.storage_key) {
        warn!(file_id = %file.id, storage_key = %file.storage_key, error = %err, "failed to remove stored file");
    }
    tx.delete_file(file.id)?;
    Ok(())
}

/// Marks a file approved. Re-approving re-stamps approver and time.
pub(crate) fn approve(
    tx: &StoreTx<'_>,
    actor: UserId,
    group: GroupId,
    file: FileId,
    now: DateTime<Utc>,
) -> Result<FileRecord, Error> {
    require_admin(tx, group, actor)?;
    let mut file = load_file(tx, file)?;
    let task = load_task(tx, file.task_id)?;
    if task.group_id != Some(group) {
        return Err(Error::forbidden(
            taskhub_policies::DenyReason::TaskNotInGroup.message(),
        ));
    }
    file.approved = true;
    file.approved_by = Some(actor);
    file.approved_at = Some(now);
    tx.set_file_approval(&file)?;
    if file.user_id != actor {
        notify(
            tx,
            file.user_id,
            NotificationKind::FileApproved,
            "File approved",
            format!("Your file \"{}\" was approved", file.filename),
            file.id.get(),
            now,
        )?;
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{at, store, user};
    use crate::services::write_with_staged_blobs;
    use crate::services::groups;
    use crate::services::tasks::{self, tests::draft};
    use taskhub_core::ErrorCode;
    use taskhub_model::{FilePolicy, TaskStatus};
    use taskhub_store::{MemoryBlobStore, SqliteStore};

    fn pdf(name: &str) -> Upload {
        Upload {
            filename: name.to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    fn put(
        store: &SqliteStore,
        blobs: &MemoryBlobStore,
        actor: UserId,
        task: TaskId,
        file: Upload,
        now: DateTime<Utc>,
    ) -> Result<FileRecord, Error> {
        write_with_staged_blobs(store, blobs, |tx, staged| {
            upload(tx, blobs, actor, task, file, now, staged)
        })
    }

    fn personal_task(store: &SqliteStore, policy: FilePolicy) -> (UserId, TaskId) {
        store
            .write(|tx| {
                let alice = user(tx, "alice")?;
                let mut d = draft("report");
                d.file_policy = policy;
                let task = tasks::create_personal(tx, alice.id, d, at(2, 9))?;
                Ok::<_, Error>((alice.id, task.id))
            })
            .expect("seed")
    }

    #[test]
    fn quota_stops_uploads_at_max_files() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(
            &store,
            FilePolicy {
                max_files: 2,
                ..FilePolicy::default()
            },
        );
        for name in ["a.pdf", "b.pdf"] {
            put(&store, &blobs, alice, task, pdf(name), at(2, 10))
                .expect("within quota");
        }
        let err = put(&store, &blobs, alice, task, pdf("c.pdf"), at(2, 10))
            .expect_err("quota");
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(blobs.keys().len(), 2);
    }

    #[test]
    fn same_second_uploads_get_distinct_keys() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(&store, FilePolicy::default());
        let a = put(&store, &blobs, alice, task, pdf("same.pdf"), at(2, 10))
            .expect("first");
        let b = put(&store, &blobs, alice, task, pdf("same.pdf"), at(2, 10))
            .expect("second");
        assert_ne!(a.storage_key, b.storage_key);
        assert_eq!(b.storage_key, format!("{}.1", a.storage_key));
        assert_eq!(a.sha256, b.sha256);
    }

    #[test]
    fn allowed_types_and_empty_files_are_enforced() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(
            &store,
            FilePolicy {
                allowed_types: FilePolicy::parse_allowed_types("png,jpg"),
                ..FilePolicy::default()
            },
        );
        let err = put(&store, &blobs, alice, task, pdf("doc.pdf"), at(2, 10))
            .expect_err("type");
        assert_eq!(err.code, ErrorCode::InvalidInput);
        let empty = Upload {
            filename: "x.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: Vec::new(),
        };
        let err = put(&store, &blobs, alice, task, empty, at(2, 10))
            .expect_err("empty");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn delete_survives_blob_removal_failure() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(&store, FilePolicy::default());
        let file = put(&store, &blobs, alice, task, pdf("a.pdf"), at(2, 10))
            .expect("upload");
        blobs.set_fail_removals(true);
        store
            .write(|tx| delete(tx, &blobs, alice, file.id))
            .expect("record removed anyway");
        let err = store
            .read(|tx| download(tx, &blobs, alice, file.id))
            .expect_err("gone");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn group_upload_touches_progress_notes_and_notifies_creator() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (admin, member, group, task) = store
            .write(|tx| {
                let admin = user(tx, "alice")?;
                let member = user(tx, "bob")?;
                let g = groups::create(tx, admin.id, "team", "", &[member.id], at(2, 9))?;
                groups::accept_invitation(tx, member.id, g.group.id, member.id)?;
                let view = tasks::create_group_task(
                    tx,
                    admin.id,
                    g.group.id,
                    draft("ship"),
                    &[member.id],
                    at(2, 10),
                )?;
                Ok::<_, Error>((admin.id, member.id, g.group.id, view.task.task.id))
            })
            .expect("seed");
        let file = put(&store, &blobs, member, task, pdf("proof.pdf"), at(2, 11))
            .expect("upload");
        let row = store
            .read(|tx| Ok::<_, Error>(tx.group_progress(task, member)?.expect("row")))
            .expect("row");
        assert_eq!(row.notes, "Uploaded file: proof.pdf");
        let notes = store
            .read(|tx| Ok::<_, Error>(tx.notifications_of(admin)?))
            .expect("notes");
        assert!(notes.iter().any(|n| n.kind == NotificationKind::FileUploaded));

        let approved = store
            .write(|tx| approve(tx, admin, group, file.id, at(3, 9)))
            .expect("approve");
        assert_eq!(approved.approved_by, Some(admin));
        let again = store
            .write(|tx| approve(tx, admin, group, file.id, at(4, 9)))
            .expect("approve twice");
        assert_eq!(again.approved_at, Some(at(4, 9)));

        let err = store
            .write(|tx| approve(tx, member, group, file.id, at(4, 9)))
            .expect_err("member approve");
        assert_eq!(err.code, ErrorCode::Forbidden);

        let (_, bytes) = store
            .read(|tx| download(tx, &blobs, admin, file.id))
            .expect("download");
        assert_eq!(bytes, b"%PDF-1.7");
        let status = store
            .read(|tx| Ok::<_, Error>(tx.task_by_id(task)?.expect("task").status))
            .expect("status");
        assert_eq!(status, TaskStatus::Pending);
    }

    #[test]
    fn approving_a_file_from_another_group_is_forbidden() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let err = write_with_staged_blobs(&store, &blobs, |tx, staged| {
            let alice = user(tx, "alice")?;
            let g1 = groups::create(tx, alice.id, "one", "", &[], at(2, 9))?;
            let g2 = groups::create(tx, alice.id, "two", "", &[], at(2, 9))?;
            let view =
                tasks::create_group_task(tx, alice.id, g1.group.id, draft("t"), &[], at(2, 9))?;
            let file = upload(
                tx,
                &blobs,
                alice.id,
                view.task.task.id,
                pdf("a.pdf"),
                at(2, 10),
                staged,
            )?;
            approve(tx, alice.id, g2.group.id, file.id, at(2, 11))
        })
        .expect_err("cross group");
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(blobs.keys().is_empty(), "rolled back upload left its blob");
    }

    #[test]
    fn other_users_personal_files_read_as_missing() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(&store, FilePolicy::default());
        let file = put(&store, &blobs, alice, task, pdf("a.pdf"), at(2, 10)).expect("upload");
        let bob = store.write(|tx| user(tx, "bob")).expect("bob").id;
        let missing_task = TaskId::new(task.get() + 100);
        let missing_file = FileId::new(file.id.get() + 100);

        for target in [task, missing_task] {
            let err = put(&store, &blobs, bob, target, pdf("b.pdf"), at(2, 11)).expect_err("upload");
            assert_eq!(err.code, ErrorCode::NotFound);
            let err = store
                .read(|tx| list_for_task(tx, bob, target))
                .expect_err("list");
            assert_eq!(err.code, ErrorCode::NotFound);
        }
        for target in [file.id, missing_file] {
            let err = store
                .read(|tx| download(tx, &blobs, bob, target))
                .expect_err("download");
            assert_eq!(err.code, ErrorCode::NotFound);
            let err = store
                .write(|tx| delete(tx, &blobs, bob, target))
                .expect_err("delete");
            assert_eq!(err.code, ErrorCode::NotFound);
        }
        assert_eq!(blobs.keys().len(), 1);
    }

    #[test]
    fn display_name_keeps_unicode_while_key_stays_ascii() {
        let store = store();
        let blobs = MemoryBlobStore::default();
        let (alice, task) = personal_task(&store, FilePolicy::default());
        let file = put(&store, &blobs, alice, task, pdf("گزارش.pdf"), at(2, 10)).expect("upload");
        assert_eq!(file.filename, "گزارش.pdf");
        assert!(file.storage_key.ends_with("_____.pdf"));
        assert!(file.storage_key.is_ascii());
    }
}
