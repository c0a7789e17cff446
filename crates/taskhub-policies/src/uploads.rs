// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use taskhub_core::Error;
use taskhub_model::{FilePolicy, TaskId, UserId};

const FILENAME_MAX_LEN: usize = 128;

pub fn check_upload_quota(policy: &FilePolicy, existing_files: u64) -> Result<(), Error> {
    if policy.max_files > 0 && existing_files >= u64::from(policy.max_files) {
        return Err(Error::quota_exceeded(format!(
            "maximum number of files ({}) reached for this task",
            policy.max_files
        )));
    }
    Ok(())
}

/// An empty allow-list accepts everything. Each entry matches the mime
/// top-level type (`image`), the mime subtype (`pdf`) or the extension.
#[must_use]
pub fn matches_allowed_types(policy: &FilePolicy, filename: &str, mime_type: &str) -> bool {
    if policy.allowed_types.is_empty() {
        return true;
    }
    let mime = mime_type.to_ascii_lowercase();
    let (top, sub) = mime.split_once('/').unwrap_or((mime.as_str(), ""));
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    policy
        .allowed_types
        .iter()
        .any(|allowed| allowed == top || allowed == sub || *allowed == extension)
}

fn base_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or_default()
}

/// Name shown back to users: the last path component with control
/// characters dropped. Non-ASCII text is kept as sent.
#[must_use]
pub fn display_filename(raw: &str) -> String {
    let cleaned: String = base_name(raw)
        .chars()
        .filter(|c| !c.is_control())
        .take(FILENAME_MAX_LEN)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Last path component of a client supplied name, restricted to a safe
/// character set. Used for storage keys and header values.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = base_name(raw)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(FILENAME_MAX_LEN)
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Storage key for an upload. Not content addressed: identical bytes
/// uploaded twice get two keys.
#[must_use]
pub fn storage_key(task: TaskId, uploader: UserId, at: DateTime<Utc>, filename: &str) -> String {
    format!(
        "tasks/{task}/{uploader}_{}_{}",
        at.timestamp(),
        sanitize_filename(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_files: u32, allowed: &[&str]) -> FilePolicy {
        FilePolicy {
            require_files: false,
            max_files,
            allowed_types: allowed.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn quota_rejects_at_limit_and_zero_is_unlimited() {
        let limited = policy(3, &[]);
        assert!(check_upload_quota(&limited, 2).is_ok());
        let err = check_upload_quota(&limited, 3).expect_err("fourth upload");
        assert!(err.is(taskhub_core::ErrorCode::QuotaExceeded));
        assert!(check_upload_quota(&policy(0, &[]), 10_000).is_ok());
    }

    #[test]
    fn allowed_types_match_mime_or_extension() {
        let p = policy(0, &["pdf", "image"]);
        assert!(matches_allowed_types(&p, "report.PDF", "application/octet-stream"));
        assert!(matches_allowed_types(&p, "scan", "image/png"));
        assert!(matches_allowed_types(&p, "doc", "application/pdf"));
        assert!(!matches_allowed_types(&p, "clip.mp4", "video/mp4"));
        assert!(matches_allowed_types(&policy(0, &[]), "anything.bin", ""));
    }

    #[test]
    fn filenames_cannot_escape_the_task_prefix() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\my file.txt"), "my_file.txt");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename(".env"), "env");
    }

    #[test]
    fn display_names_keep_non_ascii_text() {
        assert_eq!(display_filename("گزارش نهایی.pdf"), "گزارش نهایی.pdf");
        assert_eq!(display_filename("dir/sub\\résumé\n.txt"), "résumé.txt");
        assert_eq!(display_filename(".."), "upload");
        assert_eq!(sanitize_filename("گزارش.pdf"), "_____.pdf");
    }

    #[test]
    fn storage_key_layout() {
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        assert_eq!(
            storage_key(TaskId::new(4), UserId::new(9), at, "notes v2.pdf"),
            "tasks/4/9_1700000000_notes_v2.pdf"
        );
    }
}
