//! Directory-version read model.
//!
//! Content-addressed: `(repository_id, sha256)` is unique, and lookups
//! are served by an actor whose id is derived from that pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::DirectoryVersionEvent;
use crate::domains::entity::EventSourced;

/// Derive the actor id serving `(repository_id, sha256)`.
pub fn directory_version_actor_id(repository_id: Uuid, sha256_hash: &str) -> Uuid {
    Uuid::new_v5(&repository_id, sha256_hash.as_bytes())
}

/// Hash of the canonical listing: one `path:hash:size` line per file.
///
/// The declared directory hash must equal this recomputation over the
/// uploaded entries.
pub fn compute_directory_sha256(files: &[FileEntry]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.relative_path.as_bytes());
        hasher.update(b":");
        hasher.update(file.sha256_hash.as_bytes());
        hasher.update(b":");
        hasher.update(file.size.to_string().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub relative_path: String,
    pub sha256_hash: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryVersionDto {
    pub directory_version_id: Uuid,
    pub repository_id: Uuid,
    pub sha256_hash: String,
    pub relative_path: String,
    pub files: Vec<FileEntry>,
    /// Aggregate size; must equal the sum of the file sizes.
    pub size: u64,
    /// Children directory versions.
    pub directory_version_ids: Vec<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for DirectoryVersionDto {
    type Event = DirectoryVersionEvent;

    fn apply(mut dto: Self, event: &DirectoryVersionEvent) -> Self {
        match event {
            DirectoryVersionEvent::Created {
                directory_version_id,
                repository_id,
                sha256_hash,
                relative_path,
                files,
                size,
                directory_version_ids,
                created_at,
            } => {
                dto.directory_version_id = *directory_version_id;
                dto.repository_id = *repository_id;
                dto.sha256_hash = sha256_hash.clone();
                dto.relative_path = relative_path.clone();
                dto.files = files.clone();
                dto.size = *size;
                dto.directory_version_ids = directory_version_ids.clone();
                dto.created_at = Some(*created_at);
            }
            DirectoryVersionEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            DirectoryVersionEvent::Undeleted => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            DirectoryVersionEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.directory_version_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_hash_is_order_sensitive_and_stable() {
        let files = vec![
            FileEntry {
                relative_path: "src/main.rs".into(),
                sha256_hash: "aa".repeat(32),
                size: 120,
            },
            FileEntry {
                relative_path: "Cargo.toml".into(),
                sha256_hash: "bb".repeat(32),
                size: 40,
            },
        ];

        let first = compute_directory_sha256(&files);
        assert_eq!(first, compute_directory_sha256(&files));
        assert_eq!(first.len(), 64);

        let reversed: Vec<FileEntry> = files.iter().rev().cloned().collect();
        assert_ne!(first, compute_directory_sha256(&reversed));
    }

    #[test]
    fn actor_id_is_deterministic_per_repository_and_hash() {
        let repository_id = Uuid::new_v4();
        let other_repository = Uuid::new_v4();
        let hash = "ab".repeat(32);

        assert_eq!(
            directory_version_actor_id(repository_id, &hash),
            directory_version_actor_id(repository_id, &hash)
        );
        assert_ne!(
            directory_version_actor_id(repository_id, &hash),
            directory_version_actor_id(other_repository, &hash)
        );
        assert_ne!(
            directory_version_actor_id(repository_id, &hash),
            directory_version_actor_id(repository_id, &"cd".repeat(32))
        );
    }
}
