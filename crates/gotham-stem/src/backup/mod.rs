//! Database and media backups with optional off-site copies, and media restore.

pub mod database;
pub mod media;
pub mod storage;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

pub use database::{backup_database, DatabaseTarget, DumpCommand};
pub use media::{backup_media, restore_media, RestoreReport};
pub use storage::{ObjectStorage, S3Client, StorageError};

use crate::config::MediaConfig;

const MEDIA_ACL: &str = "private";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("DATABASE_URL is not set")]
    DatabaseNotConfigured,
    #[error("invalid database URL '{0}'")]
    InvalidDatabaseUrl(String),
    #[error("unsupported database engine '{0}'")]
    UnsupportedDatabase(String),
    #[error("could not start {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    DumpFailed { program: &'static str, status: String },
    #[error("media directory {0} does not exist")]
    MediaRootMissing(PathBuf),
    #[error("backup file not found at {0}")]
    ArchiveMissing(PathBuf),
    #[error("{path} is not a readable gzip tar archive: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },
    #[error("archive entry {0} would escape the media directory")]
    UnsafeEntry(PathBuf),
    #[error("object storage is not configured")]
    StorageNotConfigured,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("backup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Timestamp embedded in backup file names.
pub fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H%M%S").to_string()
}

/// Where a backup ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    pub local_path: PathBuf,
    pub uploaded: bool,
}

/// Backup and restore jobs run from the command line.
pub struct BackupJobs {
    media: MediaConfig,
    database_url: Option<String>,
    storage: Option<Arc<dyn ObjectStorage>>,
}

impl BackupJobs {
    pub fn new(
        media: MediaConfig,
        database_url: Option<String>,
        storage: Option<Arc<dyn ObjectStorage>>,
    ) -> Self {
        Self {
            media,
            database_url,
            storage,
        }
    }

    pub async fn backup_database(&self, now: DateTime<Utc>) -> Result<BackupOutcome, BackupError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(BackupError::DatabaseNotConfigured)?;
        let local_path = backup_database(url, &self.media.backup_dir, &stamp(now)).await?;
        let uploaded = self.upload(&local_path, None).await;
        Ok(BackupOutcome {
            local_path,
            uploaded,
        })
    }

    pub async fn backup_media(&self, now: DateTime<Utc>) -> Result<BackupOutcome, BackupError> {
        let local_path =
            backup_media(&self.media.media_root, &self.media.backup_dir, &stamp(now)).await?;
        let uploaded = self.upload(&local_path, Some(MEDIA_ACL)).await;
        Ok(BackupOutcome {
            local_path,
            uploaded,
        })
    }

    pub async fn restore_media(&self, archive: &Path) -> Result<RestoreReport, BackupError> {
        restore_media(archive, &self.media.media_root).await
    }

    /// Downloads `key` into the backup directory, then restores from that copy.
    pub async fn restore_remote_media(&self, key: &str) -> Result<RestoreReport, BackupError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or(BackupError::StorageNotConfigured)?;
        let file_name = Path::new(key)
            .file_name()
            .ok_or_else(|| BackupError::ArchiveMissing(PathBuf::from(key)))?;
        tokio::fs::create_dir_all(&self.media.backup_dir).await?;
        let local_path = self.media.backup_dir.join(file_name);
        info!(key, path = %local_path.display(), "downloading media archive");
        storage.download(key, &local_path).await?;
        self.restore_media(&local_path).await
    }

    /// Copies a finished backup off-site. Failures are logged; the local file stays.
    async fn upload(&self, path: &Path, acl: Option<&str>) -> bool {
        let Some(storage) = &self.storage else {
            warn!(path = %path.display(), "object storage not configured; backup remains local");
            return false;
        };
        let Some(key) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        match storage.upload(key, path, acl).await {
            Ok(()) => {
                info!(key, "backup uploaded");
                true
            }
            Err(err) => {
                error!(error = %err, key, "backup upload failed");
                false
            }
        }
    }
}
