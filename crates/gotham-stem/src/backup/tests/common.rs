use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backup::{BackupJobs, ObjectStorage, StorageError};
use crate::config::MediaConfig;

/// Object store backed by a directory, recording every upload.
pub(super) struct DirectoryStorage {
    pub root: PathBuf,
    pub fail: bool,
    pub uploads: Mutex<Vec<(String, Option<String>)>>,
}

impl DirectoryStorage {
    pub(super) fn new(root: &Path, fail: bool) -> Arc<Self> {
        fs::create_dir_all(root).expect("storage dir");
        Arc::new(Self {
            root: root.to_path_buf(),
            fail,
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn uploads(&self) -> Vec<(String, Option<String>)> {
        self.uploads.lock().expect("uploads poisoned").clone()
    }
}

#[async_trait]
impl ObjectStorage for DirectoryStorage {
    async fn upload(&self, key: &str, source: &Path, acl: Option<&str>) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Status {
                status: 403,
                body: "AccessDenied".to_string(),
            });
        }
        fs::copy(source, self.root.join(key))?;
        self.uploads
            .lock()
            .expect("uploads poisoned")
            .push((key.to_string(), acl.map(str::to_string)));
        Ok(())
    }

    async fn download(&self, key: &str, destination: &Path) -> Result<(), StorageError> {
        let source = self.root.join(key);
        if !source.exists() {
            return Err(StorageError::Status {
                status: 404,
                body: "NoSuchKey".to_string(),
            });
        }
        fs::copy(source, destination)?;
        Ok(())
    }
}

pub(super) struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let media = dir.path().join("media");
        fs::create_dir_all(media.join("images")).expect("media dirs");
        fs::write(media.join("images/spring.png"), b"png-bytes").expect("image");
        fs::write(media.join("flyer.pdf"), b"pdf-bytes").expect("document");
        Self { dir }
    }

    pub(super) fn media_root(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    pub(super) fn backup_dir(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    pub(super) fn media_config(&self) -> MediaConfig {
        MediaConfig {
            media_root: self.media_root(),
            backup_dir: self.backup_dir(),
        }
    }

    pub(super) fn jobs(
        &self,
        database_url: Option<&str>,
        storage: Option<Arc<DirectoryStorage>>,
    ) -> BackupJobs {
        BackupJobs::new(
            self.media_config(),
            database_url.map(str::to_string),
            storage.map(|storage| storage as Arc<dyn ObjectStorage>),
        )
    }
}
