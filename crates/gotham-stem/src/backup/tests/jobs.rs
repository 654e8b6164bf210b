use std::fs;

use chrono::{TimeZone, Utc};

use super::common::*;
use crate::backup::{stamp, BackupError};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
}

#[test]
fn stamps_use_date_and_compact_time() {
    assert_eq!(stamp(now()), "2025-01-02_030405");
}

#[tokio::test]
async fn media_backup_stays_local_without_storage() {
    let workspace = Workspace::new();

    let outcome = workspace
        .jobs(None, None)
        .backup_media(now())
        .await
        .expect("backup");

    assert!(!outcome.uploaded);
    assert_eq!(
        outcome.local_path,
        workspace.backup_dir().join("wagtail_media_2025-01-02_030405.tar.gz")
    );
    assert!(outcome.local_path.is_file());
}

#[tokio::test]
async fn media_backup_uploads_privately() {
    let workspace = Workspace::new();
    let storage = DirectoryStorage::new(&workspace.dir.path().join("bucket"), false);

    let outcome = workspace
        .jobs(None, Some(storage.clone()))
        .backup_media(now())
        .await
        .expect("backup");

    assert!(outcome.uploaded);
    assert_eq!(
        storage.uploads(),
        vec![(
            "wagtail_media_2025-01-02_030405.tar.gz".to_string(),
            Some("private".to_string())
        )]
    );
}

#[tokio::test]
async fn upload_failure_keeps_local_copy() {
    let workspace = Workspace::new();
    let storage = DirectoryStorage::new(&workspace.dir.path().join("bucket"), true);

    let outcome = workspace
        .jobs(None, Some(storage.clone()))
        .backup_media(now())
        .await
        .expect("backup");

    assert!(!outcome.uploaded);
    assert!(outcome.local_path.is_file());
    assert!(storage.uploads().is_empty());
}

#[tokio::test]
async fn missing_media_root_leaves_no_archive() {
    let workspace = Workspace::new();
    fs::remove_dir_all(workspace.media_root()).expect("remove media");

    let result = workspace.jobs(None, None).backup_media(now()).await;

    assert!(matches!(result, Err(BackupError::MediaRootMissing(_))));
    let leftovers = fs::read_dir(workspace.backup_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn sqlite_database_is_copied_and_uploaded() {
    let workspace = Workspace::new();
    let database = workspace.dir.path().join("db.sqlite3");
    fs::write(&database, b"SQLite format 3\0").expect("database");
    let storage = DirectoryStorage::new(&workspace.dir.path().join("bucket"), false);
    let url = format!("sqlite://{}", database.display());

    let outcome = workspace
        .jobs(Some(&url), Some(storage.clone()))
        .backup_database(now())
        .await
        .expect("backup");

    assert_eq!(
        outcome.local_path,
        workspace.backup_dir().join("db_backup_2025-01-02_030405.sql")
    );
    assert_eq!(
        fs::read(&outcome.local_path).expect("dump"),
        b"SQLite format 3\0".to_vec()
    );
    assert!(outcome.uploaded);
    assert_eq!(
        storage.uploads(),
        vec![("db_backup_2025-01-02_030405.sql".to_string(), None)]
    );
}

#[tokio::test]
async fn failed_dump_aborts_before_upload() {
    let workspace = Workspace::new();
    let storage = DirectoryStorage::new(&workspace.dir.path().join("bucket"), false);
    let url = format!(
        "sqlite://{}",
        workspace.dir.path().join("missing.sqlite3").display()
    );

    let result = workspace
        .jobs(Some(&url), Some(storage.clone()))
        .backup_database(now())
        .await;

    assert!(matches!(result, Err(BackupError::Io(_))));
    assert!(!workspace
        .backup_dir()
        .join("db_backup_2025-01-02_030405.sql")
        .exists());
    assert!(storage.uploads().is_empty());
}

#[tokio::test]
async fn database_backup_requires_a_url() {
    let workspace = Workspace::new();

    let result = workspace.jobs(None, None).backup_database(now()).await;

    assert!(matches!(result, Err(BackupError::DatabaseNotConfigured)));
}
