use crate::infra::{backup_jobs, mailing_list, open_stores};
use chrono::Utc;
use clap::Args;
use gotham_stem::backup::{BackupError, BackupOutcome};
use gotham_stem::config::AppConfig;
use gotham_stem::error::AppError;
use gotham_stem::newsletter::{sync_unsubscribes, MailingList, NewsletterError, SyncReport};
use gotham_stem::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub(crate) struct RestoreArgs {
    /// Path to a local .tar.gz media backup
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// Object key of a media backup in object storage
    #[arg(long)]
    pub(crate) remote: Option<String>,
}

fn load() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn print_outcome(kind: &str, outcome: &BackupOutcome) {
    println!("{kind} backup written to {}", outcome.local_path.display());
    if outcome.uploaded {
        println!("uploaded to object storage");
    } else {
        println!("object storage copy skipped; backup remains local");
    }
}

pub(crate) async fn run_backup_db() -> Result<(), AppError> {
    let config = load()?;
    let outcome = backup_jobs(&config)?.backup_database(Utc::now()).await?;
    print_outcome("database", &outcome);
    Ok(())
}

pub(crate) async fn run_backup_media() -> Result<(), AppError> {
    let config = load()?;
    let outcome = backup_jobs(&config)?.backup_media(Utc::now()).await?;
    print_outcome("media", &outcome);
    Ok(())
}

pub(crate) async fn run_restore_media(args: RestoreArgs) -> Result<(), AppError> {
    let config = load()?;
    let jobs = backup_jobs(&config)?;
    let report = match (args.file, args.remote) {
        (Some(file), _) => jobs.restore_media(&file).await?,
        (None, Some(key)) => jobs.restore_remote_media(&key).await?,
        (None, None) => return Err(BackupError::ArchiveMissing(PathBuf::new()).into()),
    };
    println!(
        "restored {} entries into {}",
        report.entries,
        config.media.media_root.display()
    );
    Ok(())
}

/// Requires `DATABASE_URL`; without it the job fails before the mailing list is contacted.
pub(crate) async fn sync_job(
    config: &AppConfig,
    list: Option<Arc<dyn MailingList>>,
) -> Result<SyncReport, AppError> {
    if config.database.url.is_none() {
        return Err(NewsletterError::StoreNotConfigured.into());
    }
    let list = list.ok_or(NewsletterError::NotConfigured)?;
    let stores = open_stores(config).await?;
    Ok(sync_unsubscribes(list.as_ref(), stores.recipients.as_ref(), Utc::now()).await?)
}

pub(crate) async fn run_sync_unsubscribes() -> Result<(), AppError> {
    let config = load()?;
    let report = sync_job(&config, mailing_list(&config)?).await?;
    for email in &report.deactivated {
        println!("Synced unsubscribe for: {email}");
    }
    println!(
        "examined {} unsubscribed members, deactivated {}",
        report.examined,
        report.deactivated.len()
    );
    Ok(())
}
