use gotham_stem::admin::{AdminService, EditorToken};
use gotham_stem::backup::{BackupJobs, ObjectStorage, S3Client};
use gotham_stem::config::AppConfig;
use gotham_stem::contact::{BotScorer, ContactService, LogNotifier, RecaptchaClient};
use gotham_stem::demo::seed_demo_site;
use gotham_stem::directory::{DirectoryService, DirectoryStore};
use gotham_stem::error::AppError;
use gotham_stem::newsletter::{MailchimpClient, MailingList, NewsletterService, RecipientStore};
use gotham_stem::pages::{PageStore, SiteService};
use gotham_stem::store::{MemoryStore, PostgresStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_BOT_THRESHOLD: f32 = 0.7;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) database: Option<PostgresStore>,
}

/// Directory served under `/media`.
#[derive(Clone)]
pub(crate) struct MediaRoot(pub(crate) PathBuf);

/// The same backing store seen through each module's repository trait.
#[derive(Clone)]
pub(crate) struct Stores {
    pub(crate) pages: Arc<dyn PageStore>,
    pub(crate) directory: Arc<dyn DirectoryStore>,
    pub(crate) recipients: Arc<dyn RecipientStore>,
    pub(crate) database: Option<PostgresStore>,
}

impl Stores {
    pub(crate) fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            pages: store.clone(),
            directory: store.clone(),
            recipients: store,
            database: None,
        }
    }

    fn postgres(store: PostgresStore) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            pages: shared.clone(),
            directory: shared.clone(),
            recipients: shared,
            database: Some(store),
        }
    }
}

/// Connects and migrates Postgres when `DATABASE_URL` is set, otherwise seeds the
/// in-memory demo site.
pub(crate) async fn open_stores(config: &AppConfig) -> Result<Stores, AppError> {
    match &config.database.url {
        Some(url) => {
            let store = PostgresStore::connect(url, &config.database).await?;
            store.migrate().await?;
            info!("connected to postgres");
            Ok(Stores::postgres(store))
        }
        None => {
            warn!("DATABASE_URL not set; serving the in-memory demo site");
            let store = Arc::new(MemoryStore::new());
            seed_demo_site(store.as_ref(), store.as_ref()).await?;
            Ok(Stores::memory(store))
        }
    }
}

#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) site: Arc<SiteService>,
    pub(crate) directory: Arc<DirectoryService>,
    pub(crate) admin: Arc<AdminService>,
    pub(crate) contact: Arc<ContactService>,
    pub(crate) newsletter: Arc<NewsletterService>,
    pub(crate) editors: EditorToken,
}

pub(crate) fn bot_scorer(config: &AppConfig) -> Result<Option<Arc<dyn BotScorer>>, AppError> {
    match &config.recaptcha {
        Some(recaptcha) => Ok(Some(Arc::new(RecaptchaClient::new(recaptcha)?))),
        None => {
            warn!("reCAPTCHA not configured; contact submissions will be rejected");
            Ok(None)
        }
    }
}

pub(crate) fn mailing_list(config: &AppConfig) -> Result<Option<Arc<dyn MailingList>>, AppError> {
    match &config.mailchimp {
        Some(mailchimp) => Ok(Some(Arc::new(MailchimpClient::new(mailchimp)?))),
        None => Ok(None),
    }
}

pub(crate) fn object_storage(
    config: &AppConfig,
) -> Result<Option<Arc<dyn ObjectStorage>>, AppError> {
    match &config.object_storage {
        Some(storage) => Ok(Some(Arc::new(S3Client::new(storage)?))),
        None => Ok(None),
    }
}

pub(crate) fn backup_jobs(config: &AppConfig) -> Result<BackupJobs, AppError> {
    Ok(BackupJobs::new(
        config.media.clone(),
        config.database.url.clone(),
        object_storage(config)?,
    ))
}

pub(crate) fn build_services(
    config: &AppConfig,
    stores: &Stores,
    scorer: Option<Arc<dyn BotScorer>>,
    list: Option<Arc<dyn MailingList>>,
) -> Services {
    let site = Arc::new(SiteService::new(
        stores.pages.clone(),
        config.site.clone(),
        &config.cache,
    ));
    let threshold = config
        .recaptcha
        .as_ref()
        .map(|recaptcha| recaptcha.threshold)
        .unwrap_or(DEFAULT_BOT_THRESHOLD);
    let contact = ContactService::new(
        scorer,
        Arc::new(LogNotifier),
        threshold,
        config.site.contact_recipient.clone(),
    )
    .with_site_key(config.recaptcha.as_ref().map(|recaptcha| recaptcha.site_key.clone()));

    Services {
        directory: Arc::new(DirectoryService::new(
            stores.directory.clone(),
            stores.pages.clone(),
        )),
        admin: Arc::new(AdminService::new(
            stores.directory.clone(),
            stores.pages.clone(),
            stores.recipients.clone(),
        )),
        contact: Arc::new(contact),
        newsletter: Arc::new(NewsletterService::new(stores.recipients.clone(), list)),
        editors: EditorToken::new(config.admin.token.clone()),
        site,
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    use gotham_stem::config::{
        AdminConfig, AppEnvironment, CacheConfig, DatabaseConfig, MediaConfig, ServerConfig,
        SiteConfig, TelemetryConfig,
    };

    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        media: MediaConfig {
            media_root: PathBuf::from("media"),
            backup_dir: PathBuf::from("backups"),
        },
        site: SiteConfig::default(),
        cache: CacheConfig::default(),
        admin: AdminConfig {
            token: Some("ops-token".to_string()),
        },
        recaptcha: None,
        mailchimp: None,
        object_storage: None,
    }
}
