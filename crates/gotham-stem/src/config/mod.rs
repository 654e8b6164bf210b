use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub site: SiteConfig,
    pub cache: CacheConfig,
    pub admin: AdminConfig,
    pub recaptcha: Option<RecaptchaConfig>,
    pub mailchimp: Option<MailchimpConfig>,
    pub object_storage: Option<ObjectStorageConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            url: optional_var("DATABASE_URL"),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let media = MediaConfig {
            media_root: PathBuf::from(
                env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            ),
            backup_dir: PathBuf::from(
                env::var("BACKUP_DIR").unwrap_or_else(|_| "backups".to_string()),
            ),
        };

        let site = SiteConfig {
            base_url: env::var("SITE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            contact_recipient: env::var("CONTACT_RECIPIENT")
                .unwrap_or_else(|_| "info@stellark.com".to_string()),
            utm: UtmDefaults {
                source: env::var("NEWSLETTER_UTM_SOURCE")
                    .unwrap_or_else(|_| "newsletter".to_string()),
                medium: env::var("NEWSLETTER_UTM_MEDIUM").unwrap_or_else(|_| "email".to_string()),
                campaign: optional_var("NEWSLETTER_UTM_CAMPAIGN"),
            },
        };

        let cache = CacheConfig {
            navigation_ttl: Duration::from_secs(parse_var("NAVIGATION_CACHE_SECS", 300)?),
            featured_ttl: Duration::from_secs(parse_var("FEATURED_CACHE_SECS", 3600)?),
        };

        let admin = AdminConfig {
            token: optional_var("ADMIN_TOKEN"),
        };

        let recaptcha = match (
            optional_var("RECAPTCHA_SITE_KEY"),
            optional_var("GOOGLE_PROJECT_ID"),
            optional_var("GOOGLE_API_KEY"),
        ) {
            (Some(site_key), Some(project_id), Some(api_key)) => Some(RecaptchaConfig {
                site_key,
                project_id,
                api_key,
                threshold: parse_var("RECAPTCHA_THRESHOLD", 0.7)?,
            }),
            _ => None,
        };

        let mailchimp = match (
            optional_var("MAILCHIMP_API_KEY"),
            optional_var("MAILCHIMP_SERVER"),
            optional_var("MAILCHIMP_AUDIENCE_ID"),
        ) {
            (Some(api_key), Some(server), Some(audience_id)) => Some(MailchimpConfig {
                api_key,
                server,
                audience_id,
            }),
            _ => None,
        };

        let object_storage = match (
            optional_var("OCI_ACCESS_KEY"),
            optional_var("OCI_SECRET_KEY"),
            optional_var("OCI_NAMESPACE"),
            optional_var("OCI_REGION"),
            optional_var("OCI_BUCKET_NAME"),
        ) {
            (Some(access_key), Some(secret_key), Some(namespace), Some(region), Some(bucket)) => {
                Some(ObjectStorageConfig {
                    access_key,
                    secret_key,
                    namespace,
                    region,
                    bucket,
                })
            }
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            media,
            site,
            cache,
            admin,
            recaptcha,
            mailchimp,
            object_storage,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            name,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Relational store settings. Without a URL the service runs on the in-memory store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_root: PathBuf,
    pub backup_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub contact_recipient: String,
    pub utm: UtmDefaults,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            contact_recipient: "info@stellark.com".to_string(),
            utm: UtmDefaults {
                source: "newsletter".to_string(),
                medium: "email".to_string(),
                campaign: None,
            },
        }
    }
}

/// Query parameters appended to outbound newsletter links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtmDefaults {
    pub source: String,
    pub medium: String,
    pub campaign: Option<String>,
}

impl UtmDefaults {
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("utm_source".to_string(), self.source.clone()),
            ("utm_medium".to_string(), self.medium.clone()),
        ];
        if let Some(campaign) = &self.campaign {
            pairs.push(("utm_campaign".to_string(), campaign.clone()));
        }
        pairs
    }
}

/// Time-to-live for the read-through page fragment caches.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub navigation_ttl: Duration,
    pub featured_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            navigation_ttl: Duration::from_secs(300),
            featured_ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    pub site_key: String,
    pub project_id: String,
    pub api_key: String,
    pub threshold: f32,
}

#[derive(Debug, Clone)]
pub struct MailchimpConfig {
    pub api_key: String,
    pub server: String,
    pub audience_id: String,
}

/// S3-compatible object storage used to mirror backups.
#[derive(Debug, Clone)]
pub struct ObjectStorageConfig {
    pub access_key: String,
    pub secret_key: String,
    pub namespace: String,
    pub region: String,
    pub bucket: String,
}

impl ObjectStorageConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}.compat.objectstorage.{}.oraclecloud.com",
            self.namespace, self.region
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be numeric (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
