use crate::backup::{BackupError, StorageError};
use crate::config::ConfigError;
use crate::contact::ScoreError;
use crate::newsletter::{MailingListError, NewsletterError};
use crate::store::StoreError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Database(sqlx::Error),
    Migration(sqlx::migrate::MigrateError),
    Store(StoreError),
    Backup(BackupError),
    Newsletter(NewsletterError),
    Scoring(ScoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Database(err) => write!(f, "database error: {}", err),
            AppError::Migration(err) => write!(f, "migration error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Backup(err) => write!(f, "backup error: {}", err),
            AppError::Newsletter(err) => write!(f, "newsletter error: {}", err),
            AppError::Scoring(err) => write!(f, "bot scoring error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::Migration(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Backup(err) => Some(err),
            AppError::Newsletter(err) => Some(err),
            AppError::Scoring(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Newsletter(NewsletterError::EmailRequired) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BackupError> for AppError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Backup(BackupError::Storage(value))
    }
}

impl From<NewsletterError> for AppError {
    fn from(value: NewsletterError) -> Self {
        Self::Newsletter(value)
    }
}

impl From<MailingListError> for AppError {
    fn from(value: MailingListError) -> Self {
        Self::Newsletter(NewsletterError::MailingList(value))
    }
}

impl From<ScoreError> for AppError {
    fn from(value: ScoreError) -> Self {
        Self::Scoring(value)
    }
}
