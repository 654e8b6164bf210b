//! Storage adapters shared by every module: an in-memory store for development and
//! tests, and a Postgres store backed by `sqlx`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Error enumeration for store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record conflicts with an existing one: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Self::NotFound,
            _ => Self::Unavailable(value.to_string()),
        }
    }
}

/// Offset/limit pair for listing queries; `limit: None` returns every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Slice {
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    pub const fn window(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    pub(crate) fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset as usize);
        match self.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        }
    }
}
