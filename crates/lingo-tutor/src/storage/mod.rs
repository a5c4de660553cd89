//! Persistence backends. [`SqliteStore`] is the durable store; [`MemoryStore`] backs
//! tests and the offline CLI. Both implement every repository trait in the crate.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::accounts::AccountRepository;
use crate::admin::AdminRepository;
use crate::chat::ChatRepository;
use crate::progression::ProgressionRepository;

/// Ceiling on stored XP. SQLite integers are signed 64-bit, and the memory
/// store clamps to the same value so both backends agree.
pub const MAX_STORED_XP: u64 = i64::MAX as u64;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("unit of work aborted: {0}")]
    Aborted(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Everything the HTTP surface needs from a backend.
pub trait Store:
    AccountRepository + ChatRepository + ProgressionRepository + AdminRepository + 'static
{
}

impl<T> Store for T where
    T: AccountRepository + ChatRepository + ProgressionRepository + AdminRepository + 'static
{
}
