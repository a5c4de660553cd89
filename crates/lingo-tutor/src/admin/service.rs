use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::domain::{BasicStats, TopUser};
use super::logs::{latest_log_file, read_json_tail, LOG_TAIL_LIMIT};
use super::repository::AdminRepository;
use crate::accounts::UserId;
use crate::progression::{BadgeDefinition, ProgressionEngine};
use crate::storage::RepositoryError;

pub const DEFAULT_TOP_USERS: usize = 5;

/// Operator-only analytics and maintenance.
pub struct AdminService<R> {
    repository: Arc<R>,
    engine: Arc<ProgressionEngine>,
    log_dir: Option<PathBuf>,
}

impl<R> AdminService<R>
where
    R: AdminRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<ProgressionEngine>, log_dir: Option<PathBuf>) -> Self {
        Self {
            repository,
            engine,
            log_dir,
        }
    }

    /// Succeeds only when `caller` names an existing admin account.
    pub async fn authorize(&self, caller: Option<UserId>) -> Result<UserId, AdminError> {
        let caller = caller.ok_or(AdminError::Forbidden)?;
        if self.repository.is_admin(caller).await? {
            Ok(caller)
        } else {
            warn!(user_id = %caller, "admin access denied");
            Err(AdminError::Forbidden)
        }
    }

    pub async fn basic_stats(&self) -> Result<BasicStats, AdminError> {
        Ok(self.repository.basic_stats().await?)
    }

    pub async fn top_users(&self, limit: Option<usize>) -> Result<Vec<TopUser>, AdminError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_USERS);
        Ok(self.repository.top_users(limit).await?)
    }

    /// Store the configured badge catalog. Returns how many badges were new.
    pub async fn seed_badges(&self) -> Result<usize, AdminError> {
        let catalog: Vec<BadgeDefinition> = self
            .engine
            .badge_rules()
            .iter()
            .map(|rule| rule.badge.clone())
            .collect();
        let created = self.repository.seed_badges(&catalog).await?;
        info!(created, total = catalog.len(), "badge catalog seeded");
        Ok(created)
    }

    pub async fn recent_logs(&self) -> Result<Vec<Value>, AdminError> {
        let dir = self.log_dir.as_ref().ok_or(AdminError::LogsUnavailable)?;
        let path = latest_log_file(dir)
            .await
            .map_err(|err| AdminError::LogRead(err.to_string()))?
            .ok_or(AdminError::LogsUnavailable)?;
        read_json_tail(&path, LOG_TAIL_LIMIT)
            .await
            .map_err(|err| AdminError::LogRead(err.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("admin access required")]
    Forbidden,
    #[error("log file not found")]
    LogsUnavailable,
    #[error("log file could not be read: {0}")]
    LogRead(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
