use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{RepositoryError, MAX_STORED_XP};
use crate::accounts::{AccountRepository, NewAccount, UserAccount, UserId};
use crate::admin::{AdminRepository, BasicStats, TopUser};
use crate::chat::{ChatMessage, ChatRepository, ChatSession, MessageRole, SessionId};
use crate::progression::{
    BadgeAward, BadgeDefinition, BadgeId, ExperienceUpdate, LevelThresholds,
    ProgressionRepository, ProgressionState,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store. XP increments run as a single write transaction whose
/// first statement is the increment itself.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!(url, "sqlite store ready");
        Ok(store)
    }

    /// Private in-memory database, kept alive on a single pooled connection.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), RepositoryError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                language_level TEXT NOT NULL,
                preferred_language TEXT NOT NULL DEFAULT 'English',
                is_admin INTEGER NOT NULL DEFAULT 0,
                experience_points INTEGER NOT NULL DEFAULT 0 CHECK (experience_points >= 0),
                current_level TEXT NOT NULL,
                total_messages INTEGER NOT NULL DEFAULT 0 CHECK (total_messages >= 0),
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS badges (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                icon TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_badges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                badge_id TEXT NOT NULL,
                awarded_at TEXT NOT NULL,
                UNIQUE (user_id, badge_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS conversation_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_session_id INTEGER NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_chat_sessions_user ON chat_sessions(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_history_session ON conversation_history(chat_session_id)",
        ];
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn badges_held<'e, E>(executor: E, user: UserId) -> Result<BTreeSet<BadgeId>, RepositoryError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let ids: Vec<String> = sqlx::query_scalar("SELECT badge_id FROM user_badges WHERE user_id = ?")
            .bind(user.0)
            .fetch_all(executor)
            .await?;
        Ok(ids.into_iter().map(BadgeId).collect())
    }
}

fn clamp_xp(value: u64) -> i64 {
    i64::try_from(value.min(MAX_STORED_XP)).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::Unavailable(format!("negative counter {value} in storage")))
}

fn account_from_row(row: &SqliteRow, badges_held: BTreeSet<BadgeId>) -> Result<UserAccount, RepositoryError> {
    Ok(UserAccount {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        language_level: row.try_get("language_level")?,
        preferred_language: row.try_get("preferred_language")?,
        is_admin: row.try_get("is_admin")?,
        created_at: row.try_get("created_at")?,
        progression: ProgressionState {
            cumulative_xp: to_u64(row.try_get("experience_points")?)?,
            level_label: row.try_get("current_level")?,
            messages_sent: to_u64(row.try_get("total_messages")?)?,
            badges_held,
        },
    })
}

fn session_from_row(row: &SqliteRow) -> Result<ChatSession, RepositoryError> {
    Ok(ChatSession {
        id: SessionId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        title: row.try_get("title")?,
        created_at: row.try_get("created_at")?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<ChatMessage, RepositoryError> {
    let role: String = row.try_get("role")?;
    Ok(ChatMessage {
        id: row.try_get("id")?,
        chat_session_id: SessionId(row.try_get("chat_session_id")?),
        user_id: UserId(row.try_get("user_id")?),
        role: MessageRole::parse(&role)
            .ok_or_else(|| RepositoryError::Unavailable(format!("unknown message role {role}")))?,
        message: row.try_get("message")?,
        timestamp: row.try_get("timestamp")?,
    })
}

const USER_COLUMNS: &str = "id, username, email, language_level, preferred_language, is_admin, \
     experience_points, current_level, total_messages, created_at";

#[async_trait]
impl AccountRepository for SqliteStore {
    async fn insert_account(
        &self,
        account: NewAccount,
        initial_level: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserAccount, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, language_level, preferred_language, is_admin,
                               experience_points, current_level, total_messages, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.language_level)
        .bind(&account.preferred_language)
        .bind(account.is_admin)
        .bind(initial_level)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserAccount {
            id: UserId(id),
            username: account.username,
            email: account.email,
            language_level: account.language_level,
            preferred_language: account.preferred_language,
            is_admin: account.is_admin,
            created_at,
            progression: ProgressionState::new(initial_level),
        })
    }

    async fn account(&self, user: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let held = Self::badges_held(&self.pool, user).await?;
                Ok(Some(account_from_row(&row, held)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProgressionRepository for SqliteStore {
    async fn progression(&self, user: UserId) -> Result<Option<ProgressionState>, RepositoryError> {
        Ok(self.account(user).await?.map(|account| account.progression))
    }

    async fn record_message_experience(
        &self,
        user: UserId,
        xp: u64,
        thresholds: &LevelThresholds,
    ) -> Result<ExperienceUpdate, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Writing first takes the database write lock before anything is read.
        let row = sqlx::query(
            r#"
            UPDATE users
            SET experience_points = experience_points + MIN(?, ? - experience_points),
                total_messages = total_messages + 1
            WHERE id = ?
            RETURNING experience_points, total_messages, current_level
            "#,
        )
        .bind(clamp_xp(xp))
        .bind(i64::MAX)
        .bind(user.0)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let cumulative_xp = to_u64(row.try_get("experience_points")?)?;
        let messages_sent = to_u64(row.try_get("total_messages")?)?;
        let previous_level: String = row.try_get("current_level")?;

        // Dropping the transaction on error rolls the increment back.
        let level = thresholds
            .resolve(cumulative_xp)
            .map_err(|err| RepositoryError::Aborted(err.to_string()))?;
        sqlx::query("UPDATE users SET current_level = ? WHERE id = ?")
            .bind(&level.label)
            .bind(user.0)
            .execute(&mut *tx)
            .await?;
        let badges_held = Self::badges_held(&mut *tx, user).await?;
        tx.commit().await?;

        Ok(ExperienceUpdate {
            previous_level,
            state: ProgressionState {
                cumulative_xp,
                level_label: level.label.clone(),
                messages_sent,
                badges_held,
            },
        })
    }

    async fn award_badge(
        &self,
        user: UserId,
        badge: &BadgeId,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, awarded_at) VALUES (?, ?, ?)",
        )
        .bind(user.0)
        .bind(&badge.0)
        .bind(awarded_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn badge_awards(&self, user: UserId) -> Result<Vec<BadgeAward>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT badge_id, awarded_at FROM user_badges WHERE user_id = ? ORDER BY awarded_at, id",
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| -> Result<BadgeAward, RepositoryError> {
                Ok(BadgeAward {
                    user_id: user,
                    badge_id: BadgeId(row.try_get("badge_id")?),
                    awarded_at: row.try_get("awarded_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ChatRepository for SqliteStore {
    async fn create_session(
        &self,
        user: UserId,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO chat_sessions (user_id, title, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(user.0)
        .bind(&title)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(ChatSession {
            id: SessionId(id),
            user_id: user,
            title,
            created_at,
        })
    }

    async fn session(&self, session: SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT id, user_id, title, created_at FROM chat_sessions WHERE id = ?")
            .bind(session.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn sessions_for_user(&self, user: UserId) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, created_at FROM chat_sessions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(session_from_row).collect()
    }

    async fn set_session_title(
        &self,
        session: SessionId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET title = ? WHERE id = ?")
            .bind(title)
            .bind(session.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, session: SessionId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM conversation_history WHERE chat_session_id = ?")
            .bind(session.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_message(
        &self,
        session: SessionId,
        user: UserId,
        role: MessageRole,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO conversation_history (chat_session_id, user_id, role, message, timestamp)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(session.0)
        .bind(user.0)
        .bind(role.as_str())
        .bind(message)
        .bind(sent_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(ChatMessage {
            id,
            chat_session_id: session,
            user_id: user,
            role,
            message: message.to_string(),
            timestamp: sent_at,
        })
    }

    async fn messages(&self, session: SessionId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, chat_session_id, user_id, role, message, timestamp
            FROM conversation_history
            WHERE chat_session_id = ?
            ORDER BY id
            "#,
        )
        .bind(session.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(message_from_row).collect()
    }
}

#[async_trait]
impl AdminRepository for SqliteStore {
    async fn basic_stats(&self) -> Result<BasicStats, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM chat_sessions) AS total_chat_sessions,
                (SELECT COUNT(*) FROM conversation_history) AS total_messages
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(BasicStats {
            total_users: to_u64(row.try_get("total_users")?)?,
            total_chat_sessions: to_u64(row.try_get("total_chat_sessions")?)?,
            total_messages: to_u64(row.try_get("total_messages")?)?,
        })
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<TopUser>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, COUNT(h.id) AS message_count
            FROM users u
            JOIN conversation_history h ON h.user_id = u.id AND h.role = 'user'
            GROUP BY u.id, u.username
            ORDER BY message_count DESC, u.id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| -> Result<TopUser, RepositoryError> {
                Ok(TopUser {
                    user_id: UserId(row.try_get("id")?),
                    username: row.try_get("username")?,
                    message_count: to_u64(row.try_get("message_count")?)?,
                })
            })
            .collect()
    }

    async fn is_admin(&self, user: UserId) -> Result<bool, RepositoryError> {
        let flag: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = ?")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(flag.unwrap_or(false))
    }

    async fn seed_badges(&self, badges: &[BadgeDefinition]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for badge in badges {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO badges (id, name, description, icon) VALUES (?, ?, ?, ?)",
            )
            .bind(&badge.id.0)
            .bind(&badge.name)
            .bind(&badge.description)
            .bind(&badge.icon)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(created)
    }
}
