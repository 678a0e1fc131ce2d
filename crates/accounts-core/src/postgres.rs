//! PostgreSQL credential store
//!
//! Provides user persistence using SQLx and PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{NewUser, Role, User};
use crate::store::{StoreError, UserStore};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at DESC)";

const SELECT_COLUMNS: &str =
    "SELECT id, full_name, username, password_hash, role, created_at, updated_at FROM users";

/// PostgreSQL user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create the `users` table and its indexes if they do not exist
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in [CREATE_USERS_TABLE, CREATE_CREATED_AT_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    full_name: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = row.role.parse::<Role>().unwrap_or_else(|_| {
            tracing::warn!(user_id = %row.id, role = %row.role, "Unknown stored role, using default");
            Role::default()
        });

        User {
            id: row.id,
            full_name: row.full_name,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn database_error(context: &str, err: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{context}: {err}"))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to fetch user", e))?;

        Ok(row.map(User::from))
    }

    async fn insert(&self, user: NewUser) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, full_name, username, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(&id)
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateUsername(user.username))
            }
            Err(e) => Err(database_error("Failed to create user", e)),
        }
    }

    async fn update(&self, user: &User) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET full_name = $1, password_hash = $2, role = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to update user", e))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to delete user", e))?;

        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let rows =
            sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| database_error("Failed to list users", e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Health check failed", e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: "id-1".to_string(),
            full_name: "Ari Ayu".to_string(),
            username: "ariayu".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion() {
        let user = User::from(row("admin"));
        assert_eq!(user.id, "id-1");
        assert_eq!(user.full_name, "Ari Ayu");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_unknown_role_falls_back_to_default() {
        let user = User::from(row("auditor"));
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    async fn test_postgres_roundtrip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgUserStore::connect(&url, 2).await.unwrap();
        store.migrate().await.unwrap();

        let username = format!("pg-{}", Uuid::new_v4());
        let id = store
            .insert(NewUser {
                full_name: "Pg User".to_string(),
                username: username.clone(),
                password_hash: "hash".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let duplicate = store
            .insert(NewUser {
                full_name: "Pg User".to_string(),
                username: username.clone(),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateUsername(_))));

        let user = store.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(store.delete(&id).await.unwrap(), 1);
        assert!(store.find_by_id(&id).await.unwrap().is_none());
    }
}
