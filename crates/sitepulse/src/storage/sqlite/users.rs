//! SQLite user repository.

use async_trait::async_trait;
use chrono::Utc;
use sitepulse_core::storage::{format_timestamp, RepositoryError, Result};
use sitepulse_core::users::{plan_upsert, Role, UpsertPlan, UpsertUser, User, UserRepository};
use sqlx::sqlite::SqliteRow;

use super::conversions::{column, parse_timestamp};
use super::error::map_sqlx_error;
use super::schema::{SELECT_USER_BY_OPEN_ID, UPSERT_USER};
use crate::storage::Database;

const ENTITY: &str = "User";

/// SQLite-backed [`UserRepository`].
#[derive(Clone)]
pub struct UserStore {
    db: Database,
    owner_open_id: Option<String>,
}

impl UserStore {
    pub fn new(db: Database, owner_open_id: Option<String>) -> Self {
        Self { db, owner_open_id }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn upsert_user(&self, user: &UpsertUser) -> Result<()> {
        let pool = match self.db.pool().await {
            Ok(pool) => pool,
            Err(RepositoryError::Unavailable) => {
                tracing::warn!(open_id = %user.open_id, "Cannot upsert user: database not available");
                return Err(RepositoryError::Unavailable);
            }
            Err(e) => return Err(e),
        };

        let plan = plan_upsert(user, self.owner_open_id.as_deref(), Utc::now())?;
        let now = format_timestamp(&plan.now);

        sqlx::query(UPSERT_USER)
            .bind(&plan.open_id)
            .bind(UpsertPlan::insert_value(&plan.name))
            .bind(UpsertPlan::insert_value(&plan.email))
            .bind(UpsertPlan::insert_value(&plan.login_method))
            .bind(plan.insert_role.as_str())
            .bind(&now)
            .bind(&now)
            .bind(format_timestamp(&plan.last_signed_in))
            .bind(plan.name.is_some())
            .bind(plan.email.is_some())
            .bind(plan.login_method.is_some())
            .bind(plan.update_role.map(|role| role.as_str()))
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::error!(open_id = %plan.open_id, error = %e, "Failed to upsert user");
                map_sqlx_error(e, ENTITY)
            })?;

        Ok(())
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> Result<Option<User>> {
        let pool = self.db.pool().await?;

        let row = sqlx::query(SELECT_USER_BY_OPEN_ID)
            .bind(open_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_sqlx_error(e, ENTITY))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let role: String = column(row, "role", ENTITY)?;

    Ok(User {
        id: column(row, "id", ENTITY)?,
        open_id: column(row, "open_id", ENTITY)?,
        name: column(row, "name", ENTITY)?,
        email: column(row, "email", ENTITY)?,
        login_method: column(row, "login_method", ENTITY)?,
        role: role.parse::<Role>().map_err(RepositoryError::Serialization)?,
        created_at: parse_timestamp(row, "created_at", ENTITY)?,
        updated_at: parse_timestamp(row, "updated_at", ENTITY)?,
        last_signed_in: parse_timestamp(row, "last_signed_in", ENTITY)?,
    })
}
