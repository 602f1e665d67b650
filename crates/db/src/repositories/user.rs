use std::str::FromStr;

use sqlx::Row;

use ideaflow_core::domain::user::{User, UserId, UserRole};

use super::{decode_err, RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let username: String = row.try_get("username").map_err(decode_err)?;
    let full_name: String = row.try_get("full_name").map_err(decode_err)?;
    let email: String = row.try_get("email").map_err(decode_err)?;
    let role: String = row.try_get("role").map_err(decode_err)?;
    let department: String = row.try_get("department").map_err(decode_err)?;
    let categories_json: String = row.try_get("approval_categories_json").map_err(decode_err)?;
    let is_active: bool = row.try_get("is_active").map_err(decode_err)?;

    Ok(User {
        id: UserId(id),
        username,
        full_name,
        email,
        role: UserRole::from_str(&role).map_err(decode_err)?,
        department,
        approval_categories: serde_json::from_str(&categories_json).map_err(decode_err)?,
        is_active,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, full_name, email, role, department,
                    approval_categories_json, is_active
             FROM app_user WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, username, full_name, email, role, department,
                    approval_categories_json, is_active
             FROM app_user ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let categories_json =
            serde_json::to_string(&user.approval_categories).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO app_user (id, username, full_name, email, role, department,
                                   approval_categories_json, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 full_name = excluded.full_name,
                 email = excluded.email,
                 role = excluded.role,
                 department = excluded.department,
                 approval_categories_json = excluded.approval_categories_json,
                 is_active = excluded.is_active",
        )
        .bind(&user.id.0)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(categories_json)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
