use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{NewUser, Pagination, User, UserRole},
    AppError,
};
use uuid::Uuid;

use crate::db::map_unique_violation;

const USER_COLUMNS: &str = "id, email, name, password_hash, auth_provider, auth_provider_id, \
                            role, organization_id, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Emails are stored lower-cased, the lookup is too.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE email = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE auth_provider = $1 AND auth_provider_id = $2",
            USER_COLUMNS
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, new_user), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, auth_provider, auth_provider_id, role, organization_id)
            VALUES (LOWER($1), $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(new_user.email.trim())
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.auth_provider.as_str())
        .bind(&new_user.auth_provider_id)
        .bind(new_user.role)
        .bind(new_user.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A user with this email already exists"))?;

        Ok(user)
    }

    /// Attach an identity-provider subject to an existing user found by email.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn link_provider(
        &self,
        id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            UPDATE users
            SET auth_provider = $2, auth_provider_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Identity is already linked to another user"))?;

        user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Change a user's role within an organization.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn update_role(
        &self,
        organization_id: Uuid,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            UPDATE users SET role = $3, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(organization_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<User>, AppError> {
        let page = pagination.clamped();
        let users = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE organization_id = $1 ORDER BY email ASC LIMIT $2 OFFSET $3",
            USER_COLUMNS
        ))
        .bind(organization_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
