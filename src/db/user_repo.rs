// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::AppError,
        retry::{retry_read, ReadRetryPolicy},
    },
    models::auth::{User, UserRole},
};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, display_name, first_name, last_name, phone, role,
    department, employee_id, insurance_company, bio, address, profile_completed,
    created_at, updated_at
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    retry: ReadRetryPolicy,
}

impl UserRepository {
    pub fn new(pool: PgPool, retry: ReadRetryPolicy) -> Self {
        Self { pool, retry }
    }

    // Busca um usuário pelo seu e-mail (já normalizado em minúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        retry_read(&self.retry, "users.find_by_email", || async {
            Ok(sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?)
        })
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        retry_read(&self.retry, "users.find_by_id", || async {
            Ok(sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?)
        })
        .await
    }

    // Cria um novo usuário. Novos cadastros entram como `agent` com perfil incompleto.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, display_name, role, profile_completed)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(display_name)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    |constraint| match constraint {
                        Some("users_email_key") => AppError::EmailAlreadyExists,
                        other => AppError::UniqueConstraintViolation(
                            other.unwrap_or("users").to_string(),
                        ),
                    },
                    "Usuário",
                )
            })
    }

    /// Troca a senha só se a conta não mudou desde `expected_updated_at`.
    /// Devolve `false` quando outra escrita chegou antes (token já usado).
    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() \
             WHERE id = $1 AND updated_at = $3",
        )
        .bind(id)
        .bind(password_hash)
        .bind(expected_updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Grava o perfil já mesclado pelo serviço (última escrita vence).
    pub async fn save_profile(&self, user: &User) -> Result<User, AppError> {
        let sql = format!(
            r#"
            UPDATE users SET
                display_name = $2, first_name = $3, last_name = $4, phone = $5,
                department = $6, employee_id = $7, insurance_company = $8, bio = $9,
                address = $10, profile_completed = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.display_name)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(&user.department)
            .bind(&user.employee_id)
            .bind(&user.insurance_company)
            .bind(&user.bio)
            .bind(user.address.as_ref().map(|a| Json(&a.0)))
            .bind(user.profile_completed)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        );
        retry_read(&self.retry, "users.list", || async {
            let users = sqlx::query_as::<_, User>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await?;
            Ok((users, total))
        })
        .await
    }

    pub async fn set_role(&self, id: Uuid, role: UserRole) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }
}
