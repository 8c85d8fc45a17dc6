use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::models::User;
use crate::error::{ApiError, Result};

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
}

/// A member row joined with their derived savings balance, for the admin
/// member listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemberSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub savings_balance: Decimal,
}

pub struct UserService {
    db_pool: PgPool,
}

impl UserService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    /// Registration; role is always MEMBER at creation, only the seed admin
    /// ever carries ADMIN.
    pub async fn create(&self, new: NewUser<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, role, is_active)
            VALUES ($1, $2, $3, $4, $5, 'MEMBER', TRUE)
            RETURNING *
            "#,
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Validation("User with this email already exists".to_string())
            }
            _ => ApiError::Database(e.to_string()),
        })?;

        Ok(user)
    }

    pub async fn activate(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users SET is_active = TRUE WHERE id = $1 RETURNING *"#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
    }

    /// Member listing for the admin dashboard, each with the savings balance
    /// derived from their completed ledger entries.
    pub async fn list_members(&self) -> Result<Vec<MemberSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.is_active,
                   COALESCE(SUM(
                       CASE
                           WHEN t.transaction_type = 'DEPOSIT' AND t.to_user_id = u.id THEN t.amount
                           WHEN t.transaction_type = 'WITHDRAWAL' AND t.from_user_id = u.id THEN -t.amount
                           ELSE 0
                       END
                   ) FILTER (WHERE t.status = 'COMPLETED'), 0) AS savings_balance
            FROM users u
            LEFT JOIN transactions t ON t.from_user_id = u.id OR t.to_user_id = u.id
            WHERE u.role = 'MEMBER'
            GROUP BY u.id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberSummary {
                id: r.get("id"),
                email: r.get("email"),
                first_name: r.get("first_name"),
                last_name: r.get("last_name"),
                is_active: r.get("is_active"),
                savings_balance: r.get("savings_balance"),
            })
            .collect())
    }
}
