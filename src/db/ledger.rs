use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::{TransactionRecord, TransactionStatus, TransactionType};
use crate::error::{ApiError, Result};

/// Net savings position derived from a user's ledger entries: completed
/// deposits crediting the user minus completed withdrawals debiting them.
/// Pending and rejected entries never contribute, nor do other entry types.
pub fn derive_savings_balance(user_id: Uuid, entries: &[TransactionRecord]) -> Decimal {
    entries
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .fold(Decimal::ZERO, |acc, t| match t.transaction_type {
            TransactionType::Deposit if t.to_user_id == Some(user_id) => acc + t.amount,
            TransactionType::Withdrawal if t.from_user_id == Some(user_id) => acc - t.amount,
            _ => acc,
        })
}

pub const TRANSACTION_PAGE_SIZE: i64 = 10;

pub struct LedgerService {
    db_pool: PgPool,
}

impl LedgerService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn savings_balance(&self, user_id: Uuid) -> Result<Decimal> {
        let entries = self.entries_for(user_id, &self.db_pool).await?;
        Ok(derive_savings_balance(user_id, &entries))
    }

    /// Records a completed deposit crediting the user.
    pub async fn record_deposit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<TransactionRecord> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (to_user_id, amount, currency, transaction_type, status, description)
            VALUES ($1, $2, $3, 'DEPOSIT', 'COMPLETED', 'Savings deposit')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(currency)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(record)
    }

    /// Withdraws from savings as one atomic conditional write: the user row
    /// is locked, the balance recomputed inside the transaction, and the
    /// withdrawal inserted only if it is covered. Concurrent withdrawals for
    /// the same user serialize on the row lock, so two requests can never
    /// both pass the check against a stale balance.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<TransactionRecord> {
        let mut tx = self.db_pool.begin().await?;

        self.lock_user(&mut tx, user_id).await?;

        let entries = self.entries_for(user_id, &mut *tx).await?;
        let available = derive_savings_balance(user_id, &entries);
        if amount > available {
            tx.rollback().await.ok();
            return Err(ApiError::InsufficientBalance { available });
        }

        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (from_user_id, amount, currency, transaction_type, status, description)
            VALUES ($1, $2, $3, 'WITHDRAWAL', 'COMPLETED', 'Savings withdrawal')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(currency)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Member-to-member transfer, balance-checked under the sender's row
    /// lock like a withdrawal.
    pub async fn transfer(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<TransactionRecord> {
        let mut tx = self.db_pool.begin().await?;

        self.lock_user(&mut tx, from_user_id).await?;

        let entries = self.entries_for(from_user_id, &mut *tx).await?;
        let available = derive_savings_balance(from_user_id, &entries);
        if amount > available {
            tx.rollback().await.ok();
            return Err(ApiError::InsufficientBalance { available });
        }

        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (from_user_id, to_user_id, amount, currency, transaction_type, status, description)
            VALUES ($1, $2, $3, $4, 'TRANSFER', 'COMPLETED', 'Member transfer')
            RETURNING *
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(amount)
        .bind(currency)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Records the disbursement of an approved loan as a completed ledger
    /// entry crediting the borrower. Runs on the caller's transaction so the
    /// loan status flip and the ledger entry commit together.
    pub async fn record_loan_disbursement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (to_user_id, amount, transaction_type, status, description)
            VALUES ($1, $2, 'LOAN_DISBURSEMENT', 'COMPLETED', 'Loan disbursement')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await?;

        Ok(record)
    }

    /// Transactions where the user is sender or recipient, newest first.
    pub async fn transactions_for(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT * FROM transactions
            WHERE from_user_id = $1 OR to_user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(records)
    }

    /// The user's deposit history, newest first (the savings listing).
    pub async fn deposits_for(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT * FROM transactions
            WHERE to_user_id = $1 AND transaction_type = 'DEPOSIT'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(records)
    }

    /// Sum of every member's derived savings balance, for the admin overview.
    pub async fn total_savings(&self) -> Result<Decimal> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(
                CASE
                    WHEN transaction_type = 'DEPOSIT' THEN amount
                    WHEN transaction_type = 'WITHDRAWAL' THEN -amount
                    ELSE 0
                END
            ), 0)
            FROM transactions
            WHERE status = 'COMPLETED'
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        Ok(row.0)
    }

    async fn lock_user(&self, tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
        sqlx::query(r#"SELECT id FROM users WHERE id = $1 FOR UPDATE"#)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User".to_string()))?;

        Ok(())
    }

    async fn entries_for<'e, E>(&self, user_id: Uuid, executor: E) -> Result<Vec<TransactionRecord>>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, TransactionRecord>(
            r#"SELECT * FROM transactions WHERE from_user_id = $1 OR to_user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
