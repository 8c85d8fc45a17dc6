use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::ledger::LedgerService;
use crate::db::models::{Loan, LoanStatus};
use crate::error::{ApiError, Result};

// repayment window granted on approval
const LOAN_TERM_DAYS: i64 = 30;

pub struct LoanService {
    db_pool: PgPool,
}

impl LoanService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn request(
        &self,
        user_id: Uuid,
        amount: Decimal,
        interest: Decimal,
        reason: &str,
    ) -> Result<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, amount, interest, reason, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(interest)
        .bind(reason)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(loan)
    }

    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"SELECT * FROM loans WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(loans)
    }

    pub async fn list_all(&self) -> Result<Vec<Loan>> {
        let loans =
            sqlx::query_as::<_, Loan>(r#"SELECT * FROM loans ORDER BY created_at DESC"#)
                .fetch_all(&self.db_pool)
                .await?;

        Ok(loans)
    }

    /// PENDING -> APPROVED; the conditional update makes the transition
    /// atomic, so two admins racing on the same loan cannot both win.
    pub async fn approve(&self, loan_id: Uuid) -> Result<Loan> {
        let due_date = Utc::now() + Duration::days(LOAN_TERM_DAYS);

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'APPROVED', approved_at = NOW(), due_date = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(due_date)
        .fetch_optional(&self.db_pool)
        .await?;

        match updated {
            Some(loan) => Ok(loan),
            None => Err(self.transition_error(loan_id, "approved").await?),
        }
    }

    /// PENDING -> REJECTED.
    pub async fn reject(&self, loan_id: Uuid) -> Result<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'REJECTED'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&self.db_pool)
        .await?;

        match updated {
            Some(loan) => Ok(loan),
            None => Err(self.transition_error(loan_id, "rejected").await?),
        }
    }

    /// APPROVED -> DISBURSED, crediting the borrower in the same database
    /// transaction so the status flip and the ledger entry land together.
    pub async fn disburse(&self, loan_id: Uuid, ledger: &LedgerService) -> Result<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'DISBURSED', disbursed_at = NOW()
            WHERE id = $1 AND status = 'APPROVED'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?;

        let loan = match updated {
            Some(loan) => loan,
            None => {
                tx.rollback().await.ok();
                return Err(self.transition_error(loan_id, "disbursed").await?);
            }
        };

        ledger
            .record_loan_disbursement(&mut tx, loan.user_id, loan.amount)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    // distinguishes "no such loan" from "loan exists but is in the wrong state"
    async fn transition_error(&self, loan_id: Uuid, action: &str) -> Result<ApiError> {
        let current: Option<(LoanStatus,)> =
            sqlx::query_as(r#"SELECT status FROM loans WHERE id = $1"#)
                .bind(loan_id)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(match current {
            None => ApiError::NotFound("Loan".to_string()),
            Some((status,)) => ApiError::Validation(format!(
                "Loan cannot be {action} from status {status:?}"
            )),
        })
    }
}
