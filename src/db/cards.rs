use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{CardStatus, VirtualCard};
use crate::error::{ApiError, Result};

pub struct CardService {
    db_pool: PgPool,
}

impl CardService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn request(&self, user_id: Uuid, currency: &str) -> Result<VirtualCard> {
        let card = sqlx::query_as::<_, VirtualCard>(
            r#"
            INSERT INTO virtual_cards (user_id, currency, status)
            VALUES ($1, $2, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(currency)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(card)
    }

    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<VirtualCard>> {
        let cards = sqlx::query_as::<_, VirtualCard>(
            r#"SELECT * FROM virtual_cards WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(cards)
    }

    pub async fn list_all(&self) -> Result<Vec<VirtualCard>> {
        let cards = sqlx::query_as::<_, VirtualCard>(
            r#"SELECT * FROM virtual_cards ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(cards)
    }

    /// PENDING -> ACTIVE. Card issuance against the payments provider is an
    /// external concern; activation here only flips the status.
    pub async fn activate(&self, card_id: Uuid) -> Result<VirtualCard> {
        let updated = sqlx::query_as::<_, VirtualCard>(
            r#"
            UPDATE virtual_cards
            SET status = 'ACTIVE'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.db_pool)
        .await?;

        match updated {
            Some(card) => Ok(card),
            None => {
                let current: Option<(CardStatus,)> =
                    sqlx::query_as(r#"SELECT status FROM virtual_cards WHERE id = $1"#)
                        .bind(card_id)
                        .fetch_optional(&self.db_pool)
                        .await?;

                Err(match current {
                    None => ApiError::NotFound("Card".to_string()),
                    Some((status,)) => ApiError::Validation(format!(
                        "Card cannot be activated from status {status:?}"
                    )),
                })
            }
        }
    }
}
