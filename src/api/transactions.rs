use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::positive_amount;
use crate::auth::Claims;
use crate::db::ledger::TRANSACTION_PAGE_SIZE;
use crate::db::models::TransactionRecord;
use crate::error::{ApiError, Result};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionRecord>,
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<TransactionsResponse>> {
    let transactions = state
        .ledger
        .transactions_for(claims.sub, TRANSACTION_PAGE_SIZE)
        .await?;

    Ok(Json(TransactionsResponse { transactions }))
}

fn default_currency() -> String {
    "USDT".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub to_email: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub success: bool,
    pub transaction: TransactionRecord,
}

pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>)> {
    let amount = positive_amount(req.amount)?;

    let recipient = state
        .users
        .find_by_email(&req.to_email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient".to_string()))?;

    if recipient.id == claims.sub {
        return Err(ApiError::Validation(
            "Cannot transfer to yourself".to_string(),
        ));
    }

    let transaction = state
        .ledger
        .transfer(claims.sub, recipient.id, amount, &req.currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            success: true,
            transaction,
        }),
    ))
}
