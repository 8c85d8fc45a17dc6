use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::positive_amount;
use crate::auth::Claims;
use crate::db::models::TransactionRecord;
use crate::error::Result;
use crate::AppState;

fn default_currency() -> String {
    "USDT".to_string()
}

#[derive(Debug, Serialize)]
pub struct SavingsResponse {
    pub savings: Vec<TransactionRecord>,
}

pub async fn list_savings(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SavingsResponse>> {
    let savings = state.ledger.deposits_for(claims.sub).await?;

    Ok(Json(SavingsResponse { savings }))
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub success: bool,
    pub saving: TransactionRecord,
    pub message: String,
}

pub async fn create_deposit(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DepositRequest>,
) -> Result<(StatusCode, Json<DepositResponse>)> {
    let amount = positive_amount(req.amount)?;

    let saving = state
        .ledger
        .record_deposit(claims.sub, amount, &req.currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DepositResponse {
            success: true,
            saving,
            message: "Savings deposit completed successfully".to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub success: bool,
    pub transaction: TransactionRecord,
    pub message: String,
    pub remaining_balance: Decimal,
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>> {
    let amount = positive_amount(req.amount)?;

    let transaction = state
        .ledger
        .withdraw(claims.sub, amount, &req.currency)
        .await?;

    let remaining_balance = state.ledger.savings_balance(claims.sub).await?;

    Ok(Json(WithdrawResponse {
        success: true,
        transaction,
        message: "Withdrawal completed successfully".to_string(),
        remaining_balance,
    }))
}
