use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::positive_amount;
use crate::auth::Claims;
use crate::db::models::Loan;
use crate::error::{ApiError, Result};
use crate::AppState;

fn default_interest() -> Decimal {
    Decimal::new(500, 2) // 5.00%
}

#[derive(Debug, Serialize)]
pub struct LoansResponse {
    pub loans: Vec<Loan>,
}

pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<LoansResponse>> {
    let loans = state.loans.list_for(claims.sub).await?;

    Ok(Json(LoansResponse { loans }))
}

#[derive(Debug, Deserialize)]
pub struct LoanRequest {
    pub amount: Decimal,
    pub reason: String,
    #[serde(default = "default_interest")]
    pub interest: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub success: bool,
    pub loan: Loan,
}

pub async fn request_loan(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>)> {
    let amount = positive_amount(req.amount)?;

    if req.reason.trim().is_empty() {
        return Err(ApiError::Validation("Loan reason is required".to_string()));
    }
    if req.interest < Decimal::ZERO {
        return Err(ApiError::Validation("Invalid interest rate".to_string()));
    }

    let loan = state
        .loans
        .request(claims.sub, amount, req.interest, req.reason.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            success: true,
            loan,
        }),
    ))
}
