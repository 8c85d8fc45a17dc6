use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::{Loan, UserProfile, VirtualCard};
use crate::db::users::MemberSummary;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub total_members: i64,
    pub active_members: i64,
    pub total_savings: Decimal,
    pub total_loans: Decimal,
    pub pending_approvals: i64,
}

/// Aggregate view over all members for the admin dashboard.
pub async fn overview(State(state): State<Arc<AppState>>) -> Result<Json<OverviewResponse>> {
    let db = &state.db_pool;

    let members = sqlx::query(
        "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_active) AS active
         FROM users WHERE role = 'MEMBER'",
    )
    .fetch_one(db)
    .await?;
    let total_members: i64 = members.get("total");
    let active_members: i64 = members.get("active");

    let total_savings = state.ledger.total_savings().await?;

    let loans = sqlx::query(
        "SELECT COALESCE(SUM(amount), 0) AS total
         FROM loans WHERE status IN ('APPROVED', 'DISBURSED')",
    )
    .fetch_one(db)
    .await?;
    let total_loans: Decimal = loans.get("total");

    // everything waiting on an administrator: loan requests, card requests,
    // and members pending activation
    let pending = sqlx::query(
        "SELECT
            (SELECT COUNT(*) FROM loans WHERE status = 'PENDING')
          + (SELECT COUNT(*) FROM virtual_cards WHERE status = 'PENDING')
          + (SELECT COUNT(*) FROM users WHERE role = 'MEMBER' AND NOT is_active)
            AS pending",
    )
    .fetch_one(db)
    .await?;
    let pending_approvals: i64 = pending.get("pending");

    Ok(Json(OverviewResponse {
        total_members,
        active_members,
        total_savings,
        total_loans,
        pending_approvals,
    }))
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub members: Vec<MemberSummary>,
}

pub async fn list_members(State(state): State<Arc<AppState>>) -> Result<Json<MembersResponse>> {
    let members = state.users.list_members().await?;

    Ok(Json(MembersResponse { members }))
}

#[derive(Debug, Serialize)]
pub struct MemberActionResponse {
    pub success: bool,
    pub user: UserProfile,
}

pub async fn activate_member(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberActionResponse>> {
    let user = state.users.activate(member_id).await?;

    tracing::info!("Member {} activated", user.id);

    Ok(Json(MemberActionResponse {
        success: true,
        user: user.into(),
    }))
}

#[derive(Debug, Serialize)]
pub struct AdminLoansResponse {
    pub loans: Vec<Loan>,
}

pub async fn list_loans(State(state): State<Arc<AppState>>) -> Result<Json<AdminLoansResponse>> {
    let loans = state.loans.list_all().await?;

    Ok(Json(AdminLoansResponse { loans }))
}

#[derive(Debug, Serialize)]
pub struct LoanActionResponse {
    pub success: bool,
    pub loan: Loan,
}

pub async fn approve_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanActionResponse>> {
    let loan = state.loans.approve(loan_id).await?;

    tracing::info!("Loan {} approved", loan.id);

    Ok(Json(LoanActionResponse { success: true, loan }))
}

pub async fn reject_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanActionResponse>> {
    let loan = state.loans.reject(loan_id).await?;

    tracing::info!("Loan {} rejected", loan.id);

    Ok(Json(LoanActionResponse { success: true, loan }))
}

pub async fn disburse_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanActionResponse>> {
    let loan = state.loans.disburse(loan_id, &state.ledger).await?;

    tracing::info!("Loan {} disbursed to user {}", loan.id, loan.user_id);

    Ok(Json(LoanActionResponse { success: true, loan }))
}

#[derive(Debug, Serialize)]
pub struct AdminCardsResponse {
    pub cards: Vec<VirtualCard>,
}

pub async fn list_cards(State(state): State<Arc<AppState>>) -> Result<Json<AdminCardsResponse>> {
    let cards = state.cards.list_all().await?;

    Ok(Json(AdminCardsResponse { cards }))
}

#[derive(Debug, Serialize)]
pub struct CardActionResponse {
    pub success: bool,
    pub card: VirtualCard,
}

pub async fn activate_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardActionResponse>> {
    let card = state.cards.activate(card_id).await?;

    tracing::info!("Card {} activated", card.id);

    Ok(Json(CardActionResponse {
        success: true,
        card,
    }))
}
