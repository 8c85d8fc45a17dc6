use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::Claims;
use crate::db::models::VirtualCard;
use crate::error::Result;
use crate::AppState;

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Serialize)]
pub struct CardsResponse {
    pub cards: Vec<VirtualCard>,
}

pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CardsResponse>> {
    let cards = state.cards.list_for(claims.sub).await?;

    Ok(Json(CardsResponse { cards }))
}

#[derive(Debug, Deserialize)]
pub struct CardRequest {
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub success: bool,
    pub card: VirtualCard,
}

pub async fn request_card(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CardRequest>,
) -> Result<(StatusCode, Json<CardResponse>)> {
    let card = state.cards.request(claims.sub, &req.currency).await?;

    Ok((
        StatusCode::CREATED,
        Json(CardResponse {
            success: true,
            card,
        }),
    ))
}
