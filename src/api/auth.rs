use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::password;
use crate::auth::token::{LOGIN_TOKEN_TTL_SECS, REGISTRATION_TOKEN_TTL_SECS};
use crate::db::models::UserProfile;
use crate::db::users::NewUser;
use crate::error::{ApiError, Result};
use crate::AppState;

fn session_cookie(state: &AppState, token: String, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build(("token", token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserProfile,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    // unknown email and wrong password collapse to the same error so the
    // response doesn't reveal which emails are registered
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue_login(user.id, &user.email, user.role)?;
    let jar = jar.add(session_cookie(&state, token, LOGIN_TOKEN_TTL_SECS));

    tracing::info!("User {} logged in", user.id);

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<RegisterResponse>)> {
    if req.email.trim().is_empty()
        || req.password.is_empty()
        || req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Email, password, first name, and last name are required".to_string(),
        ));
    }

    let password_hash = password::hash(&req.password)?;

    let user = state
        .users
        .create(NewUser {
            email: req.email.trim(),
            password_hash: &password_hash,
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            phone: req.phone.as_deref(),
        })
        .await?;

    let token = state
        .tokens
        .issue_registration(user.id, &user.email, user.role)?;
    let jar = jar.add(session_cookie(&state, token.clone(), REGISTRATION_TOKEN_TTL_SECS));

    tracing::info!("User {} registered", user.id);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    // clearing is an immediately-expiring empty value
    let jar = jar.add(session_cookie(&state, String::new(), 0));

    Ok((jar, Json(serde_json::json!({ "success": true }))))
}
