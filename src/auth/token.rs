use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Role;
use crate::error::{ApiError, Result};

/// Identity claims embedded in the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
}

// TODO: login and registration issue tokens with different lifetimes;
// unify once product decides which one is intended
pub const LOGIN_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const REGISTRATION_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Issues and validates HS256 session tokens. Stateless; validity depends
/// only on the signature and the embedded expiry.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_login(&self, user_id: Uuid, email: &str, role: Role) -> Result<String> {
        self.issue(user_id, email, role, LOGIN_TOKEN_TTL_SECS)
    }

    pub fn issue_registration(&self, user_id: Uuid, email: &str, role: Role) -> Result<String> {
        self.issue(user_id, email, role, REGISTRATION_TOKEN_TTL_SECS)
    }

    fn issue(&self, user_id: Uuid, email: &str, role: Role, ttl_secs: i64) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            exp: Utc::now().timestamp() + ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}
